//! Definitions and the projection tree
//!
//! A [`Definition`] is the nested mapping describing the full configuration of
//! a remote resource. Projection and exclusion produce a [`Node`] tree
//! instead, so that a key missing from the source, a key removed on purpose
//! and a key holding an explicit `null` remain three different things.
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Nested mapping describing the configuration of a resource
pub type Definition = Map<String, Value>;

/// Convert a value into a definition, non-mapping values give an empty one
pub fn to_definition(value: Value) -> Definition {
    match value {
        Value::Object(map) => map,
        _ => Definition::new(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// The key is not present in the source data
    Absent,
    /// The key was removed by an exclusion path
    Excluded,
    /// Any non-mapping value, including an explicit `null`
    Value(Value),
    Map(BTreeMap<String, Node>),
}

impl Node {
    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map(_))
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert back to a JSON value, dropping absent and excluded keys.
    ///
    /// Returns `None` if the node itself is absent or excluded.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Node::Absent | Node::Excluded => None,
            Node::Value(v) => Some(v),
            Node::Map(map) => Some(Value::Object(
                map.into_iter()
                    .filter_map(|(k, n)| n.into_value().map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    /// Convert back to a JSON value where both absent and excluded keys
    /// become `null`.
    ///
    /// This loses information and is only meant for display.
    pub fn collapse(&self) -> Value {
        match self {
            Node::Absent | Node::Excluded => Value::Null,
            Node::Value(v) => v.clone(),
            Node::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, n)| (k.clone(), n.collapse()))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => Node::from(map),
            v => Node::Value(v.clone()),
        }
    }
}

impl From<&Definition> for Node {
    fn from(def: &Definition) -> Self {
        Node::Map(def.iter().map(|(k, v)| (k.clone(), Node::from(v))).collect())
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn it_converts_values_into_nodes_and_back() {
        let value = json!({"a": {"b": [1, 2]}, "c": null, "d": "x"});
        let node = Node::from(&value);
        assert!(node.is_map());
        assert_eq!(node.get("c"), Some(&Node::Value(Value::Null)));
        assert_eq!(node.into_value(), Some(value));
    }

    #[test]
    fn it_tells_absent_excluded_and_null_apart() {
        let null = Node::Map(BTreeMap::from([("k".to_string(), Node::Value(Value::Null))]));
        let absent = Node::Map(BTreeMap::from([("k".to_string(), Node::Absent)]));
        let excluded = Node::Map(BTreeMap::from([("k".to_string(), Node::Excluded)]));

        assert_ne!(null, absent);
        assert_ne!(absent, excluded);
        assert_ne!(null, excluded);

        // but their display forms are all the same
        assert_eq!(null.collapse(), json!({"k": null}));
        assert_eq!(absent.collapse(), json!({"k": null}));
        assert_eq!(excluded.collapse(), json!({"k": null}));

        // while converting back only keeps the real null
        assert_eq!(null.into_value(), Some(json!({"k": null})));
        assert_eq!(absent.into_value(), Some(json!({})));
        assert_eq!(excluded.into_value(), Some(json!({})));
    }

    #[test]
    fn it_builds_definitions_from_values() {
        assert_eq!(to_definition(json!({"a": 1})).get("a"), Some(&json!(1)));
        assert!(to_definition(json!([1])).is_empty());
    }
}
