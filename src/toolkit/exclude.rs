use crate::definition::{to_definition, Definition, Node};
use crate::path::DottedPath;

/// Mark the values found at `paths` as [`Node::Excluded`].
///
/// Paths are grouped by their first segment. Keys not matched by any path
/// are copied. A matched key holding a non-mapping value is excluded
/// outright. A matched key holding a mapping is either excluded down to
/// each of its leaves, if a path ends there, or processed recursively with
/// the remainder of the matching paths.
///
/// Paths that do not exist in `node` have no effect.
pub fn exclude(node: &Node, paths: &[DottedPath]) -> Node {
    let Node::Map(map) = node else {
        return node.clone();
    };
    if paths.is_empty() {
        return node.clone();
    }

    Node::Map(
        map.iter()
            .map(|(key, child)| {
                let matching: Vec<&DottedPath> = paths
                    .iter()
                    .filter(|p| p.head() == Some(key.as_str()))
                    .collect();

                let child = if matching.is_empty() {
                    child.clone()
                } else if !child.is_map() {
                    Node::Excluded
                } else if matching.iter().any(|p| p.len() == 1) {
                    exclude_leaves(child)
                } else {
                    let nested: Vec<DottedPath> =
                        matching.iter().filter_map(|p| p.tail()).collect();
                    exclude(child, &nested)
                };
                (key.clone(), child)
            })
            .collect(),
    )
}

fn exclude_leaves(node: &Node) -> Node {
    match node {
        Node::Map(map) => Node::Map(
            map.iter()
                .map(|(k, n)| (k.clone(), exclude_leaves(n)))
                .collect(),
        ),
        _ => Node::Excluded,
    }
}

/// Remove the values found at `paths` from a definition
pub fn redact(def: &Definition, paths: &[DottedPath]) -> Definition {
    exclude(&Node::from(def), paths)
        .into_value()
        .map(to_definition)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::paths;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn excluded(value: Value, fields: &[&str]) -> Value {
        exclude(&Node::from(&value), &paths(fields)).collapse()
    }

    fn connect_info() -> Value {
        json!({
            "data_dir": "/data/dataiku/dss",
            "host": "localhost",
            "port": 10000,
            "api_key": "thisissecret"
        })
    }

    #[test]
    fn it_excludes_top_level_keys() {
        assert_eq!(
            excluded(connect_info(), &["data_dir", "api_key"]),
            json!({"data_dir": null, "host": "localhost", "port": 10000, "api_key": null})
        );
        assert_eq!(
            excluded(connect_info(), &["host", "port", "unknown"]),
            json!({"data_dir": "/data/dataiku/dss", "host": null, "port": null, "api_key": "thisissecret"})
        );
    }

    #[test]
    fn it_excludes_nested_keys() {
        assert_eq!(
            excluded(json!({"a": {"b": 1, "c": 2}}), &["a.b"]),
            json!({"a": {"b": null, "c": 2}})
        );
        assert_eq!(
            excluded(
                json!({"data_dir": "/data/dataiku/dss", "port": 10000, "nested": {"port": 10000, "host": "localhost"}}),
                &["port", "nested.port"]
            ),
            json!({"data_dir": "/data/dataiku/dss", "port": null, "nested": {"port": null, "host": "localhost"}})
        );
    }

    #[test]
    fn it_only_applies_nested_paths_under_their_own_head() {
        assert_eq!(
            excluded(json!({"a": {"b": 1}, "c": {"b": 2}}), &["c.b"]),
            json!({"a": {"b": 1}, "c": {"b": null}})
        );
    }

    #[test]
    fn it_excludes_every_leaf_of_a_mapping() {
        let node = exclude(
            &Node::from(&json!({"sso": {"a": 1, "b": {"c": 2}}, "d": 3})),
            &paths(&["sso"]),
        );
        assert_eq!(node.into_value(), Some(json!({"sso": {"b": {}}, "d": 3})));
    }

    #[test]
    fn it_excludes_scalars_on_the_way_to_a_nested_path() {
        assert_eq!(
            excluded(json!({"a": "flat", "b": 1}), &["a.b.c"]),
            json!({"a": null, "b": 1})
        );
    }

    #[test]
    fn it_marks_excluded_keys_differently_from_nulls() {
        let node = exclude(&Node::from(&json!({"a": null, "b": 1})), &paths(&["b"]));
        assert_eq!(node.get("a"), Some(&Node::Value(Value::Null)));
        assert_eq!(node.get("b"), Some(&Node::Excluded));
    }

    #[test]
    fn it_ignores_missing_paths() {
        let data = json!({"a": {"b": 1}, "c": [1, 2]});
        let node = Node::from(&data);
        assert_eq!(exclude(&node, &paths(&["x", "a.x", "x.y.z"])), node);
        assert_eq!(exclude(&node, &[]), node);
    }

    #[test]
    fn it_is_idempotent() {
        let node = Node::from(&json!({"a": {"b": 1, "c": {"d": 2}}, "e": 3}));
        let fields = paths(&["a.c", "e"]);
        let once = exclude(&node, &fields);
        assert_eq!(exclude(&once, &fields), once);
    }

    #[test]
    fn it_redacts_definitions() {
        let def = to_definition(json!({"name": "pg", "params": {"password": "enc", "user": "u"}}));
        assert_eq!(
            Value::Object(redact(&def, &paths(&["params.password"]))),
            json!({"name": "pg", "params": {"user": "u"}})
        );
    }
}
