use serde_json::Value;

use crate::definition::{Definition, Node};

/// Keep only the part of `data` matching `shape`.
///
/// `shape` is a mapping whose leaf values are placeholders, only its keys
/// matter. The result has the keys of `shape` at every level: a key
/// missing from `data` becomes [`Node::Absent`], or a mapping of absent
/// keys if `shape` nests further under it. A key whose value is a mapping
/// in both `data` and `shape` is projected recursively, any other value is
/// copied as is.
///
/// A non-mapping `data` is returned unchanged.
pub fn project(data: &Value, shape: &Value) -> Node {
    match (data, shape) {
        (Value::Object(data), Value::Object(shape)) => project_definition(data, shape),
        (data, _) => Node::from(data),
    }
}

/// Same as [`project`] for definitions
pub fn project_definition(data: &Definition, shape: &Definition) -> Node {
    Node::Map(
        shape
            .iter()
            .map(|(key, placeholder)| {
                let node = match data.get(key) {
                    Some(value) if value.is_object() && placeholder.is_object() => {
                        project(value, placeholder)
                    }
                    Some(value) => Node::from(value),
                    None => match placeholder {
                        Value::Object(nested) => project_definition(&Definition::new(), nested),
                        _ => Node::Absent,
                    },
                };
                (key.clone(), node)
            })
            .collect(),
    )
}
