use serde_json::Value;

use super::merge::merge_definition;
use crate::definition::Definition;
use crate::path::DottedPath;

/// Build a nested mapping holding `default` at the end of every path.
///
/// Paths sharing a prefix share the corresponding subtree.
pub fn build_template(paths: &[DottedPath], default: &Value) -> Definition {
    let mut template = Definition::new();
    for path in paths {
        let branch = path.iter().rev().fold(default.clone(), |value, key| {
            let mut map = Definition::new();
            map.insert(key.clone(), value);
            Value::Object(map)
        });
        if let Value::Object(branch) = branch {
            merge_definition(&mut template, &branch);
        }
    }
    template
}

/// Same as [`build_template`] parsing the fields with the given delimiter
pub fn build_template_from_fields<S: AsRef<str>>(
    fields: &[S],
    default: &Value,
    delimiter: char,
) -> Definition {
    let paths: Vec<DottedPath> = fields
        .iter()
        .map(|f| DottedPath::parse_with(f.as_ref(), delimiter))
        .collect();
    build_template(&paths, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn leaves(value: &Value, prefix: Vec<String>, out: &mut Vec<(String, Value)>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (k, v) in map {
                    let mut path = prefix.clone();
                    path.push(k.clone());
                    leaves(v, path, out);
                }
            }
            v => out.push((prefix.join("."), v.clone())),
        }
    }

    #[test]
    fn it_builds_nested_skeletons() {
        let template = build_template_from_fields(
            &["containerSettings.executionConfigs", "sparkSettings.executionConfigs"],
            &json!([]),
            '.',
        );
        assert_eq!(
            Value::Object(template),
            json!({
                "containerSettings": {"executionConfigs": []},
                "sparkSettings": {"executionConfigs": []}
            })
        );
    }

    #[test]
    fn it_shares_common_prefixes() {
        let fields = ["a.b.c", "a.b.d", "a.e", "f"];
        let template = build_template_from_fields(&fields, &json!(0), '.');
        assert_eq!(
            Value::Object(template.clone()),
            json!({"a": {"b": {"c": 0, "d": 0}, "e": 0}, "f": 0})
        );

        let mut found = Vec::new();
        leaves(&Value::Object(template), Vec::new(), &mut found);
        assert!(found.iter().all(|(_, v)| v == &json!(0)));
        assert_eq!(found.len(), fields.len());
        assert_eq!(
            found.into_iter().map(|(p, _)| p).collect::<BTreeSet<_>>(),
            fields.iter().map(|f| f.to_string()).collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn it_supports_other_delimiters() {
        let template = build_template_from_fields(&["a/b", "a/c"], &json!(null), '/');
        assert_eq!(Value::Object(template), json!({"a": {"b": null, "c": null}}));
    }

    #[test]
    fn it_builds_an_empty_template_from_no_fields() {
        assert!(build_template(&[], &json!(1)).is_empty());
    }
}
