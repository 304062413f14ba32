use jsonptr::PointerBuf;
use serde_json::Value;
use std::fmt::Display;
use std::ops::Deref;

use crate::definition::Definition;

pub const DEFAULT_DELIMITER: char = '.';

/// A key path through nested definitions, e.g. `ldapSettings.bindPassword`
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct DottedPath(Vec<String>);

impl DottedPath {
    /// Parse a path using the default `.` delimiter
    pub fn parse(s: &str) -> DottedPath {
        Self::parse_with(s, DEFAULT_DELIMITER)
    }

    pub fn parse_with(s: &str, delimiter: char) -> DottedPath {
        DottedPath(s.split(delimiter).map(String::from).collect())
    }

    pub fn from_segments<I, S>(segments: I) -> DottedPath
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DottedPath(segments.into_iter().map(Into::into).collect())
    }

    /// First segment of the path
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The path without its first segment, `None` if nothing remains
    pub fn tail(&self) -> Option<DottedPath> {
        if self.0.len() > 1 {
            Some(DottedPath(self.0[1..].to_vec()))
        } else {
            None
        }
    }

    pub fn to_pointer(&self) -> PointerBuf {
        PointerBuf::from_tokens(self.0.iter().map(String::as_str))
    }

    /// Look up the value at this path
    pub fn lookup<'v>(&self, def: &'v Definition) -> Option<&'v Value> {
        let (head, rest) = self.0.split_first()?;
        let value = def.get(head)?;
        if rest.is_empty() {
            return Some(value);
        }
        PointerBuf::from_tokens(rest.iter().map(String::as_str))
            .resolve(value)
            .ok()
    }

    /// Write `value` at this path, creating intermediate mappings as needed
    pub fn assign(&self, def: &mut Definition, value: Value) {
        let Some((last, parents)) = self.0.split_last() else {
            return;
        };
        let mut cur = def;
        for key in parents {
            let entry = cur
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Definition::new()));
            if !entry.is_object() {
                *entry = Value::Object(Definition::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            cur = next;
        }
        cur.insert(last.clone(), value);
    }

    /// Remove the value at this path, returning it if it was there
    pub fn remove(&self, def: &mut Definition) -> Option<Value> {
        let (head, rest) = self.0.split_first()?;
        if rest.is_empty() {
            return def.remove(head);
        }
        let value = def.get_mut(head)?;
        PointerBuf::from_tokens(rest.iter().map(String::as_str)).delete(value)
    }
}

impl Deref for DottedPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DottedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for DottedPath {
    fn from(s: &str) -> DottedPath {
        DottedPath::parse(s)
    }
}

impl From<DottedPath> for String {
    fn from(path: DottedPath) -> String {
        path.to_string()
    }
}

/// Parse a list of dotted strings
pub fn paths(fields: &[&str]) -> Vec<DottedPath> {
    fields.iter().map(|f| DottedPath::parse(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn def(value: Value) -> Definition {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn it_converts_a_path_to_string() {
        assert_eq!(DottedPath::parse("a.b.c").to_string(), "a.b.c");
        assert_eq!(DottedPath::parse_with("a/b/c", '/').to_string(), "a.b.c");
        assert_eq!(String::from(DottedPath::from("a")), "a");
    }

    #[test]
    fn it_splits_head_and_tail() {
        let path = DottedPath::parse("ssoSettings.openIDParams.clientSecret");
        assert_eq!(path.head(), Some("ssoSettings"));
        assert_eq!(
            path.tail(),
            Some(DottedPath::parse("openIDParams.clientSecret"))
        );
        assert_eq!(DottedPath::parse("password").tail(), None);
    }

    #[test]
    fn it_converts_to_a_json_pointer() {
        assert_eq!(
            DottedPath::parse("params.password").to_pointer().as_str(),
            "/params/password"
        );
    }

    #[test]
    fn it_looks_up_nested_values() {
        let d = def(json!({"params": {"password": "enc", "host": "db"}, "type": "PostgreSQL"}));
        assert_eq!(
            DottedPath::parse("params.password").lookup(&d),
            Some(&json!("enc"))
        );
        assert_eq!(DottedPath::parse("type").lookup(&d), Some(&json!("PostgreSQL")));
        assert_eq!(DottedPath::parse("params.user").lookup(&d), None);
        assert_eq!(DottedPath::parse("type.inner").lookup(&d), None);
    }

    #[test]
    fn it_assigns_and_removes_nested_values() {
        let mut d = def(json!({"a": 1}));
        DottedPath::parse("b.c.d").assign(&mut d, json!(true));
        DottedPath::parse("a.x").assign(&mut d, json!("replaced"));
        assert_eq!(
            Value::Object(d.clone()),
            json!({"a": {"x": "replaced"}, "b": {"c": {"d": true}}})
        );

        assert_eq!(DottedPath::parse("b.c.d").remove(&mut d), Some(json!(true)));
        assert_eq!(DottedPath::parse("b.c.d").remove(&mut d), None);
        assert_eq!(DottedPath::parse("a").remove(&mut d), Some(json!({"x": "replaced"})));
        assert_eq!(Value::Object(d), json!({"b": {"c": {}}}));
    }
}
