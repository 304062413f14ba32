use serde_json::Value;

use crate::error::ValidationError;

/// Field used to match entries of a named list
pub const NAME_KEY: &str = "name";

/// Merge two sequences of mappings by their `name` field.
///
/// For every entry of `updates`, the first entry of the result with the same
/// name receives the update fields (a field level overwrite, not a deep
/// merge) and keeps its position. Entries with a new name are appended in
/// the order they appear in `updates`.
///
/// Entries of `current` that `updates` does not mention are kept, there is no
/// way of removing an entry through this merge. Entries of `current` without
/// a name are kept but never matched.
pub fn merge_named(current: &[Value], updates: &[Value]) -> Result<Vec<Value>, ValidationError> {
    let mut result = current.to_vec();

    for (idx, update) in updates.iter().enumerate() {
        let Some((fields, name)) = update
            .as_object()
            .and_then(|fields| fields.get(NAME_KEY).map(|name| (fields, name)))
        else {
            return Err(ValidationError::new(format!(
                "named list entry #{idx} must be a mapping with a '{NAME_KEY}' field"
            )));
        };

        match result
            .iter()
            .position(|entry| entry.get(NAME_KEY) == Some(name))
        {
            Some(pos) => {
                if let Value::Object(entry) = &mut result[pos] {
                    for (key, value) in fields {
                        entry.insert(key.clone(), value.clone());
                    }
                }
            }
            None => result.push(update.clone()),
        }
    }

    Ok(result)
}
