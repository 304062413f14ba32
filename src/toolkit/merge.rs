use serde_json::Value;

use crate::definition::Definition;

/// Recursively merge `updates` into `base`.
///
/// Mappings are merged key by key, any other value in `updates` (scalars,
/// sequences, `null`) overwrites what `base` holds. Keys of `base` that
/// `updates` does not mention are left untouched, nothing is ever removed.
///
/// If `updates` is not a mapping it replaces `base` wholesale. If `base` is
/// not a mapping but `updates` is, the result is `updates` merged onto an
/// empty mapping.
pub fn merge(base: &mut Value, updates: &Value) {
    let Value::Object(updates) = updates else {
        *base = updates.clone();
        return;
    };

    if !base.is_object() {
        *base = Value::Object(Definition::new());
    }

    if let Value::Object(base) = base {
        merge_definition(base, updates);
    }
}

/// Same as [`merge`] for two definitions
pub fn merge_definition(base: &mut Definition, updates: &Definition) {
    for (key, value) in updates {
        if value.is_object() {
            let entry = base
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Definition::new()));
            merge(entry, value);
        } else {
            base.insert(key.clone(), value.clone());
        }
    }
}

/// Return the result of merging `updates` into `base`
pub fn merged(mut base: Value, updates: &Value) -> Value {
    merge(&mut base, updates);
    base
}
