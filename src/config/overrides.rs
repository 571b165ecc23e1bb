use serde::Serialize;
use serde_json::Value;

/// Serialize CLI overrides, dropping every unset (`null`) field so that flags
/// the user did not pass never shadow lower configuration layers
pub fn filter_unset<T: Serialize>(input: T) -> Value {
    let mut value = serde_json::to_value(input).unwrap_or(Value::Null);
    filter_unset_recursive(&mut value);
    value
}

fn filter_unset_recursive(value: &mut Value) {
    if let Value::Object(map) = value {
        let keys_to_remove: Vec<String> = map
            .iter()
            .filter_map(|(k, v)| if v.is_null() { Some(k.clone()) } else { None })
            .collect();

        for key in keys_to_remove {
            map.remove(&key);
        }

        for (_, v) in map.iter_mut() {
            filter_unset_recursive(v);
        }

        // Sections left empty carry nothing to merge
        map.retain(|_, v| !matches!(v, Value::Object(inner) if inner.is_empty()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_unset_drops_nulls_and_empty_sections() {
        let filtered = filter_unset(json!({
            "job": { "route": "paladin", "output_dir": null },
            "dispatch": { "max_threads": null },
        }));

        assert_eq!(filtered, json!({ "job": { "route": "paladin" } }));
    }

    #[test]
    fn test_filter_unset_keeps_false_and_zero() {
        let filtered = filter_unset(json!({
            "job": { "persistent_cache": false },
            "dispatch": { "max_threads": 0 },
        }));

        assert_eq!(filtered["job"]["persistent_cache"], json!(false));
        assert_eq!(filtered["dispatch"]["max_threads"], json!(0));
    }
}
