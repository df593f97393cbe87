//! Wire-name conversion: columns are snake_case in the store, keys are camelCase on the wire.

use serde_json::{Map, Value};

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "user_id" -> "userId", "street_address_1" -> "streetAddress1"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = !out.is_empty();
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert all keys of a JSON object from snake_case to camelCase (in place).
pub fn object_keys_to_camel_case(obj: &mut Map<String, Value>) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for k in keys {
        let camel = to_camel_case(&k);
        if camel != k {
            if let Some(v) = obj.remove(&k) {
                obj.insert(camel, v);
            }
        }
    }
}

/// Recursively apply camelCase to all object keys (objects and arrays of objects).
/// Nested include payloads come back from `row_to_json` with raw column names.
pub fn value_keys_to_camel_case_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            object_keys_to_camel_case(map);
            for (_, v) in map.iter_mut() {
                value_keys_to_camel_case_recursive(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                value_keys_to_camel_case_recursive(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_cases_identifiers() {
        assert_eq!(to_camel_case("contact_phone"), "contactPhone");
        assert_eq!(to_camel_case("street_address_1"), "streetAddress1");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("_private"), "private");
        assert_eq!(to_camel_case("addresses"), "addresses");
    }

    #[test]
    fn converts_nested_includes() {
        let mut v = json!({
            "email_verified": true,
            "addresses": [{"zip_code": "00100", "city_id": 3}],
            "state": {"state_code": "NB"}
        });
        value_keys_to_camel_case_recursive(&mut v);
        assert_eq!(
            v,
            json!({
                "emailVerified": true,
                "addresses": [{"zipCode": "00100", "cityId": 3}],
                "state": {"stateCode": "NB"}
            })
        );
    }
}
