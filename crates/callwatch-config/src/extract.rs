//! Typed field extraction from an untyped JSON tree.
//!
//! Every getter follows the same policy: a missing key yields `Ok(None)`, a
//! key holding the expected shape yields `Ok(Some(_))`, and anything else,
//! including an explicit `null`, is an error naming the field.

use serde_json::{Map, Value};

use crate::ConfigError;

pub(crate) type Object = Map<String, Value>;

/// Name of a JSON value's type, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Joins a parent path and a key into a dotted field path.
pub(crate) fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub(crate) fn get_bool(obj: &Object, parent: &str, key: &str) -> Result<Option<bool>, ConfigError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ConfigError::type_mismatch(
            field_path(parent, key),
            "boolean",
            type_name(other),
        )),
    }
}

pub(crate) fn get_string(
    obj: &Object,
    parent: &str,
    key: &str,
) -> Result<Option<String>, ConfigError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::type_mismatch(
            field_path(parent, key),
            "string",
            type_name(other),
        )),
    }
}

pub(crate) fn get_list<'a>(
    obj: &'a Object,
    parent: &str,
    key: &str,
) -> Result<Option<&'a [Value]>, ConfigError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(ConfigError::type_mismatch(
            field_path(parent, key),
            "array",
            type_name(other),
        )),
    }
}

pub(crate) fn get_object<'a>(
    obj: &'a Object,
    parent: &str,
    key: &str,
) -> Result<Option<&'a Object>, ConfigError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(ConfigError::type_mismatch(
            field_path(parent, key),
            "object",
            type_name(other),
        )),
    }
}

/// Reads an unsigned integer.
///
/// Accepts JSON integers, floats with an exactly integral value (`10.0`)
/// and strings holding a decimal integer.
pub(crate) fn get_u64(obj: &Object, parent: &str, key: &str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = obj.get(key) else {
        return Ok(None);
    };
    let field = field_path(parent, key);

    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(Some(u));
            }
            if n.is_i64() {
                return Err(ConfigError::out_of_range(field, n, "must not be negative"));
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            integral_f64_to_u64(&field, f).map(Some)
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(u) = trimmed.parse::<u64>() {
                Ok(Some(u))
            } else if trimmed.parse::<i64>().is_ok() {
                Err(ConfigError::out_of_range(field, s, "must not be negative"))
            } else {
                Err(ConfigError::type_mismatch(field, "integer", "string"))
            }
        }
        other => Err(ConfigError::type_mismatch(field, "integer", type_name(other))),
    }
}

/// Reads an unsigned integer that must fit in 32 bits.
pub(crate) fn get_u32(obj: &Object, parent: &str, key: &str) -> Result<Option<u32>, ConfigError> {
    match get_u64(obj, parent, key)? {
        None => Ok(None),
        Some(wide) => u32::try_from(wide).map(Some).map_err(|_| {
            ConfigError::out_of_range(field_path(parent, key), wide, "must fit in 32 bits")
        }),
    }
}

/// Reads a floating point number, from a JSON number or a numeric string.
pub(crate) fn get_f64(obj: &Object, parent: &str, key: &str) -> Result<Option<f64>, ConfigError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            ConfigError::type_mismatch(field_path(parent, key), "number", "string")
        }),
        Some(other) => Err(ConfigError::type_mismatch(
            field_path(parent, key),
            "number",
            type_name(other),
        )),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn integral_f64_to_u64(field: &str, f: f64) -> Result<u64, ConfigError> {
    if f.fract() != 0.0 || !f.is_finite() {
        return Err(ConfigError::type_mismatch(field, "integer", "fractional number"));
    }
    if f < 0.0 {
        return Err(ConfigError::out_of_range(field, f, "must not be negative"));
    }
    // u64::MAX as f64 rounds up to 2^64, which is itself out of range.
    if f >= u64::MAX as f64 {
        return Err(ConfigError::out_of_range(field, f, "must fit in 64 bits"));
    }
    Ok(f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_missing_key_is_none() {
        let obj = object(json!({}));
        assert_eq!(get_bool(&obj, "", "flag").unwrap(), None);
        assert_eq!(get_string(&obj, "", "name").unwrap(), None);
        assert_eq!(get_u64(&obj, "", "count").unwrap(), None);
        assert_eq!(get_f64(&obj, "", "rate").unwrap(), None);
        assert!(get_list(&obj, "", "items").unwrap().is_none());
        assert!(get_object(&obj, "", "tags").unwrap().is_none());
    }

    #[test]
    fn test_explicit_null_is_type_mismatch() {
        let obj = object(json!({"flag": null}));
        let err = get_bool(&obj, "", "flag").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TypeMismatch { found: "null", .. }
        ));
    }

    #[test]
    fn test_get_bool_wrong_type() {
        let obj = object(json!({"flag": "true"}));
        let err = get_bool(&obj, "", "flag").unwrap_err();
        assert_eq!(err.field(), Some("flag"));
    }

    #[test]
    fn test_field_path_nesting() {
        let obj = object(json!({"pattern": 5}));
        let err = get_string(&obj, "log_filters[1]", "pattern").unwrap_err();
        assert_eq!(err.field(), Some("log_filters[1].pattern"));
    }

    #[test]
    fn test_get_u64_coercions() {
        let obj = object(json!({"a": 42, "b": 10.0, "c": "17", "d": " 8 "}));
        assert_eq!(get_u64(&obj, "", "a").unwrap(), Some(42));
        assert_eq!(get_u64(&obj, "", "b").unwrap(), Some(10));
        assert_eq!(get_u64(&obj, "", "c").unwrap(), Some(17));
        assert_eq!(get_u64(&obj, "", "d").unwrap(), Some(8));
    }

    #[test]
    fn test_get_u64_large_value() {
        let obj = object(json!({"count": 9_007_199_254_740_993_u64}));
        assert_eq!(get_u64(&obj, "", "count").unwrap(), Some(9_007_199_254_740_993));
    }

    #[test]
    fn test_get_u64_rejects_fraction_and_negative() {
        let obj = object(json!({"frac": 1.5, "neg": -3, "negf": -2.0, "neg_str": "-4"}));
        assert!(matches!(
            get_u64(&obj, "", "frac").unwrap_err(),
            ConfigError::TypeMismatch { .. }
        ));
        assert!(matches!(
            get_u64(&obj, "", "neg").unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
        assert!(matches!(
            get_u64(&obj, "", "negf").unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
        assert!(matches!(
            get_u64(&obj, "", "neg_str").unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_get_u64_rejects_non_numeric_string() {
        let obj = object(json!({"count": "many"}));
        assert!(matches!(
            get_u64(&obj, "", "count").unwrap_err(),
            ConfigError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_get_u32_overflow() {
        let obj = object(json!({"bytes": 4_294_967_296_u64, "ok": 4_294_967_295_u64}));
        assert!(matches!(
            get_u32(&obj, "", "bytes").unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
        assert_eq!(get_u32(&obj, "", "ok").unwrap(), Some(u32::MAX));
    }

    #[test]
    fn test_get_f64() {
        let obj = object(json!({"a": 0.5, "b": 1, "c": "0.25", "d": [1]}));
        assert_eq!(get_f64(&obj, "", "a").unwrap(), Some(0.5));
        assert_eq!(get_f64(&obj, "", "b").unwrap(), Some(1.0));
        assert_eq!(get_f64(&obj, "", "c").unwrap(), Some(0.25));
        assert!(get_f64(&obj, "", "d").is_err());
    }

    #[test]
    fn test_get_list_and_object_wrong_type() {
        let obj = object(json!({"items": {}, "tags": []}));
        assert!(get_list(&obj, "", "items").is_err());
        assert!(get_object(&obj, "", "tags").is_err());
    }
}
