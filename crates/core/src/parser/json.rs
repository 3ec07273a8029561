use serde_json::Value;
use thiserror::Error;

/// The import text is not a JSON array; callers fall back to the text format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array of questions")]
    NotAnArray,
}

/// Parse `text` as a top-level JSON array and return its elements untouched.
///
/// Elements are not validated here; the bank validates them when it loads.
///
/// # Errors
///
/// Returns `FormatError::InvalidJson` if `text` is not JSON, and
/// `FormatError::NotAnArray` if the top-level value is anything but an array.
pub fn parse_json_array(text: &str) -> Result<Vec<Value>, FormatError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| FormatError::InvalidJson(err.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(FormatError::NotAnArray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_elements_verbatim() {
        let items = parse_json_array(r#"[{"stem":"s","options":["a"]}, 3, "x"]"#).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["options"][0], "a");
        assert_eq!(items[1], 3);
    }

    #[test]
    fn empty_array_is_fine() {
        assert!(parse_json_array(" [] ").unwrap().is_empty());
    }

    #[test]
    fn rejects_objects_and_garbage() {
        assert_eq!(
            parse_json_array(r#"{"stem":"s"}"#).unwrap_err(),
            FormatError::NotAnArray
        );
        assert!(matches!(
            parse_json_array("Q: what?").unwrap_err(),
            FormatError::InvalidJson(_)
        ));
    }
}
