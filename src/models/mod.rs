// Entity models: each owns its store document shape and its wire shape.
//
// Every model has two explicit constructors: `from_payload` for inbound
// request bodies and `from_entity` for previously stored documents. Inbound
// integers are coerced with `coerce_int`; non-numeric input becomes the
// `None` marker and is rejected by `validate`, never by a panic.
use serde_json::Value;

pub mod boat;
pub mod load;
pub mod user;

pub use boat::Boat;
pub use load::Load;
pub use user::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("The request object is missing at least one of the required attributes")]
    MissingRequiredFields,
    #[error("The boat name is invalid. Names must be 1-40 alphanumeric characters long, contain no special symbols except spaces.")]
    InvalidName,
    #[error("The boat type is invalid. Names must be 1-40 alphanumeric characters long, contain no special symbols except spaces.")]
    InvalidType,
    #[error("The boat length is invalid. Lengths must be an integer.")]
    InvalidLength,
    #[error("The load volume is invalid. Volumes must be an integer.")]
    InvalidVolume,
    #[error("stored {0} document has an unexpected shape")]
    BadStoredDocument(&'static str),
}

/// Base-10 integer coercion for inbound fields. Accepts JSON integers and
/// numeric strings; everything else becomes the invalid-number marker.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Inbound text fields keep their string value; scalar non-strings keep
/// their JSON rendering (so a numeric name like `28` stays usable, as the
/// validation rules permit digits).
pub(crate) fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 1-40 alphanumeric characters plus spaces, not starting with a space.
pub(crate) fn string_is_valid(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    s.len() <= 40 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_int(&json!(28)), Some(28));
        assert_eq!(coerce_int(&json!("28")), Some(28));
        assert_eq!(coerce_int(&json!(" 7 ")), Some(7));
    }

    #[test]
    fn coerce_int_marks_non_numeric_input_invalid() {
        assert_eq!(coerce_int(&json!("twenty eight")), None);
        assert_eq!(coerce_int(&json!(28.5)), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&json!(null)), None);
    }

    #[test]
    fn string_validation_rules() {
        assert!(string_is_valid("Sea Witch"));
        assert!(string_is_valid("28"));
        assert!(!string_is_valid(""));
        assert!(!string_is_valid(" leading space"));
        assert!(!string_is_valid("name-with-dashes"));
        assert!(!string_is_valid(&"x".repeat(41)));
    }
}
