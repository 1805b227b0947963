//! Input normalization and validation helpers shared by the flows.

use regex::Regex;
use serde_json::Value;

pub const NAME_MIN_CHARS: usize = 2;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const AGE_MIN: i64 = 13;
pub const AGE_MAX: i64 = 120;

/// Normalize an email for lookup/uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Email grammar check on already-normalized input: a dot-atom local part
/// and a domain of at least two DNS labels.
pub fn valid_email(email: &str) -> bool {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .is_ok_and(|re| re.is_match(email) && email.len() <= 254)
}

/// Text form of a JSON field, trimmed. `None` for absent/null, arrays and
/// objects.
pub fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integer value of an age field using leading-integer semantics:
/// `"30"`, `"30 años"` and `30.9` give 30, anything unparsable gives 0.
pub fn parse_age(text: &str) -> i64 {
    let text = text.trim();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map_or(0, |value| sign * value)
}
