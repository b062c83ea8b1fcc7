//! Comparison operators
//!
//! Usage: {% if operation.path is startsWith("/admin") %}
//! or, with a compound left side: {% if (base ~ path) is startsWith("/admin") %}

use minijinja::Value;

use crate::extension::{Operator, is_null, string_form};

/// True iff the string form of `left` begins with the string form of `right`
///
/// Null on either side is false.
pub fn starts_with(left: &Value, right: &Value) -> bool {
    if is_null(left) || is_null(right) {
        return false;
    }
    string_form(left).starts_with(&string_form(right))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StartsWith;

impl Operator for StartsWith {
    fn symbol(&self) -> &'static str {
        "startsWith"
    }

    fn evaluate(&self, left: &Value, right: &Value) -> bool {
        starts_with(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with() {
        assert!(starts_with(&Value::from("hello"), &Value::from("he")));
        assert!(!starts_with(&Value::from("hi"), &Value::from("hello")));
        assert!(starts_with(&Value::from("x"), &Value::from("")));
        assert!(starts_with(&Value::from(42), &Value::from(4)));
    }

    #[test]
    fn test_starts_with_null() {
        assert!(!starts_with(&Value::from(()), &Value::from("x")));
        assert!(!starts_with(&Value::from("x"), &Value::from(())));
        assert!(!starts_with(&Value::UNDEFINED, &Value::UNDEFINED));
    }

    #[test]
    fn test_starts_with_bool() {
        assert!(starts_with(&Value::from(true), &Value::from("t")));
        assert!(starts_with(&Value::from(false), &Value::from("fal")));
        assert!(!starts_with(&Value::from(true), &Value::from("T")));
    }
}
