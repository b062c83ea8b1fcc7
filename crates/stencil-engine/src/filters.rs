//! Code-generation template filters
//!
//! Each filter is a unit struct implementing [`Filter`]; the string logic lives
//! in plain functions so it can be used (and tested) without an environment.
//! Unless noted otherwise a filter passes `none`/undefined input through as
//! `none`.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use minijinja::{Error, ErrorKind, Value};

use crate::extension::{Arguments, CANONICAL_LINE_TERMINATOR, Filter, is_null, string_form};

/// Largest width `padright` accepts from a template
pub const MAX_PAD_WIDTH: usize = 1 << 16;

/// Append `pad` until `value` is `width` characters long
///
/// Usage: {{ name | padright(20) }} or {{ name | padright(20, ".") }}
pub fn pad_right(value: &str, width: usize, pad: char) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let extra = (width - len).saturating_mul(pad.len_utf8());
    let mut result = String::with_capacity(value.len().saturating_add(extra));
    result.push_str(value);
    result.extend(std::iter::repeat_n(pad, width - len));
    result
}

/// Surround `value` with `prefix` and `suffix`
///
/// Usage: {{ name | wrapin("\"") }} or {{ name | wrapin("[", "]") }}
pub fn wrap_in(value: &str, prefix: &str, suffix: &str) -> String {
    let mut result = String::with_capacity(prefix.len() + value.len() + suffix.len());
    result.push_str(prefix);
    result.push_str(value);
    result.push_str(suffix);
    result
}

/// Prefix every line and terminate every line with CRLF
///
/// A trailing newline yields a final empty line, which is prefixed as well.
///
/// Usage: {{ description | lineprefix(" * ") }}
pub fn line_prefix(value: &str, prefix: &str) -> String {
    let line_count = value.matches('\n').count() + 1;
    let mut result = String::with_capacity(
        value.len() + line_count * (prefix.len() + CANONICAL_LINE_TERMINATOR.len()),
    );

    for line in value.split('\n') {
        result.push_str(prefix);
        result.push_str(line);
        result.push_str(CANONICAL_LINE_TERMINATOR);
    }

    result
}

/// Collapse a text onto one line
///
/// Usage: // {{ summary | commentsingleline }}
pub fn comment_single_line(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\u{2028}', '\u{2029}'], " ")
        .trim()
        .to_string()
}

/// Continue a multi-line comment: every line but the first gets `prefix`
///
/// Usage: /// {{ description | commentmultiline("/// ") }}
pub fn comment_multi_line(value: &str, prefix: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for (idx, line) in value.split('\n').enumerate() {
        if idx > 0 {
            result.push('\n');
            result.push_str(prefix);
        }
        result.push_str(line);
    }
    result
}

/// Entities that are already escaped and must survive `escape_javadoc` as-is
const JAVADOC_ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;", "&#39;"];

/// Escape text for use inside a Javadoc comment
///
/// Usage: * {{ description | escapejavadoc }}
pub fn escape_javadoc(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(c) = rest.chars().next() {
        match c {
            '&' => match JAVADOC_ENTITIES.iter().find(|e| rest.starts_with(**e)) {
                Some(entity) => {
                    result.push_str(entity);
                    rest = &rest[entity.len()..];
                    continue;
                }
                None => result.push_str("&amp;"),
            },
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '/' if rest.starts_with("/*") => {
                result.push_str("/&#42;");
                rest = &rest[2..];
                continue;
            }
            '*' if rest.starts_with("*/") => {
                result.push_str("&#42;/");
                rest = &rest[2..];
                continue;
            }
            other => result.push(other),
        }
        rest = &rest[c.len_utf8()..];
    }

    result
}

/// Uppercase the first character only
pub fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character only
pub fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a dotted package name into a relative directory path
///
/// Always uses `/`, so generated layouts do not depend on the host platform.
///
/// Usage: {{ packageName | tofilepath }}
pub fn to_file_path(value: &str) -> String {
    value.replace('.', "/")
}

fn none() -> Value {
    Value::from(())
}

/// `padright(width, pad=" ")`
#[derive(Debug, Clone, Copy, Default)]
pub struct PadRight;

impl Filter for PadRight {
    fn argument_names(&self) -> &'static [&'static str] {
        &["width", "pad"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error> {
        if is_null(&input) {
            return Ok(none());
        }

        let width = args
            .get("width")
            .filter(|v| !is_null(v))
            .ok_or_else(|| Error::new(ErrorKind::MissingArgument, "padright requires a width"))?;
        let width = width
            .as_i64()
            .or_else(|| width.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("padright width must be an integer, got `{}`", width),
                )
            })?;
        let width = usize::try_from(width).unwrap_or(0);
        if width > MAX_PAD_WIDTH {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("padright width {} exceeds the maximum of {}", width, MAX_PAD_WIDTH),
            ));
        }

        let pad = args
            .string("pad")
            .and_then(|s| s.chars().next())
            .unwrap_or(' ');

        Ok(Value::from(pad_right(&string_form(&input), width, pad)))
    }
}

/// `wrapin(prefix, suffix=prefix)`
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapIn;

impl Filter for WrapIn {
    fn argument_names(&self) -> &'static [&'static str] {
        &["prefix", "suffix"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error> {
        if is_null(&input) {
            return Ok(none());
        }

        let prefix = args.string("prefix").unwrap_or_default();
        let suffix = args.string("suffix").unwrap_or_else(|| prefix.clone());
        Ok(Value::from(wrap_in(&string_form(&input), &prefix, &suffix)))
    }
}

/// `lineprefix(prefix)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePrefix;

impl Filter for LinePrefix {
    fn argument_names(&self) -> &'static [&'static str] {
        &["prefix"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error> {
        if is_null(&input) {
            return Ok(none());
        }

        let prefix = args.string("prefix").unwrap_or_default();
        Ok(Value::from(line_prefix(&string_form(&input), &prefix)))
    }
}

/// `commentmultiline(prefix)`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentMultiLine;

impl Filter for CommentMultiLine {
    fn argument_names(&self) -> &'static [&'static str] {
        &["prefix"]
    }

    fn apply(&self, input: Value, args: &Arguments) -> Result<Value, Error> {
        if is_null(&input) {
            return Ok(none());
        }

        let prefix = args.string("prefix").unwrap_or_default();
        Ok(Value::from(comment_multi_line(&string_form(&input), &prefix)))
    }
}

/// Argument-less string transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    CommentSingleLine,
    EscapeJavadoc,
    UpperFirst,
    LowerFirst,
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    FilePath,
}

impl TextTransform {
    pub fn transform(self, value: &str) -> String {
        match self {
            Self::CommentSingleLine => comment_single_line(value),
            Self::EscapeJavadoc => escape_javadoc(value),
            Self::UpperFirst => upper_first(value),
            Self::LowerFirst => lower_first(value),
            Self::PascalCase => value.to_upper_camel_case(),
            Self::CamelCase => value.to_lower_camel_case(),
            Self::SnakeCase => value.to_snake_case(),
            Self::KebabCase => value.to_kebab_case(),
            Self::FilePath => to_file_path(value),
        }
    }
}

impl Filter for TextTransform {
    fn apply(&self, input: Value, _args: &Arguments) -> Result<Value, Error> {
        if is_null(&input) {
            return Ok(none());
        }
        Ok(Value::from(self.transform(&string_form(&input))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&'static str, Value)]) -> Arguments {
        Arguments::from_pairs(pairs.iter().cloned())
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("ab", 5, ' '), "ab   ");
        assert_eq!(pad_right("ab", 5, '.'), "ab...");
        assert_eq!(pad_right("abcdef", 3, ' '), "abcdef");
        assert_eq!(pad_right("abc", 3, ' '), "abc");
        assert_eq!(pad_right("", 0, ' '), "");
    }

    #[test]
    fn test_pad_right_length_property() {
        for s in ["", "a", "hello", "größe", "日本"] {
            for w in 0..12 {
                let padded = pad_right(s, w, '-');
                assert!(padded.starts_with(s));
                if w >= s.chars().count() {
                    assert_eq!(padded.chars().count(), w);
                } else {
                    assert_eq!(padded, s);
                }
            }
        }
    }

    #[test]
    fn test_pad_right_filter() {
        let filter = PadRight;
        let result = filter
            .apply(Value::from("id"), &args(&[("width", Value::from(4))]))
            .unwrap();
        assert_eq!(result.as_str(), Some("id  "));

        let result = filter
            .apply(
                Value::from("id"),
                &args(&[("width", Value::from("4")), ("pad", Value::from("*"))]),
            )
            .unwrap();
        assert_eq!(result.as_str(), Some("id**"));

        let result = filter
            .apply(Value::from("id"), &args(&[("width", Value::from(-3))]))
            .unwrap();
        assert_eq!(result.as_str(), Some("id"));
    }

    #[test]
    fn test_pad_right_filter_null_and_errors() {
        let filter = PadRight;
        assert!(
            filter
                .apply(Value::from(()), &args(&[("width", Value::from(4))]))
                .unwrap()
                .is_none()
        );

        let err = filter.apply(Value::from("x"), &args(&[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArgument);

        let err = filter
            .apply(Value::from("x"), &args(&[("width", Value::from("wide"))]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_pad_right_filter_rejects_huge_width() {
        let filter = PadRight;
        let err = filter
            .apply(
                Value::from("a"),
                &args(&[("width", Value::from(5_000_000_000_000_000_000_i64))]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let at_limit = filter
            .apply(Value::from("a"), &args(&[("width", Value::from(MAX_PAD_WIDTH as i64))]))
            .unwrap();
        assert_eq!(at_limit.as_str().unwrap().len(), MAX_PAD_WIDTH);
    }

    #[test]
    fn test_wrap_in() {
        assert_eq!(wrap_in("X", "[", "]"), "[X]");

        let filter = WrapIn;
        let result = filter
            .apply(Value::from("X"), &args(&[("prefix", Value::from("|"))]))
            .unwrap();
        assert_eq!(result.as_str(), Some("|X|"));

        let result = filter
            .apply(
                Value::from("X"),
                &args(&[("prefix", Value::from("[")), ("suffix", Value::from("]"))]),
            )
            .unwrap();
        assert_eq!(result.as_str(), Some("[X]"));

        let result = filter
            .apply(
                Value::from(()),
                &args(&[("prefix", Value::from("[")), ("suffix", Value::from("]"))]),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_line_prefix() {
        assert_eq!(line_prefix("a\nb", ">"), ">a\r\n>b\r\n");
        assert_eq!(line_prefix("a\n", ">"), ">a\r\n>\r\n");
        assert_eq!(line_prefix("", "> "), "> \r\n");
        assert_eq!(line_prefix("single", " * "), " * single\r\n");
    }

    #[test]
    fn test_line_prefix_filter_null() {
        let filter = LinePrefix;
        let result = filter
            .apply(Value::UNDEFINED, &args(&[("prefix", Value::from(">"))]))
            .unwrap();
        assert!(result.is_none());

        let result = filter.apply(Value::from("a"), &args(&[])).unwrap();
        assert_eq!(result.as_str(), Some("a\r\n"));
    }

    #[test]
    fn test_comment_single_line() {
        assert_eq!(comment_single_line("  first\r\nsecond\nthird  "), "first second third");
        assert_eq!(comment_single_line("a\u{2028}b\u{2029}c"), "a b c");
        assert_eq!(comment_single_line(""), "");
    }

    #[test]
    fn test_comment_multi_line() {
        assert_eq!(comment_multi_line("a\nb\nc", "// "), "a\n// b\n// c");
        assert_eq!(comment_multi_line("only", "// "), "only");
    }

    #[test]
    fn test_escape_javadoc() {
        assert_eq!(escape_javadoc("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_javadoc("keep &amp; and &lt;"), "keep &amp; and &lt;");
        assert_eq!(escape_javadoc("/* nested */"), "/&#42; nested &#42;/");
        assert_eq!(escape_javadoc("plain äöü"), "plain äöü");
    }

    #[test]
    fn test_case_transforms() {
        assert_eq!(TextTransform::PascalCase.transform("user_id"), "UserId");
        assert_eq!(TextTransform::CamelCase.transform("user-id"), "userId");
        assert_eq!(TextTransform::SnakeCase.transform("UserId"), "user_id");
        assert_eq!(TextTransform::KebabCase.transform("UserId"), "user-id");
        assert_eq!(upper_first("pet"), "Pet");
        assert_eq!(lower_first("PetStore"), "petStore");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_to_file_path() {
        assert_eq!(to_file_path("io.github.example"), "io/github/example");
    }

    #[test]
    fn test_text_transform_null() {
        let result = TextTransform::SnakeCase
            .apply(Value::from(()), &args(&[]))
            .unwrap();
        assert!(result.is_none());
    }
}
