//! Template functions (global functions available in templates)

use minijinja::value::ValueKind;
use minijinja::{Error, Value};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extension::{Arguments, CANONICAL_LINE_TERMINATOR, Function, is_null};

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]*)`").expect("valid regex"));

/// Explicit line break, independent of whitespace control
///
/// Usage: {{ newline() }}
#[derive(Debug, Clone, Copy, Default)]
pub struct NewLine;

impl Function for NewLine {
    fn invoke(&self, _args: &Arguments) -> Result<Value, Error> {
        Ok(Value::from(CANONICAL_LINE_TERMINATOR))
    }
}

/// Look up `key` in `map`, falling back to `default`
///
/// Usage: {{ getOrDefault(model.extensions, "x-name", model.name) }}
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOrDefault;

/// Value at `key` if `map` is a mapping holding a non-null value there
pub fn get_or_default(map: &Value, key: &Value, default: Value) -> Value {
    if is_null(map) || is_null(key) || map.kind() != ValueKind::Map {
        return default;
    }

    match map.get_item(key) {
        Ok(found) if !is_null(&found) => found,
        _ => default,
    }
}

impl Function for GetOrDefault {
    fn argument_names(&self) -> &'static [&'static str] {
        &["map", "key", "default"]
    }

    fn invoke(&self, args: &Arguments) -> Result<Value, Error> {
        let default = args
            .get("default")
            .cloned()
            .unwrap_or_else(|| Value::from(()));
        Ok(get_or_default(&args.value("map"), &args.value("key"), default))
    }
}

/// Render a Markdown-flavoured summary as inline Javadoc
///
/// Usage: /** {{ javadocInline(operation.summary) }} */
#[derive(Debug, Clone, Copy, Default)]
pub struct JavadocInline;

pub fn javadoc_inline(summary: &str) -> String {
    let escaped = summary
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("\\\"", "\"");

    let blocks = CODE_BLOCK.replace_all(&escaped, "<pre>$1</pre>");
    INLINE_CODE.replace_all(&blocks, "{@code $1}").into_owned()
}

impl Function for JavadocInline {
    fn argument_names(&self) -> &'static [&'static str] {
        &["summary"]
    }

    fn invoke(&self, args: &Arguments) -> Result<Value, Error> {
        let summary = args.string("summary").unwrap_or_default();
        Ok(Value::from(javadoc_inline(&summary)))
    }
}

/// First argument that is neither null nor an empty string
///
/// Usage: {{ firstNonEmpty(model.title, model.name, "Unnamed") }}
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstNonEmpty;

impl Function for FirstNonEmpty {
    fn variadic(&self) -> bool {
        true
    }

    fn invoke(&self, args: &Arguments) -> Result<Value, Error> {
        let found = args
            .rest()
            .iter()
            .find(|v| !is_null(v) && v.as_str().is_none_or(|s| !s.is_empty()))
            .cloned();
        Ok(found.unwrap_or_else(|| Value::from("")))
    }
}
