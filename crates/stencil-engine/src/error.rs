//! Engine error types with source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use stencil_core::CoreError;
use thiserror::Error;

use crate::extension::ExtensionNames;
use crate::suggestions::{SuggestionCategory, extract_unknown_name, suggest_unknown};

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// Neither the static source nor the content provider knows the template
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EngineError {
    /// True for resolution failures
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }

    /// The template-level error kind, if this is a template error
    pub fn template_kind(&self) -> Option<TemplateErrorKind> {
        match self {
            Self::Template(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Convert into an I/O error for callers that speak `std::io`
    ///
    /// Resolution failures map to `NotFound`, everything else to `Other`.
    pub fn into_io(self) -> std::io::Error {
        match self {
            Self::Io(e) => e,
            missing @ Self::TemplateNotFound { .. } => {
                std::io::Error::new(std::io::ErrorKind::NotFound, missing)
            }
            other => std::io::Error::other(other),
        }
    }
}

impl From<EngineError> for std::io::Error {
    fn from(err: EngineError) -> Self {
        err.into_io()
    }
}

/// Error kind for categorizing template errors
///
/// Note: This enum is non-exhaustive - new variants may be added in future versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    UnknownTest,
    SyntaxError,
    TypeError,
    InvalidArguments,
    InvalidOperation,
    /// A template source or the content provider failed while loading
    Provider,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownFunction => "unknown_function",
            Self::UnknownTest => "unknown_test",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidArguments => "invalid_arguments",
            Self::InvalidOperation => "invalid_operation",
            Self::Provider => "provider",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(stencil::template::render))]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Name of the template the error occurred in
    pub template: String,

    /// Line number (1-based), when known
    pub line: Option<usize>,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    ///
    /// `template_source` is the text of the template the error points into
    /// (empty if unavailable); `names` feeds "did you mean" suggestions.
    pub fn from_minijinja(
        err: &minijinja::Error,
        template_name: &str,
        template_source: &str,
        names: &ExtensionNames,
    ) -> Self {
        let kind = categorize_minijinja_error(err);
        let line = err.line();
        let span = line.and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(err, kind, template_source, names);

        let message = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };

        Self {
            message,
            kind,
            template: template_name.to_string(),
            line,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> TemplateErrorKind {
    use minijinja::ErrorKind;

    if caused_by_source(err) {
        return TemplateErrorKind::Provider;
    }

    match err.kind() {
        ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        ErrorKind::UnknownTest => TemplateErrorKind::UnknownTest,
        ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        ErrorKind::TooManyArguments | ErrorKind::MissingArgument => {
            TemplateErrorKind::InvalidArguments
        }
        ErrorKind::NonPrimitive | ErrorKind::NonKey => TemplateErrorKind::TypeError,
        ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        _ => TemplateErrorKind::Other,
    }
}

/// Whether a template source or content provider failure is in the cause chain
fn caused_by_source(err: &minijinja::Error) -> bool {
    let mut current = std::error::Error::source(err);
    while let Some(cause) = current {
        if cause.downcast_ref::<CoreError>().is_some() {
            return true;
        }
        current = cause.source();
    }
    false
}

/// Whether resolution failed, and the missing name if the error carries one
///
/// `None` means the error is not a resolution failure. Otherwise the innermost
/// `TemplateNotFound` in the cause chain wins, so a missing partial is named
/// rather than the template that included it. MiniJinja's own include errors
/// quote the name inside a sentence; the quoted part is taken.
pub fn unresolved_template(err: &minijinja::Error) -> Option<Option<String>> {
    let mut innermost = None;
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(inner) = cause.downcast_ref::<minijinja::Error>()
            && inner.kind() == minijinja::ErrorKind::TemplateNotFound
        {
            innermost = Some(inner.detail().and_then(missing_name));
        }
        current = cause.source();
    }
    innermost
}

fn missing_name(detail: &str) -> Option<String> {
    let name = match (detail.find('"'), detail.rfind('"')) {
        (Some(start), Some(end)) if end > start => &detail[start + 1..end],
        _ => detail,
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.split('\n').enumerate() {
        if idx + 1 == line_num {
            let len = line.strip_suffix('\r').unwrap_or(line).len();
            return Some(SourceSpan::new(offset.into(), len));
        }
        offset += line.len() + 1;
    }

    None
}

/// Generate suggestions based on error kind
fn generate_suggestion(
    err: &minijinja::Error,
    kind: TemplateErrorKind,
    template_source: &str,
    names: &ExtensionNames,
) -> Option<String> {
    let unknown = || {
        err.detail()
            .and_then(extract_unknown_name)
            .or_else(|| name_at_error(err, template_source))
    };

    match kind {
        TemplateErrorKind::UnknownFilter => {
            unknown().and_then(|name| suggest_unknown(&name, SuggestionCategory::Filter, names))
        }
        TemplateErrorKind::UnknownFunction => {
            unknown().and_then(|name| suggest_unknown(&name, SuggestionCategory::Function, names))
        }
        TemplateErrorKind::UnknownTest => {
            unknown().and_then(|name| suggest_unknown(&name, SuggestionCategory::Test, names))
        }
        TemplateErrorKind::UndefinedVariable => Some(
            "Check the bundle for the key, or guard it with `is defined` / `| default(...)`."
                .to_string(),
        ),
        TemplateErrorKind::SyntaxError => Some(
            "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements, `{# #}` for comments"
                .to_string(),
        ),
        TemplateErrorKind::Provider => {
            Some("The executor could not supply this template; check the generator's template set.".to_string())
        }
        _ => None,
    }
}

/// The identifier the error's source range starts with
///
/// MiniJinja reports unknown filters without naming them; the range points at
/// the name in the template text.
fn name_at_error(err: &minijinja::Error, template_source: &str) -> Option<String> {
    let text = template_source.get(err.range()?)?;
    let name: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
