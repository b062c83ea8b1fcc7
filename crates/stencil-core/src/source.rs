//! Template sources
//!
//! Template text reaches the engine from two places:
//!
//! - A [`TemplateSource`]: the static, packaged template set shipped with the
//!   tool (embedded in the binary or read from an installed directory).
//! - A [`ContentProvider`]: the active code-generation executor, which knows
//!   about generator-specific partials the static set does not carry.
//!
//! Both return `Ok(None)` for names they do not know. An `Err` means the source
//! knew about the name but could not produce it.
//!
//! Sources never cache: every call reads the current content.

use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// A static, packaged template set
pub trait TemplateSource: Send + Sync {
    /// Load the source text of a template by name
    fn load(&self, name: &str) -> Result<Option<String>>;
}

/// Templates supplied by the active code-generation executor
///
/// Implemented by whatever drives a generation run. The engine calls
/// [`resolve`](ContentProvider::resolve) only for names the static source
/// could not supply.
pub trait ContentProvider: Send + Sync {
    /// Resolve a template name to source text
    fn resolve(&self, name: &str) -> Result<Option<String>>;
}

/// A source that knows no templates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateSource for NoTemplates {
    fn load(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

impl ContentProvider for NoTemplates {
    fn resolve(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Templates compiled into the binary
///
/// ```
/// use stencil_core::{EmbeddedTemplates, TemplateSource};
///
/// let templates = EmbeddedTemplates::new()
///     .with("header.peb", "// generated, do not edit\n");
/// assert!(templates.load("header.peb").unwrap().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedTemplates {
    templates: IndexMap<&'static str, &'static str>,
}

impl EmbeddedTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a static table of `(name, source)` pairs
    pub fn from_entries(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            templates: entries.iter().copied().collect(),
        }
    }

    /// Add a template (builder style)
    pub fn with(mut self, name: &'static str, source: &'static str) -> Self {
        self.templates.insert(name, source);
        self
    }

    /// Names of all embedded templates, in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for EmbeddedTemplates {
    fn load(&self, name: &str) -> Result<Option<String>> {
        Ok(self.templates.get(name).map(|s| s.to_string()))
    }
}

/// Templates read from a directory on disk
///
/// Names are resolved relative to the root. Absolute names and names that
/// climb out of the root (`..`) are treated as unknown, so they fall through
/// to the next source instead of reading arbitrary files.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    root: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, name: &str) -> Option<PathBuf> {
        let requested = Path::new(name);
        if name.is_empty() || requested.is_absolute() {
            return None;
        }

        let contained = requested
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(requested))
    }
}

impl TemplateSource for DirectoryTemplates {
    fn load(&self, name: &str) -> Result<Option<String>> {
        let Some(path) = self.resolve_path(name) else {
            return Ok(None);
        };

        if !path.is_file() {
            return Ok(None);
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::TemplateRead {
                name: name.to_string(),
                source: e,
            }),
        }
    }
}

/// Owned in-memory templates
///
/// Usable both as a static source and as a content provider, which makes it
/// the natural stand-in for an executor in tests and for callers that assemble
/// snippets programmatically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplates {
    templates: IndexMap<String, String>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template (builder style)
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Add or replace a template
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.templates.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for InMemoryTemplates {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        Self {
            templates: iter
                .into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect(),
        }
    }
}

impl TemplateSource for InMemoryTemplates {
    fn load(&self, name: &str) -> Result<Option<String>> {
        Ok(self.templates.get(name).cloned())
    }
}

impl ContentProvider for InMemoryTemplates {
    fn resolve(&self, name: &str) -> Result<Option<String>> {
        Ok(self.templates.get(name).cloned())
    }
}
