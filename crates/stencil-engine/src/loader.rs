//! Layered template resolution
//!
//! A [`DualSourceLoader`] answers MiniJinja's template lookups (the entry
//! template as well as every `include`, `import` and `extends`) by asking the
//! static source first and the content provider second. The order is fixed:
//! packaged templates cannot be shadowed by executor content, and executor
//! content fills in whatever the packaged set lacks.
//!
//! Nothing is served from a cache. A loader lives for exactly one render and is
//! bound to exactly one provider, so there is no binding to swap between
//! renders. It does remember what it handed out and what it failed to find
//! during that render, which is what error reporting reads afterwards.

use indexmap::IndexMap;
use minijinja::{Error, ErrorKind};
use std::sync::{Arc, Mutex};
use stencil_core::{ContentProvider, TemplateSource};

/// Which source answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Static,
    Provider,
}

/// What one render resolved and missed
#[derive(Debug, Default)]
struct ResolutionLog {
    sources: IndexMap<String, String>,
    last_missing: Option<String>,
}

/// Static-first, provider-second template resolver
///
/// Clones share one resolution log.
#[derive(Clone)]
pub struct DualSourceLoader {
    static_source: Arc<dyn TemplateSource>,
    provider: Arc<dyn ContentProvider>,
    log: Arc<Mutex<ResolutionLog>>,
}

impl DualSourceLoader {
    pub fn new(static_source: Arc<dyn TemplateSource>, provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            static_source,
            provider,
            log: Arc::default(),
        }
    }

    /// Source text handed out for `name` by [`resolve`](Self::resolve)
    pub fn resolved_source(&self, name: &str) -> Option<String> {
        self.log.lock().ok()?.sources.get(name).cloned()
    }

    /// The most recent name neither source knew
    pub fn last_missing(&self) -> Option<String> {
        self.log.lock().ok()?.last_missing.clone()
    }

    /// Resolve a name to source text, reporting which source served it
    ///
    /// `Ok(None)` means neither source knows the name.
    pub fn lookup(&self, name: &str) -> Result<Option<(String, ResolvedFrom)>, Error> {
        if let Some(source) = self.static_source.load(name).map_err(|e| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("static template source failed for `{}`", name),
            )
            .with_source(e)
        })? {
            tracing::trace!(template = name, "resolved from static source");
            return Ok(Some((source, ResolvedFrom::Static)));
        }

        if let Some(source) = self.provider.resolve(name).map_err(|e| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("content provider failed for `{}`", name),
            )
            .with_source(e)
        })? {
            tracing::trace!(template = name, "resolved from content provider");
            return Ok(Some((source, ResolvedFrom::Provider)));
        }

        Ok(None)
    }

    /// Resolve a name, failing with `TemplateNotFound` when no source has it
    ///
    /// The error detail is exactly the unresolved name.
    pub fn resolve(&self, name: &str) -> Result<String, Error> {
        match self.lookup(name)? {
            Some((source, _)) => {
                if let Ok(mut log) = self.log.lock() {
                    log.sources.insert(name.to_string(), source.clone());
                }
                Ok(source)
            }
            None => {
                tracing::debug!(template = name, "template not found in any source");
                if let Ok(mut log) = self.log.lock() {
                    log.last_missing = Some(name.to_string());
                }
                Err(Error::new(ErrorKind::TemplateNotFound, name.to_string()))
            }
        }
    }

    /// Adapter for `Environment::set_loader`
    pub fn load(&self, name: &str) -> Result<Option<String>, Error> {
        self.resolve(name).map(Some)
    }
}
