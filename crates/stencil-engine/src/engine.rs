//! Template engine based on MiniJinja

use minijinja::{AutoEscape, Environment, Output, State, UndefinedBehavior, Value};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use stencil_core::{Bundle, ContentProvider, NoTemplates, TemplateSource};

use crate::error::{EngineError, Result, TemplateError, unresolved_template};
use crate::extension::{Extension, ExtensionNames, ExtensionRegistry, bool_form, is_null};
use crate::loader::DualSourceLoader;

/// Engine settings
///
/// Loadable from YAML:
///
/// ```yaml
/// strict: true
/// trimBlocks: true
/// keepTrailingNewline: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Fail on undefined variables instead of rendering them empty
    pub strict: bool,

    /// Drop the first newline after a block tag
    pub trim_blocks: bool,

    /// Strip whitespace before a block tag on its line
    pub lstrip_blocks: bool,

    /// Keep a template's final newline in the output
    pub keep_trailing_newline: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            trim_blocks: true,
            lstrip_blocks: false,
            keep_trailing_newline: true,
        }
    }
}

impl EngineConfig {
    /// Parse settings from YAML; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }
}

/// Template engine builder
pub struct EngineBuilder {
    config: EngineConfig,
    static_source: Arc<dyn TemplateSource>,
    registry: ExtensionRegistry,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Default settings, no static templates, the code-generation extension
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            static_source: Arc::new(NoTemplates),
            registry: ExtensionRegistry::codegen(),
        }
    }

    /// Replace all settings
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Drop the first newline after a block tag
    pub fn trim_blocks(mut self, trim: bool) -> Self {
        self.config.trim_blocks = trim;
        self
    }

    /// Keep a template's final newline in the output
    pub fn keep_trailing_newline(mut self, keep: bool) -> Self {
        self.config.keep_trailing_newline = keep;
        self
    }

    /// The packaged template set consulted before the content provider
    pub fn static_source(mut self, source: impl TemplateSource + 'static) -> Self {
        self.static_source = Arc::new(source);
        self
    }

    /// Shared variant of [`static_source`](Self::static_source)
    pub fn static_source_arc(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.static_source = source;
        self
    }

    /// Register an additional extension on top of the current registry
    pub fn extension(mut self, extension: &dyn Extension) -> Self {
        self.registry.register(extension);
        self
    }

    /// Replace the registry (drops the default code-generation extension)
    pub fn registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let names = self.registry.names();
        Engine {
            config: self.config,
            static_source: self.static_source,
            registry: Arc::new(self.registry),
            names,
        }
    }
}

/// The template engine
///
/// Immutable once built and safe to share between threads. Every render gets
/// its own MiniJinja environment whose loader is bound to that render's
/// content provider, so compiled templates never outlive a call and concurrent
/// renders cannot see each other's provider.
pub struct Engine {
    config: EngineConfig,
    static_source: Arc<dyn TemplateSource>,
    registry: Arc<ExtensionRegistry>,
    names: ExtensionNames,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default settings and no static templates
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Create a configured MiniJinja environment bound to `provider`
    fn create_environment(
        &self,
        provider: Arc<dyn ContentProvider>,
    ) -> (Environment<'static>, DualSourceLoader) {
        let mut env = Environment::new();

        if self.config.strict {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Lenient);
        }
        env.set_trim_blocks(self.config.trim_blocks);
        env.set_lstrip_blocks(self.config.lstrip_blocks);
        env.set_keep_trailing_newline(self.config.keep_trailing_newline);

        // generated source is never HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_formatter(format_value);

        self.registry.install(&mut env);

        let loader = DualSourceLoader::new(Arc::clone(&self.static_source), provider);
        let env_loader = loader.clone();
        env.set_loader(move |name| env_loader.load(name));

        (env, loader)
    }

    /// Render a named template against a bundle
    ///
    /// The name is resolved static source first, `executor` second; so is
    /// every template it includes, imports or extends.
    pub fn compile_template(
        &self,
        executor: Arc<dyn ContentProvider>,
        bundle: &Bundle,
        template_name: &str,
    ) -> Result<String> {
        tracing::debug!(template = template_name, "processing template");
        self.trace_bundle(template_name, bundle);

        let (env, loader) = self.create_environment(executor);

        let tmpl = env
            .get_template(template_name)
            .map_err(|e| self.convert_error(&e, &loader, template_name, None))?;

        tmpl.render(Value::from_serialize(bundle))
            .map_err(|e| self.convert_error(&e, &loader, template_name, None))
    }

    /// Render template text that is not stored in any source
    ///
    /// `template_name` names the text in diagnostics. Templates it includes are
    /// resolved as in [`compile_template`](Self::compile_template).
    pub fn render_str(
        &self,
        executor: Arc<dyn ContentProvider>,
        bundle: &Bundle,
        source: &str,
        template_name: &str,
    ) -> Result<String> {
        tracing::debug!(template = template_name, "processing inline template");
        self.trace_bundle(template_name, bundle);

        let (mut env, loader) = self.create_environment(executor);

        env.add_template_owned(template_name.to_string(), source.to_string())
            .map_err(|e| self.convert_error(&e, &loader, template_name, Some(source)))?;

        let tmpl = env
            .get_template(template_name)
            .map_err(|e| self.convert_error(&e, &loader, template_name, Some(source)))?;

        tmpl.render(Value::from_serialize(bundle))
            .map_err(|e| self.convert_error(&e, &loader, template_name, Some(source)))
    }

    fn trace_bundle(&self, template_name: &str, bundle: &Bundle) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }

        match serde_json::to_string_pretty(bundle) {
            Ok(json) => tracing::trace!(template = template_name, bundle = %json, "bundle data"),
            Err(e) => tracing::trace!(template = template_name, error = %e, "bundle is not serializable"),
        }
    }

    fn convert_error(
        &self,
        err: &minijinja::Error,
        loader: &DualSourceLoader,
        requested: &str,
        inline_source: Option<&str>,
    ) -> EngineError {
        if let Some(reported) = unresolved_template(err) {
            let name = loader
                .last_missing()
                .or(reported)
                .unwrap_or_else(|| requested.to_string());
            return EngineError::TemplateNotFound { name };
        }

        let template_name = err.name().unwrap_or(requested);
        let source = match inline_source {
            Some(source) if template_name == requested => source.to_string(),
            _ => loader.resolved_source(template_name).unwrap_or_default(),
        };

        EngineError::Template(TemplateError::from_minijinja(
            err,
            template_name,
            &source,
            &self.names,
        ))
    }
}

/// Print values as-is; `none` and undefined print nothing, booleans lowercase
pub(crate) fn format_value(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), minijinja::Error> {
    if is_null(value) {
        return Ok(());
    }
    if let Some(literal) = bool_form(value) {
        return out
            .write_str(literal)
            .map_err(|_| minijinja::Error::from(minijinja::ErrorKind::WriteFailure));
    }
    minijinja::escape_formatter(out, state, value)
}
