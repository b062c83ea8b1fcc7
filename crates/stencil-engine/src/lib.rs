//! Stencil Engine - MiniJinja rendering for code generators
//!
//! This crate provides the template adapter used by code generators:
//! - Per-render environments whose loader is bound to the caller's content provider
//! - Static-first, provider-second resolution of templates and partials
//! - An extension model (filters, functions, tests, operators, globals)
//! - The built-in code-generation extension (`padright`, `wrapin`, `lineprefix`, ...)
//! - Source-annotated error messages with suggestions

pub mod codegen;
pub mod engine;
pub mod error;
pub mod extension;
pub mod filters;
pub mod functions;
pub mod loader;
pub mod operators;
pub mod suggestions;

pub use codegen::CodegenExtension;
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use extension::{
    Arguments, CANONICAL_LINE_TERMINATOR, Extension, ExtensionNames, ExtensionRegistry, Filter,
    Function, Operator, Test,
};
pub use loader::{DualSourceLoader, ResolvedFrom};
pub use stencil_core::{Bundle, ContentProvider, TemplateSource};
