//! Stencil Core - Core types for the code-generation template core
//!
//! This crate provides the foundational types used throughout Stencil:
//! - `Bundle`: The read-only data a template is rendered against
//! - `TemplateSource`: Static, packaged template sets (embedded, directory, in-memory)
//! - `ContentProvider`: Templates supplied by the active code-generation executor

pub mod bundle;
pub mod error;
pub mod source;

pub use bundle::Bundle;
pub use error::{CoreError, Result};
pub use source::{
    ContentProvider, DirectoryTemplates, EmbeddedTemplates, InMemoryTemplates, NoTemplates,
    TemplateSource,
};
