#![deny(missing_docs)]
//! Folio core: composite document compilation, front matter, layouts, and diagnostics.

/// Code fence detection utilities.
pub mod code_fence;
/// JavaScript source generation helpers.
pub mod codegen;
/// Composite document compilation using mdxjs-rs.
pub mod compiler;
/// Compiler message to diagnostic mapping.
pub mod diagnostic;
/// Core error and diagnostic types.
pub mod error;
/// YAML front matter extraction helpers.
pub mod frontmatter;
/// Layout registry and document resolution.
pub mod layout;

pub use code_fence::{FencePhase, FenceState, UnclosedFence, advance_fence_state, find_unclosed_fence};
pub use compiler::{
    COMPOSITE_EXTENSION, CompileOptions, CompiledDocument, compile_document, is_composite_document,
};
pub use diagnostic::{CompilerMessage, MessagePoint, map_message, point_at};
pub use error::{Diagnostic, DiagnosticLocation, Diagnostics, ResolveError, Severity};
pub use frontmatter::{FrontMatter, FrontmatterError, FrontmatterExtraction, extract_frontmatter};
pub use layout::{LAYOUT_KEY, Layout, LayoutRegistry, ResolvedDocument, resolve_document};
