//! Composite document compilation using mdxjs-rs.
//!
//! A composite document is resolved against the layout registry first (front
//! matter export plus optional layout wrapper), then compiled by mdxjs-rs into
//! an ES module whose default export is the page component.

use crate::code_fence::find_unclosed_fence;
use crate::diagnostic::{CompilerMessage, MessagePoint, map_message, point_at};
use crate::error::{Diagnostic, Diagnostics, ResolveError};
use crate::frontmatter::FrontMatter;
use crate::layout::{LayoutRegistry, ResolvedDocument, resolve_document};
use mdxjs::{JsxRuntime, MdxParseOptions, Options, compile};
use std::path::Path;

/// Extension of composite documents.
pub const COMPOSITE_EXTENSION: &str = "mdx";

/// Whether `path` names a composite document.
pub fn is_composite_document(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(COMPOSITE_EXTENSION))
}

/// Configuration options for document compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The JSX import source for the automatic runtime (e.g., "react").
    pub jsx_import_source: Option<String>,
    /// Whether to output JSX instead of function calls.
    pub jsx: bool,
    /// Whether to use the development JSX runtime.
    pub development: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            jsx_import_source: Some("react".to_string()),
            jsx: false,
            development: false,
        }
    }
}

/// Output of compiling one composite document.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    /// Compiled module text; `None` when a fatal diagnostic was raised.
    pub code: Option<String>,
    /// Front matter declared by the document.
    pub front_matter: FrontMatter,
    /// Errors and warnings raised while compiling.
    pub diagnostics: Diagnostics,
}

impl CompiledDocument {
    /// Whether a usable module was produced.
    pub fn is_ok(&self) -> bool {
        self.code.is_some() && !self.diagnostics.has_errors()
    }
}

/// Compiles a composite document to an ES module.
///
/// Front matter and compiler failures are returned as diagnostics on the
/// [`CompiledDocument`], positioned in the document as written. Layout
/// failures are configuration errors and are returned as `Err` so the caller
/// can abort the build.
///
/// Fenced code is emitted as `<pre><code className="language-*">`; pages
/// highlight it through the `pre`/`code` entries of their components mapping.
pub fn compile_document(
    source: &str,
    path: &Path,
    layouts: &LayoutRegistry,
    options: &CompileOptions,
) -> Result<CompiledDocument, ResolveError> {
    let file = path.to_string_lossy();
    let mut diagnostics = Diagnostics::new();

    let resolved = match resolve_document(source, path, layouts) {
        Ok(resolved) => resolved,
        Err(ResolveError::Frontmatter(err)) => {
            let message = CompilerMessage::fatal(err.to_string())
                .at(point_at(source, err.offset()), None);
            diagnostics.push(map_message(&message, source, &file));
            return Ok(CompiledDocument {
                code: None,
                front_matter: FrontMatter::new(),
                diagnostics,
            });
        }
        Err(err) => return Err(err),
    };

    if let Some(fence) = find_unclosed_fence(&source[resolved.body_start..]) {
        let message = CompilerMessage::warning(format!(
            "Unclosed code fence ({}): the rest of the document is treated as code",
            fence.marker
        ))
        .at(point_at(source, resolved.body_start + fence.offset), None);
        diagnostics.push(map_message(&message, source, &file));
    }

    let mdx_options = Options {
        filepath: Some(file.to_string()),
        development: options.development,
        jsx_runtime: Some(JsxRuntime::Automatic),
        jsx_import_source: options.jsx_import_source.clone(),
        jsx: options.jsx,
        parse: MdxParseOptions::gfm(),
        ..Default::default()
    };

    let code = match compile(&resolved.source, &mdx_options) {
        Ok(code) => Some(code),
        Err(message) => {
            let message = CompilerMessage::from_markdown(&message);
            diagnostics.push(map_compiler_message(&message, source, &resolved, &file));
            None
        }
    };

    log::debug!(
        "compiled {} ({} errors, {} warnings)",
        file,
        diagnostics.errors.len(),
        diagnostics.warnings.len()
    );

    Ok(CompiledDocument {
        code,
        front_matter: resolved.front_matter,
        diagnostics,
    })
}

/// Maps a message raised against the composed source onto the raw document.
///
/// Messages pointing into the generated prefix stay on the composed source.
fn map_compiler_message(
    message: &CompilerMessage,
    raw: &str,
    resolved: &ResolvedDocument,
    file: &str,
) -> Diagnostic {
    let to_raw = |point: MessagePoint| {
        resolved
            .raw_offset(point.offset)
            .map(|offset| point_at(raw, offset))
    };

    match message.start.and_then(to_raw) {
        Some(start) => {
            let end = message.end.and_then(to_raw);
            map_message(&message.clone().at(start, end), raw, file)
        }
        None => map_message(message, &resolved.source, file),
    }
}
