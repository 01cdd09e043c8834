//! Bundling of the generated entries.
//!
//! A [`Bundler`] receives every server and client entry in one request and
//! produces ES modules with shared chunks. Composite documents are loaded
//! through the [`ModuleLoader`] passed with the request.

mod esbuild;
pub(crate) mod protocol;

pub use esbuild::EsbuildBundler;

use crate::loader::ModuleLoader;
use folio_core::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Shared chunk directory inside the bundle root.
pub const CHUNK_DIR: &str = "chunks";

/// One bundler invocation over all page entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Server and client entries of every page.
    pub entry_points: Vec<PathBuf>,
    /// Common root of the entries; outputs mirror paths below it.
    pub outbase: PathBuf,
    /// Output root.
    pub outdir: PathBuf,
    /// Directory bare imports are resolved from.
    pub working_dir: PathBuf,
    /// Keep the session for [`Bundler::rebuild`].
    pub incremental: bool,
    /// Development build (`process.env.NODE_ENV`).
    pub development: bool,
}

/// A file the bundler wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path of the output.
    pub path: PathBuf,
    /// Entry the output was built from; `None` for shared chunks.
    pub entry_point: Option<PathBuf>,
}

/// Result of a successful bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleOutput {
    /// Every output file.
    pub artifacts: Vec<Artifact>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
}

/// Errors raised while bundling.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundler reported errors.
    #[error("bundling failed with {} error(s)", .errors.len())]
    Failed {
        /// Reported errors.
        errors: Vec<Diagnostic>,
        /// Warnings reported alongside.
        warnings: Vec<Diagnostic>,
    },
    /// The bundler process could not be started.
    #[error("failed to start the bundler: {0}")]
    Spawn(#[source] io::Error),
    /// Reading from or writing to the bundler failed.
    #[error("bundler I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The bundler sent something unexpected.
    #[error("bundler protocol error: {0}")]
    Protocol(String),
    /// The bundler process went away mid-build.
    #[error("the bundler exited unexpectedly")]
    Exited,
    /// `rebuild` was called without an incremental session.
    #[error("no incremental bundler session")]
    NoSession,
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Protocol(err.to_string())
    }
}

/// Builds ES module bundles from page entries.
pub trait Bundler: Send {
    /// Bundle every entry of `request`. With `request.incremental` the
    /// session is kept for [`Bundler::rebuild`].
    fn build(
        &mut self,
        request: &BundleRequest,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<BundleOutput, BundleError>;

    /// Re-run the kept session.
    fn rebuild(&mut self) -> Result<BundleOutput, BundleError>;

    /// Release the kept session, if any.
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::DiagnosticLocation;

    #[test]
    fn failure_counts_errors() {
        let err = BundleError::Failed {
            errors: vec![
                Diagnostic::error("a", DiagnosticLocation::default()),
                Diagnostic::error("b", DiagnosticLocation::default()),
            ],
            warnings: Vec::new(),
        };
        assert_eq!(err.to_string(), "bundling failed with 2 error(s)");
    }

    #[test]
    fn json_errors_are_protocol_errors() {
        let err: BundleError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, BundleError::Protocol(_)));
    }
}
