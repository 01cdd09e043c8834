use crate::bundler::BundleError;
use folio_core::ResolveError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running a server artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render process could not be started.
    #[error("failed to start renderer for {}: {source}", .page.display())]
    Spawn {
        /// Page being rendered.
        page: PathBuf,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
    /// The render process exited unsuccessfully.
    #[error("rendering {} failed ({status}){}", .page.display(), stderr_suffix(.stderr))]
    Failed {
        /// Page being rendered.
        page: PathBuf,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The render process wrote something that is not UTF-8.
    #[error("rendering {} produced non UTF-8 output", .page.display())]
    InvalidOutput {
        /// Page being rendered.
        page: PathBuf,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

/// Fatal errors of a page build. Every variant aborts the build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A page names an unknown layout, or its layout value is invalid.
    #[error(transparent)]
    Layout(#[from] ResolveError),
    /// Two pages map to the same HTML file.
    #[error(
        "{} and {} both render to {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    DuplicateOutput {
        /// Page discovered first.
        first: PathBuf,
        /// Page discovered second.
        second: PathBuf,
        /// The shared output path.
        output: PathBuf,
    },
    /// A page lies outside the input root.
    #[error("{} is not inside the page root {}", .page.display(), .root.display())]
    OutsideRoot {
        /// Offending page.
        page: PathBuf,
        /// Configured input root.
        root: PathBuf,
    },
    /// The node binary could not be located.
    #[error("could not find `{binary}` on PATH: {source}")]
    NodeNotFound {
        /// Binary that was searched for.
        binary: String,
        /// Lookup failure.
        #[source]
        source: which::Error,
    },
    /// Bundling failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),
    /// A page failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Filesystem failure on a specific path.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// `rebuild` was called while another rebuild was running.
    #[error("a rebuild is already in progress")]
    RebuildInProgress,
}

impl BuildError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was detected before any output was produced.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            BuildError::Layout(err) => err.is_configuration_error(),
            BuildError::DuplicateOutput { .. } | BuildError::OutsideRoot { .. } => true,
            _ => false,
        }
    }
}
