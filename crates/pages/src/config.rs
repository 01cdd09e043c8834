//! Build configuration.

use crate::error::BuildError;
use folio_core::{CompileOptions, Layout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CACHE_SUBDIR: &str = "node_modules/.cache/folio";

/// Options for a page build.
///
/// Deserializable from the camelCase JSON an outer config layer produces;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Directory holding the page documents.
    pub dir: PathBuf,
    /// Directory the site is written to.
    pub out_dir: PathBuf,
    /// Scratch directory for entries and bundles.
    /// Defaults to `<dir>/node_modules/.cache/folio`.
    pub cache_dir: Option<PathBuf>,
    /// Keep the bundler session alive for incremental rebuilds.
    pub watch: bool,
    /// Explicitly registered layouts, in priority order.
    pub layouts: Vec<Layout>,
    /// Node binary used for bundling and rendering. Looked up on `PATH`
    /// when unset.
    pub node: Option<PathBuf>,
    /// Maximum number of pages rendered at once. Defaults to the available
    /// parallelism.
    pub render_concurrency: Option<usize>,
    /// Module exporting `components`, the MDX components mapping handed to
    /// every page on the server and in the browser. Relative paths resolve
    /// against `dir`.
    pub components_module: Option<PathBuf>,
    /// Id of the element pages hydrate into.
    pub root_id: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            out_dir: PathBuf::from("out"),
            cache_dir: None,
            watch: false,
            layouts: Vec::new(),
            node: None,
            render_concurrency: None,
            components_module: None,
            root_id: "root".to_string(),
        }
    }
}

impl BuildOptions {
    /// Options for the pages under `dir`, written to `out_dir`.
    pub fn new(dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// A copy with every configured directory made absolute.
    pub fn absolute(&self) -> Result<Self, BuildError> {
        let absolute = |path: &Path| {
            std::path::absolute(path).map_err(|source| BuildError::io(path, source))
        };
        let mut resolved = self.clone();
        resolved.dir = absolute(&self.dir)?;
        resolved.out_dir = absolute(&self.out_dir)?;
        resolved.cache_dir = Some(absolute(&self.cache_dir())?);
        resolved.components_module = self
            .components_module
            .as_ref()
            .map(|module| absolute(&resolved.dir.join(module)))
            .transpose()?;
        Ok(resolved)
    }

    /// Cache directory, defaulted under the input root.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.dir.join(CACHE_SUBDIR))
    }

    /// Root of the generated entry modules.
    pub fn entries_dir(&self) -> PathBuf {
        self.cache_dir().join("entries")
    }

    /// Root of the generated runtime helpers.
    pub fn runtime_dir(&self) -> PathBuf {
        self.cache_dir().join("runtime")
    }

    /// Root of the bundler output.
    pub fn bundle_dir(&self) -> PathBuf {
        self.cache_dir().join("build")
    }

    /// Directory of user layouts, excluded from page discovery.
    pub fn layouts_dir(&self) -> PathBuf {
        self.dir.join("layouts")
    }

    /// Number of pages rendered concurrently; at least one.
    pub fn render_concurrency(&self) -> usize {
        self.render_concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Options for compiling composite documents. Pages render through
    /// React, so documents compile against its JSX runtime.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            development: self.watch,
            ..CompileOptions::default()
        }
    }

    /// Locate the node binary.
    pub fn node_binary(&self) -> Result<PathBuf, BuildError> {
        let binary = self
            .node
            .clone()
            .unwrap_or_else(|| PathBuf::from("node"));
        which::which(&binary).map_err(|source| BuildError::NodeNotFound {
            binary: binary.display().to_string(),
            source,
        })
    }
}
