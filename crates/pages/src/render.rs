//! Static rendering and artifact placement.

use crate::bundler::{BundleOutput, CHUNK_DIR};
use crate::error::{BuildError, RenderError};
use crate::page::PageDescriptor;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const DOCTYPE: &str = "<!DOCTYPE html>\n";
const MODULE_MARKER: &str = "package.json";
const MODULE_MARKER_SOURCE: &str = "{ \"type\": \"module\" }\n";

/// Turns a bundled server artifact into page HTML.
pub trait PageRenderer: Send + Sync {
    /// Render `page` from its server artifact, returning the document body.
    fn render(&self, page: &PageDescriptor, server_artifact: &Path) -> Result<String, RenderError>;
}

/// Runs each server artifact with node in its own process and captures stdout.
#[derive(Debug, Clone)]
pub struct NodeRenderer {
    node: PathBuf,
}

impl NodeRenderer {
    /// Use `node` to run server artifacts.
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self { node: node.into() }
    }
}

impl PageRenderer for NodeRenderer {
    fn render(&self, page: &PageDescriptor, server_artifact: &Path) -> Result<String, RenderError> {
        let mut command = Command::new(&self.node);
        command
            .arg(server_artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = server_artifact.parent() {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| RenderError::Spawn {
            page: page.source_path.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                page: page.source_path.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| RenderError::InvalidOutput {
            page: page.source_path.clone(),
        })
    }
}

/// Render every page on a pool of `concurrency` threads.
///
/// Returns the HTML of every page in page order, or the first failure after
/// logging all of them. Nothing is written to disk.
pub fn render_pages(
    pages: &[PageDescriptor],
    bundle_dir: &Path,
    renderer: &dyn PageRenderer,
    concurrency: usize,
) -> Result<Vec<String>, BuildError> {
    let render = |page: &PageDescriptor| renderer.render(page, &page.server_artifact(bundle_dir));

    let results: Vec<Result<String, RenderError>> = match rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| pages.par_iter().map(render).collect()),
        Err(err) => {
            log::warn!("falling back to the global thread pool: {err}");
            pages.par_iter().map(render).collect()
        }
    };

    let mut rendered = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(html) => rendered.push(html),
            Err(err) => {
                log::error!("{err}");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(rendered),
    }
}

/// Write rendered HTML to each page's output path.
pub fn write_html(pages: &[PageDescriptor], rendered: &[String]) -> Result<(), BuildError> {
    for (page, html) in pages.iter().zip(rendered) {
        let path = &page.output_html_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::io(parent, source))?;
        }
        fs::write(path, format!("{DOCTYPE}{html}")).map_err(|source| BuildError::io(path, source))?;
    }
    Ok(())
}

/// Copy client bundles and shared chunks from the bundle root into
/// `out_dir`, keeping their paths relative to the bundle root.
///
/// Returns the copied destinations.
pub fn place_artifacts(
    pages: &[PageDescriptor],
    output: &BundleOutput,
    bundle_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, BuildError> {
    let client_entries: HashSet<&Path> = pages
        .iter()
        .map(|page| page.client_entry_path.as_path())
        .collect();
    let client_artifacts: HashSet<PathBuf> = pages
        .iter()
        .map(|page| page.client_artifact(bundle_dir))
        .collect();
    let chunk_dir = bundle_dir.join(CHUNK_DIR);

    let mut placed = Vec::new();
    for artifact in &output.artifacts {
        let is_client = artifact
            .entry_point
            .as_deref()
            .is_some_and(|entry| client_entries.contains(entry))
            || client_artifacts.contains(&artifact.path);
        let is_chunk = artifact.entry_point.is_none() && artifact.path.starts_with(&chunk_dir);
        if !is_client && !is_chunk {
            continue;
        }

        let Ok(relative) = artifact.path.strip_prefix(bundle_dir) else {
            log::warn!(
                "skipping {}: outside the bundle directory",
                artifact.path.display()
            );
            continue;
        };
        let destination = out_dir.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::io(parent, source))?;
        }
        fs::copy(&artifact.path, &destination)
            .map_err(|source| BuildError::io(&artifact.path, source))?;
        placed.push(destination);
    }

    log::debug!("copied {} client artifacts", placed.len());
    Ok(placed)
}

/// Mark the bundle root as ES modules so node runs server artifacts as ESM.
/// An existing marker is left alone.
pub fn ensure_module_marker(bundle_dir: &Path) -> Result<(), BuildError> {
    let marker = bundle_dir.join(MODULE_MARKER);
    if marker.exists() {
        return Ok(());
    }
    fs::create_dir_all(bundle_dir).map_err(|source| BuildError::io(bundle_dir, source))?;
    fs::write(&marker, MODULE_MARKER_SOURCE).map_err(|source| BuildError::io(&marker, source))
}
