//! Newline-delimited JSON spoken with the esbuild driver.

use super::{Artifact, BundleRequest, CHUNK_DIR};
use folio_core::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::path::PathBuf;

/// Messages sent to the driver.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    Build {
        id: u64,
        options: JsonValue,
        incremental: bool,
    },
    Rebuild {
        id: u64,
    },
    /// Reply to [`Event::Load`].
    Loaded {
        id: u64,
        contents: Option<String>,
        errors: Vec<Diagnostic>,
        warnings: Vec<Diagnostic>,
    },
    Dispose,
}

/// Messages received from the driver.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// esbuild wants a composite document.
    Load { id: u64, path: PathBuf },
    /// A build or rebuild finished.
    Done {
        id: u64,
        #[serde(default)]
        errors: Vec<Diagnostic>,
        #[serde(default)]
        warnings: Vec<Diagnostic>,
        #[serde(default)]
        outputs: Vec<OutputFile>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub path: PathBuf,
    #[serde(default)]
    pub entry_point: Option<PathBuf>,
}

impl From<OutputFile> for Artifact {
    fn from(output: OutputFile) -> Self {
        Artifact {
            path: output.path,
            entry_point: output.entry_point,
        }
    }
}

pub fn encode(request: &Request) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    Ok(line)
}

pub fn decode(line: &str) -> serde_json::Result<Event> {
    serde_json::from_str(line)
}

/// esbuild options for `request`; the driver adds the loader plugin.
pub fn esbuild_options(request: &BundleRequest) -> JsonValue {
    let node_env = if request.development {
        "development"
    } else {
        "production"
    };
    json!({
        "entryPoints": request.entry_points,
        "outbase": request.outbase,
        "outdir": request.outdir,
        "absWorkingDir": request.working_dir,
        "bundle": true,
        "splitting": true,
        "format": "esm",
        "jsx": "automatic",
        "metafile": true,
        "write": true,
        "logLevel": "silent",
        "entryNames": "[dir]/[name]",
        "chunkNames": format!("{CHUNK_DIR}/[name]-[hash]"),
        "resolveExtensions": [".mdx", ".tsx", ".ts", ".jsx", ".js", ".json"],
        "loader": { ".js": "jsx" },
        "define": {
            "process.env.NODE_ENV": serde_json::to_string(node_env).unwrap_or_default(),
        },
    })
}
