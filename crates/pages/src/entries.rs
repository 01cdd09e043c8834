//! Virtual entry modules.
//!
//! Every page gets a server entry that renders it to an HTML document on
//! stdout and a client entry that hydrates it in the browser. Both go
//! through small runtime helpers written once into the cache, and both pass
//! the configured components mapping to the page.

use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::page::PageDescriptor;
use folio_core::codegen::{js_path_literal, js_string_literal};
use rayon::prelude::*;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

const SERVER_RUNTIME: &str = "server.jsx";
const CLIENT_RUNTIME: &str = "client.jsx";

const SERVER_RUNTIME_SOURCE: &str = r#"import * as React from "react";
import { renderToString } from "react-dom/server";

const escapeHtml = (value) =>
  String(value)
    .replace(/&/g, "&amp;")
    .replace(/</g, "&lt;")
    .replace(/>/g, "&gt;")
    .replace(/"/g, "&quot;");

export function renderDocument(page, { rootId, clientScript, components = {} }) {
  const Page = page.default;
  const frontMatter = page.frontMatter ?? {};
  const body = renderToString(<Page components={components} />);
  const title =
    frontMatter.title == null ? "" : `<title>${escapeHtml(frontMatter.title)}</title>`;

  return [
    "<html>",
    `<head><meta charset="utf-8" />${title}</head>`,
    "<body>",
    `<div id="${escapeHtml(rootId)}">${body}</div>`,
    `<script type="module" src="${escapeHtml(clientScript)}"></script>`,
    "</body>",
    "</html>",
  ].join("\n");
}
"#;

const CLIENT_RUNTIME_SOURCE: &str = r#"import * as React from "react";
import { hydrateRoot } from "react-dom/client";

export function hydrateDocument(page, { rootId, components = {} }) {
  const Page = page.default;
  return hydrateRoot(
    document.getElementById(rootId),
    <Page components={components} />
  );
}
"#;

fn write_imports(
    code: &mut String,
    page: &PageDescriptor,
    runtime: &Path,
    helper: &str,
    options: &BuildOptions,
) {
    let _ = writeln!(code, "import * as page from {};", page.import_specifier());
    if let Some(components) = &options.components_module {
        let _ = writeln!(
            code,
            "import {{ components }} from {};",
            js_path_literal(components)
        );
    }
    let _ = writeln!(code, "import {{ {helper} }} from {};", js_path_literal(runtime));
    let _ = writeln!(code);
}

/// Source of the server-render entry for `page`.
pub fn server_entry_source(page: &PageDescriptor, options: &BuildOptions) -> String {
    let mut code = String::new();
    let runtime = options.runtime_dir().join(SERVER_RUNTIME);
    write_imports(&mut code, page, &runtime, "renderDocument", options);
    let _ = writeln!(code, "process.stdout.write(");
    let _ = writeln!(code, "  renderDocument(page, {{");
    let _ = writeln!(code, "    rootId: {},", js_string_literal(&options.root_id));
    let _ = writeln!(
        code,
        "    clientScript: {},",
        js_string_literal(&page.client_script())
    );
    if options.components_module.is_some() {
        let _ = writeln!(code, "    components,");
    }
    let _ = writeln!(code, "  }})");
    let _ = writeln!(code, ");");
    code
}

/// Source of the client-hydration entry for `page`.
pub fn client_entry_source(page: &PageDescriptor, options: &BuildOptions) -> String {
    let mut code = String::new();
    let runtime = options.runtime_dir().join(CLIENT_RUNTIME);
    write_imports(&mut code, page, &runtime, "hydrateDocument", options);
    let components = if options.components_module.is_some() {
        ", components"
    } else {
        ""
    };
    let _ = writeln!(
        code,
        "hydrateDocument(page, {{ rootId: {}{components} }});",
        js_string_literal(&options.root_id)
    );
    code
}

/// Write `contents` to `path` unless it already holds exactly that.
fn write_if_changed(path: &Path, contents: &str) -> Result<(), BuildError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::io(parent, source))?;
    }
    fs::write(path, contents).map_err(|source| BuildError::io(path, source))
}

/// Write the runtime helpers into the cache.
pub fn write_runtime(options: &BuildOptions) -> Result<(), BuildError> {
    let runtime_dir = options.runtime_dir();
    write_if_changed(&runtime_dir.join(SERVER_RUNTIME), SERVER_RUNTIME_SOURCE)?;
    write_if_changed(&runtime_dir.join(CLIENT_RUNTIME), CLIENT_RUNTIME_SOURCE)
}

/// Write the runtime helpers and both entries of every page, in parallel.
pub fn write_entries(pages: &[PageDescriptor], options: &BuildOptions) -> Result<(), BuildError> {
    write_runtime(options)?;

    pages.par_iter().try_for_each(|page| {
        write_if_changed(&page.server_entry_path, &server_entry_source(page, options))?;
        write_if_changed(&page.client_entry_path, &client_entry_source(page, options))
    })?;

    log::debug!("wrote {} entry modules", pages.len() * 2);
    Ok(())
}
