//! Page descriptors: where each page's entries, artifacts, and HTML live.

use crate::config::BuildOptions;
use crate::error::BuildError;
use folio_core::codegen::js_path_literal;
use folio_core::is_composite_document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CLIENT_SUFFIX: &str = "-client";

/// One discovered page and the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Absolute path of the page document.
    pub source_path: PathBuf,
    /// Generated server-render entry.
    pub server_entry_path: PathBuf,
    /// Generated client-hydration entry.
    pub client_entry_path: PathBuf,
    /// Where the rendered HTML is written.
    pub output_html_path: PathBuf,
    /// Page path relative to the input root, without extension.
    pub relative_stem: PathBuf,
}

impl PageDescriptor {
    /// Derive the paths for `source` under already absolute `options`.
    pub fn new(source: &Path, options: &BuildOptions) -> Result<Self, BuildError> {
        let relative = source
            .strip_prefix(&options.dir)
            .map_err(|_| BuildError::OutsideRoot {
                page: source.to_path_buf(),
                root: options.dir.clone(),
            })?;
        let relative_stem = relative.with_extension("");
        let entries = options.entries_dir();

        Ok(Self {
            source_path: source.to_path_buf(),
            server_entry_path: entries.join(with_suffix(&relative_stem, "", "jsx")),
            client_entry_path: entries.join(with_suffix(&relative_stem, CLIENT_SUFFIX, "jsx")),
            output_html_path: options.out_dir.join(with_suffix(&relative_stem, "", "html")),
            relative_stem,
        })
    }

    /// Whether the page is a composite document rather than a component page.
    pub fn is_composite(&self) -> bool {
        is_composite_document(&self.source_path)
    }

    /// File name of the page without extension.
    pub fn stem(&self) -> String {
        self.relative_stem
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// JS string literal importing the page module. A trailing `index`
    /// segment is dropped so the page is imported as its directory.
    pub fn import_specifier(&self) -> String {
        let is_index = self
            .source_path
            .file_stem()
            .is_some_and(|stem| stem == "index");
        match self.source_path.parent() {
            Some(parent) if is_index => js_path_literal(parent),
            _ => js_path_literal(&self.source_path),
        }
    }

    /// Client bundle URL, relative to the page's HTML file.
    pub fn client_script(&self) -> String {
        format!("./{}{CLIENT_SUFFIX}.js", self.stem())
    }

    /// Bundler output for the server entry.
    pub fn server_artifact(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(with_suffix(&self.relative_stem, "", "js"))
    }

    /// Bundler output for the client entry.
    pub fn client_artifact(&self, bundle_dir: &Path) -> PathBuf {
        bundle_dir.join(with_suffix(&self.relative_stem, CLIENT_SUFFIX, "js"))
    }
}

fn with_suffix(stem: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Describe every page, rejecting pages that would overwrite each other.
pub fn describe_pages(
    sources: &[PathBuf],
    options: &BuildOptions,
) -> Result<Vec<PageDescriptor>, BuildError> {
    let mut seen: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut pages = Vec::with_capacity(sources.len());

    for source in sources {
        let page = PageDescriptor::new(source, options)?;
        if let Some(first) = seen.insert(page.output_html_path.clone(), source.clone()) {
            return Err(BuildError::DuplicateOutput {
                first,
                second: source.clone(),
                output: page.output_html_path,
            });
        }
        pages.push(page);
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> BuildOptions {
        BuildOptions {
            cache_dir: Some(PathBuf::from("/site/.cache")),
            ..BuildOptions::new("/site", "/site/out")
        }
    }

    #[test]
    fn mirrors_relative_paths() {
        let page = PageDescriptor::new(Path::new("/site/guide/intro.mdx"), &options()).unwrap();

        assert_eq!(page.relative_stem, PathBuf::from("guide/intro"));
        assert_eq!(
            page.server_entry_path,
            PathBuf::from("/site/.cache/entries/guide/intro.jsx")
        );
        assert_eq!(
            page.client_entry_path,
            PathBuf::from("/site/.cache/entries/guide/intro-client.jsx")
        );
        assert_eq!(
            page.output_html_path,
            PathBuf::from("/site/out/guide/intro.html")
        );
        assert_eq!(page.client_script(), "./intro-client.js");
        assert_eq!(
            page.client_artifact(Path::new("/b")),
            PathBuf::from("/b/guide/intro-client.js")
        );
        assert_eq!(
            page.server_artifact(Path::new("/b")),
            PathBuf::from("/b/guide/intro.js")
        );
        assert!(page.is_composite());
    }

    #[test]
    fn index_pages_import_their_directory() {
        let page = PageDescriptor::new(Path::new("/site/guide/index.tsx"), &options()).unwrap();
        assert_eq!(page.import_specifier(), "\"/site/guide\"");
        assert!(!page.is_composite());

        let page = PageDescriptor::new(Path::new("/site/indexes.mdx"), &options()).unwrap();
        assert_eq!(page.import_specifier(), "\"/site/indexes.mdx\"");
    }

    #[test]
    fn keeps_dots_in_page_names() {
        let page = PageDescriptor::new(Path::new("/site/v1.2.mdx"), &options()).unwrap();
        assert_eq!(page.output_html_path, PathBuf::from("/site/out/v1.2.html"));
        assert_eq!(
            page.server_entry_path,
            PathBuf::from("/site/.cache/entries/v1.2.jsx")
        );
    }

    #[test]
    fn rejects_pages_outside_the_root() {
        let err = PageDescriptor::new(Path::new("/elsewhere/a.mdx"), &options()).unwrap_err();
        assert!(matches!(err, BuildError::OutsideRoot { .. }));
    }

    #[test]
    fn duplicate_outputs_are_fatal() {
        let sources = vec![
            PathBuf::from("/site/a.mdx"),
            PathBuf::from("/site/b.mdx"),
            PathBuf::from("/site/a.tsx"),
        ];
        let err = describe_pages(&sources, &options()).unwrap_err();
        match err {
            BuildError::DuplicateOutput { first, second, output } => {
                assert_eq!(first, PathBuf::from("/site/a.mdx"));
                assert_eq!(second, PathBuf::from("/site/a.tsx"));
                assert_eq!(output, PathBuf::from("/site/out/a.html"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
