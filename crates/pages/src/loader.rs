//! Loading composite documents on behalf of the bundler.

use crate::error::BuildError;
use crate::page::PageDescriptor;
use folio_core::{
    CompileOptions, CompilerMessage, Diagnostics, FrontMatter, LayoutRegistry,
    compile_document, extract_frontmatter, map_message,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A module handed back to the bundler.
#[derive(Debug, Clone, Default)]
pub struct LoadedModule {
    /// Module text; `None` when loading failed.
    pub contents: Option<String>,
    /// Errors and warnings raised while loading.
    pub diagnostics: Diagnostics,
}

/// Turns a composite document path into module text for the bundler.
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `path`.
    fn load(&self, path: &Path) -> LoadedModule;
}

/// Compiles composite documents and records their front matter by path.
#[derive(Debug)]
pub struct DocumentLoader {
    layouts: LayoutRegistry,
    options: CompileOptions,
    front_matters: Mutex<HashMap<PathBuf, FrontMatter>>,
}

impl DocumentLoader {
    /// Create a loader resolving layouts against `layouts`.
    pub fn new(layouts: LayoutRegistry, options: CompileOptions) -> Self {
        Self {
            layouts,
            options,
            front_matters: Mutex::new(HashMap::new()),
        }
    }

    /// Registered layouts.
    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    fn store(&self) -> MutexGuard<'_, HashMap<PathBuf, FrontMatter>> {
        self.front_matters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check that every composite page names a registered layout.
    ///
    /// Malformed front matter is left to compilation, which reports it as a
    /// diagnostic of the document.
    pub fn preflight(&self, pages: &[PageDescriptor]) -> Result<(), BuildError> {
        for page in pages.iter().filter(|page| page.is_composite()) {
            let source = fs::read_to_string(&page.source_path)
                .map_err(|source| BuildError::io(&page.source_path, source))?;
            let Ok(extraction) = extract_frontmatter(&source) else {
                continue;
            };
            self.layouts.resolve(&extraction.value, &page.source_path)?;
        }
        Ok(())
    }

    /// Front matter of `pages`, in page order. Pages that were never loaded
    /// (component pages) get an empty mapping.
    pub fn front_matters_for(&self, pages: &[PageDescriptor]) -> Vec<FrontMatter> {
        let store = self.store();
        pages
            .iter()
            .map(|page| store.get(&page.source_path).cloned().unwrap_or_default())
            .collect()
    }
}

impl ModuleLoader for DocumentLoader {
    fn load(&self, path: &Path) -> LoadedModule {
        let file = path.to_string_lossy();
        let mut diagnostics = Diagnostics::new();

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                let message = CompilerMessage::fatal(format!("failed to read document: {err}"));
                diagnostics.push(map_message(&message, "", &file));
                return LoadedModule {
                    contents: None,
                    diagnostics,
                };
            }
        };

        match compile_document(&source, path, &self.layouts, &self.options) {
            Ok(compiled) => {
                self.store()
                    .insert(path.to_path_buf(), compiled.front_matter);
                LoadedModule {
                    contents: compiled.code,
                    diagnostics: compiled.diagnostics,
                }
            }
            // Layouts are checked before bundling; this only happens when a
            // document changed between builds.
            Err(err) => {
                let message = CompilerMessage::fatal(err.to_string());
                diagnostics.push(map_message(&message, &source, &file));
                LoadedModule {
                    contents: None,
                    diagnostics,
                }
            }
        }
    }
}
