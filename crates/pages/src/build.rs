//! Page build coordination: discover, generate entries, bundle, render.

use crate::bundler::{BundleOutput, BundleRequest, Bundler, EsbuildBundler};
use crate::config::BuildOptions;
use crate::discovery::{discover_layouts, discover_pages};
use crate::entries::write_entries;
use crate::error::BuildError;
use crate::loader::{DocumentLoader, ModuleLoader};
use crate::page::{PageDescriptor, describe_pages};
use crate::render::{
    NodeRenderer, PageRenderer, ensure_module_marker, place_artifacts, render_pages, write_html,
};
use folio_core::{FrontMatter, LayoutRegistry};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type CompleteCallback = Box<dyn Fn(&[PageDescriptor], &[FrontMatter]) + Send + Sync>;

/// Configures and runs a page build.
pub struct PageBuilder {
    options: BuildOptions,
    bundler: Option<Box<dyn Bundler>>,
    renderer: Option<Box<dyn PageRenderer>>,
    on_complete: Vec<CompleteCallback>,
}

impl PageBuilder {
    /// A builder using esbuild and node, located from `options`.
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            bundler: None,
            renderer: None,
            on_complete: Vec::new(),
        }
    }

    /// Bundle with `bundler` instead of esbuild.
    pub fn with_bundler(mut self, bundler: impl Bundler + 'static) -> Self {
        self.bundler = Some(Box::new(bundler));
        self
    }

    /// Render with `renderer` instead of node.
    pub fn with_renderer(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Call `callback` with the pages and their front matter after every
    /// successful build and rebuild.
    pub fn on_complete(
        mut self,
        callback: impl Fn(&[PageDescriptor], &[FrontMatter]) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete.push(Box::new(callback));
        self
    }

    /// Discover pages under `options.dir` and build them.
    ///
    /// Returns `Ok(None)` when there are no pages.
    pub fn build_pages(self) -> Result<Option<PageBuild>, BuildError> {
        let options = self.options.absolute().inspect_err(log_failure)?;
        log::info!("Discovering pages in {}", options.dir.display());

        let sources = discover_pages(&options);
        if sources.is_empty() {
            log::warn!("No pages were found in {}", options.dir.display());
            return Ok(None);
        }

        self.build(sources).map(Some)
    }

    /// Build the given page documents.
    pub fn build(self, sources: Vec<PathBuf>) -> Result<PageBuild, BuildError> {
        self.start(sources).inspect_err(log_failure)
    }

    fn start(self, sources: Vec<PathBuf>) -> Result<PageBuild, BuildError> {
        let options = self.options.absolute()?;
        let sources = sources
            .into_iter()
            .map(|source| std::path::absolute(&source).map_err(|err| BuildError::io(source, err)))
            .collect::<Result<Vec<_>, _>>()?;

        let pages = describe_pages(&sources, &options)?;
        let mut layouts: LayoutRegistry = options.layouts.iter().cloned().collect();
        layouts.extend(discover_layouts(&options));
        let loader = Arc::new(DocumentLoader::new(layouts, options.compile_options()));
        loader.preflight(&pages)?;

        let bundler: Box<dyn Bundler> = match self.bundler {
            Some(bundler) => bundler,
            None => Box::new(EsbuildBundler::new(options.node_binary()?)),
        };
        let renderer: Box<dyn PageRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None => Box::new(NodeRenderer::new(options.node_binary()?)),
        };

        let mut session = Session {
            options,
            bundler,
            renderer,
            loader,
            on_complete: self.on_complete,
        };
        let front_matters = session.initial_build(&pages)?;

        Ok(PageBuild {
            pages,
            front_matters,
            session: Mutex::new(session),
            busy: AtomicBool::new(false),
        })
    }
}

/// Build and return the result for `options`; `Ok(None)` when no pages exist.
pub fn build_pages(options: BuildOptions) -> Result<Option<PageBuild>, BuildError> {
    PageBuilder::new(options).build_pages()
}

/// Remove the output directory.
pub fn clean(options: &BuildOptions) -> Result<(), BuildError> {
    let out_dir = options.absolute()?.out_dir;
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir).map_err(|source| BuildError::io(&out_dir, source))?;
        log::info!("Removed {}", out_dir.display());
    }
    Ok(())
}

fn log_failure(err: &BuildError) {
    log::error!("{err}");
    if let BuildError::Bundle(crate::bundler::BundleError::Failed { errors, .. }) = err {
        for diagnostic in errors {
            log::error!("{diagnostic}");
        }
    }
}

/// A finished build. Holds the bundler session for [`PageBuild::rebuild`].
pub struct PageBuild {
    /// Every page, in discovery order.
    pub pages: Vec<PageDescriptor>,
    /// Front matter of each page from the initial build, aligned with `pages`.
    pub front_matters: Vec<FrontMatter>,
    session: Mutex<Session>,
    busy: AtomicBool,
}

impl std::fmt::Debug for PageBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBuild")
            .field("pages", &self.pages)
            .field("front_matters", &self.front_matters)
            .finish_non_exhaustive()
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PageBuild {
    /// Re-bundle and re-render every page from the kept bundler session.
    ///
    /// Without `watch` there is no session and this logs and returns the
    /// front matter of the initial build. Fails fast with
    /// [`BuildError::RebuildInProgress`] when called concurrently.
    pub fn rebuild(&self) -> Result<Vec<FrontMatter>, BuildError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(BuildError::RebuildInProgress);
        }
        let _guard = BusyGuard(&self.busy);

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !session.options.watch {
            log::info!("Not in watch mode; nothing to rebuild");
            return Ok(self.front_matters.clone());
        }

        session.rebuild(&self.pages).inspect_err(log_failure)
    }
}

impl Drop for PageBuild {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        session.bundler.dispose();
    }
}

struct Session {
    options: BuildOptions,
    bundler: Box<dyn Bundler>,
    renderer: Box<dyn PageRenderer>,
    loader: Arc<DocumentLoader>,
    on_complete: Vec<CompleteCallback>,
}

impl Session {
    fn initial_build(&mut self, pages: &[PageDescriptor]) -> Result<Vec<FrontMatter>, BuildError> {
        log::info!("Building {} pages", pages.len());
        write_entries(pages, &self.options)?;

        let bundle_dir = self.options.bundle_dir();
        ensure_module_marker(&bundle_dir)?;

        let request = BundleRequest {
            entry_points: pages
                .iter()
                .flat_map(|page| [page.server_entry_path.clone(), page.client_entry_path.clone()])
                .collect(),
            outbase: self.options.entries_dir(),
            outdir: bundle_dir,
            working_dir: self.options.cache_dir(),
            incremental: self.options.watch,
            development: self.options.watch,
        };
        let loader: Arc<dyn ModuleLoader> = self.loader.clone();
        let output = self.bundler.build(&request, loader)?;

        self.materialize(pages, &output)
    }

    fn rebuild(&mut self, pages: &[PageDescriptor]) -> Result<Vec<FrontMatter>, BuildError> {
        log::info!("Rebuilding {} pages", pages.len());
        let output = self.bundler.rebuild()?;
        self.materialize(pages, &output)
    }

    fn materialize(
        &self,
        pages: &[PageDescriptor],
        output: &BundleOutput,
    ) -> Result<Vec<FrontMatter>, BuildError> {
        for warning in &output.warnings {
            log::warn!("{warning}");
        }

        let bundle_dir = self.options.bundle_dir();
        let rendered = render_pages(
            pages,
            &bundle_dir,
            &*self.renderer,
            self.options.render_concurrency(),
        )?;
        // HTML is published only once every client bundle it references is in place.
        place_artifacts(pages, output, &bundle_dir, &self.options.out_dir)?;
        write_html(pages, &rendered)?;

        let front_matters = self.loader.front_matters_for(pages);
        for callback in &self.on_complete {
            callback(pages, &front_matters);
        }
        log::info!(
            "Ready: {} pages written to {}",
            pages.len(),
            self.options.out_dir.display()
        );
        Ok(front_matters)
    }
}
