#![deny(missing_docs)]
//! Folio pages: builds a static site from MDX and component pages.
//!
//! Pages are discovered under the input root, paired with generated server and
//! client entries, bundled in one pass, rendered to HTML by running the server
//! bundles, and published alongside the client bundles that hydrate them.

/// Page build coordination.
pub mod build;
/// Bundler abstraction and the esbuild implementation.
pub mod bundler;
/// Build configuration.
pub mod config;
/// Page and layout discovery.
pub mod discovery;
/// Server and client entry generation.
pub mod entries;
/// Build errors.
pub mod error;
/// Composite document loading for the bundler.
pub mod loader;
/// Page descriptors.
pub mod page;
/// Static rendering and artifact placement.
pub mod render;

pub use build::{PageBuild, PageBuilder, build_pages, clean};
pub use bundler::{Artifact, BundleError, BundleOutput, BundleRequest, Bundler, EsbuildBundler};
pub use config::BuildOptions;
pub use discovery::{discover_layouts, discover_pages};
pub use entries::write_entries;
pub use error::{BuildError, RenderError};
pub use loader::{DocumentLoader, LoadedModule, ModuleLoader};
pub use page::{PageDescriptor, describe_pages};
pub use render::{NodeRenderer, PageRenderer, place_artifacts, render_pages};
