//! Page and layout discovery.

use crate::config::BuildOptions;
use folio_core::Layout;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of page documents.
pub const PAGE_EXTENSIONS: &[&str] = &["mdx", "jsx", "tsx"];
/// Extensions of layout modules.
pub const LAYOUT_EXTENSIONS: &[&str] = &["jsx", "tsx"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Find every page under `options.dir`, sorted by path.
///
/// The output directory, the cache directory, `node_modules`, and the
/// layouts directory are skipped, as is the components module. `options`
/// must be absolute.
pub fn discover_pages(options: &BuildOptions) -> Vec<PathBuf> {
    let excluded = [
        options.out_dir.clone(),
        options.cache_dir(),
        options.layouts_dir(),
    ];

    let mut pages: Vec<PathBuf> = WalkDir::new(&options.dir)
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            entry.file_name() != "node_modules"
                && !excluded.iter().any(|dir| entry.path() == dir)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), PAGE_EXTENSIONS))
        .filter(|e| options.components_module.as_deref() != Some(e.path()))
        .map(|e| e.into_path())
        .collect();

    pages.sort();
    log::debug!("discovered {} pages in {}", pages.len(), options.dir.display());
    pages
}

/// Register every `*.jsx`/`*.tsx` file under `<dir>/layouts` by file stem.
pub fn discover_layouts(options: &BuildOptions) -> Vec<Layout> {
    let layouts_dir = options.layouts_dir();
    if !layouts_dir.is_dir() {
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(&layouts_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), LAYOUT_EXTENSIONS))
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().into_owned();
            Some(Layout { name, path })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn options(root: &TempDir) -> BuildOptions {
        BuildOptions::new(root.path(), root.path().join("out"))
            .absolute()
            .unwrap()
    }

    #[test]
    fn finds_pages_in_sorted_order() {
        let root = TempDir::new().unwrap();
        for file in ["b.mdx", "a.tsx", "guide/intro.mdx", "guide/widget.jsx", "notes.md", "style.css"] {
            touch(root.path(), file);
        }

        let options = options(&root);
        let relative: Vec<PathBuf> = discover_pages(&options)
            .into_iter()
            .map(|path| path.strip_prefix(&options.dir).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.tsx"),
                PathBuf::from("b.mdx"),
                PathBuf::from("guide/intro.mdx"),
                PathBuf::from("guide/widget.jsx"),
            ]
        );
    }

    #[test]
    fn skips_reserved_directories() {
        let root = TempDir::new().unwrap();
        for file in [
            "page.mdx",
            "out/old.mdx",
            "layouts/docs.tsx",
            "node_modules/pkg/readme.mdx",
            "nested/node_modules/x.jsx",
        ] {
            touch(root.path(), file);
        }

        let pages = discover_pages(&options(&root));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].ends_with("page.mdx"));
    }

    #[test]
    fn skips_custom_cache_directory() {
        let root = TempDir::new().unwrap();
        touch(root.path(), "page.mdx");
        touch(root.path(), ".folio/entries/page.jsx");

        let options = BuildOptions {
            cache_dir: Some(root.path().join(".folio")),
            ..options(&root)
        };
        assert_eq!(discover_pages(&options).len(), 1);
    }

    #[test]
    fn skips_the_components_module() {
        let root = TempDir::new().unwrap();
        touch(root.path(), "page.mdx");
        touch(root.path(), "components.tsx");

        let options = BuildOptions {
            components_module: Some(PathBuf::from("components.tsx")),
            ..BuildOptions::new(root.path(), root.path().join("out"))
        }
        .absolute()
        .unwrap();
        let pages = discover_pages(&options);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].ends_with("page.mdx"));
    }

    #[test]
    fn empty_root_has_no_pages() {
        let root = TempDir::new().unwrap();
        assert!(discover_pages(&options(&root)).is_empty());
    }

    #[test]
    fn registers_layouts_by_stem() {
        let root = TempDir::new().unwrap();
        touch(root.path(), "layouts/docs.tsx");
        touch(root.path(), "layouts/blog/post.jsx");
        touch(root.path(), "layouts/readme.md");

        let layouts = discover_layouts(&options(&root));
        let names: Vec<&str> = layouts.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["post", "docs"]);
        assert!(layouts.iter().all(|l| l.path.is_absolute()));
    }

    #[test]
    fn missing_layouts_directory_is_fine() {
        let root = TempDir::new().unwrap();
        assert!(discover_layouts(&options(&root)).is_empty());
    }
}
