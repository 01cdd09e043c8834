//! Layout registry and front matter/layout resolution for composite documents.

use crate::codegen::compose_document;
use crate::error::ResolveError;
use crate::frontmatter::{FrontMatter, extract_frontmatter};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Front matter key naming the layout a page renders into.
pub const LAYOUT_KEY: &str = "layout";

/// A named layout module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Name referenced from front matter.
    pub name: String,
    /// Absolute path of the layout module.
    pub path: PathBuf,
}

/// Ordered collection of layouts; lookups match names exactly, first wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutRegistry {
    layouts: Vec<Layout>,
}

impl LayoutRegistry {
    /// Create a registry from layouts in priority order.
    pub fn new(layouts: Vec<Layout>) -> Self {
        Self { layouts }
    }

    /// Register a layout after the existing ones.
    pub fn push(&mut self, layout: Layout) {
        self.layouts.push(layout);
    }

    /// Find a layout by exact name.
    pub fn find(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.name == name)
    }

    /// Iterate layouts in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Layout> {
        self.layouts.iter()
    }

    /// Number of registered layouts.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether no layouts are registered.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Resolves the layout a document's front matter asks for.
    ///
    /// Returns `Ok(None)` when `layout` is absent, null, or an empty string.
    pub fn resolve(
        &self,
        front_matter: &FrontMatter,
        document: &Path,
    ) -> Result<Option<&Layout>, ResolveError> {
        let name = match front_matter.get(LAYOUT_KEY) {
            None | Some(JsonValue::Null) => return Ok(None),
            Some(JsonValue::String(name)) if name.is_empty() => return Ok(None),
            Some(JsonValue::String(name)) => name,
            Some(other) => {
                return Err(ResolveError::InvalidLayout {
                    document: document.to_path_buf(),
                    value: other.to_string(),
                });
            }
        };

        self.find(name)
            .map(Some)
            .ok_or_else(|| ResolveError::MissingLayout {
                document: document.to_path_buf(),
                layout: name.clone(),
            })
    }
}

impl FromIterator<Layout> for LayoutRegistry {
    fn from_iter<T: IntoIterator<Item = Layout>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Layout> for LayoutRegistry {
    fn extend<T: IntoIterator<Item = Layout>>(&mut self, iter: T) {
        self.layouts.extend(iter);
    }
}

/// A document split into front matter and the source handed to the compiler.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    /// Parsed front matter, in declaration order.
    pub front_matter: FrontMatter,
    /// Layout the document renders into, if any.
    pub layout: Option<Layout>,
    /// Body prefixed with the front matter export and layout wrapper.
    pub source: String,
    /// Byte offset of the body in the raw document.
    pub body_start: usize,
    /// Byte offset of the body in [`ResolvedDocument::source`].
    pub body_offset: usize,
}

impl ResolvedDocument {
    /// Maps a byte offset in `source` back onto the raw document.
    ///
    /// Offsets inside the generated prefix have no counterpart and yield `None`.
    pub fn raw_offset(&self, offset: usize) -> Option<usize> {
        offset
            .checked_sub(self.body_offset)
            .map(|within| self.body_start + within)
    }
}

/// Extracts front matter from `raw` and resolves its layout against `layouts`.
pub fn resolve_document(
    raw: &str,
    document: &Path,
    layouts: &LayoutRegistry,
) -> Result<ResolvedDocument, ResolveError> {
    let extraction = extract_frontmatter(raw)?;
    let layout = layouts.resolve(&extraction.value, document)?.cloned();
    let body = &raw[extraction.body_start..];
    let source = compose_document(&extraction.value, layout.as_ref(), body);

    Ok(ResolvedDocument {
        front_matter: extraction.value,
        layout,
        body_offset: source.len() - body.len(),
        body_start: extraction.body_start,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> LayoutRegistry {
        LayoutRegistry::new(vec![
            Layout {
                name: "docs".to_string(),
                path: PathBuf::from("/site/layouts/docs.tsx"),
            },
            Layout {
                name: "docs".to_string(),
                path: PathBuf::from("/elsewhere/docs.tsx"),
            },
        ])
    }

    #[test]
    fn round_trips_front_matter_with_layout() {
        let raw = "---\ntitle: Intro\nlayout: docs\n---\n# Intro\n";
        let resolved = resolve_document(raw, Path::new("/site/intro.mdx"), &registry()).unwrap();

        assert_eq!(
            JsonValue::Object(resolved.front_matter.clone()),
            json!({ "title": "Intro", "layout": "docs" })
        );
        assert_eq!(
            resolved.layout.map(|layout| layout.path),
            Some(PathBuf::from("/site/layouts/docs.tsx"))
        );

        let json_start = resolved.source.find('{').unwrap();
        let json_end = resolved.source.find("\n}").unwrap() + 2;
        let exported: JsonValue = serde_json::from_str(&resolved.source[json_start..json_end]).unwrap();
        assert_eq!(exported, json!({ "title": "Intro", "layout": "docs" }));
        assert!(resolved.source.contains("import UserLayout from \"/site/layouts/docs.tsx\";"));
        assert!(resolved.source.ends_with("}\n\n# Intro\n"));
    }

    #[test]
    fn raw_offsets_skip_the_generated_prefix() {
        let raw = "---\ntitle: Intro\nlayout: docs\n---\n# Intro\n";
        let resolved = resolve_document(raw, Path::new("/site/intro.mdx"), &registry()).unwrap();

        let heading = resolved.source.find("# Intro").unwrap();
        assert_eq!(resolved.raw_offset(heading), raw.find("# Intro"));
        assert_eq!(resolved.raw_offset(0), None);
    }

    #[test]
    fn missing_layout_is_a_configuration_error() {
        let raw = "---\nlayout: missing\n---\nBody";
        let err = resolve_document(raw, Path::new("/site/a.mdx"), &registry()).unwrap_err();

        assert!(err.is_configuration_error());
        assert!(matches!(
            err,
            ResolveError::MissingLayout { ref layout, .. } if layout == "missing"
        ));
    }

    #[test]
    fn lookup_is_exact() {
        let raw = "---\nlayout: Docs\n---\nBody";
        let err = resolve_document(raw, Path::new("/site/a.mdx"), &registry()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingLayout { .. }));
    }

    #[test]
    fn empty_or_null_layout_means_none() {
        for raw in ["---\nlayout: ''\n---\nBody", "---\nlayout:\n---\nBody", "Body"] {
            let resolved = resolve_document(raw, Path::new("/site/a.mdx"), &registry()).unwrap();
            assert!(resolved.layout.is_none(), "{raw:?}");
            assert!(!resolved.source.contains("UserLayout"));
            assert!(resolved.source.ends_with("Body"));
        }
    }

    #[test]
    fn non_string_layout_is_rejected() {
        let raw = "---\nlayout: 3\n---\nBody";
        let err = resolve_document(raw, Path::new("/site/a.mdx"), &registry()).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLayout { ref value, .. } if value == "3"));
    }

    #[test]
    fn malformed_front_matter_is_not_a_configuration_error() {
        let err = resolve_document("---\ntitle: [\n---\n", Path::new("/a.mdx"), &registry())
            .unwrap_err();
        assert!(!err.is_configuration_error());
    }
}
