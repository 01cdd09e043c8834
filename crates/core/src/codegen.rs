//! JavaScript source generation shared by the document compiler and the
//! virtual entry generator.

use crate::frontmatter::FrontMatter;
use crate::layout::Layout;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Converts a Rust string to a JavaScript string literal.
///
/// Uses JSON serialization to properly escape special characters.
///
/// # Examples
///
/// ```
/// use folio_core::codegen::js_string_literal;
///
/// assert_eq!(js_string_literal("hello"), "\"hello\"");
/// assert_eq!(js_string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
/// ```
pub fn js_string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// A JavaScript string literal naming a filesystem path as an import specifier.
///
/// Separators are normalized to `/` so specifiers are stable across platforms.
pub fn js_path_literal(path: &Path) -> String {
    js_string_literal(&path.to_string_lossy().replace('\\', "/"))
}

/// Emits `export const frontMatter = {...}` with pretty-printed JSON.
pub fn front_matter_export(front_matter: &FrontMatter) -> String {
    let json = serde_json::to_string_pretty(front_matter).unwrap_or_else(|_| "{}".to_string());
    format!("export const frontMatter = {json}")
}

/// Emits the wrapper that routes a page through its layout.
///
/// In a composite document, a default export is the layout the content is
/// rendered into; the wrapper forwards the page's props and front matter.
pub fn layout_wrapper(layout: &Layout) -> String {
    let mut code = String::new();
    let _ = writeln!(
        code,
        "import UserLayout from {};",
        js_path_literal(&layout.path)
    );
    let _ = writeln!(code);
    let _ = writeln!(code, "export default function Layout(props) {{");
    let _ = writeln!(
        code,
        "  return <UserLayout frontMatter={{frontMatter}} {{...props}} />"
    );
    let _ = write!(code, "}}");
    code
}

/// Assembles the text handed to the MDX compiler: the front matter export,
/// the optional layout wrapper, then the document body.
pub fn compose_document(front_matter: &FrontMatter, layout: Option<&Layout>, body: &str) -> String {
    let mut code = front_matter_export(front_matter);
    code.push_str("\n\n");
    if let Some(layout) = layout {
        code.push_str(&layout_wrapper(layout));
        code.push_str("\n\n");
    }
    code.push_str(body);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn docs_layout() -> Layout {
        Layout {
            name: "docs".to_string(),
            path: PathBuf::from("/site/layouts/docs.tsx"),
        }
    }

    #[test]
    fn test_js_string_literal() {
        assert_eq!(js_string_literal("line1\nline2"), "\"line1\\nline2\"");
        assert_eq!(js_string_literal("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn path_literals_use_forward_slashes() {
        assert_eq!(
            js_path_literal(Path::new("C:\\site\\layouts\\docs.tsx")),
            "\"C:/site/layouts/docs.tsx\""
        );
    }

    #[test]
    fn front_matter_export_keeps_key_order() {
        let json = json!({ "title": "Intro", "layout": "docs" });
        let front_matter = json.as_object().unwrap();
        insta::assert_snapshot!(front_matter_export(front_matter), @r#"
        export const frontMatter = {
          "title": "Intro",
          "layout": "docs"
        }
        "#);
    }

    #[test]
    fn wraps_page_in_layout() {
        insta::assert_snapshot!(layout_wrapper(&docs_layout()), @r#"
        import UserLayout from "/site/layouts/docs.tsx";

        export default function Layout(props) {
          return <UserLayout frontMatter={frontMatter} {...props} />
        }
        "#);
    }

    #[test]
    fn composes_without_layout() {
        let composed = compose_document(&FrontMatter::new(), None, "# Hello");
        assert_eq!(composed, "export const frontMatter = {}\n\n# Hello");
    }

    #[test]
    fn composes_with_layout() {
        let composed = compose_document(&FrontMatter::new(), Some(&docs_layout()), "Body");
        assert!(composed.starts_with("export const frontMatter = {}\n\nimport UserLayout"));
        assert!(composed.ends_with("}\n\nBody"));
    }
}
