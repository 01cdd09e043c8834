use serde_json::Value as JsonValue;
use thiserror::Error;

/// Ordered front matter mapping; keys keep their declaration order.
pub type FrontMatter = serde_json::Map<String, JsonValue>;

/// Result returned after extracting front matter from a composite document.
#[derive(Debug)]
pub struct FrontmatterExtraction {
    /// Parsed front matter.
    pub value: FrontMatter,
    /// Byte offset inside the original document where the body begins.
    pub body_start: usize,
}

impl FrontmatterExtraction {
    fn empty() -> Self {
        Self {
            value: FrontMatter::new(),
            body_start: 0,
        }
    }
}

/// Errors emitted while parsing or extracting front matter.
///
/// Every variant carries the byte offset in the original document it refers to.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (e.g., missing terminating `---`).
    #[error("Unterminated YAML front matter block: expected closing '---'")]
    Unterminated {
        /// Offset of the opening fence.
        offset: usize,
    },
    /// YAML failed to parse.
    #[error("Front matter parse error: {message}")]
    Parse {
        /// Parser message.
        message: String,
        /// Offset of the failure inside the document.
        offset: usize,
    },
    /// Top-level YAML node was not a mapping.
    #[error("Front matter must be a YAML mapping at the top level")]
    InvalidRootType {
        /// Offset of the YAML block.
        offset: usize,
    },
}

impl FrontmatterError {
    /// Byte offset in the original document this error points at.
    pub fn offset(&self) -> usize {
        match self {
            FrontmatterError::Unterminated { offset }
            | FrontmatterError::Parse { offset, .. }
            | FrontmatterError::InvalidRootType { offset } => *offset,
        }
    }
}

/// The raw YAML block located at the start of a document.
struct YamlBlock<'a> {
    text: &'a str,
    start: usize,
    body_start: usize,
}

/// Extracts YAML front matter from a composite document.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction, FrontmatterError> {
    match find_yaml_block(input)? {
        Some(block) => {
            let value = parse_yaml_block(&block)?;
            Ok(FrontmatterExtraction {
                value,
                body_start: block.body_start,
            })
        }
        None => Ok(FrontmatterExtraction::empty()),
    }
}

fn parse_yaml_block(block: &YamlBlock<'_>) -> Result<FrontMatter, FrontmatterError> {
    if block.text.trim().is_empty() {
        return Ok(FrontMatter::new());
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block.text).map_err(|err| FrontmatterError::Parse {
            offset: block.start + err.location().map(|loc| loc.index()).unwrap_or(0),
            message: err.to_string(),
        })?;
    let json_value = serde_json::to_value(yaml_value).map_err(|err| FrontmatterError::Parse {
        message: err.to_string(),
        offset: block.start,
    })?;

    match json_value {
        JsonValue::Null => Ok(FrontMatter::new()),
        JsonValue::Object(map) => Ok(map),
        _ => Err(FrontmatterError::InvalidRootType {
            offset: block.start,
        }),
    }
}

fn find_yaml_block(input: &str) -> Result<Option<YamlBlock<'_>>, FrontmatterError> {
    let (without_bom, bom_len) = strip_bom(input);
    let mut cursor = 0usize;

    while let Some((line, next_cursor)) = next_line(without_bom, cursor) {
        if line.trim().is_empty() {
            cursor = next_cursor;
            continue;
        }

        if !is_yaml_fence(line) {
            return Ok(None);
        }

        let block_start = next_cursor;
        let mut scan_cursor = next_cursor;

        while let Some((block_line, next_line_cursor)) = next_line(without_bom, scan_cursor) {
            if is_yaml_fence(block_line) {
                let raw_block = &without_bom[block_start..scan_cursor];
                return Ok(Some(YamlBlock {
                    text: raw_block.trim_end_matches(['\r', '\n']),
                    start: bom_len + block_start,
                    body_start: bom_len + next_line_cursor,
                }));
            }
            scan_cursor = next_line_cursor;
        }

        return Err(FrontmatterError::Unterminated {
            offset: bom_len + cursor,
        });
    }

    Ok(None)
}

fn strip_bom(input: &str) -> (&str, usize) {
    if let Some(stripped) = input.strip_prefix('\u{feff}') {
        (stripped, '\u{feff}'.len_utf8())
    } else {
        (input, 0)
    }
}

fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    let bytes = &input.as_bytes()[start..];
    if let Some(pos) = bytes.iter().position(|b| *b == b'\n') {
        let line_end = start + pos;
        Some((&input[start..line_end], line_end + 1))
    } else {
        Some((&input[start..], input.len()))
    }
}

fn is_yaml_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> FrontmatterExtraction {
        extract_frontmatter(input).expect("front matter extraction should succeed")
    }

    #[test]
    fn returns_empty_when_no_frontmatter() {
        let result = extract("# Title\nBody");
        assert_eq!(result.body_start, 0);
        assert!(result.value.is_empty());
    }

    #[test]
    fn parses_basic_yaml() {
        let input = "---\ntitle: Example\ntags:\n  - rust\n  - docs\n---\n# Content";
        let result = extract(input);
        assert_eq!(result.body_start, input.find("# Content").unwrap());
        assert_eq!(result.value["title"], "Example");
        assert_eq!(result.value["tags"], serde_json::json!(["rust", "docs"]));
    }

    #[test]
    fn keeps_declaration_order() {
        let input = "---\nzeta: 1\nalpha: 2\nlayout: docs\n---\n";
        let keys: Vec<_> = extract(input).value.keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "layout"]);
    }

    #[test]
    fn handles_empty_block() {
        let input = "---\n---\n# Body";
        let result = extract(input);
        assert!(result.value.is_empty());
        assert_eq!(result.body_start, input.find("# Body").unwrap());
    }

    #[test]
    fn handles_crlf_fences() {
        let input = "---\r\ntitle: Windows\r\n---\r\nBody";
        let result = extract(input);
        assert_eq!(result.value["title"], "Windows");
        assert_eq!(&input[result.body_start..], "Body");
    }

    #[test]
    fn preserves_bom_and_whitespace() {
        let input = "\u{feff}\n   \n---\nfoo: bar\n---\nBody";
        let result = extract(input);
        assert_eq!(result.value["foo"], "bar");
        assert_eq!(result.body_start, input.find("Body").unwrap());
    }

    #[test]
    fn fence_must_lead_the_document() {
        let input = "# Title\n---\nfoo: bar\n---\n";
        let result = extract(input);
        assert!(result.value.is_empty());
        assert_eq!(result.body_start, 0);
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let input = "---\ninvalid: [unterminated\n---\n";
        let err = extract_frontmatter(input).unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse { .. }), "{err:?}");
        assert!(err.offset() >= 4, "offset should fall inside the block: {err:?}");
    }

    #[test]
    fn errors_on_unterminated_block() {
        let input = "\n---\ntitle: test";
        let err = extract_frontmatter(input).unwrap_err();
        assert!(matches!(err, FrontmatterError::Unterminated { offset: 1 }));
    }

    #[test]
    fn errors_on_scalar_root() {
        let input = "---\njust a string\n---\n";
        let err = extract_frontmatter(input).unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidRootType { offset: 4 }));
    }
}
