use crate::frontmatter::FrontmatterError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fatal for the document being compiled.
    Error,
    /// Reported but does not block compilation.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Where a diagnostic points inside its source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticLocation {
    /// File the diagnostic belongs to.
    pub file: String,
    /// Line number (1-indexed), when the message carried a position.
    pub line: Option<usize>,
    /// Column (0-indexed byte column), when the message carried a position.
    pub column: Option<usize>,
    /// Length of the highlighted range, never longer than `line_text`.
    pub length: usize,
    /// Full text of the line the diagnostic points at.
    pub line_text: String,
}

/// A structured, presentable compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable message.
    pub text: String,
    /// Source location and excerpt.
    pub location: DiagnosticLocation,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(text: impl Into<String>, location: DiagnosticLocation) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            location,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(text: impl Into<String>, location: DiagnosticLocation) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
            location,
        }
    }

    /// Whether this diagnostic is fatal.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.text)?;

        let location = &self.location;
        if location.file.is_empty() {
            return Ok(());
        }
        write!(f, "\n  --> {}", location.file)?;
        if let (Some(line), Some(column)) = (location.line, location.column) {
            write!(f, ":{}:{}", line, column + 1)?;
        }

        if !location.line_text.is_empty() {
            let gutter = location
                .line
                .map(|line| line.to_string())
                .unwrap_or_default();
            let pad = " ".repeat(gutter.len());
            write!(f, "\n {} | {}", gutter, location.line_text)?;
            if let Some(column) = location.column {
                let lead = location
                    .line_text
                    .get(..column)
                    .map(|prefix| prefix.chars().count())
                    .unwrap_or(column);
                write!(
                    f,
                    "\n {} | {}{}",
                    pad,
                    " ".repeat(lead),
                    "^".repeat(location.length.max(1))
                )?;
            }
        }
        Ok(())
    }
}

/// Diagnostics collected for one document, partitioned by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Fatal diagnostics.
    pub errors: Vec<Diagnostic>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the list matching its severity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Total count of all diagnostics.
    pub fn count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// Iterate errors first, then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

/// Errors raised while resolving a document's front matter and layout.
///
/// Layout failures are configuration errors and abort the whole build;
/// front matter failures are reported as diagnostics of the document.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The document names a layout that is not in the registry.
    #[error("{}: layout `{layout}` is not registered", .document.display())]
    MissingLayout {
        /// Document that referenced the layout.
        document: PathBuf,
        /// Requested layout name.
        layout: String,
    },
    /// The `layout` key holds something other than a string.
    #[error("{}: front matter `layout` must be a string, found {value}", .document.display())]
    InvalidLayout {
        /// Document that declared the layout.
        document: PathBuf,
        /// The offending value, serialized as JSON.
        value: String,
    },
    /// The metadata block could not be parsed.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

impl ResolveError {
    /// Whether this error must abort the build rather than a single document.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ResolveError::Frontmatter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> DiagnosticLocation {
        DiagnosticLocation {
            file: "docs/intro.mdx".to_string(),
            line: Some(3),
            column: Some(4),
            length: 4,
            line_text: "let charlie = 30;".to_string(),
        }
    }

    #[test]
    fn partitions_by_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("unused", location()));
        diagnostics.push(Diagnostic::error("broken", location()));
        diagnostics.push(Diagnostic::warning("again", location()));

        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert_eq!(diagnostics.errors.len(), 1);
        assert_eq!(diagnostics.warnings.len(), 2);
        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.iter().next().map(|d| d.text.as_str()), Some("broken"));
    }

    #[test]
    fn renders_excerpt_with_caret() {
        let rendered = Diagnostic::error("Unexpected token", location()).to_string();
        insta::assert_snapshot!(rendered, @r"
        error: Unexpected token
          --> docs/intro.mdx:3:5
         3 | let charlie = 30;
           |     ^^^^
        ");
    }

    #[test]
    fn renders_without_position() {
        let diagnostic = Diagnostic::warning(
            "heads up",
            DiagnosticLocation {
                file: "a.mdx".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(diagnostic.to_string(), "warning: heads up\n  --> a.mdx");
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(Diagnostic::error("x", location())).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["location"]["lineText"], "let charlie = 30;");
        assert_eq!(json["location"]["column"], 4);
    }

    #[test]
    fn layout_errors_are_configuration_errors() {
        let err = ResolveError::MissingLayout {
            document: PathBuf::from("docs/a.mdx"),
            layout: "missing".to_string(),
        };
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "docs/a.mdx: layout `missing` is not registered");

        let err = ResolveError::Frontmatter(FrontmatterError::InvalidRootType { offset: 4 });
        assert!(!err.is_configuration_error());
    }
}
