//! Maps compiler messages onto presentable diagnostics.
//!
//! Compiler positions use 1-indexed lines and columns plus a 0-indexed byte
//! offset. Diagnostics use a 0-indexed column and carry the full text of the
//! line they point at, with the highlighted length clamped to that line.

use crate::error::{Diagnostic, DiagnosticLocation, Severity};
use markdown::message::{Message, Place};

/// A point reported by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePoint {
    /// Line (1-indexed).
    pub line: usize,
    /// Column (1-indexed).
    pub column: usize,
    /// Absolute byte offset (0-indexed).
    pub offset: usize,
}

impl MessagePoint {
    /// Create a point.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl From<&markdown::unist::Point> for MessagePoint {
    fn from(point: &markdown::unist::Point) -> Self {
        Self::new(point.line, point.column, point.offset)
    }
}

/// A message reported while compiling a composite document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerMessage {
    /// Why the message was raised.
    pub reason: String,
    /// Start of the offending range.
    pub start: Option<MessagePoint>,
    /// End of the offending range.
    pub end: Option<MessagePoint>,
    /// Fatal messages become errors, the rest warnings.
    pub fatal: bool,
}

impl CompilerMessage {
    /// A fatal message without a position.
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            start: None,
            end: None,
            fatal: true,
        }
    }

    /// A non-fatal message without a position.
    pub fn warning(reason: impl Into<String>) -> Self {
        Self {
            fatal: false,
            ..Self::fatal(reason)
        }
    }

    /// Attach a position to the message.
    pub fn at(mut self, start: MessagePoint, end: Option<MessagePoint>) -> Self {
        self.start = Some(start);
        self.end = end;
        self
    }

    /// Convert a markdown-rs / mdxjs-rs message. These are always thrown, so fatal.
    pub fn from_markdown(message: &Message) -> Self {
        let (start, end) = match message.place.as_deref() {
            Some(Place::Position(position)) => (
                Some(MessagePoint::from(&position.start)),
                Some(MessagePoint::from(&position.end)),
            ),
            Some(Place::Point(point)) => (Some(MessagePoint::from(point)), None),
            None => (None, None),
        };
        Self {
            reason: message.reason.clone(),
            start,
            end,
            fatal: true,
        }
    }
}

/// Computes the compiler-style point for a byte offset in `source`.
///
/// `\r\n`, lone `\r`, and `\n` each end a line.
pub fn point_at(source: &str, offset: usize) -> MessagePoint {
    let offset = floor_char_boundary(source, offset);
    let bytes = source.as_bytes();
    let mut line = 1;
    let mut line_start = 0;
    let mut i = 0;
    while i < offset {
        match bytes[i] {
            b'\n' => {
                line += 1;
                line_start = i + 1;
            }
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => {
                line += 1;
                line_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    MessagePoint::new(line, offset - line_start + 1, offset)
}

/// Converts a compiler message into a diagnostic against `source`.
pub fn map_message(message: &CompilerMessage, source: &str, file: &str) -> Diagnostic {
    let mut length = 0;
    let mut line_start = 0;
    let mut line = None;
    let mut column = None;

    if let Some(start) = message.start {
        let zero_based = start.column.saturating_sub(1);
        line = Some(start.line);
        column = Some(zero_based);
        line_start = start.offset.saturating_sub(zero_based);
        length = match message.end {
            Some(end) => end.offset.saturating_sub(start.offset),
            None => 1,
        };
    }

    let line_start = floor_char_boundary(source, line_start);
    let line_end = find_line_end(source, line_start);

    let severity = if message.fatal {
        Severity::Error
    } else {
        Severity::Warning
    };

    Diagnostic {
        severity,
        text: message.reason.clone(),
        location: DiagnosticLocation {
            file: file.to_string(),
            line,
            column,
            length: length.min(line_end - line_start),
            line_text: source[line_start..line_end].to_string(),
        },
    }
}

/// Index of the first line terminator at or after `from`, or the end of `source`.
fn find_line_end(source: &str, from: usize) -> usize {
    source[from..]
        .find(['\n', '\r', '\u{2028}', '\u{2029}'])
        .map(|pos| from + pos)
        .unwrap_or(source.len())
}

fn floor_char_boundary(source: &str, index: usize) -> usize {
    let mut index = index.min(source.len());
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "const alpha = 10;\nconst bravo = 20;\nlet charlie = 30;\nconst delta = 40;\nconst echo = 50;";

    fn mapped(message: CompilerMessage, source: &str) -> Diagnostic {
        map_message(&message, source, "page.mdx")
    }

    #[test]
    fn maps_range_on_third_line() {
        let message = CompilerMessage::fatal("Unexpected token")
            .at(MessagePoint::new(3, 5, 40), Some(MessagePoint::new(3, 9, 44)));
        let diagnostic = mapped(message, SOURCE);

        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.text, "Unexpected token");
        assert_eq!(diagnostic.location.file, "page.mdx");
        assert_eq!(diagnostic.location.line, Some(3));
        assert_eq!(diagnostic.location.column, Some(4));
        assert_eq!(diagnostic.location.length, 4);
        assert_eq!(diagnostic.location.line_text, "let charlie = 30;");
    }

    #[test]
    fn missing_end_highlights_one_byte() {
        let message = CompilerMessage::warning("Odd").at(MessagePoint::new(2, 1, 18), None);
        let diagnostic = mapped(message, SOURCE);

        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.location.column, Some(0));
        assert_eq!(diagnostic.location.length, 1);
        assert_eq!(diagnostic.location.line_text, "const bravo = 20;");
    }

    #[test]
    fn no_position_points_at_first_line() {
        let diagnostic = mapped(CompilerMessage::fatal("Boom"), SOURCE);

        assert_eq!(diagnostic.location.line, None);
        assert_eq!(diagnostic.location.column, None);
        assert_eq!(diagnostic.location.length, 0);
        assert_eq!(diagnostic.location.line_text, "const alpha = 10;");
    }

    #[test]
    fn length_is_clamped_to_the_line() {
        // Range spills from line 3 into line 5.
        let message = CompilerMessage::fatal("Spans lines")
            .at(MessagePoint::new(3, 5, 40), Some(MessagePoint::new(5, 4, 75)));
        let diagnostic = mapped(message, SOURCE);

        assert_eq!(diagnostic.location.length, "let charlie = 30;".len());
    }

    #[test]
    fn recognises_every_line_terminator() {
        for terminator in ["\r\n", "\r", "\n", "\u{2028}", "\u{2029}"] {
            let source = format!("first{terminator}second");
            let diagnostic = mapped(
                CompilerMessage::fatal("x").at(MessagePoint::new(1, 2, 1), None),
                &source,
            );
            assert_eq!(diagnostic.location.line_text, "first", "{terminator:?}");
        }
    }

    #[test]
    fn last_line_runs_to_end_of_source() {
        let message = CompilerMessage::fatal("tail").at(MessagePoint::new(5, 7, 78), None);
        let diagnostic = mapped(message, SOURCE);
        assert_eq!(diagnostic.location.line_text, "const echo = 50;");
    }

    #[test]
    fn out_of_range_offsets_do_not_panic() {
        let message = CompilerMessage::fatal("far")
            .at(MessagePoint::new(9, 1, 500), Some(MessagePoint::new(9, 4, 503)));
        let diagnostic = mapped(message, SOURCE);
        assert_eq!(diagnostic.location.line_text, "");
        assert_eq!(diagnostic.location.length, 0);
    }

    #[test]
    fn point_at_counts_lines_and_columns() {
        assert_eq!(point_at(SOURCE, 0), MessagePoint::new(1, 1, 0));
        assert_eq!(point_at(SOURCE, 40), MessagePoint::new(3, 5, 40));
        assert_eq!(point_at("a\r\nb\rc", 5), MessagePoint::new(3, 1, 5));
    }

    #[test]
    fn converts_markdown_messages() {
        let err = markdown::to_mdast("<a>hi</b>", &markdown::ParseOptions::mdx()).unwrap_err();
        let message = CompilerMessage::from_markdown(&err);
        assert!(message.fatal);
        assert!(message.start.is_some());
        assert!(!message.reason.is_empty());
    }
}
