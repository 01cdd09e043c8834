//! Fenced code block tracking.
//!
//! Used to warn about a code fence that is opened but never closed: the MDX
//! compiler silently swallows the rest of the document into the code block.

/// Whether the scanner is inside a fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePhase {
    /// Not currently inside a fence.
    #[default]
    Outside,
    /// Within fence contents.
    Inside,
}

/// Current fence state carried from line to line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Current fence phase.
    pub phase: FencePhase,
    /// Fence marker character (`` ` `` or `~`).
    pub marker: Option<char>,
    /// Length of the opening fence run.
    pub length: usize,
}

/// Advance fence state based on a single line of text.
pub fn advance_fence_state(line: &str, state: FenceState) -> FenceState {
    let (visual_indent, byte_offset) = leading_whitespace_info(line);
    // CommonMark: openers and closers allow at most 3 columns of indentation.
    if visual_indent > 3 {
        return state;
    }
    let after_indent = &line[byte_offset..];

    match state.phase {
        FencePhase::Outside => match fence_run(after_indent) {
            Some((marker, length)) => FenceState {
                phase: FencePhase::Inside,
                marker: Some(marker),
                length,
            },
            None => state,
        },
        FencePhase::Inside => match fence_run(after_indent) {
            Some((marker, length))
                if Some(marker) == state.marker
                    && length >= state.length
                    && after_indent[length..].trim().is_empty() =>
            {
                FenceState::default()
            }
            _ => state,
        },
    }
}

/// A fence left open at the end of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnclosedFence {
    /// Byte offset of the opening fence marker.
    pub offset: usize,
    /// Fence marker character.
    pub marker: char,
}

/// Finds a code fence that is still open at the end of `source`.
pub fn find_unclosed_fence(source: &str) -> Option<UnclosedFence> {
    let mut state = FenceState::default();
    let mut opened_at = 0;
    let mut line_start = 0;

    for line in source.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        let next = advance_fence_state(text, state);
        if state.phase == FencePhase::Outside && next.phase == FencePhase::Inside {
            opened_at = line_start + leading_whitespace_info(text).1;
        }
        state = next;
        line_start += line.len();
    }

    match (state.phase, state.marker) {
        (FencePhase::Inside, Some(marker)) => Some(UnclosedFence {
            offset: opened_at,
            marker,
        }),
        _ => None,
    }
}

/// Returns (visual_columns, byte_offset) for leading whitespace.
/// Tabs expand to 4-column boundaries per CommonMark.
fn leading_whitespace_info(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => col += 1,
            b'\t' => col += 4 - (col % 4),
            _ => break,
        }
        bytes += 1;
    }
    (col, bytes)
}

fn fence_run(after_indent: &str) -> Option<(char, usize)> {
    let first = after_indent.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run_len = after_indent.chars().take_while(|c| *c == first).count();
    (run_len >= 3).then_some((first, run_len))
}
