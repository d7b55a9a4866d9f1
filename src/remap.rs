//! Mapping of checker coordinates back onto the Markdown document.
//!
//! A checker reports positions against the normalized snippet. Two shifts
//! take them back to the document: session prompts removed by the
//! normalizer are added back to the column, and the block's offset in the
//! document is added to the line.

use crate::fence::BlockKind;
use crate::session::{NormalizedBlock, PROMPT_WIDTH};

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Column on the original transcript line for a column reported against
/// the stripped source.
pub fn transcript_column(position: Position, block: &NormalizedBlock) -> usize {
    if block.source_kind == BlockKind::Interactive && block.had_prompt(position.line) {
        position.column + PROMPT_WIDTH
    } else {
        position.column
    }
}

/// Document line for a block-local line.
pub fn document_line(line: usize, start_line: usize) -> usize {
    start_line + line
}

/// Maps a snippet-local position to document coordinates.
///
/// Lines outside the block (0, or past its end) are not clamped.
pub fn to_document(position: Position, start_line: usize, block: &NormalizedBlock) -> Position {
    Position {
        line: document_line(position.line, start_line),
        column: transcript_column(position, block),
    }
}
