use crate::fence::{BlockKind, FenceTags};

/// A checkable code block extracted from a Markdown document.
///
/// ````markdown
/// ```python
/// import os
/// ```
/// ````
///
/// # Line numbers
///
/// `start_line` is the offset of the block within the document: line `l`
/// (1-based) of `raw_text` sits on document line `start_line + l`. For the
/// block above, whose fence is on line 1, `start_line` is 1 and `import os`
/// is document line 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Plain source or session transcript
    pub kind: BlockKind,
    /// Document line preceding the block's first line
    pub start_line: usize,
    /// Content between the fences, left-trimmed, one `\n` per line
    pub raw_text: String,
}

impl CodeBlock {
    /// Builds a block from its untrimmed content.
    ///
    /// Leading whitespace is stripped, blank lines included. Every newline
    /// stripped that way moves `start_line` down one line so block-local
    /// numbering still lands on the right document line.
    fn from_content(kind: BlockKind, fence_line: usize, content: &str) -> Self {
        let raw_text = content.trim_start();
        let skipped_lines = content[..content.len() - raw_text.len()]
            .matches('\n')
            .count();

        Self {
            kind,
            start_line: fence_line + skipped_lines,
            raw_text: raw_text.to_string(),
        }
    }

    /// Number of lines handed to the checker.
    pub fn line_count(&self) -> usize {
        self.raw_text.lines().count()
    }
}

enum ScanState {
    Searching,
    InBlock {
        kind: BlockKind,
        fence_line: usize,
        content: String,
    },
}

/// Extracts every checkable fenced block from Markdown content.
///
/// Lines are scanned top to bottom. An opening fence recognised by `tags`
/// starts a block and the first bare closing fence after it ends the block;
/// anything in between, further opening fences included, is content. Fences
/// do not nest. A fence left open at the end of the document is dropped.
///
/// # Example
///
/// ```ignore
/// let markdown = "# Title\n\n```python\nimport os\n```\n";
///
/// let blocks = extract_code_blocks(markdown, &FenceTags::default());
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].start_line, 3);
/// assert_eq!(blocks[0].raw_text, "import os\n");
/// ```
pub fn extract_code_blocks(content: &str, tags: &FenceTags) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut state = ScanState::Searching;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;

        state = match state {
            ScanState::Searching => match tags.classify_opening(line) {
                Some(kind) => ScanState::InBlock {
                    kind,
                    fence_line: line_no,
                    content: String::new(),
                },
                None => ScanState::Searching,
            },

            ScanState::InBlock {
                kind,
                fence_line,
                mut content,
            } => {
                if FenceTags::is_closing(line) {
                    blocks.push(CodeBlock::from_content(kind, fence_line, &content));
                    ScanState::Searching
                } else {
                    content.push_str(line);
                    content.push('\n');
                    ScanState::InBlock {
                        kind,
                        fence_line,
                        content,
                    }
                }
            }
        };
    }

    if let ScanState::InBlock { fence_line, .. } = state {
        log::debug!(
            "Ignoring unterminated code fence opened on line {}",
            fence_line
        );
    }

    blocks
}
