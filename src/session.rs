use crate::extractor::CodeBlock;
use crate::fence::BlockKind;
use std::collections::BTreeSet;

/// Prompt in front of a fresh statement in a session transcript.
pub const PRIMARY_PROMPT: &str = ">>> ";

/// Prompt in front of a continued statement in a session transcript.
pub const CONTINUATION_PROMPT: &str = "... ";

/// Width of either prompt, and so the column shift on a stripped line.
pub const PROMPT_WIDTH: usize = PRIMARY_PROMPT.len();

/// Source text ready for the checker, plus what is needed to undo the
/// prompt stripping when mapping diagnostics back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBlock {
    pub source_kind: BlockKind,
    pub checkable_text: String,
    /// 0-based line indices that had a prompt removed
    pub prefix_stripped: BTreeSet<usize>,
}

impl NormalizedBlock {
    /// Whether the checker's 1-based `line` had a prompt removed.
    pub fn had_prompt(&self, line: usize) -> bool {
        line.checked_sub(1)
            .is_some_and(|index| self.prefix_stripped.contains(&index))
    }
}

/// Turns a block into checkable source.
///
/// Plain blocks pass through. Session transcripts lose the `>>> ` or `... `
/// prompt on every line that carries one; output lines are kept as they are
/// and will usually show up as checker findings.
pub fn normalize(block: &CodeBlock) -> NormalizedBlock {
    match block.kind {
        BlockKind::Plain => NormalizedBlock {
            source_kind: block.kind,
            checkable_text: block.raw_text.clone(),
            prefix_stripped: BTreeSet::new(),
        },
        BlockKind::Interactive => {
            let (checkable_text, prefix_stripped) = strip_prompts(&block.raw_text);
            NormalizedBlock {
                source_kind: block.kind,
                checkable_text,
                prefix_stripped,
            }
        }
    }
}

fn strip_prompts(transcript: &str) -> (String, BTreeSet<usize>) {
    let mut stripped = BTreeSet::new();

    let lines: Vec<&str> = transcript
        .split('\n')
        .enumerate()
        .map(|(index, line)| {
            match line
                .strip_prefix(PRIMARY_PROMPT)
                .or_else(|| line.strip_prefix(CONTINUATION_PROMPT))
            {
                Some(source) => {
                    stripped.insert(index);
                    source
                }
                None => line,
            }
        })
        .collect();

    (lines.join("\n"), stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, raw_text: &str) -> CodeBlock {
        CodeBlock {
            kind,
            start_line: 1,
            raw_text: raw_text.to_string(),
        }
    }

    #[test]
    fn test_plain_block_is_identity() {
        let text = ">>> not a prompt here\nx = 1\n";
        let normalized = normalize(&block(BlockKind::Plain, text));

        assert_eq!(normalized.checkable_text, text);
        assert!(normalized.prefix_stripped.is_empty());
        assert!(!normalized.had_prompt(1));
    }

    #[test]
    fn test_session_prompts_stripped() {
        let transcript = ">>> def f():\n...     return 1\n>>> f()\n1\n";
        let normalized = normalize(&block(BlockKind::Interactive, transcript));

        assert_eq!(
            normalized.checkable_text,
            "def f():\n    return 1\nf()\n1\n"
        );
        assert_eq!(
            normalized.prefix_stripped.iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(normalized.had_prompt(1));
        assert!(normalized.had_prompt(3));
        assert!(!normalized.had_prompt(4));
    }

    #[test]
    fn test_prompt_without_space_is_kept() {
        let transcript = ">>>\n...\n>>>x\n";
        let normalized = normalize(&block(BlockKind::Interactive, transcript));

        assert_eq!(normalized.checkable_text, transcript);
        assert!(normalized.prefix_stripped.is_empty());
    }

    #[test]
    fn test_only_one_prompt_removed() {
        let normalized = normalize(&block(BlockKind::Interactive, ">>> >>> x\n"));
        assert_eq!(normalized.checkable_text, ">>> x\n");
    }

    #[test]
    fn test_line_zero_never_has_prompt() {
        let normalized = normalize(&block(BlockKind::Interactive, ">>> x = 1\n"));
        assert!(!normalized.had_prompt(0));
        assert!(!normalized.had_prompt(99));
    }

    #[test]
    fn test_prompt_width() {
        assert_eq!(PROMPT_WIDTH, 4);
        assert_eq!(CONTINUATION_PROMPT.len(), PROMPT_WIDTH);
    }
}
