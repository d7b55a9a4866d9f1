use crate::config::FenceConfig;

/// The literal that opens and closes a fenced block.
pub const FENCE_MARKER: &str = "```";

/// The kind of a checkable fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Ordinary source, handed to the checker as written.
    Plain,
    /// An interactive session transcript (`>>> ` / `... ` prompts).
    Interactive,
}

/// Fence tags that identify checkable blocks.
///
/// A line opens a block when it starts with [`FENCE_MARKER`] immediately
/// followed by one of the tags. Matching is a case-sensitive prefix match on
/// the info string, so `py` also accepts `python3` and anything trailing the
/// tag (line highlighting hints and the like) is ignored:
///
/// ````markdown
/// ```python hl_lines="2"
/// ```
/// ````
///
/// Session tags are tried first because the default plain tag `py` is a
/// prefix of `pycon`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceTags {
    plain: Vec<String>,
    session: Vec<String>,
}

impl FenceTags {
    pub fn new(plain: Vec<String>, session: Vec<String>) -> Self {
        Self { plain, session }
    }

    pub fn from_config(config: &FenceConfig) -> Self {
        Self::new(config.plain.clone(), config.session.clone())
    }

    /// Classifies a line as an opening fence.
    ///
    /// Returns `None` for lines that do not open a checkable block, including
    /// fences for other languages and bare closing fences.
    pub fn classify_opening(&self, line: &str) -> Option<BlockKind> {
        let info = line.strip_prefix(FENCE_MARKER)?;

        if Self::matches_any(&self.session, info) {
            Some(BlockKind::Interactive)
        } else if Self::matches_any(&self.plain, info) {
            Some(BlockKind::Plain)
        } else {
            None
        }
    }

    /// A closing fence is the bare marker and nothing else.
    pub fn is_closing(line: &str) -> bool {
        line == FENCE_MARKER
    }

    fn matches_any(tags: &[String], info: &str) -> bool {
        tags.iter().any(|tag| info.starts_with(tag.as_str()))
    }
}

impl Default for FenceTags {
    fn default() -> Self {
        Self::from_config(&FenceConfig::default())
    }
}
