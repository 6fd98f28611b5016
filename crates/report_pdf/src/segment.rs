//! Splits free-form report text into headings, paragraphs and bullet items.
//!
//! The body is cut into chunks at runs of blank lines. A chunk whose first line consists only of
//! uppercase letters and spaces opens with a [`BlockKind::Heading`]. The rest of the chunk is a
//! bullet group when its trimmed text starts with `-`, and a paragraph otherwise. Any all-caps
//! sentence at the start of a chunk is therefore read as a heading.

/// Kind of a content block, which selects its drawing style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// A section heading.
    Heading,
    /// Running text; hard line breaks inside it are preserved.
    Paragraph,
    /// One line of a bullet group.
    BulletItem,
}

/// A classified unit of body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentBlock {
    /// Kind of the block.
    pub kind: BlockKind,
    /// Raw text; may contain `\n` for paragraphs.
    pub text: String,
    /// Whether paragraph spacing follows the block.
    pub spacing_after: bool,
}

impl ContentBlock {
    fn new(kind: BlockKind, text: impl Into<String>, spacing_after: bool) -> Self {
        Self {
            kind,
            text: text.into(),
            spacing_after,
        }
    }
}

/// Returns whether a line reads as a section heading.
pub fn is_heading_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().any(char::is_uppercase)
        && trimmed.chars().all(|c| c.is_uppercase() || c == ' ')
}

/// Segments `body` into content blocks in reading order.
pub fn segment(body: &str) -> Vec<ContentBlock> {
    let normalized = body.replace("\r\n", "\n");
    let mut blocks = Vec::new();

    for chunk in chunks(&normalized) {
        let mut lines = chunk.as_slice();

        if let Some(first) = lines.first() {
            if is_heading_line(first) {
                blocks.push(ContentBlock::new(BlockKind::Heading, first.trim(), true));
                lines = &lines[1..];
            }
        }

        if lines.is_empty() {
            continue;
        }

        if lines[0].trim_start().starts_with('-') {
            let last = lines.len() - 1;
            blocks.extend(lines.iter().enumerate().map(|(index, line)| {
                ContentBlock::new(BlockKind::BulletItem, line.trim(), index == last)
            }));
        } else {
            let text = lines
                .iter()
                .map(|line| line.trim())
                .collect::<Vec<_>>()
                .join("\n");
            blocks.push(ContentBlock::new(BlockKind::Paragraph, text, true));
        }
    }

    blocks
}

fn chunks(text: &str) -> Vec<Vec<&str>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[ContentBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|block| block.kind).collect()
    }

    #[test]
    fn heading_followed_by_text_in_one_chunk() {
        let blocks = segment("OVERVIEW\nShort text.");
        assert_eq!(kinds(&blocks), [BlockKind::Heading, BlockKind::Paragraph]);
        assert_eq!(blocks[0].text, "OVERVIEW");
        assert_eq!(blocks[1].text, "Short text.");
    }

    #[test]
    fn blank_lines_separate_paragraphs() {
        let blocks = segment("First paragraph.\r\n\r\n\r\nSecond one\nwith a break.");
        assert_eq!(kinds(&blocks), [BlockKind::Paragraph, BlockKind::Paragraph]);
        assert_eq!(blocks[1].text, "Second one\nwith a break.");
    }

    #[test]
    fn bullet_group_spacing_only_after_last_item() {
        let blocks = segment("- one\n- two\n- three");
        assert_eq!(kinds(&blocks), [BlockKind::BulletItem; 3]);
        let spacing: Vec<_> = blocks.iter().map(|block| block.spacing_after).collect();
        assert_eq!(spacing, [false, false, true]);
    }

    #[test]
    fn heading_can_introduce_a_bullet_group() {
        let blocks = segment("RISKS\n- flood zone\n- roof age");
        assert_eq!(
            kinds(&blocks),
            [BlockKind::Heading, BlockKind::BulletItem, BlockKind::BulletItem]
        );
    }

    #[test]
    fn mid_chunk_caps_line_is_not_a_heading() {
        let blocks = segment("Intro line\nNOT A HEADING");
        assert_eq!(kinds(&blocks), [BlockKind::Paragraph]);
    }

    #[test]
    fn heading_detection_rules() {
        assert!(is_heading_line("MARKET ANALYSIS"));
        assert!(is_heading_line("  SUMMARY  "));
        assert!(!is_heading_line("Q3 SUMMARY"));
        assert!(!is_heading_line("Summary"));
        assert!(!is_heading_line("   "));
    }

    #[test]
    fn empty_body_has_no_blocks() {
        assert!(segment("").is_empty());
        assert!(segment("\n\n  \n").is_empty());
    }
}
