use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// A single finding reported by the grammar checker.
///
/// `offset` and `length` count UTF-16 code units, which is how LanguageTool
/// addresses text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    pub replacements: Vec<String>,
    pub rule_id: String,
}

/// An edit that was actually applied; `offset` is a byte offset into the
/// original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    pub offset: usize,
    pub original: String,
    pub replacement: String,
    pub rule_id: String,
    pub message: String,
}

/// Apply the first suggested replacement of every match.
///
/// Matches are processed in offset order. A match without suggestions, one
/// whose range falls outside the text or inside a character, and one that
/// overlaps an already applied edit are skipped.
pub fn apply_matches(text: &str, matches: &[GrammarMatch]) -> (String, Vec<AppliedEdit>) {
    let boundaries = utf16_boundaries(text);

    let mut ordered: Vec<&GrammarMatch> =
        matches.iter().filter(|m| !m.replacements.is_empty()).collect();
    ordered.sort_by_key(|m| m.offset);

    let mut corrected = String::with_capacity(text.len());
    let mut applied = Vec::new();
    let mut cursor = 0;

    for m in ordered {
        let Some(range) = resolve_range(&boundaries, m.offset, m.length) else {
            debug!(rule = %m.rule_id, offset = m.offset, length = m.length, "Skipping match with invalid range");
            continue;
        };

        if range.start < cursor {
            debug!(rule = %m.rule_id, offset = m.offset, "Skipping overlapping match");
            continue;
        }

        let replacement = &m.replacements[0];
        corrected.push_str(&text[cursor..range.start]);
        corrected.push_str(replacement);

        applied.push(AppliedEdit {
            offset: range.start,
            original: text[range.clone()].to_string(),
            replacement: replacement.clone(),
            rule_id: m.rule_id.clone(),
            message: m.message.clone(),
        });
        cursor = range.end;
    }

    corrected.push_str(&text[cursor..]);
    (corrected, applied)
}

/// For every UTF-16 offset in `text` (inclusive of the end), the matching byte
/// offset, or `None` when the offset points into the middle of a surrogate pair.
fn utf16_boundaries(text: &str) -> Vec<Option<usize>> {
    let mut boundaries = Vec::with_capacity(text.len() + 1);
    for (byte_idx, ch) in text.char_indices() {
        boundaries.push(Some(byte_idx));
        if ch.len_utf16() == 2 {
            boundaries.push(None);
        }
    }
    boundaries.push(Some(text.len()));
    boundaries
}

fn resolve_range(boundaries: &[Option<usize>], offset: usize, length: usize) -> Option<Range<usize>> {
    let end = offset.checked_add(length)?;
    let start = (*boundaries.get(offset)?)?;
    let end = (*boundaries.get(end)?)?;
    Some(start..end)
}

/// Split `text` into consecutive slices of at most `max_bytes` each, breaking
/// on line ends and falling back to word boundaries for over-long lines.
/// Concatenating the slices yields `text` again. A single word longer than
/// `max_bytes` becomes its own oversize slice.
pub fn split_into_chunks(text: &str, max_bytes: usize) -> Vec<&str> {
    if max_bytes == 0 || text.len() <= max_bytes {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for piece in piece_ranges(text, max_bytes) {
        if piece.end - start > max_bytes && end > start {
            chunks.push(&text[start..end]);
            start = end;
        }
        end = piece.end;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

fn piece_ranges(text: &str, max_bytes: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.len() <= max_bytes {
            ranges.push(offset..offset + line.len());
        } else {
            ranges.extend(
                line.split_word_bound_indices()
                    .map(|(i, word)| offset + i..offset + i + word.len()),
            );
        }
        offset += line.len();
    }

    ranges
}
