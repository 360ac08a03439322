//! Overlapping character chunking for the document vectorizer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 128,
        }
    }
}

/// A span of document text, not yet embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
}

/// Splits `text` into windows of `chunk_size` characters. Every window but the
/// last is cut back to the latest sentence end in its final fifth, if there is
/// one. The next window starts `chunk_overlap` characters before the end of
/// the kept text, so no text falls between two chunks. Blank windows are
/// dropped without consuming an index.
pub fn split_into_chunks(text: &str, source_id: &str, config: ChunkerConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();
    let mut chunks = Vec::new();
    if total_chars == 0 || config.chunk_size == 0 {
        return chunks;
    }

    let step = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);
    let mut start = 0;

    while start < total_chars {
        let end = (start + config.chunk_size).min(total_chars);
        let window: String = chars[start..end].iter().collect();

        let window = if end < total_chars {
            cut_at_sentence_boundary(&window)
        } else {
            window
        };
        let kept_chars = window.chars().count();

        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                text: trimmed.to_string(),
                source_id: source_id.to_string(),
                chunk_index: chunks.len(),
            });
        }

        if end == total_chars {
            break;
        }
        start += step
            .min(kept_chars.saturating_sub(config.chunk_overlap))
            .max(1);
    }

    chunks
}

fn cut_at_sentence_boundary(text: &str) -> String {
    const SENTENCE_ENDINGS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let mut search_start = (text.len() * 80) / 100;
    while !text.is_char_boundary(search_start) {
        search_start += 1;
    }
    let tail = &text[search_start..];

    SENTENCE_ENDINGS
        .iter()
        .filter_map(|ending| tail.rfind(ending).map(|pos| pos + ending.len()))
        .max()
        .map(|cut| text[..search_start + cut].to_string())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_into_chunks("  Check the airway.  ", "doc.txt", ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Check the airway.");
        assert_eq!(chunks[0].source_id, "doc.txt");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn windows_overlap_and_indices_are_sequential() {
        let text = "abcdefghij".repeat(3);
        let chunks = split_into_chunks(&text, "doc", config(10, 4));
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].text, "ghijabcdef");
        assert!(chunks
            .iter()
            .enumerate()
            .all(|(i, c)| c.chunk_index == i));
        assert!(chunks.last().unwrap().text.ends_with("ij"));
    }

    #[test]
    fn cuts_at_sentence_end_near_window_end() {
        let text = "Keep the patient warm and calm. Call for help now please.";
        let chunks = split_into_chunks(text, "doc", config(36, 0));
        assert_eq!(chunks[0].text, "Keep the patient warm and calm.");
        assert_eq!(chunks[1].text, "Call for help now please.");
    }

    #[test]
    fn without_overlap_chunks_cover_the_whole_text() {
        let text = "Check the scene is safe. Put on gloves if you have them. \
                    Ask the casualty what happened! Look for severe bleeding first. \
                    Is the casualty breathing normally? Call the emergency number.\n\
                    Keep the casualty warm until help arrives.";
        let squeeze = |s: &str| s.split_whitespace().collect::<String>();

        for size in [20, 36, 41, 64, 512] {
            let chunks = split_into_chunks(text, "doc", config(size, 0));
            let joined: String = chunks.iter().map(|c| squeeze(&c.text)).collect();
            assert_eq!(joined, squeeze(text), "chunk size {}", size);
        }
    }

    #[test]
    fn cut_window_still_overlaps_the_next() {
        let text = "Keep the patient warm and calm. Call for help now please.";
        let chunks = split_into_chunks(text, "doc", config(36, 6));
        assert_eq!(chunks[0].text, "Keep the patient warm and calm.");
        assert!(chunks[1].text.starts_with("calm."));
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let text = "Ñandú señal émesis. ".repeat(40);
        let chunks = split_into_chunks(&text, "doc", config(37, 9));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_into_chunks("", "doc", ChunkerConfig::default()).is_empty());
        assert!(split_into_chunks("   \n ", "doc", ChunkerConfig::default()).is_empty());
    }
}
