// Segmenter
// Splits a document into ordered, word-bounded segments of a target size

use crate::models::Segment;

/// Segments shorter than this are too small for stable statistics.
pub const MIN_SEGMENT_WORDS: usize = 50;

/// Split `text` into consecutive runs of `segment_size` whitespace-delimited
/// words, dropping any run shorter than [`MIN_SEGMENT_WORDS`].
pub fn segment_text(text: &str, segment_size: usize) -> Vec<Segment> {
    segment_text_with_min(text, segment_size, MIN_SEGMENT_WORDS)
}

pub fn segment_text_with_min(text: &str, segment_size: usize, min_words: usize) -> Vec<Segment> {
    if segment_size == 0 {
        return Vec::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(segment_size)
        .filter(|chunk| chunk.len() >= min_words)
        .enumerate()
        .map(|(index, chunk)| Segment {
            index,
            word_count: chunk.len(),
            text: chunk.join(" "),
        })
        .collect()
}
