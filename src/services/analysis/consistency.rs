// Style Consistency
// Coarse lexical-sophistication drift across segments, feeding the rule-based explanation

use std::collections::HashSet;

use super::statistics::{mean, variance};
use crate::models::{Segment, StyleConsistency};

const SOPHISTICATION_SCALE: f64 = 10.0;
const EMPTY_SOPHISTICATION: f64 = 5.0;
const VARIANCE_NORMALIZER: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    pub lexical_sophistication: f64,
    pub avg_word_length: f64,
}

/// Distinct-word share of a segment scaled to 0..=10, over whitespace words.
pub fn segment_style(text: &str) -> SegmentStyle {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return SegmentStyle {
            lexical_sophistication: EMPTY_SOPHISTICATION,
            avg_word_length: 0.0,
        };
    }

    let total = words.len() as f64;
    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();

    SegmentStyle {
        lexical_sophistication: (unique.len() as f64 / total * SOPHISTICATION_SCALE)
            .min(SOPHISTICATION_SCALE),
        avg_word_length: chars as f64 / total,
    }
}

pub fn style_consistency(segments: &[Segment]) -> StyleConsistency {
    let sophistication: Vec<f64> = segments
        .iter()
        .map(|s| segment_style(&s.text).lexical_sophistication)
        .collect();
    let var = variance(&sophistication);

    StyleConsistency {
        variance: var,
        consistency_score: 1.0 - (var / VARIANCE_NORMALIZER).min(1.0),
        segments_analyzed: segments.len(),
    }
}

/// Mean sophistication, used in prompts.
pub fn mean_sophistication(segments: &[Segment]) -> f64 {
    let values: Vec<f64> = segments
        .iter()
        .map(|s| segment_style(&s.text).lexical_sophistication)
        .collect();
    mean(&values)
}
