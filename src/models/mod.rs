// StyleGuard Data Models
// Request/response schema and the per-segment feature contract

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Segments ============

/// Contiguous word-bounded slice of the analyzed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 0-based position in document order.
    pub index: usize,
    pub word_count: usize,
    pub text: String,
}

// ============ Feature Vector ============

/// Closed set of stylometric features computed for every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AvgWordLength,
    TypeTokenRatio,
    HapaxLegomenaRatio,
    AvgSentenceLength,
    SentenceLengthVariance,
    NounRatio,
    VerbRatio,
    AdjRatio,
    AdvRatio,
    FunctionWordRatio,
    CommaPerSentence,
    SemicolonPerSentence,
    FleschReadingEase,
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Feature::AvgWordLength,
        Feature::TypeTokenRatio,
        Feature::HapaxLegomenaRatio,
        Feature::AvgSentenceLength,
        Feature::SentenceLengthVariance,
        Feature::NounRatio,
        Feature::VerbRatio,
        Feature::AdjRatio,
        Feature::AdvRatio,
        Feature::FunctionWordRatio,
        Feature::CommaPerSentence,
        Feature::SemicolonPerSentence,
        Feature::FleschReadingEase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AvgWordLength => "avg_word_length",
            Feature::TypeTokenRatio => "type_token_ratio",
            Feature::HapaxLegomenaRatio => "hapax_legomena_ratio",
            Feature::AvgSentenceLength => "avg_sentence_length",
            Feature::SentenceLengthVariance => "sentence_length_variance",
            Feature::NounRatio => "noun_ratio",
            Feature::VerbRatio => "verb_ratio",
            Feature::AdjRatio => "adj_ratio",
            Feature::AdvRatio => "adv_ratio",
            Feature::FunctionWordRatio => "function_word_ratio",
            Feature::CommaPerSentence => "comma_per_sentence",
            Feature::SemicolonPerSentence => "semicolon_per_sentence",
            Feature::FleschReadingEase => "flesch_reading_ease",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-schema numeric signature of one segment.
///
/// Serializes as a flat map keyed by the feature names. `Default` is the
/// all-zero vector used for degenerate (empty) segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureVector {
    pub avg_word_length: f64,
    pub type_token_ratio: f64,
    pub hapax_legomena_ratio: f64,
    pub avg_sentence_length: f64,
    pub sentence_length_variance: f64,
    pub noun_ratio: f64,
    pub verb_ratio: f64,
    pub adj_ratio: f64,
    pub adv_ratio: f64,
    pub function_word_ratio: f64,
    pub comma_per_sentence: f64,
    pub semicolon_per_sentence: f64,
    pub flesch_reading_ease: f64,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::AvgWordLength => self.avg_word_length,
            Feature::TypeTokenRatio => self.type_token_ratio,
            Feature::HapaxLegomenaRatio => self.hapax_legomena_ratio,
            Feature::AvgSentenceLength => self.avg_sentence_length,
            Feature::SentenceLengthVariance => self.sentence_length_variance,
            Feature::NounRatio => self.noun_ratio,
            Feature::VerbRatio => self.verb_ratio,
            Feature::AdjRatio => self.adj_ratio,
            Feature::AdvRatio => self.adv_ratio,
            Feature::FunctionWordRatio => self.function_word_ratio,
            Feature::CommaPerSentence => self.comma_per_sentence,
            Feature::SemicolonPerSentence => self.semicolon_per_sentence,
            Feature::FleschReadingEase => self.flesch_reading_ease,
        }
    }

    /// Column of one feature across a segment sequence.
    pub fn column(vectors: &[FeatureVector], feature: Feature) -> Vec<f64> {
        vectors.iter().map(|v| v.get(feature)).collect()
    }
}

// ============ Scoring ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComponentScores {
    pub lexical_inconsistency: f64,
    pub syntactic_inconsistency: f64,
    pub stylistic_shift: f64,
    pub unnatural_variation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousSegment {
    pub segment_index: usize,
    pub score: f64,
    /// Snapshot of the segment's feature vector at scoring time.
    pub features: FeatureVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObfuscationResult {
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub component_scores: ComponentScores,
    /// Sorted by score descending; ties keep document order.
    pub suspicious_segments: Vec<SuspiciousSegment>,
}

// ============ Style Consistency ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StyleConsistency {
    pub variance: f64,
    pub consistency_score: f64,
    pub segments_analyzed: usize,
}

// ============ Analyze Request / Response ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
    #[serde(default)]
    pub preprocess: bool,
    #[serde(default)]
    pub remove_urls: bool,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segment_size: default_segment_size(),
            preprocess: false,
            remove_urls: false,
        }
    }

    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub component_scores: ComponentScores,
    pub suspicious_segments: Vec<SuspiciousSegment>,
    pub explanation: String,
    pub style_consistency: StyleConsistency,
    pub num_segments: usize,
    pub segment_features: Vec<FeatureVector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============ Default Value Functions ============

pub(crate) fn default_segment_size() -> usize { 200 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_serializes_named_keys() {
        let value = serde_json::to_value(FeatureVector::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), Feature::ALL.len());
        for feature in Feature::ALL {
            assert!(obj.contains_key(feature.as_str()), "missing {}", feature);
        }
    }

    #[test]
    fn test_risk_level_serializes_uppercase() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }

    #[test]
    fn test_analyze_request_defaults() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(req.segment_size, 200);
        assert!(!req.preprocess);
        assert!(!req.remove_urls);
    }
}
