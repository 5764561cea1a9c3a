// Obfuscation Scorer
// Scores cross-segment stylometric inconsistency and flags outlier segments
//
// Four component scores in [0, 1] are combined with fixed weights; the
// overall score maps onto a risk tier. Degenerate statistics (too few
// points, zero spread, singular covariance) always fall back to 0.

use std::cmp::Ordering;

use tracing::debug;

use super::statistics::{
    coefficient_of_variation, consecutive_differences, fraction_above, is_negligible_spread,
    mahalanobis_distances, mean, std_dev,
};
use crate::models::{
    ComponentScores, Feature, FeatureVector, ObfuscationResult, RiskLevel, SuspiciousSegment,
};

const WORD_LENGTH_CV_THRESHOLD: f64 = 0.20;
const TTR_CV_THRESHOLD: f64 = 0.25;
const LEXICAL_STEP: f64 = 0.5;

const SENTENCE_JUMP_THRESHOLD: f64 = 10.0;
const SYNTACTIC_SCALE: f64 = 2.0;

const FUNCTION_WORD_SHIFT_THRESHOLD: f64 = 0.08;
const STYLISTIC_SCALE: f64 = 1.5;

const OUTLIER_DISTANCE: f64 = 3.0;
const OUTLIER_SCALE: f64 = 2.0;

const SUSPICIOUS_SEGMENT_THRESHOLD: f64 = 0.6;
const Z_SCORE_NORMALIZER: f64 = 3.0;

/// Features forming the multivariate outlier vector.
const VARIATION_FEATURES: [Feature; 5] = [
    Feature::AvgWordLength,
    Feature::TypeTokenRatio,
    Feature::AvgSentenceLength,
    Feature::NounRatio,
    Feature::VerbRatio,
];

/// Features compared per segment when ranking suspicious segments.
const DEVIATION_FEATURES: [Feature; 3] = [
    Feature::AvgWordLength,
    Feature::AvgSentenceLength,
    Feature::TypeTokenRatio,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentWeights {
    pub lexical: f64,
    pub syntactic: f64,
    pub stylistic: f64,
    pub unnatural: f64,
}

impl ComponentWeights {
    /// Convex combination; the four weights sum to 1.0.
    pub const DEFAULT: ComponentWeights = ComponentWeights {
        lexical: 0.25,
        syntactic: 0.30,
        stylistic: 0.25,
        unnatural: 0.20,
    };

    pub fn sum(&self) -> f64 {
        self.lexical + self.syntactic + self.stylistic + self.unnatural
    }

    pub fn combine(&self, scores: &ComponentScores) -> f64 {
        scores.lexical_inconsistency * self.lexical
            + scores.syntactic_inconsistency * self.syntactic
            + scores.stylistic_shift * self.stylistic
            + scores.unnatural_variation * self.unnatural
    }
}

/// Lower bounds (inclusive) of each risk tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl RiskThresholds {
    pub const DEFAULT: RiskThresholds = RiskThresholds {
        high: 0.7,
        medium: 0.5,
        low: 0.3,
    };

    pub fn classify(&self, score: f64) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else if score >= self.low {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}

pub fn risk_level(score: f64) -> RiskLevel {
    RiskThresholds::DEFAULT.classify(score)
}

/// Variation in lexical sophistication: word-length and type-token CV.
pub fn lexical_inconsistency(features: &[FeatureVector]) -> f64 {
    let word_length_cv =
        coefficient_of_variation(&FeatureVector::column(features, Feature::AvgWordLength));
    let ttr_cv =
        coefficient_of_variation(&FeatureVector::column(features, Feature::TypeTokenRatio));

    let mut score = 0.0;
    if word_length_cv > WORD_LENGTH_CV_THRESHOLD {
        score += LEXICAL_STEP;
    }
    if ttr_cv > TTR_CV_THRESHOLD {
        score += LEXICAL_STEP;
    }
    f64::min(score, 1.0)
}

/// Abrupt jumps in average sentence length between neighbouring segments.
pub fn syntactic_inconsistency(features: &[FeatureVector]) -> f64 {
    let jumps =
        consecutive_differences(&FeatureVector::column(features, Feature::AvgSentenceLength));
    (fraction_above(&jumps, SENTENCE_JUMP_THRESHOLD) * SYNTACTIC_SCALE).min(1.0)
}

/// Shifts in function-word usage between neighbouring segments.
pub fn stylistic_shift(features: &[FeatureVector]) -> f64 {
    let shifts =
        consecutive_differences(&FeatureVector::column(features, Feature::FunctionWordRatio));
    (fraction_above(&shifts, FUNCTION_WORD_SHIFT_THRESHOLD) * STYLISTIC_SCALE).min(1.0)
}

/// Share of segments that are multivariate outliers; 0 when the covariance
/// matrix is singular.
pub fn unnatural_variation(features: &[FeatureVector]) -> f64 {
    let rows: Vec<Vec<f64>> = features
        .iter()
        .map(|f| VARIATION_FEATURES.iter().map(|k| f.get(*k)).collect())
        .collect();

    match mahalanobis_distances(&rows) {
        Some(distances) => {
            (fraction_above(&distances, OUTLIER_DISTANCE) * OUTLIER_SCALE).min(1.0)
        }
        None => {
            debug!(segments = features.len(), "covariance singular, unnatural_variation=0");
            0.0
        }
    }
}

/// Leave-one-out deviation of one segment from the rest of the document.
///
/// Mean absolute z-score over the deviation features, divided by 3 and
/// capped at 1. Features whose spread among the other segments is zero
/// are left out of the mean.
pub fn segment_deviation(index: usize, features: &[FeatureVector]) -> f64 {
    if features.len() < 2 || index >= features.len() {
        return 0.0;
    }

    let mut deviations: Vec<f64> = Vec::with_capacity(DEVIATION_FEATURES.len());
    for key in DEVIATION_FEATURES {
        let others: Vec<f64> = features
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, f)| f.get(key))
            .collect();
        let others_mean = mean(&others);
        let others_std = std_dev(&others);
        if is_negligible_spread(others_std, others_mean) {
            continue;
        }
        deviations.push(((features[index].get(key) - others_mean) / others_std).abs());
    }

    if deviations.is_empty() {
        return 0.0;
    }
    (mean(&deviations) / Z_SCORE_NORMALIZER).min(1.0)
}

/// Segments whose deviation exceeds the flag threshold, highest first.
/// Equal scores keep document order.
pub fn identify_suspicious_segments(features: &[FeatureVector]) -> Vec<SuspiciousSegment> {
    let mut suspicious: Vec<SuspiciousSegment> = features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            let score = segment_deviation(i, features);
            (score > SUSPICIOUS_SEGMENT_THRESHOLD).then(|| SuspiciousSegment {
                segment_index: i,
                score,
                features: *f,
            })
        })
        .collect();

    suspicious.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    suspicious
}

/// Score an ordered sequence of segment feature vectors.
pub fn score_segments(features: &[FeatureVector]) -> ObfuscationResult {
    let component_scores = ComponentScores {
        lexical_inconsistency: lexical_inconsistency(features),
        syntactic_inconsistency: syntactic_inconsistency(features),
        stylistic_shift: stylistic_shift(features),
        unnatural_variation: unnatural_variation(features),
    };

    let overall_score = ComponentWeights::DEFAULT
        .combine(&component_scores)
        .clamp(0.0, 1.0);
    let risk_level = risk_level(overall_score);
    let suspicious_segments = identify_suspicious_segments(features);

    debug!(
        segments = features.len(),
        lexical = component_scores.lexical_inconsistency,
        syntactic = component_scores.syntactic_inconsistency,
        stylistic = component_scores.stylistic_shift,
        unnatural = component_scores.unnatural_variation,
        overall = overall_score,
        flagged = suspicious_segments.len(),
        "scorer.components"
    );

    ObfuscationResult {
        overall_score,
        risk_level,
        component_scores,
        suspicious_segments,
    }
}
