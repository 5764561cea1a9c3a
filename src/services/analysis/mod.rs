// Analysis Pipeline
// Segment -> features -> scoring -> explanation for one document

pub mod consistency;
pub mod explanation;
pub mod features;
pub mod lexicon;
pub mod pos_tagger;
pub mod scorer;
pub mod segmenter;
pub mod statistics;

pub use consistency::style_consistency;
pub use explanation::{rule_based_explanation, ExplanationContext, ExplanationEngine};
pub use features::FeatureExtractor;
pub use lexicon::{LinguisticResources, TaggerKind};
pub use pos_tagger::{LexiconTagger, PlaceholderTagger, PosTagger};
pub use scorer::{risk_level, score_segments};
pub use segmenter::{segment_text, segment_text_with_min};

use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, FeatureVector, ObfuscationResult, Segment, StyleConsistency,
};
use crate::services::config_store::{AnalysisConfig, AppConfig};
use crate::services::text_processor::{preprocess, word_count};

/// Statistical output for one document, before explanation.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub segments: Vec<Segment>,
    pub segment_features: Vec<FeatureVector>,
    pub result: ObfuscationResult,
    pub consistency: StyleConsistency,
}

/// Request pipeline. Holds only read-only state, so one instance can serve
/// concurrent requests.
#[derive(Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    extractor: FeatureExtractor,
    engine: ExplanationEngine,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, engine: ExplanationEngine) -> Self {
        let resources = LinguisticResources::shared(config.pos_tagger);
        Self {
            config,
            extractor: FeatureExtractor::new(resources),
            engine,
        }
    }

    pub fn from_app_config(cfg: &AppConfig) -> Self {
        let engine = ExplanationEngine::from_config(&cfg.effective_explanation(), cfg.proxy_url());
        Self::new(cfg.analysis.clone(), engine)
    }

    /// Rule-based explanations with default thresholds.
    pub fn rule_based() -> Self {
        Self::new(AnalysisConfig::default(), ExplanationEngine::RuleBased)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &ExplanationEngine {
        &self.engine
    }

    /// Validate the request and split it into segments.
    pub fn prepare(&self, request: &AnalyzeRequest) -> Result<Vec<Segment>, AnalysisError> {
        let cleaned;
        let text = if request.preprocess {
            cleaned = preprocess(&request.text, request.remove_urls);
            cleaned.as_str()
        } else {
            request.text.as_str()
        };

        if request.segment_size == 0 {
            return Err(AnalysisError::InvalidSegmentSize);
        }

        let words = word_count(text);
        let required_words = self.config.required_words();
        if words < required_words {
            return Err(AnalysisError::TextTooShort {
                words,
                required: required_words,
            });
        }

        let segments =
            segment_text_with_min(text, request.segment_size, self.config.min_segment_words);
        let required_segments = self.config.required_segments();
        if segments.len() < required_segments {
            return Err(AnalysisError::InsufficientSegments {
                segments: segments.len(),
                required: required_segments,
            });
        }

        Ok(segments)
    }

    /// CPU-bound part of the pipeline; deterministic for a given input.
    pub fn score(&self, segments: Vec<Segment>) -> ScoredDocument {
        let segment_features = self.extractor.extract_all(&segments);
        let result = score_segments(&segment_features);
        let consistency = style_consistency(&segments);
        ScoredDocument {
            segments,
            segment_features,
            result,
            consistency,
        }
    }

    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, AnalysisError> {
        let request_id = Uuid::new_v4();
        let t0 = Instant::now();

        let segments = self.prepare(&request).map_err(|e| {
            info!(
                request_id = %request_id,
                code = e.code(),
                "analysis.rejected: {}", e
            );
            e
        })?;
        debug!(request_id = %request_id, segments = segments.len(), "analysis.segmented");

        let worker = self.clone();
        let scored = tokio::task::spawn_blocking(move || worker.score(segments))
            .await
            .map_err(|e| AnalysisError::Internal(format!("analysis task failed: {}", e)))?;

        let explanation = self
            .engine
            .explain(&ExplanationContext {
                result: &scored.result,
                consistency: &scored.consistency,
                segments: &scored.segments,
            })
            .await;

        info!(
            request_id = %request_id,
            segments = scored.segments.len(),
            score = scored.result.overall_score,
            risk = %scored.result.risk_level,
            flagged = scored.result.suspicious_segments.len(),
            strategy = %self.engine.strategy(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "analysis.completed"
        );

        let ScoredDocument {
            segments,
            segment_features,
            result,
            consistency,
        } = scored;

        Ok(AnalyzeResponse {
            overall_score: result.overall_score,
            risk_level: result.risk_level,
            component_scores: result.component_scores,
            suspicious_segments: result.suspicious_segments,
            explanation,
            style_consistency: consistency,
            num_segments: segments.len(),
            segment_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn uniform_text() -> String {
        "The quiet river runs slowly past the old stone mill. ".repeat(100)
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_validation_order() {
        let analyzer = Analyzer::rule_based();

        let short = AnalyzeRequest::new(words(40)).with_segment_size(0);
        assert_eq!(analyzer.prepare(&short), Err(AnalysisError::InvalidSegmentSize));

        let short = AnalyzeRequest::new(words(99));
        assert_eq!(
            analyzer.prepare(&short).unwrap_err().code(),
            "TEXT_TOO_SHORT"
        );

        let few = AnalyzeRequest::new(words(150)).with_segment_size(500);
        assert_eq!(
            analyzer.prepare(&few),
            Err(AnalysisError::InsufficientSegments { segments: 1, required: 3 })
        );

        let ok = AnalyzeRequest::new(words(600));
        assert_eq!(analyzer.prepare(&ok).unwrap().len(), 3);
    }

    #[test]
    fn test_preprocess_runs_before_validation() {
        let analyzer = Analyzer::rule_based();
        // 100 words only once the URLs are kept; removing them leaves 99.
        let text = format!("{} https://example.com/page", words(99));
        let mut request = AnalyzeRequest::new(text);
        assert!(matches!(
            analyzer.prepare(&request),
            Err(AnalysisError::InsufficientSegments { .. })
        ));

        request.preprocess = true;
        request.remove_urls = true;
        assert!(matches!(
            analyzer.prepare(&request),
            Err(AnalysisError::TextTooShort { words: 99, .. })
        ));
    }

    #[test]
    fn test_config_cannot_lower_validation_gates() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"minSegments":1,"minWords":10}"#).unwrap();
        let analyzer = Analyzer::new(config, ExplanationEngine::RuleBased);

        let single = AnalyzeRequest::new(words(150)).with_segment_size(500);
        assert_eq!(
            analyzer.prepare(&single),
            Err(AnalysisError::InsufficientSegments { segments: 1, required: 3 })
        );

        let short = AnalyzeRequest::new(words(20));
        assert_eq!(
            analyzer.prepare(&short),
            Err(AnalysisError::TextTooShort { words: 20, required: 100 })
        );
    }

    #[test]
    fn test_config_can_raise_validation_gates() {
        let config = AnalysisConfig {
            min_words: 700,
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::new(config, ExplanationEngine::RuleBased);
        assert_eq!(
            analyzer.prepare(&AnalyzeRequest::new(words(600))),
            Err(AnalysisError::TextTooShort { words: 600, required: 700 })
        );
    }

    #[tokio::test]
    async fn test_uniform_document_is_minimal() {
        let analyzer = Analyzer::rule_based();
        let response = analyzer
            .analyze(AnalyzeRequest::new(uniform_text()))
            .await
            .unwrap();

        assert_eq!(response.num_segments, 5);
        assert_eq!(response.segment_features.len(), 5);
        assert_eq!(response.overall_score, 0.0);
        assert_eq!(response.risk_level, RiskLevel::Minimal);
        assert!(response.suspicious_segments.is_empty());
        assert_eq!(response.style_consistency.consistency_score, 1.0);
        assert_eq!(response.explanation, rule_based_explanation(1.0));
    }

    #[tokio::test]
    async fn test_analysis_is_deterministic() {
        let analyzer = Analyzer::rule_based();
        let mut text = String::new();
        for i in 0..8 {
            text.push_str(&uniform_text()[..300]);
            if i % 3 == 0 {
                text.push_str(
                    " Notwithstanding considerable institutional heterogeneity, \
                     contemporary epistemological frameworks necessitate methodological \
                     reconsideration; consequently, interdisciplinary collaboration remains \
                     indispensable. ",
                );
            }
        }

        let a = analyzer.analyze(AnalyzeRequest::new(text.clone())).await.unwrap();
        let b = analyzer.analyze(AnalyzeRequest::new(text)).await.unwrap();
        assert_eq!(a.component_scores, b.component_scores);
        assert_eq!(a.suspicious_segments, b.suspicious_segments);
        assert_eq!(a.segment_features, b.segment_features);
        assert_eq!(a.overall_score, b.overall_score);
        assert!((0.0..=1.0).contains(&a.overall_score));
    }

    #[tokio::test]
    async fn test_placeholder_tagger_config() {
        let config = AnalysisConfig {
            pos_tagger: TaggerKind::Placeholder,
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::new(config, ExplanationEngine::RuleBased);
        let response = analyzer
            .analyze(AnalyzeRequest::new(uniform_text()))
            .await
            .unwrap();
        for fv in &response.segment_features {
            assert_eq!(fv.noun_ratio, 0.25);
            assert_eq!(fv.adv_ratio, 0.05);
        }
    }
}
