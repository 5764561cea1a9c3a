// Explanation Engine
// Rule-based narrative with optional hosted or local model commentary

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::consistency::mean_sophistication;
use crate::models::{ObfuscationResult, Segment, StyleConsistency};
use crate::services::config_store::{ExplanationConfig, ExplanationStrategy};
use crate::services::providers::{
    require_api_key, ChatResult, ProviderClient, ProviderError, ProviderKind, LOCAL_DEFAULT_MODEL,
    LOCAL_DEFAULT_URL,
};

const SIGNIFICANT_BAND: f64 = 0.5;
const MODERATE_BAND: f64 = 0.7;

const MAX_EXCERPTS: usize = 3;
const EXCERPT_CHARS: usize = 600;
const MAX_TOKENS: u32 = 600;
const RETRY_BACKOFF_MS: u64 = 400;

const SIGNIFICANT_TEXT: &str = "The segments of this text differ markedly in style. \
Vocabulary complexity rises and falls abruptly between sections, sentence patterns change \
in ways that do not follow a natural progression, and several stylistic markers vary more \
than a single author's writing normally would. These shifts are consistent with deliberate \
authorship obfuscation and the document deserves closer review.";

const MODERATE_TEXT: &str = "The segments of this text show some stylistic variation. \
Differences in vocabulary and sentence structure are present but could still reflect one \
author writing at different times or for different purposes. A few segments stand out from \
the rest; examining the flagged segments individually is recommended.";

const CONSISTENT_TEXT: &str = "The segments of this text share a stable style. Lexical \
diversity, sentence complexity and the other measured features stay within the range \
expected of a single author. The small variations that remain follow ordinary patterns \
and give no sign of deliberate obfuscation.";

const SYSTEM_PROMPT: &str = "You are a forensic stylometry assistant. Given statistical \
measurements of stylistic inconsistency across segments of one document, write a short \
plain-language explanation (at most two paragraphs) of whether the document shows signs of \
deliberate authorship obfuscation. Refer to segments by their index. Do not invent numbers.";

/// Deterministic explanation chosen by consistency band.
pub fn rule_based_explanation(consistency_score: f64) -> &'static str {
    if consistency_score < SIGNIFICANT_BAND {
        SIGNIFICANT_TEXT
    } else if consistency_score < MODERATE_BAND {
        MODERATE_TEXT
    } else {
        CONSISTENT_TEXT
    }
}

/// Everything an explanation source may look at.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationContext<'a> {
    pub result: &'a ObfuscationResult,
    pub consistency: &'a StyleConsistency,
    pub segments: &'a [Segment],
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}

/// Segment indices to quote: flagged segments by rank, then document order.
fn excerpt_indices(ctx: &ExplanationContext<'_>) -> Vec<usize> {
    let mut indices: Vec<usize> = Vec::with_capacity(MAX_EXCERPTS);
    let flagged = ctx.result.suspicious_segments.iter().map(|s| s.segment_index);
    let in_order = ctx.segments.iter().map(|s| s.index);
    for idx in flagged.chain(in_order) {
        if indices.len() == MAX_EXCERPTS {
            break;
        }
        if !indices.contains(&idx) && idx < ctx.segments.len() {
            indices.push(idx);
        }
    }
    indices
}

pub fn build_prompt(ctx: &ExplanationContext<'_>) -> String {
    let r = ctx.result;
    let c = &r.component_scores;
    let mut prompt = format!(
        "Overall obfuscation score: {:.3} (risk level {})\n\
         Component scores: lexical_inconsistency={:.3}, syntactic_inconsistency={:.3}, \
         stylistic_shift={:.3}, unnatural_variation={:.3}\n\
         Style consistency: {:.3} (variance {:.3}, mean lexical sophistication {:.2}/10) \
         over {} segments\n",
        r.overall_score,
        r.risk_level,
        c.lexical_inconsistency,
        c.syntactic_inconsistency,
        c.stylistic_shift,
        c.unnatural_variation,
        ctx.consistency.consistency_score,
        ctx.consistency.variance,
        mean_sophistication(ctx.segments),
        ctx.consistency.segments_analyzed,
    );

    if r.suspicious_segments.is_empty() {
        prompt.push_str("Flagged segments: none\n");
    } else {
        let flagged: Vec<String> = r
            .suspicious_segments
            .iter()
            .map(|s| format!("#{} ({:.2})", s.segment_index, s.score))
            .collect();
        prompt.push_str(&format!("Flagged segments: {}\n", flagged.join(", ")));
    }

    for idx in excerpt_indices(ctx) {
        prompt.push_str(&format!(
            "\nSegment #{} excerpt:\n{}\n",
            idx,
            excerpt(&ctx.segments[idx].text)
        ));
    }

    prompt
}

/// Timeout and attempt budget for one remote explanation.
#[derive(Clone)]
pub struct RemoteSettings {
    pub client: ProviderClient,
    pub timeout: Duration,
    pub attempts: u32,
}

impl RemoteSettings {
    fn from_config(cfg: &ExplanationConfig, proxy: Option<&str>) -> Self {
        let client = match proxy {
            Some(url) => ProviderClient::with_proxy(url).unwrap_or_else(|e| {
                warn!("[EXPLANATION] invalid proxy {}: {}, connecting directly", url, e);
                ProviderClient::new()
            }),
            None => ProviderClient::new(),
        };
        Self {
            client,
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            attempts: cfg.attempts(),
        }
    }
}

/// Source of the natural-language explanation, fixed at start-up.
///
/// Remote variants never fail outward: any provider error, timeout or empty
/// reply ends in the rule-based text.
#[derive(Clone)]
pub enum ExplanationEngine {
    RuleBased,
    Api {
        provider: ProviderKind,
        model: String,
        api_key: String,
        base_url: Option<String>,
        settings: RemoteSettings,
    },
    Local {
        model: String,
        base_url: String,
        settings: RemoteSettings,
    },
}

impl ExplanationEngine {
    pub fn from_config(cfg: &ExplanationConfig, proxy: Option<&str>) -> Self {
        Self::from_config_with_keys(cfg, proxy, require_api_key)
    }

    /// Build the engine, resolving credentials through `lookup_key`.
    pub fn from_config_with_keys<F>(cfg: &ExplanationConfig, proxy: Option<&str>, lookup_key: F) -> Self
    where
        F: FnOnce(&str) -> Result<String, ProviderError>,
    {
        match cfg.strategy {
            ExplanationStrategy::RuleBased => ExplanationEngine::RuleBased,
            ExplanationStrategy::Api => {
                let provider = match cfg.provider.parse::<ProviderKind>() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("[EXPLANATION] {}, using rule-based explanations", e);
                        return ExplanationEngine::RuleBased;
                    }
                };
                let api_key = match lookup_key(provider.name()) {
                    Ok(k) => k,
                    Err(e) => {
                        warn!("[EXPLANATION] {}, using rule-based explanations", e);
                        return ExplanationEngine::RuleBased;
                    }
                };
                info!("[EXPLANATION] {} API key found, length: {}", provider, api_key.len());
                ExplanationEngine::Api {
                    provider,
                    model: cfg
                        .model
                        .clone()
                        .unwrap_or_else(|| provider.default_model().to_string()),
                    api_key,
                    base_url: cfg.base_url.clone(),
                    settings: RemoteSettings::from_config(cfg, proxy),
                }
            }
            ExplanationStrategy::Local => ExplanationEngine::Local {
                model: cfg
                    .model
                    .clone()
                    .unwrap_or_else(|| LOCAL_DEFAULT_MODEL.to_string()),
                base_url: cfg
                    .base_url
                    .clone()
                    .unwrap_or_else(|| LOCAL_DEFAULT_URL.to_string()),
                // Local models do not go through the proxy
                settings: RemoteSettings::from_config(cfg, None),
            },
        }
    }

    pub fn strategy(&self) -> ExplanationStrategy {
        match self {
            ExplanationEngine::RuleBased => ExplanationStrategy::RuleBased,
            ExplanationEngine::Api { .. } => ExplanationStrategy::Api,
            ExplanationEngine::Local { .. } => ExplanationStrategy::Local,
        }
    }

    pub async fn explain(&self, ctx: &ExplanationContext<'_>) -> String {
        let fallback = rule_based_explanation(ctx.consistency.consistency_score);

        let remote = match self {
            ExplanationEngine::RuleBased => return fallback.to_string(),
            ExplanationEngine::Api {
                provider,
                model,
                api_key,
                base_url,
                settings,
            } => {
                let user = build_prompt(ctx);
                let label = format!("{}:{}", provider, model);
                call_with_retry(settings, &label, || {
                    settings.client.complete(
                        *provider,
                        base_url.as_deref(),
                        model,
                        api_key,
                        SYSTEM_PROMPT,
                        &user,
                        MAX_TOKENS,
                    )
                })
                .await
            }
            ExplanationEngine::Local {
                model,
                base_url,
                settings,
            } => {
                let prompt = format!("{}\n\n{}", SYSTEM_PROMPT, build_prompt(ctx));
                let label = format!("local:{}", model);
                call_with_retry(settings, &label, || {
                    settings.client.generate_local(base_url, model, &prompt)
                })
                .await
            }
        };

        match remote {
            Some(text) => text,
            None => {
                warn!("[EXPLANATION] provider unavailable, falling back to rule-based text");
                fallback.to_string()
            }
        }
    }
}

/// Run `call` under the timeout, retrying once with a short backoff.
async fn call_with_retry<F, Fut>(settings: &RemoteSettings, label: &str, call: F) -> Option<String>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<ChatResult, ProviderError>>,
{
    let attempts = settings.attempts.clamp(1, 2);
    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(settings.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(settings.timeout.as_secs())),
        };

        match outcome {
            Ok(result) => {
                info!(
                    "[EXPLANATION] {} ok attempt={} latency_ms={}",
                    label, attempt, result.latency_ms
                );
                return Some(result.content);
            }
            Err(e) => {
                warn!("[EXPLANATION] {} error attempt={} : {}", label, attempt, e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64)).await;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComponentScores, FeatureVector, RiskLevel, SuspiciousSegment};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn result_with_flags(flags: &[usize]) -> ObfuscationResult {
        ObfuscationResult {
            overall_score: 0.42,
            risk_level: RiskLevel::Low,
            component_scores: ComponentScores {
                lexical_inconsistency: 0.5,
                syntactic_inconsistency: 0.0,
                stylistic_shift: 0.75,
                unnatural_variation: 0.0,
            },
            suspicious_segments: flags
                .iter()
                .map(|i| SuspiciousSegment {
                    segment_index: *i,
                    score: 0.9,
                    features: FeatureVector::default(),
                })
                .collect(),
        }
    }

    fn segments(n: usize, len: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment {
                index: i,
                word_count: 1,
                text: format!("{}", i).repeat(len),
            })
            .collect()
    }

    fn consistency(score: f64) -> StyleConsistency {
        StyleConsistency {
            variance: 1.0,
            consistency_score: score,
            segments_analyzed: 5,
        }
    }

    #[test]
    fn test_rule_based_bands() {
        assert_eq!(rule_based_explanation(0.0), SIGNIFICANT_TEXT);
        assert_eq!(rule_based_explanation(0.4999), SIGNIFICANT_TEXT);
        assert_eq!(rule_based_explanation(0.5), MODERATE_TEXT);
        assert_eq!(rule_based_explanation(0.6999), MODERATE_TEXT);
        assert_eq!(rule_based_explanation(0.7), CONSISTENT_TEXT);
        assert_eq!(rule_based_explanation(1.0), CONSISTENT_TEXT);
    }

    #[test]
    fn test_prompt_limits_excerpts() {
        let result = result_with_flags(&[3]);
        let segs = segments(5, 1000);
        let cons = consistency(0.8);
        let ctx = ExplanationContext {
            result: &result,
            consistency: &cons,
            segments: &segs,
        };

        assert_eq!(excerpt_indices(&ctx), vec![3, 0, 1]);
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("0.420"));
        assert!(prompt.contains("risk level LOW"));
        assert!(prompt.contains("#3 (0.90)"));
        assert_eq!(prompt.matches("excerpt:").count(), 3);
        assert!(!prompt.contains("Segment #4"));
        assert!(!prompt.contains(&"3".repeat(601)));
        assert!(prompt.contains(&format!("{}...", "3".repeat(600))));
    }

    #[test]
    fn test_missing_key_selects_rule_based() {
        let cfg = ExplanationConfig {
            strategy: ExplanationStrategy::Api,
            ..ExplanationConfig::default()
        };
        let engine = ExplanationEngine::from_config_with_keys(&cfg, None, |p| {
            Err(ProviderError::MissingApiKey(p.to_string()))
        });
        assert_eq!(engine.strategy(), ExplanationStrategy::RuleBased);
    }

    #[test]
    fn test_unknown_provider_selects_rule_based() {
        let cfg = ExplanationConfig {
            strategy: ExplanationStrategy::Api,
            provider: "mystery".to_string(),
            ..ExplanationConfig::default()
        };
        let engine = ExplanationEngine::from_config_with_keys(&cfg, None, |_| Ok("k".to_string()));
        assert_eq!(engine.strategy(), ExplanationStrategy::RuleBased);
    }

    #[test]
    fn test_api_engine_uses_provider_default_model() {
        let cfg = ExplanationConfig {
            strategy: ExplanationStrategy::Api,
            provider: "deepseek".to_string(),
            ..ExplanationConfig::default()
        };
        let engine = ExplanationEngine::from_config_with_keys(&cfg, None, |_| Ok("sk".to_string()));
        match engine {
            ExplanationEngine::Api { provider, model, settings, .. } => {
                assert_eq!(provider, ProviderKind::DeepSeek);
                assert_eq!(model, "deepseek-chat");
                assert_eq!(settings.attempts, 2);
                assert_eq!(settings.timeout, Duration::from_secs(30));
            }
            _ => panic!("expected api engine"),
        }
    }

    #[tokio::test]
    async fn test_rule_based_engine_explains_without_network() {
        let result = result_with_flags(&[]);
        let segs = segments(3, 10);
        let cons = consistency(0.3);
        let ctx = ExplanationContext {
            result: &result,
            consistency: &cons,
            segments: &segs,
        };
        let text = ExplanationEngine::RuleBased.explain(&ctx).await;
        assert_eq!(text, SIGNIFICANT_TEXT);
    }

    #[tokio::test]
    async fn test_unresponsive_local_model_times_out_retries_once_and_falls_back() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                // Never answer
                held.push(socket);
            }
        });

        let engine = ExplanationEngine::Local {
            model: "test".to_string(),
            base_url: format!("http://{}", addr),
            settings: RemoteSettings {
                client: ProviderClient::new(),
                timeout: Duration::from_millis(200),
                attempts: 2,
            },
        };

        let result = result_with_flags(&[1]);
        let segs = segments(3, 10);
        let cons = consistency(0.6);
        let ctx = ExplanationContext {
            result: &result,
            consistency: &cons,
            segments: &segs,
        };

        let text = engine.explain(&ctx).await;
        assert_eq!(text, MODERATE_TEXT);
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }
}
