// Feature Extraction
// Converts one text segment into its fixed-schema stylometric feature vector

use std::collections::HashMap;
use std::sync::Arc;

use super::lexicon::LinguisticResources;
use super::statistics::{mean, variance};
use crate::models::{FeatureVector, Segment};
use crate::services::text_processor::split_sentences;

const FLESCH_BASE: f64 = 206.835;
const FLESCH_SENTENCE_WEIGHT: f64 = 1.015;
const FLESCH_SYLLABLE_WEIGHT: f64 = 84.6;

/// Vowel-group syllable heuristic.
///
/// Counts entries into a vowel run (`y` counts as a vowel), drops one for a
/// trailing `e`, and never returns less than 1.
pub fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count: i64 = 0;
    let mut previous_was_vowel = false;

    for ch in lower.chars() {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }

    if lower.ends_with('e') {
        count -= 1;
    }

    count.max(1) as usize
}

pub fn flesch_reading_ease(words: &[&str], sentence_count: usize) -> f64 {
    if words.is_empty() || sentence_count == 0 {
        return 0.0;
    }
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let word_count = words.len() as f64;
    FLESCH_BASE
        - FLESCH_SENTENCE_WEIGHT * (word_count / sentence_count as f64)
        - FLESCH_SYLLABLE_WEIGHT * (syllables as f64 / word_count)
}

/// Stateless extractor over shared linguistic resources.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    resources: Arc<LinguisticResources>,
}

impl FeatureExtractor {
    pub fn new(resources: Arc<LinguisticResources>) -> Self {
        Self { resources }
    }

    /// Compute the feature vector for one segment.
    ///
    /// A segment without sentences or word tokens yields the all-zero vector.
    pub fn extract(&self, segment: &str) -> FeatureVector {
        let tokenizer = self.resources.tokenizer();
        let sentences = split_sentences(segment);
        if sentences.is_empty() {
            return FeatureVector::default();
        }

        let mut sentence_lengths: Vec<f64> = Vec::with_capacity(sentences.len());
        let mut words: Vec<&str> = Vec::new();
        let mut commas = 0usize;
        let mut semicolons = 0usize;

        for sentence in &sentences {
            let tokens = tokenizer.tokenize(sentence);
            sentence_lengths.push(tokens.len() as f64);
            for token in tokens {
                if token.is_word() {
                    words.push(token.text);
                } else if token.text == "," {
                    commas += 1;
                } else if token.text == ";" {
                    semicolons += 1;
                }
            }
        }

        if words.is_empty() {
            return FeatureVector::default();
        }

        let total = words.len() as f64;
        let sentence_count = sentences.len() as f64;

        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for w in &lowered {
            *freq.entry(w.as_str()).or_insert(0) += 1;
        }
        let hapax = freq.values().filter(|&&c| c == 1).count() as f64;
        let function_words = lowered
            .iter()
            .filter(|w| self.resources.is_stopword(w))
            .count() as f64;

        let pos = self.resources.tagger().ratios(&words);

        FeatureVector {
            avg_word_length: words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / total,
            type_token_ratio: freq.len() as f64 / total,
            hapax_legomena_ratio: hapax / total,
            avg_sentence_length: mean(&sentence_lengths),
            sentence_length_variance: variance(&sentence_lengths),
            noun_ratio: pos.noun,
            verb_ratio: pos.verb,
            adj_ratio: pos.adj,
            adv_ratio: pos.adv,
            function_word_ratio: function_words / total,
            comma_per_sentence: commas as f64 / sentence_count,
            semicolon_per_sentence: semicolons as f64 / sentence_count,
            flesch_reading_ease: flesch_reading_ease(&words, sentences.len()),
        }
    }

    /// Extract every segment, preserving segment order.
    pub fn extract_all(&self, segments: &[Segment]) -> Vec<FeatureVector> {
        segments.iter().map(|s| self.extract(&s.text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use crate::services::analysis::lexicon::TaggerKind;
    use crate::services::analysis::pos_tagger::PlaceholderTagger;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(LinguisticResources::shared(TaggerKind::Lexicon))
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("table"), 1);
        assert_eq!(count_syllables("reading"), 2);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("42"), 1);
    }

    #[test]
    fn test_empty_segment_returns_default_vector() {
        let ex = extractor();
        assert_eq!(ex.extract(""), FeatureVector::default());
        assert_eq!(ex.extract("   \n\t  "), FeatureVector::default());
        assert_eq!(ex.extract("... !!! ;;"), FeatureVector::default());
    }

    #[test]
    fn test_extract_known_values() {
        let ex = extractor();
        let fv = ex.extract("The cat sat, and the cat ran. It was fun; we laughed!");

        // words: The cat sat and the cat ran It was fun we laughed -> 12
        // lowercase types: the cat sat and ran it was fun we laughed -> 10
        assert!((fv.type_token_ratio - 10.0 / 12.0).abs() < 1e-12);
        // singletons: sat and ran it was fun we laughed -> 8
        assert!((fv.hapax_legomena_ratio - 8.0 / 12.0).abs() < 1e-12);
        // sentence tokens: 9 and 7
        assert!((fv.avg_sentence_length - 8.0).abs() < 1e-12);
        assert!((fv.sentence_length_variance - 1.0).abs() < 1e-12);
        assert!((fv.comma_per_sentence - 0.5).abs() < 1e-12);
        assert!((fv.semicolon_per_sentence - 0.5).abs() < 1e-12);
        // stopwords: the and the it was we -> 6
        assert!((fv.function_word_ratio - 0.5).abs() < 1e-12);
        let chars = 3 + 3 + 3 + 3 + 3 + 3 + 3 + 2 + 3 + 3 + 2 + 7;
        assert!((fv.avg_word_length - chars as f64 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_features_in_unit_interval() {
        let ex = extractor();
        let fv = ex.extract(
            "Careful analysis reveals remarkable patterns. Researchers quickly examined \
             the evidence; they found several unusual shifts in vocabulary, structure, and tone.",
        );
        for feature in [
            Feature::TypeTokenRatio,
            Feature::HapaxLegomenaRatio,
            Feature::NounRatio,
            Feature::VerbRatio,
            Feature::AdjRatio,
            Feature::AdvRatio,
            Feature::FunctionWordRatio,
        ] {
            let v = fv.get(feature);
            assert!((0.0..=1.0).contains(&v), "{} = {}", feature, v);
        }
        assert!(fv.noun_ratio + fv.verb_ratio + fv.adj_ratio + fv.adv_ratio <= 1.0);
        assert!(fv.sentence_length_variance >= 0.0);
        assert!(fv.avg_sentence_length > 0.0);
    }

    #[test]
    fn test_flesch_formula() {
        let words = ["The", "cat", "sat"];
        let expected = 206.835 - 1.015 * 3.0 - 84.6 * 1.0;
        assert!((flesch_reading_ease(&words, 1) - expected).abs() < 1e-9);
        assert_eq!(flesch_reading_ease(&[], 1), 0.0);
        assert_eq!(flesch_reading_ease(&words, 0), 0.0);
    }

    #[test]
    fn test_placeholder_tagger_feeds_fixed_ratios() {
        let ex = FeatureExtractor::new(LinguisticResources::shared(TaggerKind::Placeholder));
        let fv = ex.extract("Some words appear here.");
        assert_eq!(fv.noun_ratio, PlaceholderTagger::RATIOS.noun);
        assert_eq!(fv.verb_ratio, PlaceholderTagger::RATIOS.verb);
    }

    #[test]
    fn test_extract_all_preserves_order() {
        let ex = extractor();
        let segments = vec![
            Segment { index: 0, word_count: 2, text: "Short one.".to_string() },
            Segment { index: 1, word_count: 0, text: String::new() },
        ];
        let features = ex.extract_all(&segments);
        assert_eq!(features.len(), 2);
        assert!(features[0].avg_word_length > 0.0);
        assert_eq!(features[1], FeatureVector::default());
    }
}
