// Part-of-Speech Tagging
// Deterministic lexicon + suffix-rule tagger and the degraded placeholder fallback

use std::collections::HashSet;

use super::lexicon::{
    ADJECTIVES, ADVERBS, DETERMINERS, IRREGULAR_VERB_FORMS, MODALS, STOPWORDS, SUBJECT_PRONOUNS,
    VERBS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosTag {
    Noun,
    Verb,
    Adj,
    Adv,
    Other,
}

/// Fractions of word tokens carrying each open-class tag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PosRatios {
    pub noun: f64,
    pub verb: f64,
    pub adj: f64,
    pub adv: f64,
}

impl PosRatios {
    pub fn from_tags(tags: &[PosTag]) -> Self {
        if tags.is_empty() {
            return Self::default();
        }
        let total = tags.len() as f64;
        let count = |tag: PosTag| tags.iter().filter(|t| **t == tag).count() as f64 / total;
        Self {
            noun: count(PosTag::Noun),
            verb: count(PosTag::Verb),
            adj: count(PosTag::Adj),
            adv: count(PosTag::Adv),
        }
    }

    pub fn total(&self) -> f64 {
        self.noun + self.verb + self.adj + self.adv
    }
}

pub trait PosTagger: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tag a sequence of word tokens (punctuation already removed).
    fn tag(&self, words: &[&str]) -> Vec<PosTag>;

    fn ratios(&self, words: &[&str]) -> PosRatios {
        PosRatios::from_tags(&self.tag(words))
    }
}

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ism", "ance", "ence", "ship", "hood", "ist", "dom",
];
const ADJ_SUFFIXES: &[&str] = &["ous", "ful", "less", "able", "ible", "ive", "ical", "ic", "al", "ish"];
const VERB_SUFFIXES: &[&str] = &["ize", "ify"];

/// English tagger driven by closed word lists, a small verb lexicon with
/// inflection stripping, one-word left context and suffix rules.
/// Unknown content words default to nouns.
pub struct LexiconTagger {
    adverbs: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
    closed_class: HashSet<&'static str>,
    verbs: HashSet<&'static str>,
    irregular: HashSet<&'static str>,
    determiners: HashSet<&'static str>,
    modals: HashSet<&'static str>,
    pronouns: HashSet<&'static str>,
}

impl LexiconTagger {
    pub fn new() -> Self {
        let set = |words: &[&'static str]| words.iter().copied().collect::<HashSet<_>>();
        Self {
            adverbs: set(ADVERBS),
            adjectives: set(ADJECTIVES),
            closed_class: set(STOPWORDS),
            verbs: set(VERBS),
            irregular: set(IRREGULAR_VERB_FORMS),
            determiners: set(DETERMINERS),
            modals: set(MODALS),
            pronouns: set(SUBJECT_PRONOUNS),
        }
    }

    fn is_verb_form(&self, word: &str) -> bool {
        if self.verbs.contains(word) {
            return true;
        }
        if !word.is_ascii() || word.len() < 4 {
            return false;
        }

        let bytes = word.as_bytes();
        let len = word.len();
        let mut candidates: Vec<String> = Vec::new();

        if let Some(stem) = word.strip_suffix("ies") {
            candidates.push(format!("{}y", stem));
        }
        if let Some(stem) = word.strip_suffix("es") {
            candidates.push(stem.to_string());
        }
        if let Some(stem) = word.strip_suffix('s') {
            candidates.push(stem.to_string());
        }
        if let Some(stem) = word.strip_suffix("ied") {
            candidates.push(format!("{}y", stem));
        }
        if let Some(stem) = word.strip_suffix("ed") {
            candidates.push(stem.to_string());
            candidates.push(format!("{}e", stem));
            if len >= 5 && bytes[len - 3] == bytes[len - 4] {
                candidates.push(word[..len - 3].to_string());
            }
        }
        if let Some(stem) = word.strip_suffix("ing") {
            candidates.push(stem.to_string());
            candidates.push(format!("{}e", stem));
            if len >= 6 && bytes[len - 4] == bytes[len - 5] {
                candidates.push(word[..len - 4].to_string());
            }
        }

        candidates.iter().any(|c| self.verbs.contains(c.as_str()))
    }

    fn tag_word(&self, word: &str, prev: Option<&str>, prev_tag: Option<PosTag>) -> PosTag {
        if !word.chars().any(char::is_alphabetic) {
            return PosTag::Other;
        }
        if self.adverbs.contains(word) {
            return PosTag::Adv;
        }
        if self.adjectives.contains(word) {
            return PosTag::Adj;
        }
        if self.closed_class.contains(word) {
            return PosTag::Other;
        }
        if self.irregular.contains(word) {
            return PosTag::Verb;
        }

        let after_det =
            prev.map_or(false, |p| self.determiners.contains(p)) || prev_tag == Some(PosTag::Adj);
        let after_modal = prev.map_or(false, |p| self.modals.contains(p));
        let after_subject = prev.map_or(false, |p| self.pronouns.contains(p));

        if self.is_verb_form(word) {
            return if after_det { PosTag::Noun } else { PosTag::Verb };
        }
        if !after_det && (after_modal || after_subject) {
            return PosTag::Verb;
        }

        let len = word.chars().count();
        if len > 4 && word.ends_with("ly") {
            return PosTag::Adv;
        }
        if len > 5 && word.ends_with("ing") {
            return if after_det { PosTag::Noun } else { PosTag::Verb };
        }
        if len > 4 && word.ends_with("ed") {
            return if after_det { PosTag::Adj } else { PosTag::Verb };
        }
        if NOUN_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PosTag::Noun;
        }
        if len > 4 && ADJ_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PosTag::Adj;
        }
        if VERB_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PosTag::Verb;
        }

        PosTag::Noun
    }
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger for LexiconTagger {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn tag(&self, words: &[&str]) -> Vec<PosTag> {
        let mut tags = Vec::with_capacity(words.len());
        let mut prev: Option<String> = None;
        let mut prev_tag: Option<PosTag> = None;

        for word in words {
            let lower = word.to_lowercase();
            let tag = self.tag_word(&lower, prev.as_deref(), prev_tag);
            tags.push(tag);
            prev = Some(lower);
            prev_tag = Some(tag);
        }

        tags
    }
}

/// Degraded-mode tagger: reports fixed ratios without looking at the words.
pub struct PlaceholderTagger;

impl PlaceholderTagger {
    pub const RATIOS: PosRatios = PosRatios {
        noun: 0.25,
        verb: 0.15,
        adj: 0.08,
        adv: 0.05,
    };
}

impl PosTagger for PlaceholderTagger {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn tag(&self, words: &[&str]) -> Vec<PosTag> {
        vec![PosTag::Other; words.len()]
    }

    fn ratios(&self, words: &[&str]) -> PosRatios {
        if words.is_empty() {
            PosRatios::default()
        } else {
            Self::RATIOS
        }
    }
}
