// Linguistic Resources
// Word lists and the shared, read-only resource bundle used by feature extraction

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::pos_tagger::{LexiconTagger, PlaceholderTagger, PosTagger};
use crate::services::text_processor::Tokenizer;

/// Closed-class English words counted by `function_word_ratio`.
pub const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "whose", "this", "that", "these", "those", "am", "is", "are", "was", "were",
    "be", "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing",
    "would", "should", "could", "might", "must", "shall", "will", "can", "may", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "just", "now", "also",
    "upon", "yet", "however", "although", "though", "whether", "since", "unless", "within",
    "without", "among", "onto", "toward", "towards", "across", "along", "around", "behind",
    "beside", "beyond", "despite", "except", "per", "via", "whereas", "either", "neither",
    "every", "another", "many", "much", "several", "something", "anything", "nothing",
    "everything", "someone", "anyone", "everyone", "nobody", "whoever", "whatever", "already",
    "still", "even", "ever", "rather", "quite", "almost", "often", "always", "never",
    "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't", "won't", "can't",
    "couldn't", "shouldn't", "wouldn't", "hasn't", "haven't", "hadn't", "it's", "i'm",
    "you're", "we're", "they're", "i've", "you've", "we've", "they've", "that's", "there's",
];

pub const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its",
    "our", "their", "some", "any", "every", "each", "no", "another", "which", "whose",
];

pub const MODALS: &[&str] = &[
    "will", "would", "can", "could", "shall", "should", "may", "might", "must", "do",
    "does", "did", "don't", "doesn't", "didn't", "won't", "can't", "cannot",
];

pub const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "we", "they", "it", "who"];

pub const ADVERBS: &[&str] = &[
    "very", "too", "also", "just", "often", "never", "always", "here", "there", "now", "then",
    "again", "only", "soon", "still", "already", "almost", "quite", "rather", "perhaps",
    "however", "even", "ever", "yet", "well", "away", "back", "together", "instead", "later",
    "once", "therefore", "thus", "indeed", "sometimes", "usually", "maybe", "else", "today",
    "tomorrow", "yesterday", "far", "forward", "abroad", "anyway", "somewhat", "seldom",
];

pub const ADJECTIVES: &[&str] = &[
    "good", "new", "first", "last", "long", "great", "little", "own", "other", "old", "right",
    "big", "high", "different", "small", "large", "next", "early", "young", "important", "few",
    "public", "bad", "same", "able", "late", "hard", "major", "better", "best", "certain",
    "free", "full", "clear", "whole", "real", "sure", "strong", "possible", "true", "simple",
    "quiet", "slow", "fast", "dark", "light", "happy", "sad", "deep", "short", "low", "easy",
    "hot", "cold", "warm", "poor", "rich", "wide", "recent", "common", "special", "final",
    "main", "human", "local", "white", "black", "red", "green", "blue", "serious", "entire",
    "difficult", "modern", "nice", "wrong", "huge", "tiny", "bright", "soft", "likely",
    "friendly", "lonely", "ugly", "daily", "elderly", "lovely", "silly", "costly", "deadly",
    "worse", "worst", "such", "several", "many", "much", "more", "most", "less", "least",
    "fine", "calm", "brave", "wise", "proud", "rare", "pure", "strange", "familiar", "gentle",
];

/// Base forms; inflected forms are resolved by suffix stripping.
pub const VERBS: &[&str] = &[
    "be", "have", "do", "say", "make", "go", "take", "see", "know", "get", "give", "find",
    "think", "tell", "become", "show", "leave", "feel", "put", "bring", "begin", "keep",
    "hold", "write", "stand", "hear", "let", "mean", "set", "meet", "run", "pay", "sit",
    "speak", "lie", "lead", "read", "grow", "lose", "fall", "send", "build", "understand",
    "draw", "break", "spend", "cut", "rise", "drive", "buy", "wear", "choose", "seek",
    "throw", "catch", "deal", "win", "forget", "teach", "sell", "fight", "sleep", "eat",
    "drink", "walk", "talk", "help", "work", "play", "move", "live", "believe", "happen",
    "include", "continue", "learn", "change", "follow", "stop", "create", "allow", "add",
    "remember", "love", "consider", "appear", "wait", "serve", "die", "expect", "stay",
    "reach", "kill", "remain", "suggest", "raise", "pass", "require", "report", "decide",
    "pull", "ask", "seem", "try", "call", "need", "want", "look", "use", "come", "like",
    "turn", "start", "provide", "watch", "carry", "explain", "hope", "develop", "offer",
    "agree", "receive", "describe", "argue", "claim", "reveal", "enjoy", "travel", "flow",
    "pour", "sing", "swim", "fly", "smile", "laugh", "cry", "open", "close", "answer",
    "return", "enter", "visit", "notice", "prove", "join", "apply", "produce", "reduce",
    "increase", "improve", "measure", "compare", "analyze", "analyse", "examine", "observe",
];

pub const IRREGULAR_VERB_FORMS: &[&str] = &[
    "said", "made", "went", "gone", "took", "taken", "saw", "seen", "knew", "known", "got",
    "gotten", "gave", "given", "found", "thought", "told", "became", "showed", "shown", "left",
    "felt", "brought", "began", "begun", "kept", "held", "wrote", "written", "stood", "heard",
    "meant", "met", "ran", "paid", "sat", "spoke", "spoken", "led", "grew", "grown", "lost",
    "fell", "fallen", "sent", "built", "understood", "drew", "drawn", "broke", "broken",
    "spent", "rose", "risen", "drove", "driven", "bought", "wore", "worn", "chose", "chosen",
    "sought", "threw", "thrown", "caught", "won", "forgot", "forgotten", "taught", "sold",
    "fought", "slept", "ate", "eaten", "drank", "drunk", "came", "sang", "sung", "swam",
    "flew", "flown", "lay", "lain", "goes", "says", "does", "has",
];

/// Which POS tagging capability backs the feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaggerKind {
    #[default]
    Lexicon,
    /// Degraded mode: fixed POS ratios instead of per-token tags.
    Placeholder,
}

/// Linguistic resources built once at start-up and shared read-only.
pub struct LinguisticResources {
    tokenizer: Tokenizer,
    stopwords: HashSet<&'static str>,
    tagger: Box<dyn PosTagger>,
}

impl LinguisticResources {
    pub fn new(kind: TaggerKind) -> Self {
        let tagger: Box<dyn PosTagger> = match kind {
            TaggerKind::Lexicon => Box::new(LexiconTagger::new()),
            TaggerKind::Placeholder => Box::new(PlaceholderTagger),
        };
        Self {
            tokenizer: Tokenizer::new(),
            stopwords: STOPWORDS.iter().copied().collect(),
            tagger,
        }
    }

    pub fn shared(kind: TaggerKind) -> Arc<Self> {
        Arc::new(Self::new(kind))
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn tagger(&self) -> &dyn PosTagger {
        self.tagger.as_ref()
    }

    /// Expects a lowercased word.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }
}

impl Default for LinguisticResources {
    fn default() -> Self {
        Self::new(TaggerKind::default())
    }
}

impl std::fmt::Debug for LinguisticResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinguisticResources")
            .field("stopwords", &self.stopwords.len())
            .field("tagger", &self.tagger.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_are_lowercase_and_unique() {
        let set: HashSet<&str> = STOPWORDS.iter().copied().collect();
        assert_eq!(set.len(), STOPWORDS.len());
        assert!(STOPWORDS.iter().all(|w| *w == w.to_lowercase()));
    }

    #[test]
    fn test_resources_stopword_lookup() {
        let resources = LinguisticResources::default();
        assert!(resources.is_stopword("the"));
        assert!(resources.is_stopword("don't"));
        assert!(!resources.is_stopword("river"));
        assert_eq!(resources.tagger().name(), "lexicon");
    }
}
