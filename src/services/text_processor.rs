// Text Processing Service
// Preprocessing, sentence splitting and tokenization shared by the analysis pipeline

use regex::Regex;
use std::sync::OnceLock;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("url regex"))
}

fn disallowed_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[^\w\s.,;:!?\-'"]"#).expect("clean regex"))
}

/// Normalize typographic punctuation to ASCII equivalents
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    text.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Collapse every whitespace run to a single space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_urls(text: &str) -> String {
    url_re().replace_all(text, "").into_owned()
}

/// Drop characters outside word/space/basic punctuation while keeping style markers
pub fn clean_text(text: &str) -> String {
    let normalized = normalize_punctuation(text);
    disallowed_chars_re().replace_all(&normalized, "").into_owned()
}

/// Full preprocessing pipeline: optional URL removal, cleaning, whitespace collapse
pub fn preprocess(text: &str, strip_urls: bool) -> String {
    let text = if strip_urls {
        remove_urls(text)
    } else {
        text.to_string()
    };
    normalize_whitespace(&clean_text(&text))
}

/// Count whitespace-delimited words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn is_closing(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

/// Split text into sentences on terminal punctuation.
///
/// Runs such as `?!` or `...` end a single sentence, closing quotes and
/// brackets stay with the sentence they close, and decimals like `3.14`
/// never split. Trailing text without terminal punctuation is a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i].1;
        if !is_terminal(ch) {
            i += 1;
            continue;
        }

        // Decimal numbers
        if ch == '.'
            && i > 0
            && i + 1 < chars.len()
            && chars[i - 1].1.is_ascii_digit()
            && chars[i + 1].1.is_ascii_digit()
        {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (is_terminal(chars[j].1) || is_closing(chars[j].1)) {
            j += 1;
        }

        if j == chars.len() || chars[j].1.is_whitespace() {
            let end = if j == chars.len() { text.len() } else { chars[j].0 };
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
        i = j;
    }

    let remaining = text[start..].trim();
    if !remaining.is_empty() {
        sentences.push(remaining.to_string());
    }

    sentences
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
}

impl Token<'_> {
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Word/punctuation tokenizer.
///
/// Word tokens are letter/digit runs with internal apostrophes or hyphens
/// (`don't`, `well-known`) and numbers with internal separators (`3.14`,
/// `1,000`); every other non-space character is its own punctuation token.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    re: Regex,
}

impl Tokenizer {
    pub fn new() -> Self {
        let re = Regex::new(
            r"\p{N}+(?:[.,]\p{N}+)+|[\p{L}\p{N}]+(?:['\u{2019}\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]",
        )
            .expect("token regex");
        Self { re }
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        self.re
            .find_iter(text)
            .map(|m| {
                let s = m.as_str();
                let kind = if s.chars().next().map_or(false, char::is_alphanumeric) {
                    TokenKind::Word
                } else {
                    TokenKind::Punct
                };
                Token { text: s, kind }
            })
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        let input = "Hello\u{201c}World\u{201d} it\u{2019}s";
        let output = normalize_punctuation(input);
        assert_eq!(output, "Hello\"World\" it's");
    }

    #[test]
    fn test_preprocess_removes_urls_and_symbols() {
        let text = "See   https://example.com/page now!  Price: $5 #tag";
        assert_eq!(preprocess(text, true), "See now! Price: 5 tag");
        assert!(preprocess(text, false).contains("https:example.compage"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\tthree\nfour "), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences("First one. Second one! Third one? Tail");
        assert_eq!(sentences, vec!["First one.", "Second one!", "Third one?", "Tail"]);
    }

    #[test]
    fn test_split_sentences_keeps_decimals_and_runs() {
        let sentences = split_sentences("Pi is 3.14 roughly... Really?! \"Yes.\" Done");
        assert_eq!(
            sentences,
            vec!["Pi is 3.14 roughly...", "Really?!", "\"Yes.\"", "Done"]
        );
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn test_tokenizer_separates_punctuation() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("Don't stop, well-known café; ok.");
        let words: Vec<&str> = tokens.iter().filter(|t| t.is_word()).map(|t| t.text).collect();
        let puncts: Vec<&str> = tokens.iter().filter(|t| !t.is_word()).map(|t| t.text).collect();
        assert_eq!(words, vec!["Don't", "stop", "well-known", "café", "ok"]);
        assert_eq!(puncts, vec![",", ";", "."]);
    }

    #[test]
    fn test_tokenizer_keeps_decimals_whole() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("Pi is 3.14, about 1,000 times 2.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["Pi", "is", "3.14", ",", "about", "1,000", "times", "2", "."]);
        assert_eq!(tokens.iter().filter(|t| t.is_word()).count(), 7);
    }
}
