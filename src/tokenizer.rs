use std::collections::HashSet;

use regex::Regex;

use crate::stopwords::STOP_WORDS;

pub const DEFAULT_MIN_WORD_LENGTH: usize = 3;

pub struct Tokenizer {
    // everything that is not a lowercase letter, a digit or whitespace
    regex: Regex,
    pub filter: HashSet<String>,
    pub min_word_length: usize,
    pub exclude_numbers: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        let regex = Regex::new(r"[^a-z0-9\s]").expect("Unable to compile tokenization regex");

        Tokenizer {
            regex,
            filter: STOP_WORDS.iter().map(|el| el.to_string()).collect(),
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            exclude_numbers: true,
        }
    }
}

impl Tokenizer {
    pub fn with_min_word_length(mut self, size: usize) -> Self {
        self.min_word_length = size;
        self
    }

    /// Replaces the stop-word set.
    pub fn with_stop_words(mut self, value: &[&str]) -> Self {
        self.filter = value.iter().map(|el| el.to_lowercase()).collect();
        self
    }

    /// Adds words to the current stop-word set.
    pub fn with_extra_stop_words(mut self, value: &[&str]) -> Self {
        self.filter.extend(value.iter().map(|el| el.to_lowercase()));
        self
    }

    pub fn with_exclude_numbers(mut self, value: bool) -> Self {
        self.exclude_numbers = value;
        self
    }

    /// Splits `text` into normalized tokens, in source order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = self.regex.replace_all(&lowered, " ");

        let mut iter: Box<dyn Iterator<Item = &str> + '_> =
            Box::new(cleaned.split_whitespace().filter(|str| !str.is_empty()));

        if self.min_word_length > 0 {
            iter = Box::new(iter.filter(|str| str.chars().count() >= self.min_word_length));
        }

        if !self.filter.is_empty() {
            iter = Box::new(iter.filter(|str| !self.filter.contains(*str)));
        }

        if self.exclude_numbers {
            iter = Box::new(iter.filter(|word| !word.chars().any(|c| c.is_ascii_digit())));
        }

        iter.map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Tokenizer;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tokenizer = Tokenizer::default().with_stop_words(&["the", "over"]);
        let tokens = tokenizer.tokenize("The Quick Brown Fox Jumps Over The Lazy Dog");

        assert_eq!(
            tokens,
            vec!["quick", "brown", "fox", "jumps", "lazy", "dog"]
        );
    }

    #[test]
    fn punctuation_becomes_a_separator() {
        let tokens = Tokenizer::default().tokenize("rust-lang's compiler, (borrow)checker!");
        assert_eq!(tokens, vec!["rust", "lang", "compiler", "borrow", "checker"]);
    }

    #[test]
    fn tokens_with_digits_are_dropped_entirely() {
        let tokens = Tokenizer::default().tokenize("covid19 2024 abc123 release");
        assert_eq!(tokens, vec!["release"]);
    }

    #[test]
    fn contractions_split_into_fragments() {
        // "don't" -> "don" + "t"; "t" is too short, "don" survives
        let tokens = Tokenizer::default().tokenize("don't panic");
        assert_eq!(tokens, vec!["don", "panic"]);
    }

    #[test]
    fn non_ascii_letters_are_separators() {
        let tokens = Tokenizer::default().tokenize("café naïve résumé");
        assert_eq!(tokens, vec!["caf", "sum"]);
    }

    #[test]
    fn every_token_respects_filters() {
        let tokenizer = Tokenizer::default();
        let text = "It's 9am and the 3 servers, web01 & db, were rebooting again; \
                    they'll be back once the migration finishes. OK?";

        for token in tokenizer.tokenize(text) {
            assert!(token.len() >= 3, "{token} too short");
            assert!(!token.chars().any(|c| c.is_ascii_digit()), "{token} has a digit");
            assert!(!tokenizer.filter.contains(&token), "{token} is a stop word");
            assert!(token.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn min_length_is_configurable() {
        let tokens = Tokenizer::default()
            .with_min_word_length(5)
            .tokenize("tiny words vanish quickly");
        assert_eq!(tokens, vec!["words", "vanish", "quickly"]);
    }

    #[test]
    fn numbers_can_be_kept() {
        let tokens = Tokenizer::default()
            .with_exclude_numbers(false)
            .tokenize("web01 backend");
        assert_eq!(tokens, vec!["web01", "backend"]);
    }
}
