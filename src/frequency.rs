use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WordFrequency {
    pub text: String,
    pub count: u32,
}

impl WordFrequency {
    pub fn new(text: impl Into<String>, count: u32) -> Self {
        WordFrequency {
            text: text.into(),
            count,
        }
    }
}

/// Counts tokens and orders them by count, most frequent first.
///
/// Words with equal counts keep the order of their first occurrence, so identical
/// input always yields identical output. Nothing is truncated here.
pub fn count_words<S: AsRef<str>>(tokens: &[S]) -> Vec<WordFrequency> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut frequencies: Vec<WordFrequency> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        match index.get(token) {
            Some(&i) => frequencies[i].count += 1,
            None => {
                index.insert(token, frequencies.len());
                frequencies.push(WordFrequency::new(token, 1));
            }
        }
    }

    // stable: ties stay in first-occurrence order
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies
}

/// [`count_words`] followed by truncation to `limit` entries.
pub fn aggregate<S: AsRef<str>>(tokens: &[S], limit: usize) -> Result<Vec<WordFrequency>> {
    if tokens.is_empty() {
        return Err(Error::EmptyVocabulary);
    }

    let mut frequencies = count_words(tokens);
    frequencies.truncate(limit.max(1));
    Ok(frequencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_keeps_the_most_frequent() {
        let mut tokens = vec!["testing"; 5];
        tokens.extend(vec!["example"; 2]);

        let result = aggregate(&tokens, 1).unwrap();
        assert_eq!(result, vec![WordFrequency::new("testing", 5)]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let tokens: Vec<String> = vec![];
        assert!(matches!(aggregate(&tokens, 10), Err(Error::EmptyVocabulary)));
    }

    #[test]
    fn counts_match_occurrences_and_are_sorted() {
        let tokens = ["beta", "alpha", "beta", "gamma", "alpha", "beta", "delta"];
        let result = aggregate(&tokens, 100).unwrap();

        for entry in &result {
            let occurrences = tokens.iter().filter(|t| **t == entry.text).count();
            assert_eq!(entry.count as usize, occurrences);
        }
        assert!(result.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn ties_are_stable_across_runs() {
        let tokens = ["kiwi", "plum", "pear", "plum", "kiwi", "pear"];
        let first = aggregate(&tokens, 10).unwrap();
        let second = aggregate(&tokens, 10).unwrap();

        assert_eq!(first, second);
        let order: Vec<_> = first.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(order, vec!["kiwi", "plum", "pear"]);
    }

    #[test]
    fn output_never_exceeds_limit() {
        let tokens: Vec<String> = (0..50).map(|i| format!("word{}", (b'a' + i % 26) as char)).collect();
        for limit in [1, 3, 26, 300] {
            assert!(aggregate(&tokens, limit).unwrap().len() <= limit);
        }
    }
}
