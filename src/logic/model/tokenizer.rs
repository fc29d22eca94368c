//! Tokenizer - Character-level secret tokenization
//!
//! One token per char (char code), truncated to `max_seq_len`.
//! Codes outside the vocabulary map to 0.

/// Unknown-token id
pub const UNKNOWN_TOKEN: usize = 0;

#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    vocab_size: usize,
    max_seq_len: usize,
}

impl Tokenizer {
    pub fn new(vocab_size: usize, max_seq_len: usize) -> Self {
        Self { vocab_size, max_seq_len }
    }

    /// Empty secret → empty sequence (valid, not an error)
    pub fn tokenize(&self, secret: &str) -> Vec<usize> {
        secret
            .chars()
            .take(self.max_seq_len)
            .map(|c| {
                let code = c as usize;
                if code < self.vocab_size { code } else { UNKNOWN_TOKEN }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret() {
        assert!(Tokenizer::new(1000, 50).tokenize("").is_empty());
    }

    #[test]
    fn test_char_codes_and_unknown() {
        let tokenizer = Tokenizer::new(1000, 50);
        assert_eq!(tokenizer.tokenize("Ab"), vec![65, 98]);
        // U+2713 is outside the vocab
        assert_eq!(tokenizer.tokenize("a✓"), vec![97, UNKNOWN_TOKEN]);
    }

    #[test]
    fn test_truncation() {
        let tokens = Tokenizer::new(1000, 50).tokenize(&"x".repeat(80));
        assert_eq!(tokens.len(), 50);
    }
}
