//! Entropy helpers
//!
//! Shannon entropy in bits per character, whole-string and windowed.

use std::collections::HashMap;

/// Default sliding window for the entropy distribution feature
pub const ENTROPY_WINDOW: usize = 8;

/// Shannon entropy of the string's characters. Empty string → 0.
pub fn shannon_entropy(text: &str) -> f32 {
    let chars: Vec<char> = text.chars().collect();
    entropy_of(&chars)
}

fn entropy_of(chars: &[char]) -> f32 {
    if chars.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in chars {
        *freq.entry(*c).or_insert(0) += 1;
    }

    let n = chars.len() as f64;
    let entropy: f64 = freq
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.log2()
        })
        .sum();

    entropy.max(0.0) as f32
}

/// Entropy of every `window`-char slice (step 1).
/// Shorter strings yield one entry for the whole string; empty yields none.
pub fn windowed_entropy(text: &str, window: usize) -> Vec<f32> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || window == 0 {
        return Vec::new();
    }
    if chars.len() <= window {
        return vec![entropy_of(&chars)];
    }
    chars.windows(window).map(entropy_of).collect()
}

/// Population mean and standard deviation
pub fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_empty_and_uniform() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 1e-6);
        assert!((shannon_entropy("abcdefgh") - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_entropy_ordering() {
        assert!(shannon_entropy("sk-1234567890abcdef") > shannon_entropy("aaaaaaaa"));
    }

    #[test]
    fn test_windowed_entropy() {
        assert!(windowed_entropy("", ENTROPY_WINDOW).is_empty());
        assert_eq!(windowed_entropy("abc", ENTROPY_WINDOW).len(), 1);
        assert_eq!(windowed_entropy("abcdefghij", ENTROPY_WINDOW).len(), 3);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[1.0, 3.0]);
        assert_eq!(mean, 2.0);
        assert_eq!(std, 1.0);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }
}
