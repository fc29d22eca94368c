//! Enhanced Features (slots 14-18)
//!
//! Heuristic scores layered on top of the basic shape/context features.
//! Every score is clamped to [0, 1].

use super::context::has_quote;
use super::entropy::{mean_std, windowed_entropy, ENTROPY_WINDOW};
use super::patterns::{matches_known_pattern, SEPARATORS};
use super::vector::{FeatureExtractor, FeatureVector};

/// Max entropy of an 8-char window (log2 8)
const MAX_WINDOW_ENTROPY: f32 = 3.0;

const HIGH_KEYWORDS: &[&str] = &[
    "api_key", "apikey", "secret", "password", "private_key",
    "access_token", "auth_token", "credentials",
];
const MEDIUM_KEYWORDS: &[&str] = &["token", "key", "auth", "bearer", "credential"];
const LOW_KEYWORDS: &[&str] = &["config", "env", "setting", "id"];

pub struct EnhancedFeatures<'a> {
    pub secret: &'a str,
    pub context: &'a str,
}

impl<'a> EnhancedFeatures<'a> {
    pub fn new(secret: &'a str, context: &'a str) -> Self {
        Self { secret, context }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CharClass {
    Letter,
    Digit,
    Other,
}

fn char_class(c: char) -> CharClass {
    if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_alphabetic() {
        CharClass::Letter
    } else {
        CharClass::Other
    }
}

/// Alternation density + separator density + length bucket
pub fn structural_score(secret: &str) -> f32 {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }

    let alternation = if chars.len() < 2 {
        0.0
    } else {
        let switches = chars
            .windows(2)
            .filter(|pair| {
                let (a, b) = (char_class(pair[0]), char_class(pair[1]));
                a != CharClass::Other && b != CharClass::Other && a != b
            })
            .count();
        switches as f32 / (chars.len() - 1) as f32
    };

    let separators = chars.iter().filter(|c| SEPARATORS.contains(**c)).count();
    let separator_density = (separators as f32 / chars.len() as f32).min(0.2);

    let length_bonus = match chars.len() {
        n if n >= 32 => 0.3,
        n if n >= 20 => 0.2,
        n if n >= 12 => 0.1,
        _ => 0.0,
    };

    (0.5 * alternation + separator_density + length_bonus).clamp(0.0, 1.0)
}

/// 50/50 blend of normalised mean window entropy and window uniformity
pub fn entropy_distribution_score(secret: &str) -> f32 {
    let windows = windowed_entropy(secret, ENTROPY_WINDOW);
    if windows.is_empty() {
        return 0.0;
    }
    let (mean, std) = mean_std(&windows);
    let mean_part = mean / MAX_WINDOW_ENTROPY;
    let spread_part = 1.0 - (std / 1.5).min(1.0);
    (0.5 * mean_part + 0.5 * spread_part).clamp(0.0, 1.0)
}

/// Prefix/suffix heuristics plus letter/digit balance
pub fn api_key_pattern_score(secret: &str) -> f32 {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }

    let mut score = 0.0f32;

    // vendor-style prefix: "sk_", "ghp_", "xoxb-" followed by a long body
    if let Some(pos) = chars.iter().position(|c| *c == '_' || *c == '-') {
        if (2..=5).contains(&pos) && chars.len() - pos - 1 >= 16 {
            score += 0.3;
        }
    }

    let trailing_run = chars.iter().rev().take_while(|c| c.is_ascii_alphanumeric()).count();
    if trailing_run >= 16 {
        score += 0.2;
    }

    let letters = chars.iter().filter(|c| c.is_ascii_alphabetic()).count() as f32;
    let digits = chars.iter().filter(|c| c.is_ascii_digit()).count() as f32;
    if letters + digits > 0.0 {
        let balance = 1.0 - (letters - digits).abs() / (letters + digits);
        score += 0.5 * balance;
    }

    score.clamp(0.0, 1.0)
}

/// High/medium/low keyword buckets + assignment and quote bonus
pub fn context_keyword_score(context: &str) -> f32 {
    let lower = context.to_lowercase();
    let hits = |bucket: &[&str]| bucket.iter().filter(|kw| lower.contains(*kw)).count() as f32;

    let mut score = hits(HIGH_KEYWORDS) * 0.3 + hits(MEDIUM_KEYWORDS) * 0.15 + hits(LOW_KEYWORDS) * 0.05;
    if context.contains('=') {
        score += 0.1;
    }
    if has_quote(context) {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

impl FeatureExtractor for EnhancedFeatures<'_> {
    fn extract(&self, vector: &mut FeatureVector) {
        let known = if matches_known_pattern(self.secret) { 1.0 } else { 0.0 };
        vector.set_by_name("known_pattern", known);
        vector.set_by_name("structural_score", structural_score(self.secret));
        vector.set_by_name("entropy_distribution", entropy_distribution_score(self.secret));
        vector.set_by_name("api_key_pattern", api_key_pattern_score(self.secret));
        vector.set_by_name("context_keyword_score", context_keyword_score(self.context));
    }
}
