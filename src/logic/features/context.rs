//! Context Features (slots 10-13)
//!
//! Risk signals from the surrounding source line and the variable name.

use super::vector::{FeatureExtractor, FeatureVector};

/// Risk keywords, +0.2 each
const RISK_KEYWORDS: &[&str] = &["auth", "key", "secret", "token", "password"];

/// Declaration keywords counted raw
const DECLARATION_KEYWORDS: &[&str] = &["const", "let", "process.env"];

/// Substrings that make a variable name look credential-like
const NAME_HINTS: &[&str] = &["secret", "key", "token"];

pub struct ContextFeatures<'a> {
    pub context: &'a str,
    pub variable_name: Option<&'a str>,
}

impl<'a> ContextFeatures<'a> {
    pub fn new(context: &'a str, variable_name: Option<&'a str>) -> Self {
        Self { context, variable_name }
    }
}

/// Weighted keyword hits in the lowercased context, clamped to 1.0
pub fn context_risk(context: &str) -> f32 {
    let lower = context.to_lowercase();
    let risk: f32 = RISK_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .map(|_| 0.2)
        .sum();
    risk.min(1.0)
}

pub fn has_quote(context: &str) -> bool {
    context.contains('"') || context.contains('\'') || context.contains('`')
}

/// Number of declaration keywords present (each counted once)
pub fn keyword_count(context: &str) -> f32 {
    DECLARATION_KEYWORDS.iter().filter(|kw| context.contains(*kw)).count() as f32
}

/// ALL_CAPS → 0.8, credential-ish → 0.6, other → 0.2, missing → 0.0
pub fn variable_name_score(name: Option<&str>) -> f32 {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return 0.0,
    };

    if name.to_uppercase() == name {
        return 0.8;
    }

    let lower = name.to_lowercase();
    if NAME_HINTS.iter().any(|hint| lower.contains(hint)) {
        return 0.6;
    }

    0.2
}

impl FeatureExtractor for ContextFeatures<'_> {
    fn extract(&self, vector: &mut FeatureVector) {
        vector.set_by_name("context_risk", context_risk(self.context));
        vector.set_by_name("quote_present", if has_quote(self.context) { 1.0 } else { 0.0 });
        vector.set_by_name("keyword_count", keyword_count(self.context));
        vector.set_by_name("variable_name_score", variable_name_score(self.variable_name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_risk_clamped() {
        assert_eq!(context_risk("nothing here"), 0.0);
        assert!((context_risk("const apiKey = 1") - 0.2).abs() < 1e-6);
        assert_eq!(context_risk("AUTH KEY SECRET TOKEN PASSWORD auth"), 1.0);
    }

    #[test]
    fn test_keyword_count() {
        assert_eq!(keyword_count("const a = process.env.X; let b"), 3.0);
        assert_eq!(keyword_count("var x"), 0.0);
    }

    #[test]
    fn test_variable_name_score() {
        assert_eq!(variable_name_score(None), 0.0);
        assert_eq!(variable_name_score(Some("")), 0.0);
        assert_eq!(variable_name_score(Some("API_KEY")), 0.8);
        assert_eq!(variable_name_score(Some("apiKey")), 0.6);
        assert_eq!(variable_name_score(Some("userName")), 0.2);
    }
}
