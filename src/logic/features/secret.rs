//! Secret Shape Features (slots 0-9)
//!
//! Lexical properties of the candidate value itself.

use std::collections::HashSet;

use super::entropy::shannon_entropy;
use super::patterns::{has_known_prefix, is_base64_shape, is_hex_shape, SPECIAL_CHARS};
use super::vector::{FeatureExtractor, FeatureVector};

/// Extractor for the shape of the secret string
pub struct SecretShapeFeatures<'a> {
    pub secret: &'a str,
}

impl<'a> SecretShapeFeatures<'a> {
    pub fn new(secret: &'a str) -> Self {
        Self { secret }
    }

    pub fn length(&self) -> f32 {
        self.secret.chars().count() as f32
    }

    /// Distinct chars / total chars, 0 for empty
    pub fn unique_ratio(&self) -> f32 {
        let total = self.secret.chars().count();
        if total == 0 {
            return 0.0;
        }
        let unique: HashSet<char> = self.secret.chars().collect();
        unique.len() as f32 / total as f32
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl FeatureExtractor for SecretShapeFeatures<'_> {
    fn extract(&self, vector: &mut FeatureVector) {
        let s = self.secret;

        vector.set_by_name("length", self.length());
        vector.set_by_name("entropy", shannon_entropy(s));
        vector.set_by_name("has_special", flag(s.chars().any(|c| SPECIAL_CHARS.contains(c))));
        vector.set_by_name("has_digit", flag(s.chars().any(char::is_numeric)));
        vector.set_by_name("has_upper", flag(s.chars().any(char::is_uppercase)));
        vector.set_by_name("has_lower", flag(s.chars().any(char::is_lowercase)));
        vector.set_by_name("unique_ratio", self.unique_ratio());
        vector.set_by_name("known_prefix", flag(has_known_prefix(s)));
        vector.set_by_name("base64_shape", flag(is_base64_shape(s)));
        vector.set_by_name("hex_shape", flag(is_hex_shape(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_flags() {
        let mut vector = FeatureVector::new();
        SecretShapeFeatures::new("Ab3$").extract(&mut vector);

        assert_eq!(vector.get_by_name("length"), Some(4.0));
        assert_eq!(vector.get_by_name("has_special"), Some(1.0));
        assert_eq!(vector.get_by_name("has_digit"), Some(1.0));
        assert_eq!(vector.get_by_name("has_upper"), Some(1.0));
        assert_eq!(vector.get_by_name("has_lower"), Some(1.0));
        assert_eq!(vector.get_by_name("unique_ratio"), Some(1.0));
        assert_eq!(vector.get_by_name("base64_shape"), Some(0.0));
    }

    #[test]
    fn test_has_digit_unicode() {
        let mut vector = FeatureVector::new();
        SecretShapeFeatures::new("key\u{0663}").extract(&mut vector);
        assert_eq!(vector.get_by_name("has_digit"), Some(1.0));

        let mut vector = FeatureVector::new();
        SecretShapeFeatures::new("x\u{00b2}").extract(&mut vector);
        assert_eq!(vector.get_by_name("has_digit"), Some(1.0));

        let mut vector = FeatureVector::new();
        SecretShapeFeatures::new("abc").extract(&mut vector);
        assert_eq!(vector.get_by_name("has_digit"), Some(0.0));
    }

    #[test]
    fn test_unique_ratio() {
        assert_eq!(SecretShapeFeatures::new("aabb").unique_ratio(), 0.5);
        assert_eq!(SecretShapeFeatures::new("").unique_ratio(), 0.0);
    }
}
