//! Features Module - Feature Extraction Engine
//!
//! Turns (secret, context, variable name) into the fixed 19-slot vector
//! the model consumes. Pure and side-effect free.

pub mod layout;
pub mod vector;
pub mod entropy;
pub mod patterns;
pub mod secret;
pub mod context;
pub mod enhanced;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutInfo};
pub use vector::{FeatureExtractor, FeatureVector};
pub use entropy::shannon_entropy;

use context::ContextFeatures;
use enhanced::EnhancedFeatures;
use secret::SecretShapeFeatures;

/// Extract the full feature vector for a candidate secret
pub fn extract_features(secret: &str, context: &str, variable_name: Option<&str>) -> FeatureVector {
    let mut vector = FeatureVector::new();

    SecretShapeFeatures::new(secret).extract(&mut vector);
    ContextFeatures::new(context, variable_name).extract(&mut vector);
    EnhancedFeatures::new(secret, context).extract(&mut vector);

    vector
}
