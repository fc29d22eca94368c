//! Model Module - Transformer Inference Engine
//!
//! Tách logic inference khỏi feature extraction.
//! Layers bottom-up: tokenizer, positional table, attention, feed-forward,
//! transformer block, classifier, snapshot serializer.

pub mod config;
pub mod math;
pub mod tokenizer;
pub mod positional;
pub mod attention;
pub mod feed_forward;
pub mod block;
pub mod classifier;
pub mod snapshot;

// Re-export common types
pub use config::ModelConfig;
pub use tokenizer::Tokenizer;
pub use positional::PositionalEncoding;
pub use attention::{AttentionWeights, MultiHeadAttention};
pub use feed_forward::{FeedForward, FeedForwardWeights};
pub use block::{LayerWeights, TransformerBlock};
pub use classifier::{PredictionResult, SecretClassifier};
pub use snapshot::{load_model, load_or_init, save_model, ModelSnapshot, ModelWeights};
