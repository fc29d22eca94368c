//! Training Module - Sample buffer and incremental head update

pub mod sample;
pub mod engine;

pub use sample::{SampleBuffer, TrainingSample};
pub use engine::{TrainingEngine, TrainingReport};
