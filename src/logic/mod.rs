//! Logic Module - Scoring & Training Engines
//!
//! - `features/` - Feature extraction (shape, context, enhanced scores)
//! - `model/` - Transformer classifier and snapshot serializer
//! - `training/` - Sample buffer and classifier-head update
//! - `versioning/` - Model versions and A/B routing
//! - `collab/` - Cache, record store and metrics seams
//! - `analyzer` - The facade callers hold

pub mod config;
pub mod error;
pub mod labels;
pub mod calibration;

pub mod features;
pub mod model;
pub mod training;
pub mod versioning;
pub mod collab;

pub mod analyzer;
