//! Core data transformations.
//!
//! This module contains:
//! - Baseline normalization of sensor records
//! - Feature extraction from normalized records
//! - Feature vector assembly by field name
//! - Train/test partitioning of datasets

pub mod features;
pub mod normalize;
pub mod split;
pub mod vector;

// Re-export commonly used types
pub use features::{extract, extract_dataset};
pub use normalize::{normalize, normalize_dataset};
pub use split::{split, split_indices, split_seeded, SplitIndices};
pub use vector::{assemble, assemble_dataset, FeatureMatrix, FeatureRef};
