//! Record types for haptic motion trials.
//!
//! This module contains:
//! - Sensor records holding raw, baseline and normalized channels
//! - Feature records holding named scalar and vector features
//! - The dataset mapping from motion type to records

pub mod dataset;
pub mod types;

// Re-export commonly used types
pub use dataset::{group_by_motion, motion_lengths, total_records, Dataset};
pub use types::{
    is_known_motion, FeatureRecord, FeatureValue, FingerChannels, SensorRecord,
    ELECTRODE_CHANNELS, MOTION_TYPES, PAC_CHANNELS,
};
