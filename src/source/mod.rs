//! Input sources for the preparation pipeline.
//!
//! Raw recordings and adjective annotations are read through traits so that
//! other recording or annotation formats can be plugged in.

pub mod labels;
pub mod raw;

// Re-export commonly used types
pub use labels::{CsvLabelSource, LabelMap, LabelSource};
pub use raw::{JsonRawSource, RawSource};
