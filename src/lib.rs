//! haptic-prep - dataset preparation for haptic adjective learning.
//!
//! This library turns gripper recordings (electrode arrays, pressure and
//! temperature channels per finger) into labeled feature vectors and
//! train/test partitions for adjective classifiers such as "soft" or "rough".
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         haptic-prep                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │ Raw source │──▶│   Labels   │──▶│ Normalizer │            │
//! │  │ (run log)  │   │   (CSV)    │   │ (baseline) │            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! │                                          │                   │
//! │                                          ▼                   │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │ Partitioner│◀──│ Assembler  │◀──│  Features  │            │
//! │  │(train/test)│   │ (vectors)  │   │ (extract)  │            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! │                                                              │
//! │  Datasets persist as versioned JSON envelopes between steps  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use haptic_prep::{core, pipeline, source::JsonRawSource};
//! use std::path::Path;
//!
//! let mut dataset = pipeline::convert(
//!     &JsonRawSource,
//!     Path::new("runs.json"),
//!     Path::new("dataset.json"),
//!     false,
//! )?;
//! core::normalize_dataset(&mut dataset, true)?;
//!
//! let features = core::extract_dataset(&dataset)?;
//! let (train, test) = core::split_seeded(&features, 0.9, 42)?;
//! let row = core::assemble(&train["squeeze"][0], &["max_pdc", "centroid"])?;
//! # Ok::<(), haptic_prep::PipelineError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod store;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{assemble, extract, normalize, split, split_seeded, FeatureMatrix};
pub use error::{PipelineError, Result};
pub use ledger::ProcessingLedger;
pub use pipeline::{attach_labels, convert, load, persist, DatasetInput, LabelReport};
pub use record::{Dataset, FeatureRecord, FeatureValue, SensorRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
