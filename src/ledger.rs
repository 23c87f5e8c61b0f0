//! Processing ledger.
//!
//! Counts what the pipeline has processed and keeps the totals on disk so
//! that they accumulate across CLI invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Processing counters for the current session.
#[derive(Debug)]
pub struct ProcessingLedger {
    /// Sensor records produced by the raw loader
    records_loaded: AtomicU64,
    /// Records passed through the normalizer
    records_normalized: AtomicU64,
    /// Feature records extracted
    features_extracted: AtomicU64,
    /// Records that received labels
    records_labeled: AtomicU64,
    /// Records with no matching label entry
    records_unlabeled: AtomicU64,
    /// Feature vectors assembled
    vectors_assembled: AtomicU64,
    /// Train/test splits performed
    splits_performed: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl ProcessingLedger {
    pub fn new() -> Self {
        Self {
            records_loaded: AtomicU64::new(0),
            records_normalized: AtomicU64::new(0),
            features_extracted: AtomicU64::new(0),
            records_labeled: AtomicU64::new(0),
            records_unlabeled: AtomicU64::new(0),
            vectors_assembled: AtomicU64::new(0),
            splits_performed: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a ledger that continues from the totals stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut ledger = Self::new();
        ledger.persist_path = Some(path);

        if let Err(e) = ledger.load() {
            warn!("Could not load previous ledger totals: {e}");
        }

        ledger
    }

    pub fn record_loaded(&self, count: u64) {
        self.records_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_normalized(&self, count: u64) {
        self.records_normalized.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_extracted(&self, count: u64) {
        self.features_extracted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record the outcome of a label merge.
    pub fn record_labels(&self, labeled: u64, unlabeled: u64) {
        self.records_labeled.fetch_add(labeled, Ordering::Relaxed);
        self.records_unlabeled.fetch_add(unlabeled, Ordering::Relaxed);
    }

    pub fn record_vectors(&self, count: u64) {
        self.vectors_assembled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_split(&self) {
        self.splits_performed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            records_loaded: self.records_loaded.load(Ordering::Relaxed),
            records_normalized: self.records_normalized.load(Ordering::Relaxed),
            features_extracted: self.features_extracted.load(Ordering::Relaxed),
            records_labeled: self.records_labeled.load(Ordering::Relaxed),
            records_unlabeled: self.records_unlabeled.load(Ordering::Relaxed),
            vectors_assembled: self.vectors_assembled.load(Ordering::Relaxed),
            splits_performed: self.splits_performed.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Processing Statistics:\n\
             - Records loaded: {}\n\
             - Records normalized: {}\n\
             - Features extracted: {}\n\
             - Records labeled: {} ({} without labels)\n\
             - Feature vectors assembled: {}\n\
             - Train/test splits: {}",
            stats.records_loaded,
            stats.records_normalized,
            stats.features_extracted,
            stats.records_labeled,
            stats.records_unlabeled,
            stats.vectors_assembled,
            stats.splits_performed
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedLedger {
                records_loaded: stats.records_loaded,
                records_normalized: stats.records_normalized,
                features_extracted: stats.features_extracted,
                records_labeled: stats.records_labeled,
                records_unlabeled: stats.records_unlabeled,
                vectors_assembled: stats.vectors_assembled,
                splits_performed: stats.splits_performed,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedLedger =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.records_loaded
                    .store(persisted.records_loaded, Ordering::Relaxed);
                self.records_normalized
                    .store(persisted.records_normalized, Ordering::Relaxed);
                self.features_extracted
                    .store(persisted.features_extracted, Ordering::Relaxed);
                self.records_labeled
                    .store(persisted.records_labeled, Ordering::Relaxed);
                self.records_unlabeled
                    .store(persisted.records_unlabeled, Ordering::Relaxed);
                self.vectors_assembled
                    .store(persisted.vectors_assembled, Ordering::Relaxed);
                self.splits_performed
                    .store(persisted.splits_performed, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ProcessingLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of ledger counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub records_loaded: u64,
    pub records_normalized: u64,
    pub features_extracted: u64,
    pub records_labeled: u64,
    pub records_unlabeled: u64,
    pub vectors_assembled: u64,
    pub splits_performed: u64,
    pub session_start: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedLedger {
    records_loaded: u64,
    records_normalized: u64,
    features_extracted: u64,
    records_labeled: u64,
    records_unlabeled: u64,
    vectors_assembled: u64,
    splits_performed: u64,
    last_updated: DateTime<Utc>,
}
