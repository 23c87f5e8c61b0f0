//! Conversion and label-attachment façades.
//!
//! These functions tie the raw and label sources to the persisted dataset
//! format. They hold no state; the CLI records their outcomes in the
//! processing ledger.

use crate::error::Result;
use crate::record::{total_records, Dataset, FeatureRecord, SensorRecord};
use crate::source::{LabelMap, LabelSource, RawSource};
use crate::store::{self, StoredRecord};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A dataset held in memory or a path to a persisted one.
#[derive(Debug, Clone)]
pub enum DatasetInput {
    InMemory(Dataset<SensorRecord>),
    Path(PathBuf),
}

impl From<Dataset<SensorRecord>> for DatasetInput {
    fn from(dataset: Dataset<SensorRecord>) -> Self {
        DatasetInput::InMemory(dataset)
    }
}

impl From<PathBuf> for DatasetInput {
    fn from(path: PathBuf) -> Self {
        DatasetInput::Path(path)
    }
}

/// Outcome of merging labels into a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelReport {
    /// Records that matched at least one label entry
    pub labeled: usize,
    /// Records with no matching entry, left unchanged
    pub unlabeled: usize,
}

/// Convert a raw recording into a dataset, optionally persisting it.
pub fn convert<S: RawSource + ?Sized>(
    source: &S,
    input: &Path,
    output: &Path,
    persist_result: bool,
) -> Result<Dataset<SensorRecord>> {
    if persist_result {
        // Fail before the raw file is parsed
        store::check_extension(output)?;
    }

    let dataset = source.load_raw(input)?;
    info!(
        input = %input.display(),
        records = total_records(&dataset),
        "converted raw recording"
    );

    if persist_result {
        persist(&dataset, output)?;
    }
    Ok(dataset)
}

/// Load a persisted sensor dataset.
pub fn load(path: &Path) -> Result<Dataset<SensorRecord>> {
    store::read_dataset(path)
}

/// Load a persisted feature dataset.
pub fn load_features(path: &Path) -> Result<Dataset<FeatureRecord>> {
    store::read_dataset(path)
}

/// Persist a sensor or feature dataset.
pub fn persist<T: StoredRecord>(dataset: &Dataset<T>, path: &Path) -> Result<()> {
    store::write_dataset(dataset, path)
}

/// Attach adjective labels from `labels_path` to every record of `input`.
///
/// A path input is loaded first. Labels are merged into each record's
/// existing set; records without an entry are left unchanged.
pub fn attach_labels<L: LabelSource + ?Sized>(
    input: DatasetInput,
    output: &Path,
    label_source: &L,
    labels_path: &Path,
    persist_result: bool,
) -> Result<(Dataset<SensorRecord>, LabelReport)> {
    let mut dataset = match input {
        DatasetInput::InMemory(dataset) => dataset,
        DatasetInput::Path(path) => load(&path)?,
    };

    let labels = label_source.load_labels(labels_path)?;
    let report = merge_labels(&mut dataset, &labels);

    if persist_result {
        persist(&dataset, output)?;
    }
    Ok((dataset, report))
}

/// Merge labels into every matching record of `dataset`.
pub fn merge_labels(dataset: &mut Dataset<SensorRecord>, labels: &LabelMap) -> LabelReport {
    let mut report = LabelReport::default();

    for (motion, records) in dataset.iter_mut() {
        for record in records.iter_mut() {
            let (name, run_number) = record.key();
            match labels.labels_for(name, run_number) {
                Some(adjectives) => {
                    record.labels.extend(adjectives);
                    report.labeled += 1;
                }
                None => {
                    warn!(
                        motion = %motion,
                        name = %record.name,
                        run_number = record.run_number,
                        "no adjective labels for record"
                    );
                    report.unlabeled += 1;
                }
            }
        }
    }

    info!(
        labeled = report.labeled,
        unlabeled = report.unlabeled,
        "attached adjective labels"
    );
    report
}
