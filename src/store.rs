//! Persisted dataset envelope.
//!
//! Datasets are written as JSON wrapped in a small envelope that records the
//! format tag, its version, the producer and which kind of record it holds.
//! Reading checks the file extension and every envelope field before the
//! records are handed back.

use crate::error::{PipelineError, Result};
use crate::record::{Dataset, FeatureRecord, SensorRecord};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Format tag written into every envelope.
pub const FORMAT_TAG: &str = "haptic-dataset";

/// Current envelope version.
pub const FORMAT_VERSION: u32 = 1;

/// Extension required on persisted dataset files.
pub const DATASET_EXTENSION: &str = "json";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "haptic-prep";

/// Which record type an envelope holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Sensor,
    Feature,
}

/// Record types that can be stored in an envelope.
pub trait StoredRecord: Serialize + DeserializeOwned {
    const KIND: RecordKind;
}

impl StoredRecord for SensorRecord {
    const KIND: RecordKind = RecordKind::Sensor;
}

impl StoredRecord for FeatureRecord {
    const KIND: RecordKind = RecordKind::Feature;
}

/// Producer metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Envelope around a persisted dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEnvelope<M> {
    pub format: String,
    pub format_version: u32,
    /// When the file was written (RFC3339)
    pub produced_at: String,
    pub producer: Producer,
    pub record_kind: RecordKind,
    pub motions: M,
}

/// Envelope fields checked before the records are decoded.
#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    format: String,
    format_version: u32,
    record_kind: RecordKind,
}

/// Builds envelopes stamped with one producer instance.
pub struct EnvelopeBuilder {
    instance_id: Uuid,
}

impl EnvelopeBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Wrap a dataset for writing.
    pub fn build<'a, T: StoredRecord>(&self, dataset: &'a Dataset<T>) -> DatasetEnvelope<&'a Dataset<T>> {
        DatasetEnvelope {
            format: FORMAT_TAG.to_string(),
            format_version: FORMAT_VERSION,
            produced_at: Utc::now().to_rfc3339(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: Some(self.instance_id.to_string()),
            },
            record_kind: T::KIND,
            motions: dataset,
        }
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject paths without the dataset extension.
pub fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(DATASET_EXTENSION) => Ok(()),
        _ => Err(PipelineError::InvalidFormat(format!(
            "{} is not a .{DATASET_EXTENSION} dataset file",
            path.display()
        ))),
    }
}

/// Serialize a dataset envelope to a JSON string.
pub fn to_json<T: StoredRecord>(builder: &EnvelopeBuilder, dataset: &Dataset<T>) -> Result<String> {
    Ok(serde_json::to_string(&builder.build(dataset))?)
}

/// Decode a dataset envelope, validating tag, version and record kind.
pub fn from_json<T: StoredRecord>(content: &[u8]) -> Result<Dataset<T>> {
    let header: EnvelopeHeader = serde_json::from_slice(content)
        .map_err(|e| PipelineError::InvalidFormat(format!("not a dataset envelope: {e}")))?;

    if header.format != FORMAT_TAG {
        return Err(PipelineError::InvalidFormat(format!(
            "unexpected format tag '{}'",
            header.format
        )));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(PipelineError::InvalidFormat(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            header.format_version
        )));
    }
    if header.record_kind != T::KIND {
        return Err(PipelineError::InvalidFormat(format!(
            "file holds {:?} records, expected {:?}",
            header.record_kind,
            T::KIND
        )));
    }

    let envelope: DatasetEnvelope<Dataset<T>> = serde_json::from_slice(content)
        .map_err(|e| PipelineError::InvalidFormat(format!("corrupt dataset records: {e}")))?;
    Ok(envelope.motions)
}

/// Write a dataset to `path`, creating parent directories as needed.
pub fn write_dataset<T: StoredRecord>(dataset: &Dataset<T>, path: &Path) -> Result<()> {
    check_extension(path)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = to_json(&EnvelopeBuilder::new(), dataset)?;
    std::fs::write(path, json)?;

    info!(
        path = %path.display(),
        motions = dataset.len(),
        kind = ?T::KIND,
        "persisted dataset"
    );
    Ok(())
}

/// Read a dataset written by [`write_dataset`].
pub fn read_dataset<T: StoredRecord>(path: &Path) -> Result<Dataset<T>> {
    check_extension(path)?;
    let content = std::fs::read(path)?;
    let dataset = from_json(&content)?;
    info!(path = %path.display(), motions = dataset.len(), "loaded dataset");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::types::fixtures::two_finger_record;
    use std::path::PathBuf;

    fn sample_dataset() -> Dataset<SensorRecord> {
        let mut record = two_finger_record("foam", 1, 3);
        record.labels.insert("soft".to_string());
        let mut dataset = Dataset::new();
        dataset.insert("squeeze".to_string(), vec![record]);
        dataset
    }

    #[test]
    fn test_extension_check() {
        assert!(check_extension(Path::new("runs/all.json")).is_ok());
        assert!(check_extension(Path::new("runs/all.JSON")).is_ok());
        assert!(matches!(
            check_extension(Path::new("runs/all.pkl")),
            Err(PipelineError::InvalidFormat(_))
        ));
        assert!(check_extension(Path::new("runs/all")).is_err());
    }

    #[test]
    fn test_envelope_fields() {
        let builder = EnvelopeBuilder::new();
        let dataset = sample_dataset();
        let json = to_json(&builder, &dataset).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["format"], FORMAT_TAG);
        assert_eq!(value["format_version"], FORMAT_VERSION);
        assert_eq!(value["record_kind"], "sensor");
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(
            value["producer"]["instance_id"],
            builder.instance_id().to_string()
        );
        assert!(value["motions"]["squeeze"].is_array());
    }

    #[test]
    fn test_round_trip_in_memory() {
        let dataset = sample_dataset();
        let json = to_json(&EnvelopeBuilder::new(), &dataset).unwrap();
        let decoded: Dataset<SensorRecord> = from_json(json.as_bytes()).unwrap();
        assert_eq!(decoded, dataset);
    }

    #[test]
    fn test_wrong_record_kind() {
        let json = to_json(&EnvelopeBuilder::new(), &sample_dataset()).unwrap();
        let err = from_json::<FeatureRecord>(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected Feature"));
    }

    #[test]
    fn test_rejects_foreign_content() {
        let err = from_json::<SensorRecord>(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFormat(_)));

        let other = br#"{"format": "other", "format_version": 1, "record_kind": "sensor", "motions": {}}"#;
        let err = from_json::<SensorRecord>(other).unwrap_err();
        assert!(err.to_string().contains("format tag"));

        let future = br#"{"format": "haptic-dataset", "format_version": 9, "record_kind": "sensor", "motions": {}}"#;
        let err = from_json::<SensorRecord>(future).unwrap_err();
        assert!(err.to_string().contains("version 9"));
    }

    #[test]
    fn test_write_and_read_file() {
        let path: PathBuf = std::env::temp_dir()
            .join("haptic-prep-store-test")
            .join(format!("{}.json", Uuid::new_v4()));

        let dataset = sample_dataset();
        write_dataset(&dataset, &path).unwrap();
        let loaded: Dataset<SensorRecord> = read_dataset(&path).unwrap();
        assert_eq!(loaded, dataset);

        let _ = std::fs::remove_file(&path);
    }
}
