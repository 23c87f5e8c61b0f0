//! Raw run-log loading.
//!
//! A raw source turns a recording file into sensor records grouped by motion
//! type. The JSON run log stores one entry per motion trial, with 2-D
//! channels written as arrays of rows.

use crate::error::{PipelineError, Result};
use crate::record::{group_by_motion, is_known_motion, Dataset, FingerChannels, SensorRecord};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Anything that can produce sensor records from a recording file.
pub trait RawSource {
    fn load_raw(&self, path: &Path) -> Result<Dataset<SensorRecord>>;
}

/// Reads the JSON run-log format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRawSource;

#[derive(Debug, Deserialize)]
struct RawLog {
    runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    name: String,
    run_number: u32,
    motion: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    detailed_state: String,
    fingers: Vec<RawFinger>,
}

#[derive(Debug, Deserialize)]
struct RawFinger {
    electrodes: Vec<Vec<f64>>,
    electrodes_mean: Vec<Vec<f64>>,
    pdc: Vec<f64>,
    pdc_mean: Vec<f64>,
    tdc: Vec<f64>,
    tdc_mean: Vec<f64>,
    tac: Vec<f64>,
    tac_mean: Vec<f64>,
    pac: Vec<Vec<f64>>,
    pac_mean: Vec<Vec<f64>>,
}

impl JsonRawSource {
    /// Parse a run log held in memory.
    pub fn parse(&self, content: &str) -> Result<Dataset<SensorRecord>> {
        let log: RawLog = serde_json::from_str(content)
            .map_err(|e| PipelineError::InvalidFormat(format!("run log: {e}")))?;

        let records = log
            .runs
            .into_iter()
            .map(|run| {
                let motion = run.motion.clone();
                if !is_known_motion(&motion) {
                    warn!(motion = %motion, name = %run.name, "unrecognized motion type");
                }
                run_to_record(run).map(|record| (motion, record))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(group_by_motion(records))
    }
}

impl RawSource for JsonRawSource {
    fn load_raw(&self, path: &Path) -> Result<Dataset<SensorRecord>> {
        let content = std::fs::read_to_string(path)?;
        let dataset = self.parse(&content)?;
        info!(
            path = %path.display(),
            motions = dataset.len(),
            "loaded raw run log"
        );
        Ok(dataset)
    }
}

fn run_to_record(run: RawRun) -> Result<SensorRecord> {
    let label = format!("{}#{}", run.name, run.run_number);
    if run.fingers.is_empty() {
        return Err(PipelineError::DimensionMismatch(format!("{label} has no fingers")));
    }
    let mut record = SensorRecord::new(run.name, run.run_number)
        .with_state(run.state, run.detailed_state);

    for (finger_index, finger) in run.fingers.into_iter().enumerate() {
        let at = |channel: &str| format!("{label} finger {finger_index} {channel}");
        record.push_finger(FingerChannels {
            electrodes: to_matrix(finger.electrodes, &at("electrodes"))?,
            electrodes_mean: to_matrix(finger.electrodes_mean, &at("electrodes_mean"))?,
            pdc: Array1::from(finger.pdc),
            pdc_mean: Array1::from(finger.pdc_mean),
            tdc: Array1::from(finger.tdc),
            tdc_mean: Array1::from(finger.tdc_mean),
            tac: Array1::from(finger.tac),
            tac_mean: Array1::from(finger.tac_mean),
            pac: to_matrix(finger.pac, &at("pac"))?,
            pac_mean: to_matrix(finger.pac_mean, &at("pac_mean"))?,
        });
    }

    Ok(record)
}

/// Stack rows into a samples x columns matrix, rejecting ragged input.
fn to_matrix(rows: Vec<Vec<f64>>, what: &str) -> Result<Array2<f64>> {
    let Some(first) = rows.first() else {
        return Err(PipelineError::DimensionMismatch(format!("{what} has no samples")));
    };
    let cols = first.len();
    let nrows = rows.len();

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(PipelineError::DimensionMismatch(format!(
            "{what} row {i} has {} columns, expected {cols}",
            row.len()
        )));
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, cols), flat)
        .map_err(|e| PipelineError::DimensionMismatch(format!("{what}: {e}")))
}
