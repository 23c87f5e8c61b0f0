//! Sensor and feature records for a single gripper motion trial.
//!
//! A sensor record stores five per-finger channel families together with the
//! baseline captured before contact. Normalized channels are appended by the
//! normalizer and start out empty.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of electrodes on each fingertip sensor.
pub const ELECTRODE_CHANNELS: usize = 19;

/// Number of PAC values sampled per row.
pub const PAC_CHANNELS: usize = 22;

/// Motion types produced by the standard exploratory procedure.
pub const MOTION_TYPES: [&str; 5] = ["squeeze", "thermal_hold", "tap", "slide", "slow_slide"];

/// Whether `motion` is one of [`MOTION_TYPES`].
pub fn is_known_motion(motion: &str) -> bool {
    MOTION_TYPES.contains(&motion)
}

/// Raw and baseline channels for one finger.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerChannels {
    pub electrodes: Array2<f64>,
    pub electrodes_mean: Array2<f64>,
    pub pdc: Array1<f64>,
    pub pdc_mean: Array1<f64>,
    pub tdc: Array1<f64>,
    pub tdc_mean: Array1<f64>,
    pub tac: Array1<f64>,
    pub tac_mean: Array1<f64>,
    pub pac: Array2<f64>,
    pub pac_mean: Array2<f64>,
}

/// One motion trial captured from the gripper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Name of the object explored
    pub name: String,
    /// Run index for this object
    pub run_number: u32,
    /// Controller state during the motion
    pub state: String,
    /// Fine-grained controller phase
    pub detailed_state: String,
    /// Adjective labels attached after collection
    #[serde(default)]
    pub labels: BTreeSet<String>,

    pub electrodes: Vec<Array2<f64>>,
    pub electrodes_mean: Vec<Array2<f64>>,
    pub pdc: Vec<Array1<f64>>,
    pub pdc_mean: Vec<Array1<f64>>,
    pub tdc: Vec<Array1<f64>>,
    pub tdc_mean: Vec<Array1<f64>>,
    pub tac: Vec<Array1<f64>>,
    pub tac_mean: Vec<Array1<f64>>,
    pub pac: Vec<Array2<f64>>,
    pub pac_mean: Vec<Array2<f64>>,

    #[serde(default)]
    pub electrodes_normalized: Vec<Array2<f64>>,
    #[serde(default)]
    pub pdc_normalized: Vec<Array1<f64>>,
    #[serde(default)]
    pub tdc_normalized: Vec<Array1<f64>>,
    #[serde(default)]
    pub tac_normalized: Vec<Array1<f64>>,
    #[serde(default)]
    pub pac_normalized: Vec<Array2<f64>>,
    #[serde(default)]
    pub pac_flat: Vec<Array1<f64>>,
    #[serde(default)]
    pub pac_flat_normalized: Vec<Array1<f64>>,
}

impl SensorRecord {
    pub fn new(name: impl Into<String>, run_number: u32) -> Self {
        Self {
            name: name.into(),
            run_number,
            ..Self::default()
        }
    }

    /// Set the controller state metadata.
    pub fn with_state(mut self, state: impl Into<String>, detailed_state: impl Into<String>) -> Self {
        self.state = state.into();
        self.detailed_state = detailed_state.into();
        self
    }

    /// Append the channels of the next finger.
    pub fn push_finger(&mut self, finger: FingerChannels) {
        self.electrodes.push(finger.electrodes);
        self.electrodes_mean.push(finger.electrodes_mean);
        self.pdc.push(finger.pdc);
        self.pdc_mean.push(finger.pdc_mean);
        self.tdc.push(finger.tdc);
        self.tdc_mean.push(finger.tdc_mean);
        self.tac.push(finger.tac);
        self.tac_mean.push(finger.tac_mean);
        self.pac.push(finger.pac);
        self.pac_mean.push(finger.pac_mean);
    }

    /// Number of fingers with raw electrode data.
    pub fn num_fingers(&self) -> usize {
        self.electrodes.len()
    }

    /// Whether the normalizer has already run on this record.
    pub fn is_normalized(&self) -> bool {
        !self.pdc_normalized.is_empty()
    }

    /// Whether the raw channel containers have been discarded.
    pub fn raw_discarded(&self) -> bool {
        self.electrodes.is_empty()
            && self.pdc.is_empty()
            && self.tdc.is_empty()
            && self.tac.is_empty()
            && self.pac.is_empty()
            && self.pac_flat.is_empty()
    }

    /// Identity key used to match label annotations.
    pub fn key(&self) -> (&str, u32) {
        (&self.name, self.run_number)
    }
}

/// A feature value: either a scalar or a per-finger vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl FeatureValue {
    /// Number of scalars this value contributes to a feature vector.
    pub fn width(&self) -> usize {
        match self {
            FeatureValue::Scalar(_) => 1,
            FeatureValue::Vector(v) => v.len(),
        }
    }
}

/// Derived summary of one sensor record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub name: String,
    pub run_number: u32,
    pub state: String,
    pub detailed_state: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Peak normalized pressure over all fingers
    pub max_pdc: f64,
    /// Area under the normalized pressure curve, summed over fingers
    pub pdc_area: f64,
    /// Temporal centroid of the pressure curve per finger (samples)
    pub centroid: Vec<f64>,
    /// Area under the normalized TAC curve, summed over fingers
    pub tac_area: f64,
    /// Standard deviation of normalized temperature per finger
    pub tdc_std: Vec<f64>,
    /// Mean squared normalized PAC per finger
    pub pac_energy: Vec<f64>,
    /// Peak normalized electrode response per finger
    pub electrode_peak: Vec<f64>,

    /// Features computed outside this crate, keyed by name
    #[serde(default)]
    pub extra: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    /// Create a feature record carrying the identity and labels of `record`.
    pub fn from_identity(record: &SensorRecord) -> Self {
        Self {
            name: record.name.clone(),
            run_number: record.run_number,
            state: record.state.clone(),
            detailed_state: record.detailed_state.clone(),
            labels: record.labels.clone(),
            ..Self::default()
        }
    }

    /// Attach an externally computed feature.
    pub fn insert_extra(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.extra.insert(name.into(), value);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use ndarray::Array;

    /// Build a finger whose raw channels are a ramp over `samples` rows.
    pub fn ramp_finger(samples: usize, offset: f64) -> FingerChannels {
        let electrodes = Array::from_shape_fn((samples, ELECTRODE_CHANNELS), |(i, j)| {
            offset + i as f64 + j as f64 * 0.1
        });
        let electrodes_mean =
            Array::from_shape_fn((4, ELECTRODE_CHANNELS), |(i, j)| offset + j as f64 + i as f64);
        let pac = Array::from_shape_fn((samples, PAC_CHANNELS), |(i, j)| {
            (i * PAC_CHANNELS + j) as f64
        });
        let pac_mean = Array::from_shape_fn((3, PAC_CHANNELS), |(i, _)| i as f64);

        FingerChannels {
            electrodes,
            electrodes_mean,
            pdc: Array::from_shape_fn(samples, |i| offset + i as f64),
            pdc_mean: Array1::from(vec![1.0, 2.0, 3.0]),
            tdc: Array::from_shape_fn(samples, |i| 2.0 * i as f64),
            tdc_mean: Array1::from(vec![4.0, 4.0]),
            tac: Array::from_shape_fn(samples, |i| 10.0 - i as f64),
            tac_mean: Array1::from(vec![5.0]),
            pac,
            pac_mean,
        }
    }

    /// A two-finger record with `samples` rows per channel.
    pub fn two_finger_record(name: &str, run_number: u32, samples: usize) -> SensorRecord {
        let mut record = SensorRecord::new(name, run_number).with_state("closed", "squeeze_hold");
        record.push_finger(ramp_finger(samples, 0.0));
        record.push_finger(ramp_finger(samples, 1.5));
        record
    }
}
