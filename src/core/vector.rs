//! Feature vector assembly.
//!
//! Field names are resolved through a fixed accessor table for the built-in
//! features, then through the record's `extra` map. The order of the names
//! passed in is the order of the columns handed to a learner, so callers
//! should keep that list in one place (see `Config::feature_fields`).

use crate::error::{PipelineError, Result};
use crate::record::{Dataset, FeatureRecord, FeatureValue};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Borrowed view of a feature value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureRef<'a> {
    Scalar(f64),
    Vector(&'a [f64]),
}

impl FeatureRef<'_> {
    fn append_to(self, out: &mut Vec<f64>) {
        match self {
            FeatureRef::Scalar(v) => out.push(v),
            FeatureRef::Vector(values) => out.extend_from_slice(values),
        }
    }
}

impl<'a> From<&'a FeatureValue> for FeatureRef<'a> {
    fn from(value: &'a FeatureValue) -> Self {
        match value {
            FeatureValue::Scalar(v) => FeatureRef::Scalar(*v),
            FeatureValue::Vector(values) => FeatureRef::Vector(values),
        }
    }
}

type Accessor = fn(&FeatureRecord) -> FeatureRef<'_>;

fn max_pdc(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Scalar(r.max_pdc)
}

fn pdc_area(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Scalar(r.pdc_area)
}

fn centroid(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Vector(&r.centroid)
}

fn tac_area(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Scalar(r.tac_area)
}

fn tdc_std(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Vector(&r.tdc_std)
}

fn pac_energy(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Vector(&r.pac_energy)
}

fn electrode_peak(r: &FeatureRecord) -> FeatureRef<'_> {
    FeatureRef::Vector(&r.electrode_peak)
}

/// Built-in feature fields and their accessors.
static BUILTIN_FIELDS: [(&str, Accessor); 7] = [
    ("max_pdc", max_pdc),
    ("pdc_area", pdc_area),
    ("centroid", centroid),
    ("tac_area", tac_area),
    ("tdc_std", tdc_std),
    ("pac_energy", pac_energy),
    ("electrode_peak", electrode_peak),
];

impl FeatureRecord {
    /// Names of the built-in feature fields.
    pub fn field_names() -> impl Iterator<Item = &'static str> {
        BUILTIN_FIELDS.iter().map(|(name, _)| *name)
    }

    /// Look up a feature by name: built-in fields first, then `extra`.
    pub fn resolve(&self, name: &str) -> Option<FeatureRef<'_>> {
        BUILTIN_FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, accessor)| accessor(self))
            .or_else(|| self.extra.get(name).map(FeatureRef::from))
    }
}

/// Gather the named features of `record` into one flat vector.
///
/// Scalars contribute one element and vectors contribute all of theirs, in
/// the order of `field_names`. Any unknown name fails the whole call.
pub fn assemble<S: AsRef<str>>(record: &FeatureRecord, field_names: &[S]) -> Result<Vec<f64>> {
    let mut vector = Vec::new();
    for name in field_names {
        let name = name.as_ref();
        let value = record
            .resolve(name)
            .ok_or_else(|| PipelineError::UnknownFeatureField(name.to_string()))?;
        value.append_to(&mut vector);
    }
    Ok(vector)
}

/// Feature rows for one motion type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Field names the columns were assembled from
    pub fields: Vec<String>,
    /// One row per record
    pub rows: Array2<f64>,
    /// Object name and run number per row
    pub keys: Vec<(String, u32)>,
    /// Adjective labels per row
    pub labels: Vec<BTreeSet<String>>,
}

/// Assemble a feature matrix for every motion type.
///
/// All rows of a motion type must have the same width; per-finger vectors
/// of different lengths fail with `DimensionMismatch`.
pub fn assemble_dataset<S: AsRef<str>>(
    dataset: &Dataset<FeatureRecord>,
    field_names: &[S],
) -> Result<BTreeMap<String, FeatureMatrix>> {
    let fields: Vec<String> = field_names.iter().map(|s| s.as_ref().to_string()).collect();
    let mut matrices = BTreeMap::new();
    let mut count = 0;

    for (motion, records) in dataset {
        let mut flat = Vec::new();
        let mut width = None;

        for record in records {
            let row = assemble(record, field_names)?;
            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => {
                    return Err(PipelineError::DimensionMismatch(format!(
                        "{motion}: {}#{} yields {} features, expected {w}",
                        record.name,
                        record.run_number,
                        row.len()
                    )));
                }
                Some(_) => {}
            }
            flat.extend(row);
        }

        let shape = (records.len(), width.unwrap_or(0));
        let rows = Array2::from_shape_vec(shape, flat)
            .map_err(|e| PipelineError::DimensionMismatch(format!("{motion}: {e}")))?;
        count += records.len();

        matrices.insert(
            motion.clone(),
            FeatureMatrix {
                fields: fields.clone(),
                rows,
                keys: records
                    .iter()
                    .map(|r| (r.name.clone(), r.run_number))
                    .collect(),
                labels: records.iter().map(|r| r.labels.clone()).collect(),
            },
        );
    }

    info!(rows = count, fields = fields.len(), "assembled feature matrices");
    Ok(matrices)
}
