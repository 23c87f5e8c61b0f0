//! Baseline normalization of per-finger sensor channels.
//!
//! Every channel is offset by the mean of its no-contact baseline. Electrode,
//! TAC and PAC responses are sign inverted so that contact reads positive.
//! PAC rows are also flattened row-major into a single series per finger.

use crate::error::{PipelineError, Result};
use crate::record::{Dataset, SensorRecord, PAC_CHANNELS};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

/// Normalized outputs for all fingers, built before the record is touched.
#[derive(Default)]
struct NormalizedChannels {
    electrodes: Vec<Array2<f64>>,
    pdc: Vec<Array1<f64>>,
    tdc: Vec<Array1<f64>>,
    tac: Vec<Array1<f64>>,
    pac: Vec<Array2<f64>>,
    pac_flat: Vec<Array1<f64>>,
    pac_flat_normalized: Vec<Array1<f64>>,
}

/// Normalize a sensor record in place.
///
/// Appends one entry per finger to each `*_normalized` list and to `pac_flat`.
/// When `discard_raw` is set, the raw channels and `pac_flat` are cleared
/// afterwards; baselines are always kept.
///
/// All shapes are validated first, so an error leaves the record untouched.
pub fn normalize(record: &mut SensorRecord, discard_raw: bool) -> Result<()> {
    if record.is_normalized() {
        return Err(PipelineError::AlreadyNormalized {
            name: record.name.clone(),
            run_number: record.run_number,
        });
    }

    let num_fingers = check_finger_counts(record)?;
    let mut out = NormalizedChannels::default();

    for finger in 0..num_fingers {
        // Electrodes
        let electrodes = &record.electrodes[finger];
        let baseline = column_baseline(electrodes, &record.electrodes_mean[finger], "electrodes", finger)?;
        out.electrodes.push(-(electrodes - &baseline));

        // PDC
        let baseline = scalar_baseline(&record.pdc_mean[finger], "pdc", finger)?;
        out.pdc.push(&record.pdc[finger] - baseline);

        // TDC
        let baseline = scalar_baseline(&record.tdc_mean[finger], "tdc", finger)?;
        out.tdc.push(&record.tdc[finger] - baseline);

        // TAC
        let baseline = scalar_baseline(&record.tac_mean[finger], "tac", finger)?;
        out.tac.push(-(&record.tac[finger] - baseline));

        // PAC
        let pac = &record.pac[finger];
        if pac.ncols() != PAC_CHANNELS {
            return Err(PipelineError::DimensionMismatch(format!(
                "pac of finger {finger} has {} columns, expected {PAC_CHANNELS}",
                pac.ncols()
            )));
        }
        let baseline = column_baseline(pac, &record.pac_mean[finger], "pac", finger)?;
        let pac_normalized = -(pac - &baseline);

        out.pac_flat.push(flatten(pac));
        out.pac_flat_normalized.push(flatten(&pac_normalized));
        out.pac.push(pac_normalized);
    }

    record.electrodes_normalized.extend(out.electrodes);
    record.pdc_normalized.extend(out.pdc);
    record.tdc_normalized.extend(out.tdc);
    record.tac_normalized.extend(out.tac);
    record.pac_normalized.extend(out.pac);
    record.pac_flat.extend(out.pac_flat);
    record.pac_flat_normalized.extend(out.pac_flat_normalized);

    if discard_raw {
        record.pdc.clear();
        record.electrodes.clear();
        record.pac.clear();
        record.tdc.clear();
        record.tac.clear();
        record.pac_flat.clear();
    }

    debug!(
        name = %record.name,
        run_number = record.run_number,
        fingers = num_fingers,
        discard_raw,
        "normalized record"
    );

    Ok(())
}

/// Normalize every record of a dataset, stopping at the first failure.
///
/// Returns the number of records normalized.
pub fn normalize_dataset(dataset: &mut Dataset<SensorRecord>, discard_raw: bool) -> Result<usize> {
    let mut count = 0;
    for (motion, records) in dataset.iter_mut() {
        for (index, record) in records.iter_mut().enumerate() {
            normalize(record, discard_raw).map_err(|e| PipelineError::InRecord {
                motion: motion.clone(),
                index,
                source: Box::new(e),
            })?;
            count += 1;
        }
    }
    info!(records = count, discard_raw, "normalized dataset");
    Ok(count)
}

/// Check that all ten raw and baseline lists describe the same number of fingers.
fn check_finger_counts(record: &SensorRecord) -> Result<usize> {
    let expected = record.electrodes.len();
    if expected == 0 {
        return Err(PipelineError::DimensionMismatch(
            "record has no fingers".to_string(),
        ));
    }
    let counts = [
        ("electrodes_mean", record.electrodes_mean.len()),
        ("pdc", record.pdc.len()),
        ("pdc_mean", record.pdc_mean.len()),
        ("tdc", record.tdc.len()),
        ("tdc_mean", record.tdc_mean.len()),
        ("tac", record.tac.len()),
        ("tac_mean", record.tac_mean.len()),
        ("pac", record.pac.len()),
        ("pac_mean", record.pac_mean.len()),
    ];

    for (channel, count) in counts {
        if count != expected {
            return Err(PipelineError::DimensionMismatch(format!(
                "{channel} has {count} fingers, electrodes has {expected}"
            )));
        }
    }
    Ok(expected)
}

/// Mean of a 2-D baseline along the sample axis, one value per column.
fn column_baseline(
    raw: &Array2<f64>,
    baseline: &Array2<f64>,
    channel: &str,
    finger: usize,
) -> Result<Array1<f64>> {
    if baseline.ncols() != raw.ncols() {
        return Err(PipelineError::DimensionMismatch(format!(
            "{channel} baseline of finger {finger} has {} columns, raw series has {}",
            baseline.ncols(),
            raw.ncols()
        )));
    }
    baseline.mean_axis(Axis(0)).ok_or_else(|| {
        PipelineError::DimensionMismatch(format!("{channel} baseline of finger {finger} is empty"))
    })
}

/// Mean of a 1-D baseline.
fn scalar_baseline(baseline: &Array1<f64>, channel: &str, finger: usize) -> Result<f64> {
    baseline.mean().ok_or_else(|| {
        PipelineError::DimensionMismatch(format!("{channel} baseline of finger {finger} is empty"))
    })
}

/// Row-major flattening of a samples x columns series.
fn flatten(series: &Array2<f64>) -> Array1<f64> {
    series.iter().copied().collect()
}
