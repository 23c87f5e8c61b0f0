//! Feature extraction from normalized sensor records.
//!
//! Features are computed from the normalized channels only, so a record has
//! to pass through the normalizer first. Identity and label metadata are
//! copied verbatim into the resulting feature record.

use crate::error::{PipelineError, Result};
use crate::record::{Dataset, FeatureRecord, SensorRecord};
use ndarray::{Array1, Array2};
use statrs::statistics::Statistics;
use tracing::info;

/// Extract the built-in features of a normalized sensor record.
pub fn extract(record: &SensorRecord) -> Result<FeatureRecord> {
    if !record.is_normalized() {
        return Err(PipelineError::NotNormalized {
            name: record.name.clone(),
            run_number: record.run_number,
        });
    }

    let mut features = FeatureRecord::from_identity(record);

    features.max_pdc = max_over_fingers(&record.pdc_normalized);
    features.pdc_area = record.pdc_normalized.iter().map(trapezoid_area).sum();
    features.centroid = record.pdc_normalized.iter().map(temporal_centroid).collect();
    features.tac_area = record.tac_normalized.iter().map(trapezoid_area).sum();
    features.tdc_std = record.tdc_normalized.iter().map(sample_std_dev).collect();
    features.pac_energy = record.pac_flat_normalized.iter().map(mean_square).collect();
    features.electrode_peak = record.electrodes_normalized.iter().map(peak).collect();

    Ok(features)
}

/// Extract features for every record, keeping motion keys and record order.
pub fn extract_dataset(dataset: &Dataset<SensorRecord>) -> Result<Dataset<FeatureRecord>> {
    let mut extracted = Dataset::new();
    let mut count = 0;

    for (motion, records) in dataset {
        let features = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                extract(record).map_err(|e| PipelineError::InRecord {
                    motion: motion.clone(),
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        count += features.len();
        extracted.insert(motion.clone(), features);
    }

    info!(records = count, motions = extracted.len(), "extracted features");
    Ok(extracted)
}

/// Largest value over all fingers and samples, 0 when there are no samples.
fn max_over_fingers(series: &[Array1<f64>]) -> f64 {
    series
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| Statistics::max(s.iter()))
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Area under a unit-spaced series using the trapezoidal rule.
fn trapezoid_area(series: &Array1<f64>) -> f64 {
    series
        .windows(2)
        .into_iter()
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .sum()
}

/// Sample index around which the absolute signal is concentrated.
fn temporal_centroid(series: &Array1<f64>) -> f64 {
    let total: f64 = series.iter().map(|v| v.abs()).sum();
    if total == 0.0 {
        return 0.0;
    }
    let weighted: f64 = series
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v.abs())
        .sum();
    weighted / total
}

fn sample_std_dev(series: &Array1<f64>) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    Statistics::std_dev(series.iter())
}

fn mean_square(series: &Array1<f64>) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|v| v * v).sum::<f64>() / series.len() as f64
}

fn peak(series: &Array2<f64>) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    Statistics::max(series.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize;
    use crate::record::types::fixtures::two_finger_record;

    fn normalized(name: &str, run_number: u32) -> SensorRecord {
        let mut record = two_finger_record(name, run_number, 3);
        record.labels.insert("squishy".to_string());
        normalize(&mut record, true).unwrap();
        record
    }

    #[test]
    fn test_extract_requires_normalized_record() {
        let record = two_finger_record("foam", 1, 3);
        let err = extract(&record).unwrap_err();
        assert!(matches!(err, PipelineError::NotNormalized { .. }));
    }

    #[test]
    fn test_extract_copies_metadata() {
        let record = normalized("foam", 4);
        let features = extract(&record).unwrap();

        assert_eq!(features.name, "foam");
        assert_eq!(features.run_number, 4);
        assert_eq!(features.state, "closed");
        assert_eq!(features.detailed_state, "squeeze_hold");
        assert!(features.labels.contains("squishy"));
        assert!(features.extra.is_empty());
    }

    #[test]
    fn test_pressure_features() {
        let record = normalized("foam", 1);
        let features = extract(&record).unwrap();

        // finger 0: [-2, -1, 0], finger 1: [-0.5, 0.5, 1.5]
        assert_eq!(features.max_pdc, 1.5);
        assert!((features.pdc_area - (-2.0 + 1.0)).abs() < 1e-12);
        assert_eq!(features.centroid.len(), 2);
        assert!((features.centroid[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_per_finger_vectors() {
        let record = normalized("foam", 1);
        let features = extract(&record).unwrap();

        // tdc per finger: [-4, -2, 0]
        assert_eq!(features.tdc_std.len(), 2);
        assert!(features.tdc_std.iter().all(|s| (s - 2.0).abs() < 1e-9));

        // pac flattened per finger: 1, 0, -1, ..., -64
        let energy = (1..=64).map(|v| (v * v) as f64).sum::<f64>() + 1.0;
        assert_eq!(features.pac_energy.len(), 2);
        assert!(features
            .pac_energy
            .iter()
            .all(|e| (e - energy / 66.0).abs() < 1e-9));

        // electrodes: 1.5 - i + 0.9 * j, largest at i = 0, j = 18
        assert_eq!(features.electrode_peak.len(), 2);
        assert!(features
            .electrode_peak
            .iter()
            .all(|p| (p - 17.7).abs() < 1e-9));
    }

    #[test]
    fn test_tac_area() {
        let record = normalized("foam", 1);
        let features = extract(&record).unwrap();

        // tac per finger: [-5, -4, -3]
        assert!((features.tac_area - (-16.0)).abs() < 1e-12);
    }

    #[test]
    fn test_mean_square() {
        assert_eq!(mean_square(&Array1::from(vec![1.0, -3.0])), 5.0);
        assert_eq!(mean_square(&Array1::from(vec![-2.0])), 4.0);
    }

    #[test]
    fn test_helpers_on_short_series() {
        let empty = Array1::<f64>::zeros(0);
        assert_eq!(trapezoid_area(&empty), 0.0);
        assert_eq!(temporal_centroid(&empty), 0.0);
        assert_eq!(sample_std_dev(&Array1::from(vec![3.0])), 0.0);
        assert_eq!(mean_square(&empty), 0.0);
        assert_eq!(max_over_fingers(&[]), 0.0);
    }

    #[test]
    fn test_extract_dataset_keeps_order() {
        let mut dataset = Dataset::new();
        dataset.insert(
            "squeeze".to_string(),
            vec![normalized("foam", 1), normalized("cork", 2)],
        );

        let features = extract_dataset(&dataset).unwrap();
        let names: Vec<&str> = features["squeeze"].iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["foam", "cork"]);
    }

    #[test]
    fn test_extract_dataset_reports_position() {
        let mut dataset = Dataset::new();
        dataset.insert(
            "tap".to_string(),
            vec![normalized("foam", 1), two_finger_record("cork", 2, 3)],
        );

        let err = extract_dataset(&dataset).unwrap_err();
        assert!(err.to_string().starts_with("tap[1]: "));
        assert!(matches!(
            err,
            PipelineError::InRecord { ref source, .. }
                if matches!(**source, PipelineError::NotNormalized { .. })
        ));
    }
}
