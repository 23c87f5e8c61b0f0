//! End-to-end tests for the preparation pipeline

use haptic_prep::core::{assemble, assemble_dataset, extract_dataset, normalize_dataset, split};
use haptic_prep::pipeline::{self, DatasetInput};
use haptic_prep::record::{Dataset, FeatureRecord, SensorRecord, PAC_CHANNELS};
use haptic_prep::source::{CsvLabelSource, JsonRawSource};
use haptic_prep::PipelineError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("haptic-prep-pipeline-test")
        .join(format!("{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

fn finger(samples: usize, level: f64) -> serde_json::Value {
    let electrodes: Vec<Vec<f64>> = (0..samples)
        .map(|i| (0..19).map(|j| level + i as f64 - j as f64 * 0.5).collect())
        .collect();
    let pac: Vec<Vec<f64>> = (0..samples)
        .map(|i| (0..22).map(|j| ((i * 22 + j) % 7) as f64 - 3.0).collect())
        .collect();
    let pdc: Vec<f64> = (0..samples).map(|i| level + (i % 4) as f64).collect();

    json!({
        "electrodes": electrodes,
        "electrodes_mean": [vec![level; 19], vec![level + 1.0; 19]],
        "pdc": pdc,
        "pdc_mean": [level, level],
        "tdc": (0..samples).map(|i| 30.0 - i as f64 * 0.1).collect::<Vec<f64>>(),
        "tdc_mean": [30.0],
        "tac": (0..samples).map(|i| (i % 3) as f64).collect::<Vec<f64>>(),
        "tac_mean": [1.0, 1.0, 1.0],
        "pac": pac,
        "pac_mean": [vec![0.0; 22]],
    })
}

/// Ten objects, one run each, recorded for three motions.
fn write_run_log(dir: &std::path::Path) -> PathBuf {
    let objects = [
        "foam", "cork", "glass", "felt", "steel", "sponge", "rubber", "wood", "silk", "brick",
    ];
    let mut runs = Vec::new();
    for motion in ["squeeze", "tap", "slide"] {
        for (i, object) in objects.iter().enumerate() {
            runs.push(json!({
                "name": object,
                "run_number": 1,
                "motion": motion,
                "state": "closed",
                "detailed_state": format!("{motion}_contact"),
                "fingers": [finger(6, i as f64), finger(6, i as f64 + 0.5)],
            }));
        }
    }

    let path = dir.join("runs.json");
    std::fs::write(&path, json!({ "runs": runs }).to_string()).expect("Failed to write run log");
    path
}

fn write_labels(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("labels.csv");
    std::fs::write(
        &path,
        "name,run_number,soft,rough,squishy\n\
         foam,1,1,0,1\n\
         sponge,,1,0,1\n\
         brick,1,0,1,0\n\
         cork,1,0,1,0\n",
    )
    .expect("Failed to write labels");
    path
}

#[test]
fn test_full_pipeline() {
    let dir = test_dir("full");
    let raw = write_run_log(&dir);
    let labels = write_labels(&dir);
    let dataset_path = dir.join("dataset.json");
    let labeled_path = dir.join("labeled.json");

    // Convert and persist
    let converted = pipeline::convert(&JsonRawSource, &raw, &dataset_path, true).unwrap();
    assert_eq!(converted.len(), 3);
    assert!(converted.values().all(|records| records.len() == 10));
    assert!(dataset_path.exists());

    // Attach labels to the persisted dataset
    let (mut dataset, report) = pipeline::attach_labels(
        DatasetInput::Path(dataset_path.clone()),
        &labeled_path,
        &CsvLabelSource,
        &labels,
        true,
    )
    .unwrap();
    assert_eq!(report.labeled, 12);
    assert_eq!(report.unlabeled, 18);
    assert!(dataset["tap"][5].labels.contains("squishy"));

    let reloaded = pipeline::load(&labeled_path).unwrap();
    assert_eq!(reloaded, dataset);

    // Normalize and extract
    assert_eq!(normalize_dataset(&mut dataset, true).unwrap(), 30);
    for record in dataset.values().flatten() {
        assert!(record.raw_discarded());
        assert_eq!(record.pac_flat_normalized.len(), 2);
        assert_eq!(record.pac_flat_normalized[0].len(), 6 * PAC_CHANNELS);
    }

    let features = extract_dataset(&dataset).unwrap();
    let foam = &features["squeeze"][0];
    assert_eq!(foam.name, "foam");
    assert!(foam.labels.contains("soft"));
    assert_eq!(foam.centroid.len(), 2);

    // Assemble vectors
    let row = assemble(foam, &["max_pdc", "centroid"]).unwrap();
    assert_eq!(row.len(), 3);
    assert_eq!(row[0], foam.max_pdc);
    assert_eq!(&row[1..], foam.centroid.as_slice());

    let matrices = assemble_dataset(&features, &["max_pdc", "pdc_area", "pac_energy"]).unwrap();
    assert_eq!(matrices["slide"].rows.dim(), (10, 4));

    // Split features the same way across motions
    let mut rng = StdRng::seed_from_u64(2024);
    let (train, test) = split(&features, 0.9, &mut rng).unwrap();
    for motion in ["squeeze", "tap", "slide"] {
        assert_eq!(train[motion].len(), 9);
        assert_eq!(test[motion].len(), 1);
    }
    let held_out = &test["squeeze"][0].name;
    assert_eq!(&test["tap"][0].name, held_out);
    assert_eq!(&test["slide"][0].name, held_out);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_feature_dataset_round_trip() {
    let dir = test_dir("features");
    let raw = write_run_log(&dir);

    let mut dataset =
        pipeline::convert(&JsonRawSource, &raw, &dir.join("unused.json"), false).unwrap();
    normalize_dataset(&mut dataset, false).unwrap();
    let features = extract_dataset(&dataset).unwrap();

    let path = dir.join("features.json");
    pipeline::persist(&features, &path).unwrap();
    let loaded: Dataset<FeatureRecord> = pipeline::load_features(&path).unwrap();
    assert_eq!(loaded, features);

    // A feature file is not a sensor dataset
    let err = pipeline::load(&path).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_normalized_dataset_round_trip() {
    let dir = test_dir("normalized");
    let raw = write_run_log(&dir);

    let mut dataset: Dataset<SensorRecord> =
        pipeline::convert(&JsonRawSource, &raw, &dir.join("unused.json"), false).unwrap();
    normalize_dataset(&mut dataset, false).unwrap();

    let path = dir.join("normalized.json");
    pipeline::persist(&dataset, &path).unwrap();
    assert_eq!(pipeline::load(&path).unwrap(), dataset);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_load_rejects_non_dataset_files() {
    let dir = test_dir("invalid");

    let pickle = dir.join("dataset.pkl");
    std::fs::write(&pickle, "{}").unwrap();
    assert!(matches!(
        pipeline::load(&pickle),
        Err(PipelineError::InvalidFormat(_))
    ));

    let garbage = dir.join("garbage.json");
    std::fs::write(&garbage, "not json at all").unwrap();
    assert!(matches!(
        pipeline::load(&garbage),
        Err(PipelineError::InvalidFormat(_))
    ));

    assert!(matches!(
        pipeline::load(&dir.join("missing.json")),
        Err(PipelineError::Io(_))
    ));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_convert_checks_output_before_loading() {
    let dir = test_dir("convert");
    let err = pipeline::convert(
        &JsonRawSource,
        &dir.join("missing-runs.json"),
        &dir.join("out.pkl"),
        true,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(_)));

    let _ = std::fs::remove_dir_all(&dir);
}
