//! Adjective label tables.
//!
//! Labels come from a CSV annotation table with header
//! `name,run_number,<adjective>...`. A `1` in an adjective column marks the
//! adjective as present. A row with an empty `run_number` applies to every run
//! of that object.

use crate::error::{PipelineError, Result};
use csv::ReaderBuilder;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Anything that can produce adjective labels for motion records.
pub trait LabelSource {
    fn load_labels(&self, path: &Path) -> Result<LabelMap>;
}

/// Adjective labels keyed by object name and, optionally, run number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    by_run: HashMap<(String, u32), BTreeSet<String>>,
    by_name: HashMap<String, BTreeSet<String>>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add labels for one run, or for all runs of `name` when `run_number` is `None`.
    pub fn insert<I, S>(&mut self, name: &str, run_number: Option<u32>, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = match run_number {
            Some(run) => self.by_run.entry((name.to_string(), run)).or_default(),
            None => self.by_name.entry(name.to_string()).or_default(),
        };
        entry.extend(labels.into_iter().map(Into::into));
    }

    /// Labels for a run: the union of its own entry and its object-wide entry.
    ///
    /// Returns `None` when neither exists.
    pub fn labels_for(&self, name: &str, run_number: u32) -> Option<BTreeSet<String>> {
        let run = self.by_run.get(&(name.to_string(), run_number));
        let object = self.by_name.get(name);

        match (run, object) {
            (None, None) => None,
            (run, object) => Some(
                run.into_iter()
                    .chain(object)
                    .flat_map(|labels| labels.iter().cloned())
                    .collect(),
            ),
        }
    }

    /// Number of entries, object-wide entries included.
    pub fn len(&self) -> usize {
        self.by_run.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_run.is_empty() && self.by_name.is_empty()
    }
}

/// Reads CSV annotation tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLabelSource;

impl CsvLabelSource {
    /// Parse an annotation table from any reader.
    pub fn parse<R: Read>(&self, reader: R) -> Result<LabelMap> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::InvalidFormat(format!("label header: {e}")))?
            .clone();

        if headers.len() < 2
            || !headers[0].eq_ignore_ascii_case("name")
            || !headers[1].eq_ignore_ascii_case("run_number")
        {
            return Err(PipelineError::InvalidFormat(
                "label table must start with name,run_number columns".to_string(),
            ));
        }
        let adjectives: Vec<String> = headers.iter().skip(2).map(str::to_lowercase).collect();

        let mut labels = LabelMap::new();
        for (row_idx, result) in reader.records().enumerate() {
            let row = result
                .map_err(|e| PipelineError::InvalidFormat(format!("label row {}: {e}", row_idx + 1)))?;

            let name = &row[0];
            if name.is_empty() {
                return Err(PipelineError::InvalidFormat(format!(
                    "label row {} has no object name",
                    row_idx + 1
                )));
            }

            let run_number = match &row[1] {
                "" => None,
                run => Some(run.parse::<u32>().map_err(|_| {
                    PipelineError::InvalidFormat(format!(
                        "label row {}: invalid run_number '{run}'",
                        row_idx + 1
                    ))
                })?),
            };

            let mut present = Vec::new();
            for (adjective, value) in adjectives.iter().zip(row.iter().skip(2)) {
                if parse_flag(value).ok_or_else(|| {
                    PipelineError::InvalidFormat(format!(
                        "label row {}: invalid value '{value}' for '{adjective}'",
                        row_idx + 1
                    ))
                })? {
                    present.push(adjective.clone());
                }
            }

            labels.insert(name, run_number, present);
        }

        Ok(labels)
    }
}

impl LabelSource for CsvLabelSource {
    fn load_labels(&self, path: &Path) -> Result<LabelMap> {
        let file = std::fs::File::open(path)?;
        let labels = self.parse(file)?;
        info!(path = %path.display(), entries = labels.len(), "loaded adjective labels");
        Ok(labels)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
name,run_number,soft,rough,Squishy
foam,1,1,0,1
foam,2,1,0,0
cork,,0,1,
";

    #[test]
    fn test_parse_table() {
        let labels = CsvLabelSource.parse(TABLE.as_bytes()).unwrap();
        assert_eq!(labels.len(), 3);

        let foam1 = labels.labels_for("foam", 1).unwrap();
        assert_eq!(
            foam1.into_iter().collect::<Vec<_>>(),
            vec!["soft".to_string(), "squishy".to_string()]
        );
        assert!(labels.labels_for("foam", 3).is_none());
    }

    #[test]
    fn test_object_wide_rows_apply_to_every_run() {
        let labels = CsvLabelSource.parse(TABLE.as_bytes()).unwrap();
        assert!(labels.labels_for("cork", 7).unwrap().contains("rough"));
        assert!(labels.labels_for("cork", 0).unwrap().contains("rough"));
    }

    #[test]
    fn test_union_of_run_and_object_entries() {
        let mut labels = LabelMap::new();
        labels.insert("felt", Some(1), ["fuzzy"]);
        labels.insert("felt", None, ["soft"]);

        let merged = labels.labels_for("felt", 1).unwrap();
        assert!(merged.contains("fuzzy"));
        assert!(merged.contains("soft"));
        assert_eq!(labels.labels_for("felt", 2).unwrap().len(), 1);
    }

    #[test]
    fn test_bad_header() {
        let err = CsvLabelSource.parse("object,run,soft\nfoam,1,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFormat(_)));
    }

    #[test]
    fn test_bad_values() {
        let err = CsvLabelSource
            .parse("name,run_number,soft\nfoam,x,1\n".as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("invalid run_number"));

        let err = CsvLabelSource
            .parse("name,run_number,soft\nfoam,1,maybe\n".as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("'soft'"));
    }
}
