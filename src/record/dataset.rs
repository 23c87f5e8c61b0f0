//! Datasets: motion type mapped to an ordered sequence of records.

use std::collections::BTreeMap;

/// Records grouped by motion type. Keys iterate in sorted order, so the
/// first key is a stable reference when comparing sequence lengths.
pub type Dataset<T> = BTreeMap<String, Vec<T>>;

/// Total number of records across all motion types.
pub fn total_records<T>(dataset: &Dataset<T>) -> usize {
    dataset.values().map(Vec::len).sum()
}

/// Per-motion record counts, in key order.
pub fn motion_lengths<T>(dataset: &Dataset<T>) -> Vec<(&str, usize)> {
    dataset
        .iter()
        .map(|(motion, records)| (motion.as_str(), records.len()))
        .collect()
}

/// Group records by motion type, keeping the order in which they arrive.
pub fn group_by_motion<T, I>(records: I) -> Dataset<T>
where
    I: IntoIterator<Item = (String, T)>,
{
    let mut dataset = Dataset::new();
    for (motion, record) in records {
        dataset.entry(motion).or_insert_with(Vec::new).push(record);
    }
    dataset
}
