//! Compaction of a row selection into contiguous index ranges.

use crate::index::IndexModel;
use crate::types::{IndexKey, IndexRange, Sample};
use std::collections::HashMap;

/// Collapse `selected` into the fewest inclusive ranges over `full_ordered`.
///
/// Two selected samples share a range when they are neighbours in
/// `full_ordered`. Selection order does not matter. Every selected sample
/// must be a member of `full_ordered`; when an index value occurs more than
/// once the first occurrence is used.
pub fn compact_ranges(
    full_ordered: &[Sample],
    selected: &[Sample],
    index: &IndexModel,
) -> Vec<IndexRange> {
    let mut positions: HashMap<IndexKey, usize> = HashMap::with_capacity(full_ordered.len());
    for (pos, sample) in full_ordered.iter().enumerate() {
        positions.entry(sample.index.key()).or_insert(pos);
    }

    let mut resolved: Vec<(usize, &Sample)> = Vec::with_capacity(selected.len());
    for sample in selected {
        match positions.get(&sample.index.key()) {
            Some(&pos) => resolved.push((pos, sample)),
            None => {
                debug_assert!(
                    false,
                    "selected index {} is not part of the full sequence",
                    sample.index
                );
                log::error!(
                    "Selected index {} is not part of the full sequence, skipping",
                    sample.index
                );
            }
        }
    }

    resolved.sort_by(|a, b| index.compare(&a.1.index, &b.1.index));

    let mut ranges: Vec<IndexRange> = Vec::new();
    let mut previous: Option<usize> = None;
    for (pos, sample) in resolved {
        let contiguous = previous.is_some_and(|prev| pos == prev + 1);
        if contiguous {
            if let Some(current) = ranges.last_mut() {
                current.end = sample.index;
            }
        } else {
            ranges.push(IndexRange::single(sample.index));
        }
        previous = Some(pos);
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexValue;
    use chrono::{Duration, TimeZone, Utc};

    fn depth_log(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(100.0 + i as f64 * 0.5).with_value("GR", i as f64))
            .collect()
    }

    fn pick(full: &[Sample], positions: &[usize]) -> Vec<Sample> {
        positions.iter().map(|&p| full[p].clone()).collect()
    }

    #[test]
    fn test_contiguous_selection_is_one_range() {
        let full = depth_log(10);
        let ranges = compact_ranges(&full, &pick(&full, &[3, 4, 5, 6]), &IndexModel::depth());

        assert_eq!(ranges, vec![IndexRange::new(full[3].index, full[6].index)]);
    }

    #[test]
    fn test_disjoint_selection_is_two_ranges() {
        let full = depth_log(10);
        let ranges = compact_ranges(&full, &pick(&full, &[1, 2, 6, 7, 8]), &IndexModel::depth());

        assert_eq!(
            ranges,
            vec![
                IndexRange::new(full[1].index, full[2].index),
                IndexRange::new(full[6].index, full[8].index),
            ]
        );
    }

    #[test]
    fn test_selection_order_does_not_matter() {
        let full = depth_log(10);
        let model = IndexModel::depth();
        let forward = compact_ranges(&full, &pick(&full, &[0, 1, 4, 6, 7, 9]), &model);

        let reversed = compact_ranges(&full, &pick(&full, &[9, 7, 6, 4, 1, 0]), &model);
        let shuffled = compact_ranges(&full, &pick(&full, &[6, 0, 9, 4, 7, 1]), &model);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.len(), 4);
    }

    #[test]
    fn test_single_sample_range() {
        let full = depth_log(5);
        let ranges = compact_ranges(&full, &pick(&full, &[2]), &IndexModel::depth());

        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].is_single());
    }

    #[test]
    fn test_empty_selection() {
        assert!(compact_ranges(&depth_log(5), &[], &IndexModel::depth()).is_empty());
    }

    #[test]
    fn test_descending_log() {
        let full: Vec<Sample> = depth_log(6).into_iter().rev().collect();
        let model = IndexModel::depth().descending();
        let ranges = compact_ranges(&full, &pick(&full, &[4, 0, 1, 5]), &model);

        assert_eq!(
            ranges,
            vec![
                IndexRange::new(full[0].index, full[1].index),
                IndexRange::new(full[4].index, full[5].index),
            ]
        );
    }

    #[test]
    fn test_time_log() {
        let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let full: Vec<Sample> = (0..5)
            .map(|i| Sample::new(IndexValue::Time(t0 + Duration::seconds(i * 10))))
            .collect();
        let ranges = compact_ranges(&full, &pick(&full, &[2, 3, 4]), &IndexModel::time());

        assert_eq!(ranges, vec![IndexRange::new(full[2].index, full[4].index)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not part of the full sequence")]
    fn test_foreign_sample_panics_in_debug() {
        let full = depth_log(5);
        compact_ranges(&full, &[Sample::new(9999.0)], &IndexModel::depth());
    }
}
