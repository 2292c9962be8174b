use crate::bins::threshold::ThresholdSet;

/// Map one attribute value to its bucket index, or `None` for no-data.
///
/// Returns the greatest `i` with `edges[i] <= value`, clipped to the last
/// bucket index. The top edge belongs to the last bucket (closed interval);
/// every lower boundary is half-open. Values outside the edge range clip into
/// the nearest bucket — edges are pinned to the observed min/max when
/// generated, so this only fires for stale or explicit edges, and a separate
/// out-of-range bucket would complicate every palette for it.
///
/// Pure and stable: the same value and edges always give the same bucket, so
/// polygon colors cannot flicker across re-renders. Out-of-order edges (a
/// non-monotonic override) just leave the inverted bucket empty.
pub fn classify(value: Option<f64>, set: &ThresholdSet) -> Option<usize> {
    let v = match value {
        Some(v) if v.is_nan() => return None, // NaN is missing data, not a value
        Some(v) => v,
        None => return None,
    };

    let mut bucket = 0;
    for (i, &edge) in set.edges().iter().enumerate() {
        if edge <= v {
            bucket = i;
        }
    }
    Some(bucket.min(set.buckets() - 1))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::classify;
    use crate::bins::threshold::{generate, ThresholdMode, ThresholdSet};

    fn edges() -> ThresholdSet {
        generate(
            &[5.0, 12.0, 9.0, 30.0, 2.0],
            4,
            &BTreeMap::new(),
            ThresholdMode::Linear { step: 10.0 },
        )
        .unwrap() // [2, 10, 20, 30]
    }

    #[test]
    fn buckets_are_half_open_with_closed_top() {
        let set = edges();
        assert_eq!(classify(Some(9.0), &set), Some(0));
        assert_eq!(classify(Some(10.0), &set), Some(1)); // lower bound included
        assert_eq!(classify(Some(25.0), &set), Some(2));
        assert_eq!(classify(Some(30.0), &set), Some(2)); // top edge closed
    }

    #[test]
    fn missing_is_no_data_for_any_edges() {
        assert_eq!(classify(None, &edges()), None);
        assert_eq!(classify(Some(f64::NAN), &edges()), None);
        let two = ThresholdSet::from_edges(vec![0.0, 1.0]).unwrap();
        assert_eq!(classify(None, &two), None);
    }

    #[test]
    fn out_of_range_values_clip_into_nearest_bucket() {
        let set = edges();
        assert_eq!(classify(Some(-50.0), &set), Some(0));
        assert_eq!(classify(Some(1e9), &set), Some(2));
    }

    #[test]
    fn in_range_values_stay_in_bounds_and_monotonic() {
        let set = edges();
        let mut last = 0;
        for step in 0..=280 {
            let v = 2.0 + step as f64 * 0.1;
            let bucket = classify(Some(v), &set).unwrap();
            assert!(bucket <= set.buckets() - 1);
            assert!(bucket >= last, "classify must be monotonic in v");
            last = bucket;
        }
    }

    #[test]
    fn inverted_edges_leave_an_empty_bucket_without_panicking() {
        let set = ThresholdSet::from_edges(vec![2.0, 10.0, 5.0, 30.0]).unwrap();
        // The greatest-index rule skips straight past the inverted edge at
        // index 1, so bucket 1 stays empty and no value panics.
        assert_eq!(classify(Some(4.0), &set), Some(0));
        assert_eq!(classify(Some(7.0), &set), Some(2));
        assert_eq!(classify(Some(12.0), &set), Some(2));
        assert_eq!(classify(Some(30.0), &set), Some(2));
    }
}
