use polars::{frame::DataFrame, prelude::*};

use crate::error::Error;

/// Column names shared by boundary and attribute tables.
pub const CODE: &str = "code";
pub const PREF_NAME: &str = "pref_name";
pub const CITY_NAME: &str = "city_name";
pub const SUB_NAME: &str = "sub_name";
pub const DISTRICT_NAME: &str = "district_name";
pub const GEOMETRY: &str = "geometry";

/// The canonical join key column, and the city-level rollup column derived from it.
pub const KEY: &str = "name";
pub const PARENT: &str = "parent_name";

/// Name fragment columns in fixed hierarchical order. The district fragment is
/// optional in practice; tables that stop at town/aza level simply omit it.
pub const FRAGMENTS: [&str; 4] = [PREF_NAME, CITY_NAME, SUB_NAME, DISTRICT_NAME];

/// Concatenate hierarchical name fragments into one canonical key.
/// A missing fragment contributes the empty string, never a "None" literal,
/// so two sources agree on the key whenever they agree on the fragments.
pub fn canonical_key(fragments: &[Option<&str>]) -> String {
    fragments.iter().map(|f| f.unwrap_or("")).collect()
}

/// Build the canonical key column for a table from its fragment columns,
/// in the fixed `FRAGMENTS` order. Absent fragment columns contribute nothing;
/// at least the prefecture and city fragments must be present.
pub fn key_column(df: &DataFrame) -> Result<Column, Error> {
    for required in [PREF_NAME, CITY_NAME] {
        if df.column(required).is_err() {
            return Err(Error::MissingColumn { column: required.to_string() });
        }
    }

    let mut fragments = Vec::new();
    for name in FRAGMENTS {
        if let Ok(col) = df.column(name) {
            fragments.push(col.str().map_err(Error::Polars)?);
        }
    }

    let keys = (0..df.height())
        .map(|row| {
            fragments
                .iter()
                .map(|ca| ca.get(row).unwrap_or(""))
                .collect::<String>()
        })
        .collect::<Vec<_>>();

    Ok(Column::new(KEY.into(), keys))
}

/// Count of rows whose sub-area fragment is populated. A zero count on one
/// side of a join while the other side is populated means the two sources
/// disagree on fragment granularity and can only match at parent level.
pub fn rows_with_sub_fragment(df: &DataFrame) -> usize {
    let Ok(col) = df.column(SUB_NAME) else { return 0 };
    let Ok(ca) = col.str() else { return 0 };
    ca.into_iter().filter(|v| matches!(v, Some(s) if !s.is_empty())).count()
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::{canonical_key, key_column, rows_with_sub_fragment, KEY};

    fn boundary() -> DataFrame {
        DataFrame::new(vec![
            Column::new("pref_name".into(), ["東京都", "東京都", "東京都"]),
            Column::new("city_name".into(), ["千代田区", "千代田区", "中央区"]),
            Column::new("sub_name".into(), [Some("丸の内"), None, Some("銀座")]),
        ])
        .unwrap()
    }

    #[test]
    fn canonical_key_treats_missing_as_empty() {
        assert_eq!(canonical_key(&[Some("東京都"), Some("千代田区"), None]), "東京都千代田区");
        assert_eq!(
            canonical_key(&[Some("東京都"), Some("千代田区"), Some("丸の内")]),
            "東京都千代田区丸の内"
        );
        assert_eq!(canonical_key(&[None, None, None]), "");
    }

    #[test]
    fn key_column_concatenates_fragments_per_row() {
        let col = key_column(&boundary()).unwrap();
        let keys = col.str().unwrap();
        assert_eq!(col.name().as_str(), KEY);
        assert_eq!(keys.get(0), Some("東京都千代田区丸の内"));
        assert_eq!(keys.get(1), Some("東京都千代田区")); // null sub fragment drops out
        assert_eq!(keys.get(2), Some("東京都中央区銀座"));
    }

    #[test]
    fn key_column_requires_city_fragment() {
        let df = DataFrame::new(vec![Column::new("pref_name".into(), ["東京都"])]).unwrap();
        assert!(key_column(&df).is_err());
    }

    #[test]
    fn identical_fragments_give_identical_keys_across_sources() {
        let a = key_column(&boundary()).unwrap();
        let b = key_column(&boundary()).unwrap();
        assert_eq!(a.str().unwrap().get(0), b.str().unwrap().get(0));
    }

    #[test]
    fn sub_fragment_population_is_counted() {
        assert_eq!(rows_with_sub_fragment(&boundary()), 2);
        let flat = DataFrame::new(vec![Column::new("pref_name".into(), ["東京都"])]).unwrap();
        assert_eq!(rows_with_sub_fragment(&flat), 0);
    }
}
