use ahash::{AHashMap, AHashSet};
use polars::{frame::DataFrame, prelude::*};
use tracing::{debug, warn};

use crate::error::Error;
use crate::region::key::{self, CITY_NAME, KEY, PARENT, PREF_NAME, SUB_NAME};
use crate::region::table::RegionTable;
use crate::types::{AttributeSchema, ColumnKind};

/// Outcome counters for one attribute table joined onto the boundary table.
///
/// A zero match rate means the two sources disagree on the canonical key — a
/// configuration problem to surface, not an error: the join result is still
/// well-defined (all nulls).
#[derive(Debug, Clone, Default)]
pub struct JoinReport {
    /// Boundary rows (the retained side).
    pub total: usize,
    /// Boundary rows that found an attribute record.
    pub matched: usize,
    /// Attribute rows offered.
    pub attr_rows: usize,
    /// Boundary rows with a populated sub-area fragment.
    pub boundary_with_sub: usize,
    /// Attribute rows with a populated sub-area fragment.
    pub attr_with_sub: usize,
}

impl JoinReport {
    /// Fraction of boundary rows that matched.
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.matched as f64 / self.total as f64 }
    }

    /// True when nothing matched at all — almost certainly a key mismatch.
    pub fn is_suspect(&self) -> bool {
        self.matched == 0 && self.total > 0 && self.attr_rows > 0
    }

    /// True when exactly one side carries sub-area fragments: the join can
    /// only land parent-level matches, degrading silently unless surfaced.
    pub fn granularity_differs(&self) -> bool {
        (self.boundary_with_sub == 0) != (self.attr_with_sub == 0)
    }
}

/// Left-join one or more attribute tables onto a boundary table by canonical
/// key, then suppress parent rollup rows so a citywide total is never plotted
/// alongside its constituent sub-areas.
///
/// The boundary side is always retained; unmatched regions keep nulls. Numeric
/// columns declared by `schema` come back cast to f64. Returns the joined
/// table plus one report per attribute table, in input order.
pub fn join_attributes(
    boundary: &DataFrame,
    attrs: &[DataFrame],
    schema: &AttributeSchema,
) -> Result<(RegionTable, Vec<JoinReport>), Error> {
    let mut df = boundary.clone();
    df.with_column(key::key_column(boundary)?)?;

    // City-level name, kept as its own column for parent filtering.
    let parent = df.column(CITY_NAME)?.as_materialized_series().clone().with_name(PARENT.into());
    df.with_column(parent)?;

    // Remember boundary order; polars joins are free to reorder.
    let mut df = df.with_row_index("idx".into(), None)?;

    let mut reports = Vec::with_capacity(attrs.len());
    for attr in attrs {
        let (joined, report) = join_one(df, attr, schema)?;
        df = joined;
        if report.is_suspect() {
            warn!(
                attr_rows = report.attr_rows,
                "attribute table matched no boundary rows; check key fragments"
            );
        }
        if report.granularity_differs() {
            warn!(
                boundary_with_sub = report.boundary_with_sub,
                attr_with_sub = report.attr_with_sub,
                "sub-area fragments populated on only one side; join degrades to parent-level matches"
            );
        }
        reports.push(report);
    }

    let mut df = df.sort(["idx"], SortMultipleOptions::default())?.drop("idx")?;

    // Declared numeric columns go to f64 so classification and suppression
    // see one type regardless of how the CSV was inferred.
    for column in schema.names() {
        if let Ok(col) = df.column(column) {
            let casted = col
                .cast(&DataType::Float64)
                .map_err(|_| Error::NotNumeric { column: column.to_string() })?;
            df.with_column(casted)?;
        }
    }

    let suppressed = suppress_parents(&mut df, schema)?;
    debug!(suppressed, "parent rollup rows suppressed");

    Ok((RegionTable::new(df)?, reports))
}

/// Join a single attribute table, carrying over only its declared numeric
/// columns. Duplicate attribute keys would multiply boundary rows, so they
/// are rejected before the join.
fn join_one(
    df: DataFrame,
    attr: &DataFrame,
    schema: &AttributeSchema,
) -> Result<(DataFrame, JoinReport), Error> {
    let attr_key = key::key_column(attr)?;
    let keys = attr_key.str()?;

    let mut seen = AHashSet::with_capacity(attr.height());
    for k in keys.into_iter().flatten() {
        if !seen.insert(k) {
            return Err(Error::DuplicateKey { key: k.to_string() });
        }
    }

    let matched = df
        .column(KEY)?
        .str()?
        .into_iter()
        .filter(|name| matches!(name, Some(n) if seen.contains(n)))
        .count();

    let report = JoinReport {
        total: df.height(),
        matched,
        attr_rows: attr.height(),
        boundary_with_sub: key::rows_with_sub_fragment(&df),
        attr_with_sub: key::rows_with_sub_fragment(attr),
    };

    // Only the key and the declared columns cross the join; fragment columns
    // from the attribute side would collide with the boundary's.
    let mut carried = attr.clone();
    carried.with_column(attr_key)?;
    let columns = std::iter::once(KEY)
        .chain(schema.names().filter(|&c| attr.column(c).is_ok()))
        .collect::<Vec<_>>();
    let carried = carried.select(columns)?;

    let joined = df.left_join(&carried, [KEY], [KEY])?;
    Ok((joined, report))
}

/// Null out (ratios) or zero out (counts) the attributes of parent rollup
/// rows: rows with an empty sub-area fragment whose (prefecture, city) pair
/// also appears with populated sub-area fragments. Returns how many rows were
/// suppressed.
pub fn suppress_parents(df: &mut DataFrame, schema: &AttributeSchema) -> Result<usize, Error> {
    let Ok(sub) = df.column(SUB_NAME) else {
        return Ok(0); // city-level table only, no rollup rows possible
    };
    let sub = sub.str()?.clone();
    let prefs = df.column(PREF_NAME)?.str()?.clone();
    let cities = df.column(CITY_NAME)?.str()?.clone();

    let city_of = |row: usize| (prefs.get(row).unwrap_or(""), cities.get(row).unwrap_or(""));
    let has_sub = |row: usize| sub.get(row).is_some_and(|s| !s.is_empty());

    let mut cities_with_children = AHashSet::new();
    for row in 0..df.height() {
        if has_sub(row) {
            cities_with_children.insert(city_of(row));
        }
    }

    let parent_rows = (0..df.height())
        .filter(|&row| !has_sub(row) && cities_with_children.contains(&city_of(row)))
        .collect::<Vec<_>>();
    if parent_rows.is_empty() {
        return Ok(0);
    }
    let parent_set: AHashSet<usize> = parent_rows.iter().copied().collect();

    for column in schema.names() {
        let Ok(col) = df.column(column) else { continue };
        let kind = schema.kind_of(column).unwrap_or(ColumnKind::Ratio);
        let forced = match kind {
            ColumnKind::Count => Some(0.0),
            ColumnKind::Ratio => None,
        };
        let values = col
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| if parent_set.contains(&row) { forced } else { v })
            .collect::<Vec<_>>();
        df.with_column(Column::new(column.into(), values))?;
    }

    Ok(parent_rows.len())
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::join_attributes;
    use crate::error::Error;
    use crate::types::AttributeSchema;

    fn schema() -> AttributeSchema {
        AttributeSchema::from_json_str(
            r#"{"columns":[{"name":"人口","kind":"count"},{"name":"平均年齢","kind":"ratio"}]}"#,
        )
        .unwrap()
    }

    fn boundary() -> DataFrame {
        DataFrame::new(vec![
            Column::new("code".into(), ["13101", "131010010", "131010020", "13102"]),
            Column::new("pref_name".into(), ["東京都", "東京都", "東京都", "東京都"]),
            Column::new("city_name".into(), ["千代田区", "千代田区", "千代田区", "中央区"]),
            Column::new("sub_name".into(), [Some(""), Some("丸の内"), Some("神田"), Some("")]),
            Column::new("geometry".into(), ["POLYGON(...)", "POLYGON(...)", "POLYGON(...)", "POLYGON(...)"]),
        ])
        .unwrap()
    }

    fn attributes() -> DataFrame {
        DataFrame::new(vec![
            Column::new("pref_name".into(), ["東京都", "東京都", "東京都", "東京都"]),
            Column::new("city_name".into(), ["千代田区", "千代田区", "千代田区", "中央区"]),
            Column::new("sub_name".into(), [Some(""), Some("丸の内"), Some("神田"), Some("")]),
            Column::new("人口".into(), [66000i64, 4500, 6100, 170000]),
            Column::new("平均年齢".into(), [44.2, 46.1, 43.0, 42.5]),
        ])
        .unwrap()
    }

    #[test]
    fn identical_granularity_leaves_no_row_unmatched() {
        let (_, reports) = join_attributes(&boundary(), &[attributes()], &schema()).unwrap();
        assert_eq!(reports[0].matched, reports[0].total);
        assert!(!reports[0].is_suspect());
        assert!(!reports[0].granularity_differs());
    }

    #[test]
    fn parent_rows_are_suppressed_children_kept() {
        let (table, _) = join_attributes(&boundary(), &[attributes()], &schema()).unwrap();

        // 千代田区 rollup row has children, so count -> 0 and ratio -> null,
        // regardless of the source values.
        let pop = table.numeric_column("人口").unwrap();
        let age = table.numeric_column("平均年齢").unwrap();
        assert_eq!(pop[0], Some(0.0));
        assert_eq!(age[0], None);
        assert_eq!(pop[1], Some(4500.0));
        assert_eq!(age[1], Some(46.1));

        // 中央区 has no sub-area rows, so it keeps its citywide values.
        assert_eq!(pop[3], Some(170000.0));
        assert_eq!(age[3], Some(42.5));
    }

    #[test]
    fn unmatched_regions_keep_nulls_and_join_is_flagged() {
        let foreign = DataFrame::new(vec![
            Column::new("pref_name".into(), ["大阪府"]),
            Column::new("city_name".into(), ["北区"]),
            Column::new("sub_name".into(), [""]),
            Column::new("人口".into(), [120000i64]),
        ])
        .unwrap();

        let (table, reports) = join_attributes(&boundary(), &[foreign], &schema()).unwrap();
        assert!(reports[0].is_suspect());
        assert_eq!(reports[0].match_rate(), 0.0);
        let pop = table.numeric_column("人口").unwrap();
        // Parent suppression still zeroes the 千代田区 rollup row; everything
        // else stays null.
        assert_eq!(pop[0], Some(0.0));
        assert!(pop[1..].iter().all(|v| v.is_none()));
    }

    #[test]
    fn duplicate_attribute_keys_are_rejected() {
        let dup = DataFrame::new(vec![
            Column::new("pref_name".into(), ["東京都", "東京都"]),
            Column::new("city_name".into(), ["千代田区", "千代田区"]),
            Column::new("sub_name".into(), ["丸の内", "丸の内"]),
            Column::new("人口".into(), [1i64, 2]),
        ])
        .unwrap();

        let result = join_attributes(&boundary(), &[dup], &schema());
        assert!(matches!(result, Err(Error::DuplicateKey { .. })));
    }

    #[test]
    fn granularity_mismatch_is_reported_not_hidden() {
        let city_level = DataFrame::new(vec![
            Column::new("pref_name".into(), ["東京都", "東京都"]),
            Column::new("city_name".into(), ["千代田区", "中央区"]),
            Column::new("sub_name".into(), ["", ""]),
            Column::new("人口".into(), [66000i64, 170000]),
        ])
        .unwrap();

        let (_, reports) = join_attributes(&boundary(), &[city_level], &schema()).unwrap();
        assert!(reports[0].granularity_differs());
        // Only the two city-level boundary rows can match.
        assert_eq!(reports[0].matched, 2);
    }

    #[test]
    fn boundary_row_order_survives_the_join() {
        let (table, _) = join_attributes(&boundary(), &[attributes()], &schema()).unwrap();
        let names = table.names().unwrap();
        assert_eq!(names[0], "東京都千代田区");
        assert_eq!(names[1], "東京都千代田区丸の内");
        assert_eq!(names[3], "東京都中央区");
    }
}
