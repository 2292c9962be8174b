use std::{collections::BTreeMap, sync::Arc};

use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};

use crate::bins::{classify, generate, named_palette, ThresholdMode, ThresholdSet, NO_DATA_COLOR};
use crate::error::Error;
use crate::export::{LayerBinding, RegionFill};
use crate::region::{view, RegionTable, ViewQuery};

/// Everything one user interaction parameterizes, as a single immutable
/// value.
///
/// The dashboard replaces the whole state on every widget change instead of
/// mutating it in place, so no interaction can see another's leftovers. All
/// computations are pure functions of (table, state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionState {
    /// Attribute column driving the choropleth.
    pub column: String,
    /// Number of bin edges.
    pub division: usize,
    pub mode: ThresholdMode,
    /// Per-index interior edge overrides from the threshold spinners.
    #[serde(default)]
    pub overrides: BTreeMap<usize, f64>,
    /// Explicit edges, bypassing generation entirely (the fixed age bins).
    #[serde(default)]
    pub explicit_edges: Option<Vec<f64>>,
    /// Color ramp name.
    pub palette: String,
    /// City-level filter for the drill-down table; `None`/"ALL" keeps all.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_true")]
    pub ascending: bool,
}

fn default_true() -> bool { true }

impl InteractionState {
    /// Division bounds and defaults of the original UI controls.
    pub const MIN_DIVISION: usize = 4;
    pub const MAX_DIVISION: usize = 100;
    pub const DEFAULT_DIVISION: usize = 9;
    pub const DEFAULT_STEP: f64 = 25.0;

    /// State as the dashboard first opens on a column: 9 divisions, linear
    /// interior defaults at multiples of 25, BuGn ramp, every parent shown.
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            division: Self::DEFAULT_DIVISION,
            mode: ThresholdMode::Linear { step: Self::DEFAULT_STEP },
            overrides: BTreeMap::new(),
            explicit_edges: None,
            palette: "BuGn".to_string(),
            parent: None,
            ascending: true,
        }
    }

    /// Replacement state with a different division count.
    pub fn with_division(mut self, division: usize) -> Self {
        self.division = division;
        self
    }

    /// Replacement state with one interior edge overridden.
    pub fn with_override(mut self, index: usize, value: f64) -> Self {
        self.overrides.insert(index, value);
        self
    }

    /// Replacement state with explicit edges instead of generated ones.
    pub fn with_edges(mut self, edges: Vec<f64>) -> Self {
        self.explicit_edges = Some(edges);
        self
    }

    /// Enforce the dashboard's division bounds (the library itself only
    /// requires two edges; the UI spinner runs 4..=100).
    pub fn validate(&self) -> Result<(), Error> {
        if self.explicit_edges.is_some() {
            return Ok(()); // explicit edges carry their own division count
        }
        if self.division < Self::MIN_DIVISION {
            return Err(Error::InvalidDivision { division: self.division, min: Self::MIN_DIVISION });
        }
        if self.division > Self::MAX_DIVISION {
            return Err(Error::ExcessiveDivision { division: self.division, max: Self::MAX_DIVISION });
        }
        Ok(())
    }
}

/// Min/max and presence counts for one column, shown beside the threshold
/// controls (最小値/最大値).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub nulls: usize,
}

/// The interaction session: one immutable joined table, queried per state.
///
/// Owns the table behind an `Arc` so snapshots and UI layers can share it
/// without copies; nothing here ever writes to it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    regions: Arc<RegionTable>,
}

impl Dashboard {
    pub fn new(regions: impl Into<Arc<RegionTable>>) -> Self {
        Self { regions: regions.into() }
    }

    /// Get an immutable reference to the joined region table.
    #[inline] pub fn regions(&self) -> &RegionTable { &self.regions }

    /// Bin edges for the state's column: explicit edges if the state carries
    /// them, otherwise generated from the column's present values.
    pub fn thresholds(&self, state: &InteractionState) -> Result<ThresholdSet, Error> {
        state.validate()?;
        if let Some(edges) = &state.explicit_edges {
            return ThresholdSet::from_edges(edges.clone());
        }
        let series = self.regions.present_values(&state.column)?;
        generate(&series, state.division, &state.overrides, state.mode)
    }

    /// The one parameterized render-layer operation: thresholds, sampled
    /// palette, and a `{name, value, bucket, color}` fill per region. The
    /// renderer binds fills to polygons by name and the edges become the
    /// legend.
    pub fn layer(&self, state: &InteractionState) -> Result<LayerBinding, Error> {
        let edges = self.thresholds(state)?;
        let palette = named_palette(&state.palette)?;
        let colors = palette.sample(edges.buckets());

        let names = self.regions.names()?;
        let values = self.regions.numeric_column(&state.column)?;

        let fills = names
            .into_iter()
            .zip(values)
            .map(|(name, value)| {
                let bucket = classify(value, &edges);
                let color = match bucket {
                    Some(b) => colors[b].clone(),
                    None => NO_DATA_COLOR.to_string(),
                };
                RegionFill { name, value, bucket, color }
            })
            .collect();

        Ok(LayerBinding {
            column: state.column.clone(),
            palette: palette.name.to_string(),
            edges: edges.edges().to_vec(),
            fills,
        })
    }

    /// The drill-down table for the state's parent filter and sort column.
    pub fn view(&self, state: &InteractionState) -> Result<DataFrame, Error> {
        let query = ViewQuery {
            parent: state.parent.clone(),
            column: state.column.clone(),
            ascending: state.ascending,
        };
        view(self.regions.frame(), &query)
    }

    /// Min/max and presence counts for a column.
    pub fn summary(&self, column: &str) -> Result<SeriesSummary, Error> {
        let values = self.regions.numeric_column(column)?;
        let nulls = values.iter().filter(|v| v.is_none()).count();
        let present = values.into_iter().flatten().filter(|v| v.is_finite()).collect::<Vec<_>>();
        if present.is_empty() {
            return Err(Error::EmptySeries);
        }
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(SeriesSummary { min, max, count: present.len(), nulls })
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::{Dashboard, InteractionState};
    use crate::bins::NO_DATA_COLOR;
    use crate::error::Error;
    use crate::region::RegionTable;

    fn dashboard() -> Dashboard {
        let df = DataFrame::new(vec![
            Column::new("name".into(), ["丸の内", "神田", "麹町", "銀座"]),
            Column::new("city_name".into(), ["千代田区", "千代田区", "千代田区", "中央区"]),
            Column::new("parent_name".into(), ["千代田区", "千代田区", "千代田区", "中央区"]),
            Column::new("高校生数".into(), [Some(5.0), Some(12.0), None, Some(30.0)]),
        ])
        .unwrap();
        Dashboard::new(RegionTable::new(df).unwrap())
    }

    fn state() -> InteractionState {
        let mut s = InteractionState::new("高校生数");
        s.division = 4;
        s.mode = crate::bins::ThresholdMode::Linear { step: 10.0 };
        s
    }

    #[test]
    fn division_bounds_are_enforced_per_state() {
        let dash = dashboard();
        assert!(matches!(
            dash.thresholds(&state().with_division(3)),
            Err(Error::InvalidDivision { min: 4, .. })
        ));
        assert!(matches!(
            dash.thresholds(&state().with_division(101)),
            Err(Error::ExcessiveDivision { max: 100, .. })
        ));
        assert!(dash.thresholds(&state()).is_ok());
    }

    #[test]
    fn thresholds_come_from_present_values_only() {
        let set = dashboard().thresholds(&state()).unwrap();
        assert_eq!(set.edges(), &[5.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn explicit_edges_bypass_generation_and_bounds() {
        let set = dashboard()
            .thresholds(&state().with_edges(vec![0.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 70.0]))
            .unwrap();
        assert_eq!(set.division(), 8);
    }

    #[test]
    fn layer_colors_every_region_once() {
        let layer = dashboard().layer(&state()).unwrap();
        assert_eq!(layer.fills.len(), 4);
        assert_eq!(layer.edges.len(), 4);

        let missing = &layer.fills[2];
        assert_eq!(missing.name, "麹町");
        assert_eq!(missing.bucket, None);
        assert_eq!(missing.color, NO_DATA_COLOR);

        let top = &layer.fills[3];
        assert_eq!(top.bucket, Some(2)); // 30 hits the closed top bucket
    }

    #[test]
    fn same_state_always_yields_the_same_layer() {
        let dash = dashboard();
        let a = dash.layer(&state()).unwrap();
        let b = dash.layer(&state()).unwrap();
        assert_eq!(a.fills.iter().map(|f| &f.color).collect::<Vec<_>>(),
                   b.fills.iter().map(|f| &f.color).collect::<Vec<_>>());
    }

    #[test]
    fn view_respects_parent_and_direction() {
        let mut s = state();
        s.parent = Some("千代田区".to_string());
        s.ascending = false;
        let out = dashboard().view(&s).unwrap();
        assert_eq!(out.height(), 2); // null 麹町 dropped, 銀座 filtered out
        let counts = out.column("高校生数").unwrap().f64().unwrap();
        assert_eq!(counts.get(0), Some(12.0));
    }

    #[test]
    fn summary_reports_min_max_and_nulls() {
        let summary = dashboard().summary("高校生数").unwrap();
        assert_eq!(summary.min, 5.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.nulls, 1);
    }

    #[test]
    fn one_failing_artifact_leaves_others_usable() {
        let dash = dashboard();
        assert!(matches!(
            dash.layer(&InteractionState::new("存在しない列")),
            Err(Error::MissingColumn { .. })
        ));
        assert!(dash.layer(&state()).is_ok());
    }
}
