use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::bins::ThresholdSet;
use crate::session::SeriesSummary;

/// The fill computed for one region: everything the renderer and tooltip
/// need, keyed by canonical name.
#[derive(Debug, Clone, Serialize)]
pub struct RegionFill {
    pub name: String,
    pub value: Option<f64>,
    pub bucket: Option<usize>,
    pub color: String,
}

/// One choropleth layer ready for the rendering collaborator: bin edges for
/// the legend plus a fill per region. Geometry stays on the renderer's side;
/// it binds by `name`.
#[derive(Debug, Clone, Serialize)]
pub struct LayerBinding {
    pub column: String,
    pub palette: String,
    pub edges: Vec<f64>,
    pub fills: Vec<RegionFill>,
}

impl LayerBinding {
    pub fn to_json(&self) -> Value {
        json!({
            "column": self.column,
            "palette": self.palette,
            "edges": self.edges.iter().map(|&e| edge_value(e)).collect::<Vec<_>>(),
            "fills": self.fills,
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_json(&self.to_json(), path)
    }
}

/// Legend payload for one threshold set: the edges plus the series min/max
/// the dashboard shows beside them.
pub fn legend_json(set: &ThresholdSet, summary: &SeriesSummary) -> Value {
    json!({
        "edges": set.edges().iter().map(|&e| edge_value(e)).collect::<Vec<_>>(),
        "division": set.division(),
        "monotonic": set.is_monotonic(),
        "min": edge_value(summary.min),
        "max": edge_value(summary.max),
        "count": summary.count,
        "nulls": summary.nulls,
    })
}

pub fn write_json(value: &Value, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Integral edges render without a decimal point (a legend reading "2.0 –
/// 10.0" for a count column looks wrong), fractional ones keep it.
fn edge_value(edge: f64) -> Value {
    if edge.is_finite() && edge.fract() == 0.0 && edge.abs() < i64::MAX as f64 {
        json!(edge as i64)
    } else {
        json!(edge)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{legend_json, LayerBinding, RegionFill};
    use crate::bins::ThresholdSet;
    use crate::session::SeriesSummary;

    #[test]
    fn integral_edges_serialize_without_decimal_point() {
        let set = ThresholdSet::from_edges(vec![2.0, 10.0, 20.5, 30.0]).unwrap();
        let summary = SeriesSummary { min: 2.0, max: 30.0, count: 5, nulls: 0 };
        let legend = legend_json(&set, &summary);
        assert_eq!(legend["edges"], json!([2, 10, 20.5, 30]));
        assert_eq!(legend["min"], json!(2));
        assert_eq!(legend["division"], json!(4));
        assert_eq!(legend["monotonic"], json!(true));
    }

    #[test]
    fn layer_json_carries_name_and_color_per_region() {
        let layer = LayerBinding {
            column: "高校生数".to_string(),
            palette: "BuGn".to_string(),
            edges: vec![2.0, 10.0, 20.0, 30.0],
            fills: vec![RegionFill {
                name: "千代田区丸の内".to_string(),
                value: Some(9.0),
                bucket: Some(0),
                color: "#f7fcfd".to_string(),
            }],
        };
        let value = layer.to_json();
        assert_eq!(value["fills"][0]["name"], json!("千代田区丸の内"));
        assert_eq!(value["fills"][0]["color"], json!("#f7fcfd"));
        assert_eq!(value["edges"], json!([2, 10, 20, 30]));
    }
}
