use std::{fs, path::Path};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Error};
use crate::region::key::CODE;
use crate::region::table::RegionTable;
use crate::types::{AreaCode, AreaLevel};

/// One attribute replacement, keyed by area code.
///
/// A city-level code patches the city row and every sub-area row under it
/// (prefix match); a longer code patches exactly that row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub code: String,
    pub column: String,
    pub value: f64,
}

/// Corrections for known-bad source statistics, applied after the join.
///
/// The upstream dashboard hardcoded these per municipality inside the join;
/// keeping them as a table makes each correction auditable and testable on
/// its own, and lets a deployment inject its own set from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchTable {
    pub patches: Vec<Patch>,
}

impl PatchTable {
    /// The two municipal corrections the original dashboard shipped with:
    /// survey income for 港区 and the census population of 千代田区, both of
    /// which the source statistics table carries stale values for.
    pub fn builtin() -> Self {
        Self {
            patches: vec![
                Patch { code: "13103".to_string(), column: "平均所得".to_string(), value: 1471.0 },
                Patch { code: "13101".to_string(), column: "人口".to_string(), value: 66680.0 },
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json_str(&contents)?)
    }

    #[inline] pub fn is_empty(&self) -> bool { self.patches.is_empty() }

    /// Apply every patch to the joined table, returning how many cells
    /// changed. Patches naming a column the table lacks are skipped; the
    /// correction is for a dataset that isn't loaded.
    pub fn apply(&self, table: RegionTable) -> Result<RegionTable, Error> {
        if self.is_empty() {
            return Ok(table);
        }

        let mut df = table.frame().clone();
        let codes = df
            .column(CODE)
            .map_err(|_| Error::MissingColumn { column: CODE.to_string() })?
            .str()?
            .into_iter()
            .map(|code| code.unwrap_or("").to_string())
            .collect::<Vec<_>>();

        let mut changed = 0usize;
        for patch in &self.patches {
            let Ok(col) = df.column(&patch.column) else { continue };
            let casted = col
                .cast(&DataType::Float64)
                .map_err(|_| Error::NotNumeric { column: patch.column.clone() })?;
            let mut values = casted.f64()?.into_iter().collect::<Vec<_>>();
            for (row, code) in codes.iter().enumerate() {
                if patch_applies(&patch.code, code) {
                    values[row] = Some(patch.value);
                    changed += 1;
                }
            }
            df.with_column(Column::new(patch.column.as_str().into(), values))?;
        }
        debug!(changed, "override patches applied");

        RegionTable::new(df)
    }
}

/// A city-level patch code covers every row whose code truncates to it;
/// deeper patch codes must match exactly.
fn patch_applies(patch_code: &str, row_code: &str) -> bool {
    match (AreaCode::from_code(patch_code), AreaCode::from_code(row_code)) {
        (Some(patch), Some(row)) if patch.level <= AreaLevel::City => {
            *row.to_parent(patch.level).code == *patch.code
        }
        _ => patch_code == row_code,
    }
}
