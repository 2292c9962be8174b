use ahash::{AHashMap, AHashSet};
use polars::{frame::DataFrame, prelude::*};

use crate::error::Error;
use crate::region::key::{CITY_NAME, KEY};

/// The joined boundary + attribute table, one row per region.
///
/// Immutable once built; every downstream computation (thresholds, layers,
/// views) reads it without touching it. The index maps the canonical region
/// name to its row, the way the rendering layer addresses polygons.
#[derive(Debug, Clone)]
pub struct RegionTable {
    df: DataFrame,
    index: AHashMap<String, u32>, // Map between canonical names and row indices.
}

impl RegionTable {
    /// Wrap a joined table, indexing it by the canonical `name` column.
    /// A repeated name would make color binding ambiguous, so it is rejected.
    pub fn new(df: DataFrame) -> Result<Self, Error> {
        let names = df
            .column(KEY)
            .map_err(|_| Error::MissingColumn { column: KEY.to_string() })?
            .str()
            .map_err(Error::Polars)?;

        let mut index = AHashMap::with_capacity(df.height());
        for (row, name) in names.into_iter().enumerate() {
            let name = name.unwrap_or("").to_string();
            if index.insert(name.clone(), row as u32).is_some() {
                return Err(Error::DuplicateKey { key: name });
            }
        }

        Ok(Self { df, index })
    }

    /// Get an immutable reference to the underlying table.
    #[inline] pub fn frame(&self) -> &DataFrame { &self.df }

    /// Number of regions.
    #[inline] pub fn height(&self) -> usize { self.df.height() }

    /// Row index of a region by canonical name.
    #[inline] pub fn row_of(&self, name: &str) -> Option<u32> { self.index.get(name).copied() }

    /// Canonical region names, in table order.
    pub fn names(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .df
            .column(KEY)?
            .str()?
            .into_iter()
            .map(|name| name.unwrap_or("").to_string())
            .collect())
    }

    /// A numeric attribute column as per-row optional values, cast to f64.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>, Error> {
        let col = self
            .df
            .column(column)
            .map_err(|_| Error::MissingColumn { column: column.to_string() })?;
        // A string column would "cast" by parsing, silently turning text into
        // nulls; reject it outright instead.
        if matches!(col.dtype(), DataType::String | DataType::Boolean) {
            return Err(Error::NotNumeric { column: column.to_string() });
        }
        let casted = col
            .cast(&DataType::Float64)
            .map_err(|_| Error::NotNumeric { column: column.to_string() })?;
        Ok(casted.f64()?.into_iter().collect())
    }

    /// The present (non-null) values of a numeric column, in table order.
    pub fn present_values(&self, column: &str) -> Result<Vec<f64>, Error> {
        Ok(self.numeric_column(column)?.into_iter().flatten().collect())
    }

    /// Distinct city-level names in first-appearance order, for parent filters.
    pub fn parent_names(&self) -> Result<Vec<String>, Error> {
        let cities = self
            .df
            .column(CITY_NAME)
            .map_err(|_| Error::MissingColumn { column: CITY_NAME.to_string() })?
            .str()?;

        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        for city in cities.into_iter().flatten() {
            if seen.insert(city) {
                out.push(city.to_string());
            }
        }
        Ok(out)
    }
}
