use polars::{frame::DataFrame, prelude::*};

use crate::error::Error;
use crate::region::key::PARENT;

/// Sentinel parent filter meaning "every region".
pub const ALL_PARENTS: &str = "ALL";

/// One tabular drill-down request: which parent region, which column, which
/// direction.
#[derive(Debug, Clone)]
pub struct ViewQuery {
    /// City-level name to restrict to; `None` or `"ALL"` keeps everything.
    pub parent: Option<String>,
    /// Column to sort by; rows with a null here are dropped, not shown blank.
    pub column: String,
    pub ascending: bool,
}

impl ViewQuery {
    pub fn new(column: &str) -> Self {
        Self { parent: None, column: column.to_string(), ascending: true }
    }

    fn filters_parent(&self) -> Option<&str> {
        match self.parent.as_deref() {
            None | Some(ALL_PARENTS) => None,
            Some(parent) => Some(parent),
        }
    }
}

/// Derive the display table for one query: filter by parent region, drop rows
/// missing the sort column, stable-sort. The input table is never mutated.
pub fn view(df: &DataFrame, query: &ViewQuery) -> Result<DataFrame, Error> {
    if df.column(&query.column).is_err() {
        return Err(Error::MissingColumn { column: query.column.clone() });
    }

    let mut lf = df.clone().lazy();
    if let Some(parent) = query.filters_parent() {
        lf = lf.filter(col(PARENT).eq(lit(parent)));
    }
    lf = lf.filter(col(&query.column).is_not_null());

    let sorted = lf
        .sort(
            [query.column.as_str()],
            SortMultipleOptions::default()
                .with_order_descending(!query.ascending)
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(sorted)
}
