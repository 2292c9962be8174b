#![doc = "nuriwake public API"]
mod bins;
mod error;
mod export;
mod region;
mod session;
mod types;

pub mod cli;
pub mod commands;
pub mod common;

#[doc(inline)]
pub use bins::{classify, generate, named_palette, Palette, ThresholdMode, ThresholdSet, NO_DATA_COLOR};

#[doc(inline)]
pub use error::{ConfigError, Error};

#[doc(inline)]
pub use export::{legend_json, write_json, LayerBinding, RegionFill};

#[doc(inline)]
pub use region::{
    canonical_key, join_attributes, key_column, view, JoinReport, Patch, PatchTable, RegionTable,
    ViewQuery, ALL_PARENTS,
};

#[doc(inline)]
pub use session::{Dashboard, InteractionState, SeriesSummary};

#[doc(inline)]
pub use types::{pad_code, AreaCode, AreaLevel, AttributeColumn, AttributeSchema, ColumnKind};
