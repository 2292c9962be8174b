mod area_code;
mod schema;

pub use area_code::{pad_code, AreaCode, AreaLevel};
pub use schema::{AttributeColumn, AttributeSchema, ColumnKind};
