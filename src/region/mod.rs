mod join;
mod key;
mod patch;
mod table;
mod view;

pub use join::{join_attributes, suppress_parents, JoinReport};
pub use key::{canonical_key, key_column, CITY_NAME, CODE, DISTRICT_NAME, FRAGMENTS, GEOMETRY, KEY, PARENT, PREF_NAME, SUB_NAME};
pub use patch::{Patch, PatchTable};
pub use table::RegionTable;
pub use view::{view, ViewQuery, ALL_PARENTS};
