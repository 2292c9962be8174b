pub(crate) mod data;
pub(crate) mod fs;

pub use data::{read_from_csv, read_from_csv_with_string_columns, write_to_csv};
pub use fs::ensure_dir_exists;
