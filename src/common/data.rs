use std::{fs::File, io::BufWriter, path::Path, sync::Arc};

use anyhow::{Context, Result};
use polars::{
    frame::DataFrame,
    io::{SerReader, SerWriter},
    prelude::{CsvReadOptions, CsvReader, CsvWriter, DataType, Field, Schema, SchemaRef},
};

/// Reads a CSV file from `path` into a Polars DataFrame.
pub fn read_from_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    let df = CsvReader::new(file).finish()?;
    Ok(df)
}

/// Reads a CSV file, forcing the given columns to be read as strings.
/// Used for JIS area code columns so leading zeros survive ("01101" stays "01101").
pub fn read_from_csv_with_string_columns(path: &Path, columns: &[&str]) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    let schema: SchemaRef = Arc::new(Schema::from_iter(
        columns.iter().map(|&name| Field::new(name.into(), DataType::String)),
    ));
    let options = CsvReadOptions::default().with_schema_overwrite(Some(schema));

    let df = CsvReader::new(file).with_options(options).finish()?;
    Ok(df)
}

/// Writes a Polars DataFrame to a CSV file at `path`.
pub fn write_to_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let writer: BufWriter<File> = BufWriter::new(file);
    CsvWriter::new(writer).finish(&mut df.clone())?;
    Ok(())
}
