use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::*};
use tracing::info;

use crate::bins::ThresholdMode;
use crate::cli::{BinMode, BinsArgs, Cli, JoinArgs, LayerArgs, ViewArgs};
use crate::common::{self, fs::ensure_parent_exists};
use crate::export::{legend_json, write_json};
use crate::region::{join_attributes, PatchTable, RegionTable, CODE};
use crate::session::{Dashboard, InteractionState};
use crate::types::{pad_code, AttributeSchema};

pub fn join(_cli: &Cli, args: &JoinArgs) -> Result<()> {
    let boundary = pad_codes(common::read_from_csv_with_string_columns(&args.boundary, &[CODE])?)?;

    let attrs = args
        .attrs
        .iter()
        .map(|path| common::read_from_csv(path))
        .collect::<Result<Vec<_>>>()?;

    let schema = match &args.schema {
        Some(path) => AttributeSchema::from_file(path)?,
        None => AttributeSchema::builtin(),
    };
    let patches = match &args.patches {
        Some(path) => PatchTable::from_file(path)?,
        None => PatchTable::builtin(),
    };

    let (table, reports) = join_attributes(&boundary, &attrs, &schema)?;
    for (path, report) in args.attrs.iter().zip(&reports) {
        info!(
            attr = %path.display(),
            matched = report.matched,
            total = report.total,
            rate = %format!("{:.1}%", report.match_rate() * 100.0),
            "attribute table joined"
        );
    }

    let table = patches.apply(table)?;

    ensure_parent_exists(&args.output)?;
    common::write_to_csv(table.frame(), &args.output)
        .with_context(|| format!("Failed to write joined table to {}", args.output.display()))?;
    info!(regions = table.height(), output = %args.output.display(), "joined table written");

    Ok(())
}

pub fn bins(_cli: &Cli, args: &BinsArgs) -> Result<()> {
    let dashboard = load_dashboard(&args.input)?;

    let mut state = InteractionState::new(&args.column).with_division(args.division);
    state.mode = threshold_mode(args.mode, args.step);
    state.overrides = collect_overrides(&args.overrides);

    let set = dashboard.thresholds(&state)?;
    let summary = dashboard.summary(&args.column)?;
    let legend = legend_json(&set, &summary);

    emit_json(&legend, args.output.as_deref())
}

pub fn layer(_cli: &Cli, args: &LayerArgs) -> Result<()> {
    let dashboard = load_dashboard(&args.input)?;

    let mut state = InteractionState::new(&args.column).with_division(args.division);
    state.mode = threshold_mode(args.mode, args.step);
    state.overrides = collect_overrides(&args.overrides);
    state.palette = args.palette.clone();
    if let Some(edges) = &args.edges {
        state = state.with_edges(edges.clone());
    }

    let layer = dashboard.layer(&state)?;
    info!(column = %layer.column, regions = layer.fills.len(), "layer computed");

    emit_json(&layer.to_json(), args.output.as_deref())
}

pub fn view(_cli: &Cli, args: &ViewArgs) -> Result<()> {
    let dashboard = load_dashboard(&args.input)?;

    let mut state = InteractionState::new(&args.column);
    state.parent = args.parent.clone();
    state.ascending = !args.descending;

    let out = dashboard.view(&state)?;
    match &args.output {
        Some(path) => {
            ensure_parent_exists(path)?;
            common::write_to_csv(&out, path)?;
            info!(rows = out.height(), output = %path.display(), "view written");
        }
        None => println!("{out}"),
    }

    Ok(())
}

/// Restore leading zeros the code column may have lost to an upstream tool
/// that parsed it numerically ("1101" -> "01101").
fn pad_codes(mut df: DataFrame) -> Result<DataFrame> {
    if let Ok(col) = df.column(CODE) {
        let padded = col
            .str()?
            .into_iter()
            .map(|code| code.map(pad_code))
            .collect::<StringChunked>()
            .with_name(CODE.into());
        df.with_column(padded.into_series())?;
    }
    Ok(df)
}

fn load_dashboard(input: &Path) -> Result<Dashboard> {
    let df = common::read_from_csv_with_string_columns(input, &[CODE])
        .or_else(|_| common::read_from_csv(input))?;
    let table = RegionTable::new(df)
        .with_context(|| format!("{} is not a joined region table", input.display()))?;
    Ok(Dashboard::new(table))
}

fn threshold_mode(mode: BinMode, step: f64) -> ThresholdMode {
    match mode {
        BinMode::Linear => ThresholdMode::Linear { step },
        BinMode::Quantile => ThresholdMode::Quantile,
    }
}

fn collect_overrides(overrides: &[(usize, f64)]) -> BTreeMap<usize, f64> {
    overrides.iter().copied().collect()
}

fn emit_json(value: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            ensure_parent_exists(path)?;
            write_json(value, path)?;
            info!(output = %path.display(), "JSON written");
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
