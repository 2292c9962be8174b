use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

/// Choropleth binning CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "nuriwake", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join attribute tables onto a boundary table and apply patches
    Join(JoinArgs),

    /// Compute bin edges for one column of a joined table
    Bins(BinsArgs),

    /// Produce the per-region color layer for one column
    Layer(LayerArgs),

    /// Filter and sort a joined table for tabular display
    View(ViewArgs),
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Boundary CSV (code/name fragments + opaque geometry)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub boundary: PathBuf,

    /// Attribute CSV; repeat for additional tables
    #[arg(long = "attr", required = true, value_hint = ValueHint::FilePath)]
    pub attrs: Vec<PathBuf>,

    /// Patch table JSON (defaults to the builtin municipal corrections)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub patches: Option<PathBuf>,

    /// Column schema JSON (defaults to the builtin dashboard columns)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub schema: Option<PathBuf>,

    /// Output CSV for the joined table
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum BinMode { Linear, Quantile }

#[derive(Args, Debug)]
pub struct BinsArgs {
    /// Joined table CSV (output of `join`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Attribute column
    #[arg(short, long)]
    pub column: String,

    /// Division count (number of edges)
    #[arg(short = 'n', long, default_value_t = 9)]
    pub division: usize,

    #[arg(long, value_enum, default_value_t = BinMode::Linear)]
    pub mode: BinMode,

    /// Interior edge default step for linear mode
    #[arg(long, default_value_t = 25.0)]
    pub step: f64,

    /// Interior edge override, as INDEX=VALUE; repeatable
    #[arg(long = "override", value_parser = parse_override)]
    pub overrides: Vec<(usize, f64)>,

    /// Output legend JSON (stdout if omitted)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LayerArgs {
    /// Joined table CSV (output of `join`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Attribute column
    #[arg(short, long)]
    pub column: String,

    /// Color ramp name (BuGn, RdPu, YlGnBu, OrRd)
    #[arg(short, long, default_value = "BuGn")]
    pub palette: String,

    /// Explicit comma-separated edges, bypassing generation
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["division", "mode", "step", "overrides"])]
    pub edges: Option<Vec<f64>>,

    #[arg(short = 'n', long, default_value_t = 9)]
    pub division: usize,

    #[arg(long, value_enum, default_value_t = BinMode::Linear)]
    pub mode: BinMode,

    #[arg(long, default_value_t = 25.0)]
    pub step: f64,

    #[arg(long = "override", value_parser = parse_override)]
    pub overrides: Vec<(usize, f64)>,

    /// Output layer JSON (stdout if omitted)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Joined table CSV (output of `join`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Column to sort by; rows missing it are dropped
    #[arg(short, long)]
    pub column: String,

    /// City-level name to filter to ("ALL" keeps everything)
    #[arg(long)]
    pub parent: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long)]
    pub descending: bool,

    /// Output CSV (stdout summary if omitted)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Parse an `INDEX=VALUE` edge override.
fn parse_override(s: &str) -> Result<(usize, f64), String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got {s:?}"))?;
    let index = index.trim().parse::<usize>().map_err(|e| format!("bad index {index:?}: {e}"))?;
    let value = value.trim().parse::<f64>().map_err(|e| format!("bad value {value:?}: {e}"))?;
    Ok((index, value))
}

#[cfg(test)]
mod tests {
    use super::parse_override;

    #[test]
    fn override_parses_index_and_value() {
        assert_eq!(parse_override("3=45.5"), Ok((3, 45.5)));
        assert_eq!(parse_override(" 1 = 10 "), Ok((1, 10.0)));
        assert!(parse_override("3").is_err());
        assert!(parse_override("x=1").is_err());
    }
}
