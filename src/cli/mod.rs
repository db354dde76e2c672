//! Command-line parsing for the Bovespa statements dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the filter/aggregation code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::catalog::MetricGroup;
use crate::io::DecimalStyle;
use crate::metrics::Aggregation;
use crate::viz::VizMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bvd", version, about = "Bovespa financial statements dashboard")]
pub struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute one metric group and print it as a text report.
    Show(ShowArgs),
    /// List metric groups and their charts.
    Groups,
    /// List segments, companies and the year range available for filtering.
    Options(OptionsArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same dashboard pipeline as `bvd show`, but renders panels
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Where the statements come from.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Statements CSV (defaults to `$BOVESPA_CSV`, then `database.csv`).
    #[arg(short = 'f', long = "data", value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Decimal convention of numeric cells. Use `comma` for pt-BR exports.
    #[arg(long, value_enum, default_value_t = DecimalStyle::Point)]
    pub decimal: DecimalStyle,
}

/// Filter selection shared by `show` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Segment (`TIPO`). Defaults to the most recently listed segment.
    #[arg(short = 's', long, conflicts_with = "all_segments")]
    pub segment: Option<String>,

    /// Do not restrict by segment.
    #[arg(long)]
    pub all_segments: bool,

    /// First fiscal year (inclusive). Defaults to 2019 or the earliest year available.
    #[arg(long = "from", value_name = "YEAR")]
    pub from: Option<i32>,

    /// Last fiscal year (inclusive). Defaults to the latest year available.
    #[arg(long = "to", value_name = "YEAR")]
    pub to: Option<i32>,

    /// Restrict to a company (`DENOM_CIA`); repeat for several.
    #[arg(short = 'c', long = "company", value_name = "NAME")]
    pub companies: Vec<String>,
}

/// Options for a text dashboard.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Metric group to display.
    #[arg(short = 'g', long, value_enum, default_value_t = MetricGroup::Liquidez)]
    pub group: MetricGroup,

    /// Visualization for charts that offer alternatives.
    #[arg(long, value_enum, default_value_t = VizMode::Line)]
    pub viz: VizMode,

    /// Aggregation used when a chart is drawn as bars.
    #[arg(short = 'a', long = "agg", value_enum, default_value_t = Aggregation::Mean)]
    pub aggregation: Aggregation,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Export the computed dashboard to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only list companies and years within this segment.
    #[arg(short = 's', long)]
    pub segment: Option<String>,
}

/// Options for the interactive dashboard.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Initial metric group.
    #[arg(short = 'g', long, value_enum, default_value_t = MetricGroup::Liquidez)]
    pub group: MetricGroup,

    /// Initial visualization.
    #[arg(long, value_enum, default_value_t = VizMode::Line)]
    pub viz: VizMode,

    /// Initial aggregation.
    #[arg(short = 'a', long = "agg", value_enum, default_value_t = Aggregation::Mean)]
    pub aggregation: Aggregation,

    /// Where `e` writes the JSON export.
    #[arg(long, value_name = "JSON", default_value = "dashboard.json")]
    pub export: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_filters_and_choices() {
        let cli = Cli::parse_from([
            "bvd", "show", "-s", "Q", "--from", "2019", "--to", "2021", "-c", "ALFA SA", "-c", "BETA SA",
            "-g", "retorno", "--viz", "heatmap", "--agg", "std-dev", "--decimal", "comma",
        ]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.filter.segment.as_deref(), Some("Q"));
        assert_eq!((args.filter.from, args.filter.to), (Some(2019), Some(2021)));
        assert_eq!(args.filter.companies, ["ALFA SA", "BETA SA"]);
        assert_eq!(args.group, MetricGroup::Retorno);
        assert_eq!(args.viz, VizMode::Heatmap);
        assert_eq!(args.aggregation, Aggregation::StdDev);
        assert_eq!(args.data.decimal, DecimalStyle::Comma);
    }

    #[test]
    fn decimal_style_defaults_to_point() {
        let cli = Cli::parse_from(["bvd", "options"]);
        let Command::Options(args) = cli.command else {
            panic!("expected options");
        };
        assert_eq!(args.data.decimal, DecimalStyle::Point);
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::parse_from(["bvd", "groups", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn segment_conflicts_with_all_segments() {
        let res = Cli::try_parse_from(["bvd", "show", "-s", "Q", "--all-segments"]);
        assert!(res.is_err());
    }
}
