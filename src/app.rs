//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the statements dataset (once)
//! - resolves filter defaults against the data
//! - prints reports/plots or hands over to the TUI
//! - writes optional exports

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DataArgs, FilterArgs, OptionsArgs, ShowArgs};
use crate::domain::Dataset;
use crate::error::AppError;
use crate::filter::{FilterOptions, FilterSpec};
use crate::io::DatasetCache;

pub mod pipeline;

pub use pipeline::{Dashboard, DashboardRequest, build_dashboard};

/// Earliest fiscal year selected by default.
pub const DEFAULT_FIRST_YEAR: i32 = 2019;

/// Entry point for the `bvd` binary.
pub fn run() -> Result<(), AppError> {
    // We want `bvd` and `bvd -s Q` to behave like `bvd tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; log lines would tear its frames.
    if !matches!(cli.command, Command::Tui(_)) {
        init_tracing(cli.verbose);
    }

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Groups => {
            print!("{}", crate::report::format_groups());
            Ok(())
        }
        Command::Options(args) => handle_options(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn open_cache(args: &DataArgs) -> DatasetCache {
    DatasetCache::from_env(args.data.clone(), args.decimal)
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let cache = open_cache(&args.data);
    let dataset = cache.get()?;

    let request = DashboardRequest {
        filter: filter_from_args(dataset, &args.filter),
        group: args.group,
        viz: args.viz,
        aggregation: args.aggregation,
    };
    let dashboard = build_dashboard(dataset, &request)?;

    println!("{}", crate::report::format_dashboard(&dashboard, args.width));

    if let Some(path) = &args.export {
        crate::io::export::write_dashboard_json(path, &dashboard)?;
    }

    Ok(())
}

fn handle_options(args: OptionsArgs) -> Result<(), AppError> {
    let cache = open_cache(&args.data);
    let dataset = cache.get()?;
    let options = FilterOptions::from_dataset(dataset, args.segment.as_deref());
    print!("{}", crate::report::format_options(&options, args.segment.as_deref()));
    Ok(())
}

/// Resolve CLI filter flags against the data.
///
/// - no segment flag: the first listed segment (last to appear in the file)
/// - `--all-segments`: no segment restriction
/// - missing years: `max(2019, earliest)` .. latest within the segment
///
/// Explicit years are kept as given, so an inverted range still surfaces as
/// `InvalidRange` from the filter.
pub fn filter_from_args(dataset: &Dataset, args: &FilterArgs) -> FilterSpec {
    let segment = if args.all_segments {
        None
    } else {
        args.segment.clone().or_else(|| {
            FilterOptions::from_dataset(dataset, None)
                .segments
                .into_iter()
                .next()
        })
    };

    let bounds = FilterOptions::from_dataset(dataset, segment.as_deref()).year_bounds;
    let (lo, hi) = default_year_range(bounds);

    FilterSpec::new(segment, args.from.unwrap_or(lo), args.to.unwrap_or(hi))
        .with_companies(args.companies.iter().cloned())
}

/// Default selection for the year range: from 2019 (or the earliest year, if
/// later) to the latest year.
pub fn default_year_range(bounds: Option<(i32, i32)>) -> (i32, i32) {
    match bounds {
        Some((lo, hi)) => (DEFAULT_FIRST_YEAR.max(lo).min(hi), hi),
        None => (DEFAULT_FIRST_YEAR, DEFAULT_FIRST_YEAR),
    }
}

/// Rewrite argv so `bvd` defaults to `bvd tui`.
///
/// Rules:
/// - `bvd`                      -> `bvd tui`
/// - `bvd -s Q ...`             -> `bvd tui -s Q ...`
/// - `bvd --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "groups" | "options" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
