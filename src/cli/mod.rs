//! Command-line parsing for the depth-profile tool.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ModelKind, ProfileQuantity};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dprof", version, about = "Strain / Debye-Waller depth-profile models")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a profile on a depth grid and print/export it.
    Eval(EvalArgs),
    /// Re-express a parameter vector with a different number of parameters.
    Resample(ResampleArgs),
    /// Fit a model to measured depth/value pairs.
    Fit(FitArgs),
    /// Generate noisy synthetic data from known parameters and fit it back.
    Demo(DemoArgs),
    /// Print a previously exported profile JSON.
    Show(ShowArgs),
}

/// Model selection: by name, or by legacy integer code.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Model kind.
    #[arg(short = 'm', long, value_enum, conflicts_with = "code")]
    pub model: Option<ModelKind>,

    /// Legacy integer model code (0..=6).
    #[arg(long)]
    pub code: Option<i64>,
}

/// Depth grid: explicit samples, or an evenly spaced grid.
#[derive(Debug, Args, Clone)]
pub struct GridArgs {
    /// Explicit comma-separated depth samples.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub depth: Vec<f64>,

    /// Number of grid samples when `--depth` is not given.
    #[arg(long, default_value_t = 101)]
    pub slices: usize,

    /// Grid extent when `--depth` is not given (defaults to the thickness).
    #[arg(long)]
    pub damaged_depth: Option<f64>,
}

/// Levenberg–Marquardt settings.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Maximum solver iterations.
    #[arg(long = "max-iter", default_value_t = 200)]
    pub max_iterations: usize,

    /// Relative sum-of-squares tolerance.
    #[arg(long, default_value_t = 1.49012e-8)]
    pub ftol: f64,

    /// Relative step-size tolerance.
    #[arg(long, default_value_t = 1.49012e-8)]
    pub xtol: f64,

    /// Wall-clock budget in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Lower bound applied to every free parameter.
    #[arg(long, allow_negative_numbers = true)]
    pub lower: Option<f64>,

    /// Upper bound applied to every free parameter.
    #[arg(long, allow_negative_numbers = true)]
    pub upper: Option<f64>,
}

#[derive(Debug, Parser, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Comma-separated parameters (packed buffer for `*-inline` models).
    #[arg(short = 'p', long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub params: Vec<f64>,

    /// Total thickness of the damaged layer.
    #[arg(short = 't', long)]
    pub thickness: f64,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Quantity the profile describes (labels reports and exports).
    #[arg(long, value_enum, default_value_t = ProfileQuantity::Strain)]
    pub quantity: ProfileQuantity,

    /// Maximum table rows printed.
    #[arg(long, default_value_t = 21)]
    pub rows: usize,

    /// Export the depth/value table to CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export model, parameters, and evaluated grid to JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ResampleArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Comma-separated parameters to resample.
    #[arg(short = 'p', long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub params: Vec<f64>,

    /// Total thickness of the damaged layer.
    #[arg(short = 't', long)]
    pub thickness: f64,

    /// Number of parameters after resampling.
    #[arg(short = 'n', long)]
    pub new_size: usize,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[arg(long, value_enum, default_value_t = ProfileQuantity::Strain)]
    pub quantity: ProfileQuantity,

    /// Export old and resampled profiles to CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export the resampled model to JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Two-column measured profile file (depth, value); comma, tab, or space separated.
    #[arg(short = 'i', long, conflicts_with_all = ["depth", "values"])]
    pub input: Option<PathBuf>,

    /// Comma-separated measured depths (referenced from the bottom of the layer).
    #[arg(long, value_delimiter = ',', required_unless_present = "input", allow_hyphen_values = true)]
    pub depth: Vec<f64>,

    /// Comma-separated measured values, one per depth.
    #[arg(long, value_delimiter = ',', required_unless_present = "input", allow_hyphen_values = true)]
    pub values: Vec<f64>,

    /// Number of free parameters (ignored for peak shapes).
    #[arg(short = 'n', long, default_value_t = 5)]
    pub size: usize,

    /// Layer thickness (defaults to the deepest sample; peak shapes always use it).
    #[arg(short = 't', long)]
    pub thickness: Option<f64>,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[arg(long, value_enum, default_value_t = ProfileQuantity::Strain)]
    pub quantity: ProfileQuantity,

    /// Export measured and fitted values to CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export the fitted model to JSON.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Comma-separated true parameters used to synthesize data.
    #[arg(short = 'p', long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub params: Vec<f64>,

    /// Total thickness of the damaged layer.
    #[arg(short = 't', long)]
    pub thickness: f64,

    /// Number of synthetic samples.
    #[arg(long, default_value_t = 101)]
    pub samples: usize,

    /// Standard deviation of the additive Gaussian noise.
    #[arg(long, default_value_t = 1e-4)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[arg(long, value_enum, default_value_t = ProfileQuantity::Strain)]
    pub quantity: ProfileQuantity,

    /// Export synthetic, clean, and fitted values to CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Profile JSON file produced by `--export-json`.
    #[arg(value_name = "JSON")]
    pub profile: PathBuf,

    /// Maximum table rows printed.
    #[arg(long, default_value_t = 21)]
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_lists() {
        let cli = Cli::parse_from([
            "dprof", "eval", "-m", "histogram", "-p", "1,2", "-t", "40", "--depth", "0,10,20,30,40",
        ]);
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(args.model.model, Some(ModelKind::Histogram));
        assert_eq!(args.params, vec![1.0, 2.0]);
        assert_eq!(args.grid.depth.len(), 5);
        assert_eq!(args.quantity, ProfileQuantity::Strain);
    }

    #[test]
    fn negative_parameters_and_verbosity() {
        let cli = Cli::parse_from([
            "dprof", "-vv", "demo", "--code", "2", "-p", "-1.5,0.3,0.1,0.2,0.5,0.2,0.05", "-t", "100",
            "--lower", "-5",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.model.code, Some(2));
        assert_eq!(args.params[0], -1.5);
        assert_eq!(args.solver.lower, Some(-5.0));
        assert_eq!(args.solver.max_iterations, 200);
    }

    #[test]
    fn model_and_code_conflict() {
        let res = Cli::try_parse_from(["dprof", "eval", "-m", "histogram", "--code", "3", "-p", "1", "-t", "1"]);
        assert!(res.is_err());
    }

    #[test]
    fn fit_reads_input_file_or_inline_lists() {
        let cli = Cli::parse_from(["dprof", "fit", "-m", "peak-shape", "--input", "strain.txt"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.input, Some(PathBuf::from("strain.txt")));
        assert!(args.depth.is_empty());

        assert!(Cli::try_parse_from(["dprof", "fit", "-m", "histogram"]).is_err());
        assert!(
            Cli::try_parse_from(["dprof", "fit", "--input", "a.txt", "--depth", "1,2", "--values", "1,2"]).is_err()
        );
    }
}
