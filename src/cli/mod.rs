//! Command-line parsing for the fermentation curve fitter.
//!
//! Argument parsing and command dispatch stay separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ModelKind, PredictorConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ferment", version, about = "Fermentation curve fitter and completion forecaster")]
pub struct Cli {
    /// Log fitting details to stderr (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a gravity CSV, print the prediction, and optionally plot/export.
    Fit(FitArgs),
    /// Predict SG at future hours from a saved fit result.
    Predict(PredictArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Write a synthetic readings CSV to stdout.
    Simulate(SimulateArgs),
}

/// Options for fitting.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Readings CSV (`hours`/`timestamp` column plus `sg`).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Recipe final gravity, if known.
    #[arg(long)]
    pub expected_fg: Option<f64>,

    /// Model to fit: auto, exponential, gompertz, logistic.
    #[arg(long, default_value = "auto")]
    pub model: String,

    /// Minimum number of readings required to fit.
    #[arg(long, default_value_t = 10)]
    pub min_readings: usize,

    /// Rate (SG/day) below which fermentation counts as complete.
    #[arg(long, default_value_t = 0.002)]
    pub completion_threshold: f64,

    /// Solver iteration budget per model.
    #[arg(long, default_value_t = 400)]
    pub max_iterations: usize,

    /// Print the fit result as JSON instead of the text summary.
    #[arg(long)]
    pub json: bool,

    /// Render an ASCII plot after the summary.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Print observed vs. fitted readings.
    #[arg(long)]
    pub residuals: bool,

    /// Export the fit result to JSON.
    #[arg(long = "export-result", value_name = "JSON")]
    pub export_result: Option<PathBuf>,

    /// Export curve (model + params + fitted grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Export per-reading fitted values to CSV.
    #[arg(long = "export-readings", value_name = "CSV")]
    pub export_readings: Option<PathBuf>,
}

impl FitArgs {
    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            min_readings: self.min_readings,
            completion_threshold: self.completion_threshold,
            max_iterations: self.max_iterations,
            ..PredictorConfig::default()
        }
    }
}

/// Options for predicting from a saved fit.
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Result or curve JSON produced by `ferment fit --export-result/--export-curve`.
    #[arg(long, value_name = "JSON")]
    pub result: PathBuf,

    /// Elapsed hours to predict at (repeatable, or comma-separated).
    #[arg(long = "at", value_name = "HOURS", required = true, num_args = 1.., value_delimiter = ',')]
    pub at: Vec<f64>,

    /// Print predictions as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve JSON file produced by `ferment fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Overlay readings from this CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for generating synthetic readings.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[arg(long, value_enum, default_value_t = ModelKind::Exponential)]
    pub model: ModelKind,

    #[arg(long, default_value_t = 1.055)]
    pub og: f64,

    #[arg(long, default_value_t = 1.012)]
    pub fg: f64,

    /// k (1/h) for exponential/logistic, mu (SG/h) for gompertz.
    #[arg(long, default_value_t = 0.03)]
    pub rate: f64,

    /// Gompertz lag or logistic midpoint (hours).
    #[arg(long)]
    pub shape: Option<f64>,

    /// Hours between readings.
    #[arg(long, default_value_t = 4.0)]
    pub every: f64,

    /// Number of readings.
    #[arg(long, default_value_t = 30)]
    pub count: usize,

    /// Standard deviation of SG noise.
    #[arg(long, default_value_t = 0.0005)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_defaults() {
        let cli = Cli::try_parse_from(["ferment", "fit", "--csv", "batch.csv"]).unwrap();
        let Command::Fit(args) = cli.command else { panic!("expected fit") };
        assert_eq!(args.model, "auto");
        assert_eq!(args.expected_fg, None);
        assert_eq!(args.predictor_config(), PredictorConfig::default());
    }

    #[test]
    fn parses_repeated_and_comma_separated_hours() {
        let cli = Cli::try_parse_from([
            "ferment", "predict", "--result", "fit.json", "--at", "24,48", "--at", "96",
        ])
        .unwrap();
        let Command::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.at, vec![24.0, 48.0, 96.0]);
    }

    #[test]
    fn simulate_model_is_a_value_enum() {
        let cli = Cli::try_parse_from(["ferment", "-v", "simulate", "--model", "logistic"]).unwrap();
        assert!(cli.verbose);
        let Command::Simulate(args) = cli.command else { panic!("expected simulate") };
        assert_eq!(args.model, ModelKind::Logistic);
        assert!(Cli::try_parse_from(["ferment", "simulate", "--model", "auto"]).is_err());
    }
}
