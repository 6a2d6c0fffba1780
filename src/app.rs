//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the log subscriber
//! - runs fitting / prediction / simulation
//! - prints reports/plots and writes optional exports

use std::io::Write;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FitArgs, PlotArgs, PredictArgs, SimulateArgs};
use crate::data::{SimulationConfig, generate_readings, write_sample_csv};
use crate::domain::ReadingResidual;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ferment` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Plot(args) => handle_plot(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

/// Log to stderr so stdout stays machine-readable (`--json`, `simulate`).
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be set when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = args.predictor_config();
    let run = pipeline::run_fit(&args.csv, &config, args.expected_fg, &args.model)?;
    let result = &run.report.result;

    if !run.ingest.row_errors.is_empty() {
        debug!(
            skipped = run.ingest.row_errors.len(),
            rows = run.ingest.rows_read,
            "some CSV rows were skipped"
        );
    }

    if args.json {
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| AppError::numeric(format!("Failed to serialize result: {e}")))?;
        println!("{json}");
    } else {
        println!(
            "{}",
            crate::report::format_fit_summary(&run.ingest.stats, &run.report, args.expected_fg)
        );
        if args.residuals && !run.residuals.is_empty() {
            println!("{}", crate::report::format_residual_table(&run.residuals));
        }
    }

    if args.plot && !args.json {
        if let Some(best) = &run.report.best {
            let eta = result.blended_hours_to_completion.or(result.hours_to_completion).unwrap_or(0.0);
            let plot = crate::plot::render_ascii_plot(
                &run.residuals,
                best,
                Some(run.ingest.stats.hours_max + eta),
                args.width,
                args.height,
            );
            println!("{plot}");
        }
    }

    // Optional exports.
    if let Some(path) = &args.export_result {
        crate::io::write_result_json(path, result)?;
    }
    if let Some(path) = &args.export_curve {
        let best = run
            .report
            .best
            .as_ref()
            .ok_or_else(|| AppError::insufficient("No fitted curve to export."))?;
        let stats = &run.ingest.stats;
        crate::io::write_curve_json(path, best, result, stats.hours_min, stats.hours_max)?;
    }
    if let Some(path) = &args.export_readings {
        crate::io::write_readings_csv(path, &run.residuals)?;
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let result = crate::io::read_result_json(&args.result)?;
    let sgs = crate::predictor::predict(&result, &args.at)?;

    if args.json {
        let rows: Vec<_> = args
            .at
            .iter()
            .zip(&sgs)
            .map(|(&hours, &sg)| serde_json::json!({ "hours": hours, "sg": sg }))
            .collect();
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| AppError::numeric(format!("Failed to serialize predictions: {e}")))?;
        println!("{json}");
    } else {
        println!("{:>8} {:>8}", "hours", "sg");
        for (hours, sg) in args.at.iter().zip(&sgs) {
            println!("{hours:>8.1} {sg:>8.4}");
        }
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::read_curve_json(&args.curve)?;

    // Overlay readings get residuals against the saved grid model.
    let residuals: Vec<ReadingResidual> = match &args.csv {
        Some(path) => {
            let ingest = crate::io::load_readings(path)?;
            ingest
                .readings
                .iter()
                .map(|r| {
                    let sg_fit = crate::models::evaluate(curve.model, r.hours, &curve.parameters);
                    ReadingResidual { reading: *r, sg_fit, residual: r.sg - sg_fit }
                })
                .collect()
        }
        None => Vec::new(),
    };

    let plot = crate::plot::render_ascii_plot_from_curve_file(&residuals, &curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = SimulationConfig {
        model: args.model,
        og: args.og,
        fg: args.fg,
        rate: args.rate,
        shape: args.shape,
        every_hours: args.every,
        count: args.count,
        noise: args.noise,
        seed: args.seed,
    };
    let sample = generate_readings(&config)?;
    debug!(model = config.model.name(), params = ?sample.params, "simulated readings");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_sample_csv(&mut out, &sample.readings)?;
    out.flush()
        .map_err(|e| AppError::input(format!("Failed to flush stdout: {e}")))
}
