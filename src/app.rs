//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments into plain config structs
//! - reads measured profiles and runs evaluation, resampling, or fitting
//! - prints reports and writes optional exports

use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{
    Cli, Command, DemoArgs, EvalArgs, FitArgs, GridArgs, ModelArgs, ResampleArgs, ShowArgs, SolverArgs,
};
use crate::data::{generate_profile, SyntheticConfig};
use crate::domain::{ModelKind, SolverOptions};
use crate::error::{AppError, ErrorKind};
use crate::fit::{fit_parameters, initial_guess, resample_parameters};
use crate::io::{
    quantity_column, read_measured_xy, read_profile_json, write_profile_csv, write_profile_json, Column,
    MeasuredProfile, ProfileRecord,
};
use crate::models::{depth_grid, evaluate_profile, model_params};
use crate::report::{format_eval_summary, format_fit_summary, format_profile_table};

/// Rows printed for `fit`/`demo` tables.
const FIT_TABLE_ROWS: usize = 21;

/// Entry point for the `dprof` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    crate::logging::init_logging(cli.verbose);
    dispatch(cli.command)
}

/// Run one parsed subcommand.
pub fn dispatch(command: Command) -> Result<(), AppError> {
    match command {
        Command::Eval(args) => handle_eval(args),
        Command::Resample(args) => handle_resample(args),
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let model = model_from_args(&args.model)?;
    let depth = grid_from_args(&args.grid, args.thickness)?;
    let values = evaluate_profile(&depth, &args.params, args.thickness, model)?;
    info!(model = model.display_name(), n = depth.len(), "evaluated profile");

    println!(
        "{}",
        format_eval_summary(args.quantity, model, &args.params, args.thickness, &depth, &values, args.rows)
    );

    if let Some(path) = &args.export_csv {
        let column = Column { name: quantity_column(args.quantity), values: &values };
        write_profile_csv(path, &depth, &[column])?;
    }
    if let Some(path) = &args.export_json {
        let record = ProfileRecord {
            quantity: args.quantity,
            model,
            params: &args.params,
            thickness: args.thickness,
            depth: &depth,
            value: &values,
        };
        write_profile_json(path, &record)?;
    }

    Ok(())
}

fn handle_resample(args: ResampleArgs) -> Result<(), AppError> {
    let model = model_from_args(&args.model)?;
    let depth = grid_from_args(&args.grid, args.thickness)?;
    let opts = solver_options_from_args(&args.solver, args.new_size)?;

    let fit = resample_parameters(&depth, &args.params, args.thickness, args.new_size, model, &opts)?;
    println!("{}", format_fit_summary("resample", &fit, None));

    if args.export_csv.is_none() && args.export_json.is_none() {
        return Ok(());
    }

    let old = evaluate_profile(&depth, &args.params, args.thickness, model)?;
    let new = evaluate_profile(&depth, &fit.params, fit.thickness, model)?;
    if let Some(path) = &args.export_csv {
        let columns = [Column { name: "original", values: &old }, Column { name: "resampled", values: &new }];
        write_profile_csv(path, &depth, &columns)?;
    }
    if let Some(path) = &args.export_json {
        let record = ProfileRecord {
            quantity: args.quantity,
            model,
            params: &fit.params,
            thickness: fit.thickness,
            depth: &depth,
            value: &new,
        };
        write_profile_json(path, &record)?;
    }

    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let model = model_from_args(&args.model)?;
    let measured = match &args.input {
        Some(path) => read_measured_xy(path)?,
        None => MeasuredProfile { depth: args.depth.clone(), values: args.values.clone() },
    };
    info!(n = measured.depth.len(), "loaded measured profile");

    let thickness = args
        .thickness
        .unwrap_or_else(|| measured.depth.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    let free = initial_guess(model, args.size).len();
    let opts = solver_options_from_args(&args.solver, free)?;

    let fit = fit_parameters(&measured.depth, &measured.values, args.size, thickness, model, &opts)?;
    println!("{}", format_fit_summary("fit", &fit, None));

    let height: Vec<f64> = measured.depth.iter().map(|&d| fit.thickness - d).collect();
    let fitted = evaluate_profile(&height, &fit.params, fit.thickness, model)?;
    println!("{}", format_profile_table(&measured.depth, &fitted, FIT_TABLE_ROWS));

    if let Some(path) = &args.export_csv {
        let columns = [
            Column { name: quantity_column(args.quantity), values: &measured.values },
            Column { name: "fit", values: &fitted },
        ];
        write_profile_csv(path, &measured.depth, &columns)?;
    }
    if let Some(path) = &args.export_json {
        let record = ProfileRecord {
            quantity: args.quantity,
            model,
            params: &fit.params,
            thickness: fit.thickness,
            depth: &measured.depth,
            value: &fitted,
        };
        write_profile_json(path, &record)?;
    }

    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let model = model_from_args(&args.model)?;
    let free = model_params(model, &args.params)?.len();
    let opts = solver_options_from_args(&args.solver, free)?;

    let config = SyntheticConfig {
        model,
        params: args.params.clone(),
        thickness: args.thickness,
        samples: args.samples,
        noise: args.noise,
        seed: args.seed,
    };
    let data = generate_profile(&config)?;
    debug!(samples = data.depth.len(), noise = args.noise, seed = args.seed, "generated synthetic data");

    let fit = fit_parameters(&data.depth, &data.values, free, args.thickness, model, &opts)?;
    println!(
        "{}",
        format_fit_summary(
            &format!("demo ({})", args.quantity.display_name()),
            &fit,
            Some(&args.params)
        )
    );

    if let Some(path) = &args.export_csv {
        let height: Vec<f64> = data.depth.iter().map(|&d| fit.thickness - d).collect();
        let fitted = evaluate_profile(&height, &fit.params, fit.thickness, model)?;
        let columns = [
            Column { name: quantity_column(args.quantity), values: &data.values },
            Column { name: "clean", values: &data.clean },
            Column { name: "fit", values: &fitted },
        ];
        write_profile_csv(path, &data.depth, &columns)?;
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = read_profile_json(&args.profile)?;
    println!("Generated by {} at {}", file.tool, file.generated);
    println!(
        "{}",
        format_eval_summary(
            file.quantity,
            file.model,
            &file.params,
            file.thickness,
            &file.grid.depth,
            &file.grid.value,
            args.rows
        )
    );
    Ok(())
}

/// Resolve `--model` / `--code`, defaulting to the smooth spline.
pub fn model_from_args(args: &ModelArgs) -> Result<ModelKind, AppError> {
    match (args.model, args.code) {
        (Some(model), _) => Ok(model),
        (None, Some(code)) => ModelKind::from_code(code),
        (None, None) => Ok(ModelKind::SmoothSpline),
    }
}

/// Explicit `--depth` samples, or an even grid over `[0, damaged_depth]`.
pub fn grid_from_args(args: &GridArgs, thickness: f64) -> Result<Vec<f64>, AppError> {
    if !args.depth.is_empty() {
        return Ok(args.depth.clone());
    }
    depth_grid(args.damaged_depth.unwrap_or(thickness), args.slices)
}

/// Map solver flags onto `SolverOptions` for `free` unpacked parameters.
pub fn solver_options_from_args(args: &SolverArgs, free: usize) -> Result<SolverOptions, AppError> {
    let bounds = match (args.lower, args.upper) {
        (None, None) => None,
        (lo, hi) => Some(vec![(lo.unwrap_or(f64::NEG_INFINITY), hi.unwrap_or(f64::INFINITY)); free]),
    };

    let opts = SolverOptions {
        max_iterations: args.max_iterations,
        ftol: args.ftol,
        xtol: args.xtol,
        bounds,
        time_budget: args.timeout_ms.map(Duration::from_millis),
        ..SolverOptions::default()
    };
    opts.validate().map_err(|e| AppError::new(ErrorKind::Usage, format!("Invalid solver options: {e}")))?;
    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver_args() -> SolverArgs {
        SolverArgs {
            max_iterations: 50,
            ftol: 1e-10,
            xtol: 1e-10,
            timeout_ms: Some(250),
            lower: None,
            upper: None,
        }
    }

    #[test]
    fn model_defaults_and_codes() {
        let none = ModelArgs { model: None, code: None };
        assert_eq!(model_from_args(&none).unwrap(), ModelKind::SmoothSpline);

        let code = ModelArgs { model: None, code: Some(4) };
        assert_eq!(model_from_args(&code).unwrap(), ModelKind::PeakShapeInline);

        let bad = ModelArgs { model: None, code: Some(7) };
        assert_eq!(model_from_args(&bad).unwrap_err().kind(), ErrorKind::UnsupportedVariant);
    }

    #[test]
    fn explicit_depths_win_over_grid() {
        let args = GridArgs { depth: vec![3.0, 1.0], slices: 50, damaged_depth: None };
        assert_eq!(grid_from_args(&args, 10.0).unwrap(), vec![3.0, 1.0]);

        let args = GridArgs { depth: Vec::new(), slices: 5, damaged_depth: None };
        assert_eq!(grid_from_args(&args, 40.0).unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn solver_flags_map_to_options() {
        let opts = solver_options_from_args(&solver_args(), 3).unwrap();
        assert_eq!(opts.max_iterations, 50);
        assert_eq!(opts.time_budget, Some(Duration::from_millis(250)));
        assert!(opts.bounds.is_none());

        let mut args = solver_args();
        args.lower = Some(0.0);
        let opts = solver_options_from_args(&args, 3).unwrap();
        let bounds = opts.bounds.unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0], (0.0, f64::INFINITY));
    }

    #[test]
    fn inverted_bounds_are_usage_errors() {
        let mut args = solver_args();
        args.lower = Some(2.0);
        args.upper = Some(1.0);
        assert_eq!(solver_options_from_args(&args, 2).unwrap_err().kind(), ErrorKind::Usage);
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dprof-app-{}-{name}", std::process::id()))
    }

    fn run_argv(argv: &[&str]) -> Result<(), AppError> {
        dispatch(Cli::parse_from(argv).command)
    }

    fn assert_close(got: &[f64], want: &[f64], tol: f64) {
        assert_eq!(got.len(), want.len(), "got {got:?}, want {want:?}");
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < tol, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn eval_exports_and_show_reads_them_back() {
        let json = temp_path("eval.json");
        let csv = temp_path("eval.csv");
        let (json_s, csv_s) = (json.to_string_lossy().to_string(), csv.to_string_lossy().to_string());
        run_argv(&[
            "dprof", "eval", "-m", "histogram", "-p", "1,2", "-t", "40", "--slices", "5", "--quantity",
            "debye-waller", "--export-json", &json_s, "--export-csv", &csv_s,
        ])
        .unwrap();

        let file = read_profile_json(&json).unwrap();
        assert_close(&file.grid.value, &[0.01, 0.01, 0.02, 0.02, 0.02], 1e-15);
        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("depth,debye_waller"));

        run_argv(&["dprof", "show", &json_s]).unwrap();
        let _ = std::fs::remove_file(&json);
        let _ = std::fs::remove_file(&csv);
    }

    #[test]
    fn fit_reads_measured_file() {
        let thickness = 20.0;
        let truth = [1.0, 3.0];
        let depth = depth_grid(thickness, 41).unwrap();
        let height: Vec<f64> = depth.iter().map(|&d| thickness - d).collect();
        let values = evaluate_profile(&height, &truth, thickness, ModelKind::Histogram).unwrap();
        let mut text = String::from("# depth strain\n");
        for (d, v) in depth.iter().zip(values.iter()) {
            text.push_str(&format!("{d} {v}\n"));
        }

        let input = temp_path("measured.txt");
        let json = temp_path("fit.json");
        std::fs::write(&input, text).unwrap();
        let (input_s, json_s) = (input.to_string_lossy().to_string(), json.to_string_lossy().to_string());
        run_argv(&["dprof", "fit", "-m", "histogram", "-n", "2", "-i", &input_s, "--export-json", &json_s]).unwrap();

        let file = read_profile_json(&json).unwrap();
        assert_eq!(file.thickness, thickness);
        assert_close(&file.params, &truth, 1e-6);
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&json);
    }

    #[test]
    fn resample_exports_refined_histogram() {
        let json = temp_path("resample.json");
        let json_s = json.to_string_lossy().to_string();
        run_argv(&[
            "dprof", "resample", "-m", "histogram", "-p", "1,2", "-t", "40", "-n", "4", "--slices", "81",
            "--export-json", &json_s,
        ])
        .unwrap();

        let file = read_profile_json(&json).unwrap();
        assert_close(&file.params, &[1.0, 1.0, 2.0, 2.0], 1e-6);
        let _ = std::fs::remove_file(&json);
    }

    #[test]
    fn noiseless_demo_exports_all_columns() {
        let csv = temp_path("demo.csv");
        let csv_s = csv.to_string_lossy().to_string();
        run_argv(&[
            "dprof", "demo", "-m", "histogram", "-p", "1,2,3", "-t", "30", "--samples", "31", "--noise", "0",
            "--export-csv", &csv_s,
        ])
        .unwrap();

        let text = std::fs::read_to_string(&csv).unwrap();
        let _ = std::fs::remove_file(&csv);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0], "depth,strain,clean,fit");
    }

    #[test]
    fn handler_errors_carry_their_kind() {
        let err = run_argv(&["dprof", "eval", "--code", "9", "-p", "1", "-t", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVariant);

        let err = run_argv(&["dprof", "eval", "-m", "abrupt-spline", "-p", "1,1", "-t", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterVector);

        let err = run_argv(&["dprof", "show", "/nonexistent/dprof/missing.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
