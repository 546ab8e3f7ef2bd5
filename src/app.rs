//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - fetches the raw case archive
//! - runs ingest + expansion + feature joins
//! - prints the build summary
//! - writes the output table

use std::path::Path;

use clap::Parser;

use crate::cli::{BuildArgs, Command, FetchArgs};
use crate::domain::{BuildConfig, FeatureKind, FeatureSpec};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `covfeat` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Build(args) => handle_build(args, OutputMode::Write),
        Command::Stats(args) => handle_build(args, OutputMode::SummaryOnly),
        Command::Fetch(args) => handle_fetch(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Write,
    SummaryOnly,
}

fn handle_build(args: BuildArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = build_config_from_args(&args, mode == OutputMode::Write);
    let run = pipeline::run_build(&config)?;

    println!(
        "{}",
        crate::report::format_build_summary(&run.ingest, &run.table, &run.features, &config)
    );

    if let Some(path) = &config.output {
        crate::io::export::write_feature_csv(path, &run.table)?;
        println!("Wrote {} rows to {}", run.table.len(), path.display());
    }

    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = crate::data::GithubClient::from_env()?;
    let fetched = client.fetch_case_archive(&args.source_url, &args.raw_dir)?;
    println!("Fetched {fetched} files into {}", args.raw_dir.display());
    Ok(())
}

pub fn build_config_from_args(args: &BuildArgs, write_output: bool) -> BuildConfig {
    BuildConfig {
        case_type: args.case_type,
        raw_dir: args.raw_dir.clone(),
        source_url: args.source_url.clone(),
        offline: args.offline,
        reduce: args.reduce,
        features: default_feature_specs(&args.features_dir, args.default_value),
        output: write_output.then(|| args.output.clone()),
    }
}

/// The model's input features and where their CSVs live.
///
/// Population density, mask usage, and population risk are one value per
/// country; lockdown and border closures change over time and track the date
/// axis.
pub fn default_feature_specs(features_dir: &Path, default: f64) -> Vec<FeatureSpec> {
    let spec = |column: &str, kind, file: &str| FeatureSpec {
        column: column.to_string(),
        kind,
        path: features_dir.join(file),
        source_column: None,
        default,
    };

    vec![
        spec("Popden", FeatureKind::Scalar, "popden.csv"),
        spec("Masks", FeatureKind::Scalar, "masks.csv"),
        spec("Poprisk", FeatureKind::Scalar, "poprisk.csv"),
        spec("Lockdown", FeatureKind::Series, "lockdown.csv"),
        spec("Borders", FeatureKind::Series, "borders.csv"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_cover_the_model_columns() {
        let specs = default_feature_specs(Path::new("/tmp/features"), 0.0);
        let columns: Vec<&str> = specs.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(
            columns,
            vec!["Popden", "Masks", "Poprisk", "Lockdown", "Borders"]
        );
        assert_eq!(specs[3].kind, FeatureKind::Series);
        assert_eq!(specs[0].path, Path::new("/tmp/features/popden.csv"));
    }
}
