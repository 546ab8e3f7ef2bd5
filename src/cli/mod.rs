//! Command-line parsing for the training-table builder.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the ingest/alignment code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::github::DEFAULT_ARCHIVE_URL;
use crate::domain::CaseType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covfeat", version, about = "COVID-19 training table builder (JHU CSSE-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the training table: fetch raw data, expand, join features, export.
    Build(BuildArgs),
    /// Download the raw case archive and stop.
    Fetch(FetchArgs),
    /// Ingest and expand only; print the build summary without writing output.
    Stats(BuildArgs),
}

/// Common options for building and inspecting the table.
#[derive(Debug, Parser, Clone)]
pub struct BuildArgs {
    /// Which case series to build from.
    #[arg(short = 't', long, value_enum, default_value_t = CaseType::Confirmed)]
    pub case_type: CaseType,

    /// Folder holding (or receiving) the raw time-series CSVs.
    #[arg(long, default_value = "./data/raw/covid")]
    pub raw_dir: PathBuf,

    /// Folder holding the per-feature CSVs (popden.csv, lockdown.csv, ...).
    #[arg(long, default_value = "./data/features")]
    pub features_dir: PathBuf,

    /// GitHub contents-API URL of the raw archive folder.
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    pub source_url: String,

    /// Skip the download step and build from the raw CSVs already on disk.
    #[arg(long)]
    pub offline: bool,

    /// Round every case count to the nearest multiple of 5.
    #[arg(long)]
    pub reduce: bool,

    /// Value used for countries absent from a feature source.
    #[arg(long, default_value_t = 0.0)]
    pub default_value: f64,

    /// Output CSV path for the training table.
    #[arg(short = 'o', long, default_value = "./data/model/input.csv")]
    pub output: PathBuf,
}

/// Options for fetching the raw archive.
#[derive(Debug, Parser)]
pub struct FetchArgs {
    /// Folder receiving the raw time-series CSVs.
    #[arg(long, default_value = "./data/raw/covid")]
    pub raw_dir: PathBuf,

    /// GitHub contents-API URL of the raw archive folder.
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    pub source_url: String,
}
