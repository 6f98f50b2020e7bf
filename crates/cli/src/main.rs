//! Smart Hiring CLI
//!
//! A command-line tool for training the match model, scoring candidates
//! locally, inspecting model artifacts and querying a running server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{local, remote, sample, train};
use hiring_lib::SchemaKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Smart Hiring CLI
#[derive(Parser)]
#[command(name = "hiring")]
#[command(author, version, about = "CLI for the Smart Hiring match predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via HIRING_API_URL env var)
    #[arg(long, env = "HIRING_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model from a labeled CSV file
    Train {
        /// Training data CSV
        #[arg(long, short)]
        data: PathBuf,

        /// Feature schema (smart-hiring, legacy)
        #[arg(long, default_value = "smart-hiring")]
        schema: SchemaKind,

        /// Label column (defaults to the schema's label)
        #[arg(long)]
        label: Option<String>,

        /// Where to write the model artifact
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Number of trees (defaults to the schema preset)
        #[arg(long)]
        trees: Option<usize>,

        /// Random seed for the forest and the split
        #[arg(long)]
        seed: Option<u64>,

        /// Cross-validation folds on the training partition (0 disables)
        #[arg(long, default_value_t = 0)]
        cv_folds: usize,

        /// Pad thin training data with this many synthetic rows
        #[arg(long)]
        pad_samples: Option<usize>,
    },

    /// Score a candidate with a local model artifact
    Predict {
        /// Model artifact path
        #[arg(long, short)]
        model: Option<PathBuf>,

        /// Feature value, repeatable (e.g. --feature skills=5)
        #[arg(long = "feature", short = 'F', value_parser = parse_feature)]
        features: Vec<(String, String)>,
    },

    /// Show metadata and training report of a model artifact
    Inspect {
        /// Model artifact path
        #[arg(long, short)]
        model: Option<PathBuf>,
    },

    /// Write a synthetic smart hiring training CSV
    SampleData {
        /// Output CSV path
        #[arg(long, short)]
        output: PathBuf,

        /// Number of rows
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Query a running hiring server
    #[command(subcommand)]
    Remote(RemoteCommands),
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Show server health and model status
    Health,

    /// Score a candidate on the server
    Predict {
        /// Feature value, repeatable (e.g. --feature skill_match_score=0.9)
        #[arg(long = "feature", short = 'F', value_parser = parse_feature)]
        features: Vec<(String, String)>,
    },

    /// Rank a candidate pool on the server
    Rank {
        /// JSON file holding `[{"id": ..., "features": {...}}, ...]`
        #[arg(long)]
        candidates: PathBuf,
    },

    /// Ask the server to reload its model artifact
    Reload,
}

/// Parse a `name=value` pair
fn parse_feature(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load()?;

    match cli.command {
        Commands::Train {
            data,
            schema,
            label,
            output,
            trees,
            seed,
            cv_folds,
            pad_samples,
        } => {
            let options = train::TrainOptions {
                data,
                schema,
                label,
                output: output.unwrap_or_else(|| config.model_path()),
                trees,
                seed,
                cv_folds,
                pad_samples,
            };
            train::run(options, cli.format).await?;
        }
        Commands::Predict { model, features } => {
            let model = model.unwrap_or_else(|| config.model_path());
            local::predict(&model, features, cli.format)?;
        }
        Commands::Inspect { model } => {
            let model = model.unwrap_or_else(|| config.model_path());
            local::inspect(&model, cli.format)?;
        }
        Commands::SampleData { output, count, seed } => {
            sample::write_sample_data(&output, count, seed, cli.format)?;
        }
        Commands::Remote(remote_cmd) => {
            let api_url = config.api_url(cli.api_url.as_deref());
            let client = client::ApiClient::new(&api_url)?;
            match remote_cmd {
                RemoteCommands::Health => remote::health(&client, cli.format).await?,
                RemoteCommands::Predict { features } => {
                    remote::predict(&client, features, cli.format).await?
                }
                RemoteCommands::Rank { candidates } => {
                    remote::rank(&client, &candidates, cli.format).await?
                }
                RemoteCommands::Reload => remote::reload(&client, cli.format).await?,
            }
        }
    }

    Ok(())
}
