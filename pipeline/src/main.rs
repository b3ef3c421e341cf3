//! Command line entry point running the stages of the cardiovascular-disease analysis

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use cardio::table::Table;
use cardio_pipeline::config::PipelineConfig;
use cardio_pipeline::registry::ModelFamily;
use cardio_pipeline::search::{train_families, Scoring};
use cardio_pipeline::store::ResultStore;
use cardio_pipeline::{explore, report};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "cardio", version, about = "Select and evaluate cardiovascular-disease classifiers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop implausible measurements and write descriptive reports
    Explore {
        #[arg(long, default_value = "cardio.toml")]
        config: PathBuf,
    },
    /// Search, refit and store a model of every configured family
    Train {
        #[arg(long, default_value = "cardio.toml")]
        config: PathBuf,
        /// Number of drawn configurations per family
        #[arg(long)]
        n_iter: Option<usize>,
        /// Families to train, by name, may be repeated
        #[arg(long = "family")]
        families: Vec<String>,
        /// Selection criterion, `roc_auc` or `accuracy`
        #[arg(long)]
        scoring: Option<String>,
    },
    /// Compare the stored models and analyse the best one
    Report {
        #[arg(long, default_value = "cardio.toml")]
        config: PathBuf,
    },
    /// Write the outcome probability of every patient of a table
    Score {
        #[arg(long, default_value = "cardio.toml")]
        config: PathBuf,
        /// Stored family to score with, the best one on the test split by default
        #[arg(long)]
        family: Option<String>,
        /// Patient table, the processed table by default
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "data/predicted/scores.csv")]
        output: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    PipelineConfig::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn read_table(path: &Path) -> anyhow::Result<Table> {
    Table::read_csv(path).with_context(|| format!("failed to read table {}", path.display()))
}

fn load_store(config: &PipelineConfig) -> anyhow::Result<ResultStore> {
    let path = &config.report.store_path;
    ResultStore::load(path).with_context(|| format!("failed to load models from {}", path.display()))
}

fn parse_scoring(name: &str) -> anyhow::Result<Scoring> {
    match name {
        "roc_auc" => Ok(Scoring::RocAuc),
        "accuracy" => Ok(Scoring::Accuracy),
        other => Err(anyhow!("unknown scoring `{}`, expected `roc_auc` or `accuracy`", other)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Explore { config } => {
            let config = load_config(&config)?;
            let summary = explore::run(&config)?;
            println!(
                "{} of {} patients kept, {} categorical and {} numeric features",
                summary.nrows_after,
                summary.nrows_before,
                summary.features.categorical.len(),
                summary.features.numeric.len()
            );
        }
        Command::Train {
            config,
            n_iter,
            families,
            scoring,
        } => {
            let mut config = load_config(&config)?;
            if let Some(n_iter) = n_iter {
                config.search.n_iter = n_iter;
            }
            if !families.is_empty() {
                config.search.families = families;
            }
            if let Some(scoring) = scoring {
                config.search.scoring = parse_scoring(&scoring)?;
            }
            config.validate()?;

            let table = read_table(&config.data.processed_path)?;
            let store = train_families(&config, &table)?;
            store
                .save(&config.report.store_path)
                .with_context(|| format!("failed to write {}", config.report.store_path.display()))?;
            println!("{}", report::render(&report::metric_comparison(&store)?));
        }
        Command::Report { config } => {
            let config = load_config(&config)?;
            let store = load_store(&config)?;
            let table = read_table(&config.data.processed_path)?;
            print!("{}", report::run(&config, &store, &table)?);
        }
        Command::Score {
            config,
            family,
            input,
            output,
        } => {
            let config = load_config(&config)?;
            let store = load_store(&config)?;
            let result = match family {
                Some(name) => {
                    let family = ModelFamily::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown model family `{}`", name))?;
                    store
                        .get(family.name())
                        .ok_or_else(|| anyhow!("no stored model for `{}`", family))?
                }
                None => report::best_result(&store).ok_or_else(|| anyhow!("the store is empty"))?,
            };
            info!("scoring with {}", result.family);

            let input = input.unwrap_or_else(|| config.data.processed_path.clone());
            let table = read_table(&input)?;
            report::score(&config, result, &table, &output)?;
        }
    }

    Ok(())
}
