// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`   — fit and save the artifact pair
//   2. `predict` — score one JSON record
//   3. `score`   — score an unlabelled CSV
//   4. `info`    — health and version of the saved pair
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, InfoArgs, PredictArgs, ScoreArgs, TrainArgs};
use serde_json::json;
use std::{fs, path::Path};

use crate::application::predict_use_case::InferenceService;
use crate::ml::inferencer::FittedLogistic;

#[derive(Parser, Debug)]
#[command(
    name = "churn-predict",
    version,
    about = "Train a telco churn classifier, then score customers with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Score(args)   => run_score(args),
            Commands::Info(args)    => run_info(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.data);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Artifact pair {} saved.", report.pair_id);
    println!(
        "{} rows ({} TotalCharges imputed with median {:.2}), {} features, {} used for fitting",
        report.rows, report.imputed, report.median, report.feature_len, report.train_rows
    );
    println!("{}", report.metrics);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let text = match (&args.record, &args.record_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("Cannot read record file '{path}'"))?
        }
        (None, None) => anyhow::bail!("pass --record or --record-file"),
    };
    let request: serde_json::Value =
        serde_json::from_str(&text).context("Record is not valid JSON")?;

    let service = InferenceService::<FittedLogistic>::from_artifacts(Path::new(&args.artifact_dir))?
        .with_policy(args.missing.into());

    let prediction = service.predict(&request)?;
    println!("{}", serde_json::to_string(&prediction)?);
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<()> {
    use crate::application::score_use_case::ScoreUseCase;

    let output = args.output.clone();
    let written = ScoreUseCase::new(args.into()).execute()?;
    println!("Scored {written} customers → {output}");
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let service = InferenceService::<FittedLogistic>::from_artifacts(Path::new(&args.artifact_dir))?;

    let report = json!({
        "health":  service.health(),
        "version": service.version(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
