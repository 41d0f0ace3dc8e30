// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//   train | predict | score | info
//
// clap's derive macros generate help text, error messages for
// missing args and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::predict_use_case::MissingValuePolicy;
use crate::application::score_use_case::ScoreConfig;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit the Transformer and Classifier on a labelled CSV
    Train(TrainArgs),

    /// Score a single customer given as a JSON object
    Predict(PredictArgs),

    /// Score every row of an unlabelled CSV
    Score(ScoreArgs),

    /// Print health and version information for saved artifacts
    Info(InfoArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled telco CSV (customerID, 19 feature columns, Churn)
    #[arg(long, default_value = "data/telco_churn.csv")]
    pub data: String,

    /// Directory the fitted artifact pair is written to
    #[arg(long, default_value = "model")]
    pub artifact_dir: String,

    /// Share of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the train/holdout shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Full-batch optimiser steps
    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.05)]
    pub lr: f64,

    /// L2 penalty on the weights (not the bias)
    #[arg(long, default_value_t = 1e-4)]
    pub l2: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:     a.data,
            artifact_dir:  a.artifact_dir,
            test_fraction: a.test_fraction,
            seed:          a.seed,
            epochs:        a.epochs,
            learning_rate: a.lr,
            l2_penalty:    a.l2,
        }
    }
}

/// How a blank or absent TotalCharges is handled at prediction time.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum MissingPolicyArg {
    #[default]
    Reject,
    Impute,
}

impl From<MissingPolicyArg> for MissingValuePolicy {
    fn from(a: MissingPolicyArg) -> Self {
        match a {
            MissingPolicyArg::Reject => MissingValuePolicy::Reject,
            MissingPolicyArg::Impute => MissingValuePolicy::ImputeTrainingMedian,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Customer record as inline JSON
    #[arg(long, conflicts_with = "record_file", required_unless_present = "record_file")]
    pub record: Option<String>,

    /// Path to a file holding the customer record as JSON
    #[arg(long)]
    pub record_file: Option<String>,

    #[arg(long, default_value = "model")]
    pub artifact_dir: String,

    /// What to do when TotalCharges is missing or blank
    #[arg(long, value_enum, default_value_t = MissingPolicyArg::Reject)]
    pub missing: MissingPolicyArg,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Unlabelled CSV with the 19 feature columns (customerID optional)
    #[arg(long)]
    pub input: String,

    /// Where to write customerID,churn_probability rows
    #[arg(long, default_value = "scores.csv")]
    pub output: String,

    #[arg(long, default_value = "model")]
    pub artifact_dir: String,
}

impl From<ScoreArgs> for ScoreConfig {
    fn from(a: ScoreArgs) -> Self {
        ScoreConfig {
            input_path:   a.input,
            output_path:  a.output,
            artifact_dir: a.artifact_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[arg(long, default_value = "model")]
    pub artifact_dir: String,
}
