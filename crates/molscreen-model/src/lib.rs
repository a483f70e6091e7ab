//! External molecular-property predictor invocation.
//!
//! Training and inference are delegated to a chemprop-style CLI invoked
//! as a blocking subprocess. The contract is the argument shape, not the
//! tool's internals: `train` with `--data-path/--task-type/--save-dir/
//! --split-type` and `predict` with `--test-path/--model-paths/
//! --smiles-columns/--preds-path`. Exit code 0 means success; anything
//! else is fatal, with stderr carried in the error.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use molscreen_common::error::{MolscreenError, Result};

/// Arguments for one training run.
#[derive(Debug, Clone)]
pub struct TrainArgs {
    pub data_path: PathBuf,
    pub save_dir: PathBuf,
}

/// Arguments for scoring a compound library with a trained model.
#[derive(Debug, Clone)]
pub struct PredictArgs {
    pub test_path: PathBuf,
    pub model_dir: PathBuf,
    pub smiles_column: String,
    pub preds_path: PathBuf,
}

/// Seam for the external predictor, so the orchestrator can be tested
/// without a chemprop install.
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn train(&self, args: &TrainArgs) -> Result<()>;
    async fn predict(&self, args: &PredictArgs) -> Result<()>;
}

/// Wrapper for the chemprop executable.
pub struct ChempropRunner {
    executable: PathBuf,
}

impl ChempropRunner {
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
        }
    }

    async fn run(&self, argv: Vec<OsString>, mode: &str) -> Result<()> {
        info!(tool = %self.executable.display(), mode, "Invoking external predictor");

        let output = Command::new(&self.executable).args(&argv).output().await?;

        if !output.status.success() {
            return Err(MolscreenError::Tool {
                tool: self.executable.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        debug!(mode, "External predictor completed");
        Ok(())
    }
}

#[async_trait]
impl ModelRunner for ChempropRunner {
    async fn train(&self, args: &TrainArgs) -> Result<()> {
        self.run(train_argv(args), "train").await
    }

    async fn predict(&self, args: &PredictArgs) -> Result<()> {
        self.run(predict_argv(args), "predict").await
    }
}

/// Fixed argument template for `chemprop train`.
fn train_argv(args: &TrainArgs) -> Vec<OsString> {
    vec![
        OsString::from("train"),
        OsString::from("--data-path"),
        args.data_path.as_os_str().to_os_string(),
        OsString::from("--task-type"),
        OsString::from("classification"),
        OsString::from("--save-dir"),
        args.save_dir.as_os_str().to_os_string(),
        OsString::from("--split-type"),
        OsString::from("scaffold_balanced"),
    ]
}

/// Fixed argument template for `chemprop predict`.
fn predict_argv(args: &PredictArgs) -> Vec<OsString> {
    vec![
        OsString::from("predict"),
        OsString::from("--test-path"),
        args.test_path.as_os_str().to_os_string(),
        OsString::from("--model-paths"),
        args.model_dir.as_os_str().to_os_string(),
        OsString::from("--smiles-columns"),
        OsString::from(args.smiles_column.as_str()),
        OsString::from("--preds-path"),
        args.preds_path.as_os_str().to_os_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_strings(argv: Vec<OsString>) -> Vec<String> {
        argv.into_iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_train_argument_template() {
        let args = TrainArgs {
            data_path: PathBuf::from("data/Plasmodium_falciparum.csv"),
            save_dir: PathBuf::from("models/Plasmodium_falciparum"),
        };
        assert_eq!(
            to_strings(train_argv(&args)),
            vec![
                "train",
                "--data-path",
                "data/Plasmodium_falciparum.csv",
                "--task-type",
                "classification",
                "--save-dir",
                "models/Plasmodium_falciparum",
                "--split-type",
                "scaffold_balanced",
            ]
        );
    }

    #[test]
    fn test_predict_argument_template() {
        let args = PredictArgs {
            test_path: PathBuf::from("data/repurposing_hub.csv"),
            model_dir: PathBuf::from("models/SARS_CoV_2"),
            smiles_column: "smiles".to_string(),
            preds_path: PathBuf::from("data/SARS_CoV_2_preds.csv"),
        };
        assert_eq!(
            to_strings(predict_argv(&args)),
            vec![
                "predict",
                "--test-path",
                "data/repurposing_hub.csv",
                "--model-paths",
                "models/SARS_CoV_2",
                "--smiles-columns",
                "smiles",
                "--preds-path",
                "data/SARS_CoV_2_preds.csv",
            ]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_a_tool_error() {
        let runner = ChempropRunner::new("false");
        let args = TrainArgs {
            data_path: PathBuf::from("x.csv"),
            save_dir: PathBuf::from("m"),
        };
        let err = runner.train(&args).await.unwrap_err();
        assert!(matches!(err, MolscreenError::Tool { .. }));
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runner = ChempropRunner::new("true");
        let args = TrainArgs {
            data_path: PathBuf::from("x.csv"),
            save_dir: PathBuf::from("m"),
        };
        assert!(runner.train(&args).await.is_ok());
    }
}
