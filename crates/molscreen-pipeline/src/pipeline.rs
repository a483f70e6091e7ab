//! End-to-end screening pipeline.
//!
//! Orchestrates the full flow for one target:
//!   1. Ensure the data/ and models/ directories exist
//!   2. Ensure the cached reference library (downloaded on first run)
//!   3. Resolve the free-text target name against ChEMBL
//!   4. Fetch IC50 activity records for the resolved target
//!   5. Fetch structures for the tested compounds
//!   6. Build and write the labelled training set
//!   7. Train the external predictor on the training CSV
//!   8. Score the reference library with the trained model
//!
//! Stages run strictly in sequence; there is no checkpointing beyond the
//! reference library's file-existence cache, so a failed run restarts
//! from the top.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use molscreen_chembl::ChemblClient;
use molscreen_common::error::{MolscreenError, Result};
use molscreen_common::PipelineConfig;
use molscreen_dataset::library::LibraryLoader;
use molscreen_dataset::training::{build_training_set, write_training_csv};
use molscreen_model::{ModelRunner, PredictArgs, TrainArgs};

/// Parameters for a single screening run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenJob {
    /// Free-text target name, e.g. "Plasmodium falciparum".
    pub target_query: String,
    /// Potency cutoff (nM) separating active from inactive; tune per
    /// target (25 for a potent antimalarial series, 500 for a broader
    /// antiviral screen).
    pub cutoff_nm: f64,
    /// Optional cap on fetched activity records; `None` paginates fully.
    pub activity_limit: Option<usize>,
}

impl ScreenJob {
    pub fn new(target_query: impl Into<String>) -> Self {
        Self {
            target_query: target_query.into(),
            cutoff_nm: 500.0,
            activity_limit: None,
        }
    }
}

/// Summary of one completed screening run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenResult {
    pub job_id: Uuid,
    pub target_name: String,
    pub target_chembl_id: String,
    pub activities: usize,
    pub molecules_resolved: usize,
    pub training_rows: usize,
    pub actives: usize,
    pub inactives: usize,
    pub library_rows: usize,
    pub training_csv: PathBuf,
    pub predictions_csv: PathBuf,
    pub model_dir: PathBuf,
    pub duration_ms: u64,
}

/// Run the end-to-end screening pipeline for one job.
#[instrument(skip(cfg, runner))]
pub async fn run_screen(
    job: ScreenJob,
    cfg: &PipelineConfig,
    runner: &dyn ModelRunner,
) -> Result<ScreenResult> {
    let job_id = Uuid::new_v4();
    let t0 = Instant::now();

    info!(
        job_id = %job_id,
        target = %job.target_query,
        cutoff_nm = job.cutoff_nm,
        "Starting screening pipeline"
    );

    std::fs::create_dir_all(&cfg.data_dir)?;
    std::fs::create_dir_all(&cfg.models_dir)?;

    // ── 1. Reference library (file-existence cache) ─────────────────────────
    let library = LibraryLoader::new(cfg.library_url.clone())?;
    let library_summary = library.ensure(&cfg.library_path()).await?;

    // ── 2. Target resolution ────────────────────────────────────────────────
    let chembl = ChemblClient::new()?;
    let target = chembl.resolve_target(&job.target_query).await?;
    info!(
        target_id = %target.target_chembl_id,
        name = %target.pref_name,
        "Target resolved"
    );

    // ── 3. Activities and structures ────────────────────────────────────────
    let activities = chembl
        .fetch_activities(&target.target_chembl_id, job.activity_limit)
        .await?;
    if activities.is_empty() {
        return Err(MolscreenError::Pipeline(format!(
            "no IC50 activity records for {}",
            target.target_chembl_id
        )));
    }

    let mut compound_ids: Vec<String> = activities
        .iter()
        .map(|a| a.molecule_chembl_id.clone())
        .collect();
    compound_ids.sort();
    compound_ids.dedup();

    let molecules = chembl.fetch_molecules(&compound_ids).await?;

    // ── 4. Training set ─────────────────────────────────────────────────────
    let (examples, balance) = build_training_set(&activities, &molecules, job.cutoff_nm);
    if examples.is_empty() {
        return Err(MolscreenError::Pipeline(
            "training set is empty after joining structures".to_string(),
        ));
    }

    let training_csv = cfg.training_data_path(&job.target_query);
    write_training_csv(&examples, &training_csv)?;

    // ── 5. Train and score ──────────────────────────────────────────────────
    let model_dir = cfg.model_dir(&job.target_query);
    runner
        .train(&TrainArgs {
            data_path: training_csv.clone(),
            save_dir: model_dir.clone(),
        })
        .await?;

    let predictions_csv = cfg.predictions_path(&job.target_query);
    runner
        .predict(&PredictArgs {
            test_path: cfg.library_path(),
            model_dir: model_dir.clone(),
            smiles_column: "smiles".to_string(),
            preds_path: predictions_csv.clone(),
        })
        .await?;

    let result = ScreenResult {
        job_id,
        target_name: target.pref_name,
        target_chembl_id: target.target_chembl_id,
        activities: activities.len(),
        molecules_resolved: molecules.len(),
        training_rows: examples.len(),
        actives: balance.active,
        inactives: balance.inactive,
        library_rows: library_summary.rows,
        training_csv,
        predictions_csv,
        model_dir,
        duration_ms: t0.elapsed().as_millis() as u64,
    };

    info!(
        job_id = %job_id,
        activities = result.activities,
        training_rows = result.training_rows,
        actives = result.actives,
        duration_ms = result.duration_ms,
        "Screening pipeline complete"
    );

    Ok(result)
}
