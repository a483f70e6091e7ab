//! End-to-end screening scenarios.
//!
//! Requires network access and a chemprop install on PATH. Run with:
//! ```bash
//! cargo test --package molscreen-pipeline --test test_e2e_screen -- --ignored --nocapture
//! ```

use molscreen_common::PipelineConfig;
use molscreen_model::ChempropRunner;
use molscreen_pipeline::pipeline::{run_screen, ScreenJob};

async fn screen(target: &str, cutoff_nm: f64) -> molscreen_pipeline::pipeline::ScreenResult {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::with_dirs(dir.path().join("data"), dir.path().join("models"));
    let runner = ChempropRunner::new(&cfg.chemprop_bin);

    let job = ScreenJob {
        target_query: target.to_string(),
        cutoff_nm,
        activity_limit: Some(100),
    };

    let result = run_screen(job, &cfg, &runner).await.expect("pipeline failed");

    println!("target: {} ({})", result.target_name, result.target_chembl_id);
    println!(
        "training set: {} structures ({} active / {} inactive)",
        result.training_rows, result.actives, result.inactives
    );
    println!("library: {} compounds", result.library_rows);

    // Structural guarantees shared by both scenarios
    assert!(result.training_csv.exists());
    let training = std::fs::read_to_string(&result.training_csv).unwrap();
    assert!(training.starts_with("canonical_smiles,activity"));
    assert!(result.model_dir.exists());
    assert!(result.predictions_csv.exists());
    let predictions = std::fs::read_to_string(&result.predictions_csv).unwrap();
    assert!(predictions.lines().next().unwrap_or("").contains("smiles"));

    result
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires network access and a chemprop install
async fn test_screen_plasmodium_falciparum_25nm() {
    let result = screen("Plasmodium falciparum", 25.0).await;
    assert!(result.training_rows > 0);
    assert_eq!(result.training_rows, result.actives + result.inactives);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires network access and a chemprop install
async fn test_screen_sars_cov_2_500nm() {
    let result = screen("SARS-CoV-2", 500.0).await;
    assert!(result.training_rows > 0);
    // The looser cutoff should not leave the set all-inactive
    assert!(result.actives > 0);
}
