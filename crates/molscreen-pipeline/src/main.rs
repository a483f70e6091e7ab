//! molscreen — drug-repurposing candidate screening.
//! Entry point for the pipeline binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use molscreen_common::{target_slug, PipelineConfig};
use molscreen_model::ChempropRunner;
use molscreen_pipeline::pipeline::{run_screen, ScreenJob};
use molscreen_pipeline::visualize::{render_grid, top_predictions, DEFAULT_TOP_N};

#[derive(Parser)]
#[command(name = "molscreen")]
#[command(about = "Screens a reference compound library for repurposing candidates \
against ChEMBL bioactivity data")]
struct Cli {
    /// Directory for the cached library, training and prediction CSVs.
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Directory for trained model artifacts.
    #[arg(long, default_value = "models", global = true)]
    models_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the end-to-end screening pipeline for a target.
    Screen {
        /// Free-text target name, e.g. "Plasmodium falciparum".
        #[arg(long)]
        target: String,

        /// Potency cutoff in nM separating actives from inactives.
        #[arg(long, default_value_t = 500.0)]
        cutoff: f64,

        /// Cap on fetched activity records (default: fetch all pages).
        #[arg(long)]
        limit: Option<usize>,

        /// External predictor executable to invoke.
        #[arg(long, default_value = "chemprop")]
        chemprop: PathBuf,
    },

    /// Rank a target's predictions and render the top hits as an SVG grid.
    Visualize {
        /// Free-text target name used for the screening run.
        #[arg(long)]
        target: String,

        /// How many top-scoring molecules to show.
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// Output SVG path (default: <data-dir>/<target>_top.svg).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("molscreen=info,info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = PipelineConfig::with_dirs(&cli.data_dir, &cli.models_dir);

    match cli.command {
        Commands::Screen { target, cutoff, limit, chemprop } => {
            cfg.chemprop_bin = chemprop;
            let runner = ChempropRunner::new(&cfg.chemprop_bin);
            let job = ScreenJob {
                target_query: target,
                cutoff_nm: cutoff,
                activity_limit: limit,
            };

            let result = run_screen(job, &cfg, &runner).await?;

            info!(
                target = %result.target_name,
                target_id = %result.target_chembl_id,
                "Screen finished"
            );
            println!("Target:        {} ({})", result.target_name, result.target_chembl_id);
            println!("Activities:    {}", result.activities);
            println!(
                "Training set:  {} structures ({} active, {} inactive)",
                result.training_rows, result.actives, result.inactives
            );
            println!("Library:       {} compounds scored", result.library_rows);
            println!("Predictions:   {}", result.predictions_csv.display());
            println!("Model:         {}", result.model_dir.display());
            println!("Elapsed:       {} ms", result.duration_ms);
        }

        Commands::Visualize { target, top, out } => {
            let preds_path = cfg.predictions_path(&target);
            let predictions = top_predictions(&preds_path, top)?;

            let out = out.unwrap_or_else(|| {
                cfg.data_dir.join(format!("{}_top.svg", target_slug(&target)))
            });
            render_grid(&predictions, &out)?;

            println!("Top {} of {}:", predictions.len(), preds_path.display());
            for pred in &predictions {
                println!("  {:.2}  {}", pred.score, pred.smiles);
            }
            println!("Grid written to {}", out.display());
        }
    }

    Ok(())
}
