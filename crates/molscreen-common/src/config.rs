//! Pipeline configuration and local filesystem layout.
//!
//! All artifact paths are derived here from a sanitized target slug, so
//! no other crate builds paths by raw string substitution. Layout:
//!
//! - `data/` — cached reference library, per-target training CSV,
//!   per-target predictions CSV
//! - `models/` — per-target directories of trained model artifacts

use std::path::{Path, PathBuf};

/// Drug Repurposing Hub sample annotations (tab-separated, 9-line preamble).
pub const REPURPOSING_HUB_URL: &str =
    "https://s3.amazonaws.com/data.clue.io/repurposing/downloads/repurposing_samples_20200324.txt";

/// Filename of the cached, normalized reference library CSV under `data/`.
pub const LIBRARY_FILE: &str = "repurposing_hub.csv";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    /// Path or name of the external predictor executable.
    pub chemprop_bin: PathBuf,
    pub library_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("models"),
            chemprop_bin: PathBuf::from("chemprop"),
            library_url: REPURPOSING_HUB_URL.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_dirs<P: AsRef<Path>, Q: AsRef<Path>>(data_dir: P, models_dir: Q) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            models_dir: models_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Cached reference-library CSV.
    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE)
    }

    /// Training-data CSV for a target.
    pub fn training_data_path(&self, target: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", target_slug(target)))
    }

    /// Predictions CSV for a target.
    pub fn predictions_path(&self, target: &str) -> PathBuf {
        self.data_dir.join(format!("{}_preds.csv", target_slug(target)))
    }

    /// Directory holding trained model artifacts for a target.
    pub fn model_dir(&self, target: &str) -> PathBuf {
        self.models_dir.join(target_slug(target))
    }
}

/// Sanitize a free-text target name into a filesystem-safe slug.
///
/// Every run of non-alphanumeric characters maps to a single underscore;
/// leading and trailing underscores are stripped. Case is preserved.
pub fn target_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    slug
}
