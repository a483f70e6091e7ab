//! Prediction ranking and top-hit rendering.
//!
//! Loads a scored predictions CSV, ranks descending by score, and renders
//! the top hits as a 3-column SVG grid with the score (two decimals) as
//! each cell's label.

use std::cmp::Ordering;
use std::path::Path;

use tracing::info;

use molscreen_common::error::{MolscreenError, Result};
use molscreen_common::smiles;

pub const GRID_COLUMNS: usize = 3;
pub const DEFAULT_TOP_N: usize = 9;

const CELL_WIDTH: usize = 280;
const CELL_HEIGHT: usize = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPrediction {
    pub smiles: String,
    pub score: f64,
}

/// Load the predictions CSV and return exactly the `n` highest-scoring
/// rows in descending score order.
///
/// Every structure string must be valid SMILES, and at least `n` rows
/// must exist; both violations abort rather than degrade.
pub fn top_predictions(path: &Path, n: usize) -> Result<Vec<RankedPrediction>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let smiles_idx = headers
        .iter()
        .position(|c| c == "smiles")
        .ok_or_else(|| {
            MolscreenError::Pipeline("predictions file has no 'smiles' column".to_string())
        })?;
    // The score column carries the training task's name ("activity");
    // fall back to the last column for other task names.
    let score_idx = headers
        .iter()
        .position(|c| c == "activity")
        .unwrap_or(headers.len().saturating_sub(1));
    if score_idx == smiles_idx {
        return Err(MolscreenError::Pipeline(
            "predictions file has no score column".to_string(),
        ));
    }

    let mut predictions = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw = record
            .get(smiles_idx)
            .unwrap_or_default()
            .to_string();

        if smiles::normalize(&raw).is_none() {
            return Err(MolscreenError::InvalidSmiles(raw));
        }

        let score_field = record.get(score_idx).unwrap_or_default();
        let score: f64 = score_field.trim().parse().map_err(|_| {
            MolscreenError::Pipeline(format!("non-numeric prediction score: {score_field:?}"))
        })?;

        predictions.push(RankedPrediction { smiles: raw, score });
    }

    if predictions.len() < n {
        return Err(MolscreenError::Pipeline(format!(
            "only {} predictions available, {} requested",
            predictions.len(),
            n
        )));
    }

    predictions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    predictions.truncate(n);

    info!(
        n = predictions.len(),
        top_score = predictions.first().map(|p| p.score),
        "Predictions ranked"
    );
    Ok(predictions)
}

/// Render ranked predictions as an SVG grid, `GRID_COLUMNS` cells wide.
pub fn render_grid(predictions: &[RankedPrediction], out: &Path) -> Result<()> {
    let rows = predictions.len().div_ceil(GRID_COLUMNS);
    let width = GRID_COLUMNS * CELL_WIDTH;
    let height = rows.max(1) * CELL_HEIGHT;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    for (i, pred) in predictions.iter().enumerate() {
        let x = (i % GRID_COLUMNS) * CELL_WIDTH;
        let y = (i / GRID_COLUMNS) * CELL_HEIGHT;

        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" \
             stroke=\"#444\"/>\n",
            x, y, CELL_WIDTH, CELL_HEIGHT
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"16\" \
             font-weight=\"bold\">{:.2}</text>\n",
            x + 10,
            y + 28,
            pred.score
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"11\">{}</text>\n",
            x + 10,
            y + 58,
            xml_escape(&truncate(&pred.smiles, 38))
        ));
    }

    svg.push_str("</svg>\n");
    std::fs::write(out, svg)?;

    info!(path = %out.display(), cells = predictions.len(), "Grid rendered");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max])
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
