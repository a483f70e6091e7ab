//! Training-set construction.
//!
//! Joins activity records onto structure records by compound id, groups
//! by SMILES, and derives a binary activity label from mean potency.
//! Averaging happens on raw potency before thresholding; thresholding
//! averaged labels instead would shift the class balance.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::info;

use molscreen_chembl::{ActivityRecord, MoleculeRecord};
use molscreen_common::error::Result;

/// One labelled training example. SMILES strings are unique across the
/// output of [`build_training_set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub canonical_smiles: String,
    /// 1 iff mean potency is strictly below the cutoff.
    pub activity: u8,
}

/// Active/inactive counts of a built training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassBalance {
    pub active: usize,
    pub inactive: usize,
}

impl ClassBalance {
    pub fn total(&self) -> usize {
        self.active + self.inactive
    }

    pub fn percent_active(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.active as f64 / self.total() as f64 * 100.0
    }
}

/// Build a labelled training set from activity and structure records.
///
/// Activities whose compound id has no structure record are dropped.
/// Multiple measurements of the same structure are averaged, then the
/// mean is thresholded: label = 1 iff mean < `cutoff_nm`. Output is
/// sorted by SMILES so repeated runs produce identical files.
pub fn build_training_set(
    activities: &[ActivityRecord],
    molecules: &[MoleculeRecord],
    cutoff_nm: f64,
) -> (Vec<TrainingExample>, ClassBalance) {
    let structures: HashMap<&str, &str> = molecules
        .iter()
        .map(|m| (m.chembl_id.as_str(), m.canonical_smiles.as_str()))
        .collect();

    // Join on compound id, collecting all potency measurements per structure.
    let mut potencies: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for activity in activities {
        if let Some(&smiles) = structures.get(activity.molecule_chembl_id.as_str()) {
            potencies.entry(smiles).or_default().push(activity.standard_value_nm);
        }
    }

    let mut examples = Vec::with_capacity(potencies.len());
    let mut balance = ClassBalance { active: 0, inactive: 0 };

    for (smiles, values) in potencies {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let activity = u8::from(mean < cutoff_nm);
        if activity == 1 {
            balance.active += 1;
        } else {
            balance.inactive += 1;
        }
        examples.push(TrainingExample {
            canonical_smiles: smiles.to_string(),
            activity,
        });
    }

    info!(
        active = balance.active,
        inactive = balance.inactive,
        percent_active = balance.percent_active(),
        cutoff_nm,
        "Training set built"
    );

    (examples, balance)
}

/// Write a training set as CSV with header `canonical_smiles,activity`.
pub fn write_training_csv(examples: &[TrainingExample], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["canonical_smiles", "activity"])?;
    for example in examples {
        writer.write_record([
            example.canonical_smiles.as_str(),
            if example.activity == 1 { "1" } else { "0" },
        ])?;
    }
    writer.flush()?;
    Ok(())
}
