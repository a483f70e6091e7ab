//! ChEMBL API client.
//!
//! ChEMBL is a database of bioactive molecules with drug-like properties.
//! This client covers the three queries the screening pipeline needs:
//!   - target search by free-text name (ranked matches)
//!   - IC50 activity records for a target, field-projected
//!   - molecule structures (canonical SMILES) by compound id, batched
//!
//! API docs: https://chembl.gitbook.io/chembl-interface-documentation/web-resources/chembl-api
//! Endpoint: https://www.ebi.ac.uk/chembl/api/data
//!
//! List endpoints are paginated; this client follows `page_meta.next`
//! links until exhausted or until a caller-supplied cap is reached.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use molscreen_common::error::{MolscreenError, Result};
use molscreen_common::net::NetClient as Client;

const CHEMBL_BASE_URL: &str = "https://www.ebi.ac.uk";
const CHEMBL_API_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

/// Maximum page size the ChEMBL web service accepts.
const PAGE_SIZE: usize = 1000;

/// How many compound ids go into one `molecule_chembl_id__in` filter.
const MOLECULE_BATCH: usize = 100;

/// Target record from ChEMBL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    pub target_chembl_id: String,
    pub pref_name: String,
    pub organism: Option<String>,
    pub target_type: Option<String>,
}

/// One quantitative activity measurement (IC50, nM, exact relation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub molecule_chembl_id: String,
    /// Potency in nanomolar; lower is more potent.
    pub standard_value_nm: f64,
}

/// Compound structure record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoleculeRecord {
    pub chembl_id: String,
    pub canonical_smiles: String,
}

/// ChEMBL client for target, activity, and molecule data.
pub struct ChemblClient {
    client: Client,
}

impl ChemblClient {
    pub fn new() -> Result<Self> {
        Ok(Self { client: Client::new()? })
    }

    /// Search targets by free-text name, returning the service's ranked
    /// match list. The caller decides which candidate to use.
    #[instrument(skip(self))]
    pub async fn search_targets(&self, query: &str) -> Result<Vec<TargetRecord>> {
        let url = format!("{}/target/search.json", CHEMBL_API_URL);

        debug!(query = query, "Searching ChEMBL targets");

        let resp = self
            .client
            .get(&url)?
            .query(&[("q", query), ("limit", "20")])
            .send()
            .await?
            .error_for_status()?;

        let json: Value = resp.json().await?;
        let targets = parse_target_page(&json);

        info!(query = query, n = targets.len(), "Target search complete");
        Ok(targets)
    }

    /// Resolve a free-text name to the best-matching target.
    ///
    /// An empty search result is an explicit `TargetNotFound` error, not
    /// an index failure.
    pub async fn resolve_target(&self, query: &str) -> Result<TargetRecord> {
        let mut targets = self.search_targets(query).await?;
        if targets.is_empty() {
            return Err(MolscreenError::TargetNotFound(query.to_string()));
        }
        Ok(targets.remove(0))
    }

    /// Fetch IC50 activity records for a target.
    ///
    /// Filters are fixed to the pipeline's contract: `standard_type=IC50`,
    /// `standard_relation==`, `standard_units=nM`, projected to compound
    /// id and potency. Pages are followed until the service is exhausted;
    /// `limit` optionally caps the total number of records.
    #[instrument(skip(self))]
    pub async fn fetch_activities(
        &self,
        target_chembl_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityRecord>> {
        let page_size = limit.unwrap_or(PAGE_SIZE).min(PAGE_SIZE).to_string();
        let first = format!("{}/activity.json", CHEMBL_API_URL);

        let resp = self
            .client
            .get(&first)?
            .query(&[
                ("target_chembl_id", target_chembl_id),
                ("standard_type", "IC50"),
                ("standard_relation", "="),
                ("standard_units", "nM"),
                ("only", "molecule_chembl_id,standard_value"),
                ("limit", page_size.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let mut json: Value = resp.json().await?;
        let mut activities = parse_activity_page(&json)?;

        while let Some(next) = next_page_url(&json) {
            if limit.is_some_and(|cap| activities.len() >= cap) {
                break;
            }
            debug!(next = %next, fetched = activities.len(), "Following activity page");
            let resp = self.client.get(&next)?.send().await?.error_for_status()?;
            json = resp.json().await?;
            activities.extend(parse_activity_page(&json)?);
        }

        if let Some(cap) = limit {
            activities.truncate(cap);
        }

        info!(
            target = target_chembl_id,
            n = activities.len(),
            "Fetched activity records"
        );
        Ok(activities)
    }

    /// Fetch canonical SMILES for a set of compound ids.
    ///
    /// Ids are batched into `molecule_chembl_id__in` filters; compounds
    /// the service has no structure for are absent from the result.
    #[instrument(skip(self, chembl_ids))]
    pub async fn fetch_molecules(&self, chembl_ids: &[String]) -> Result<Vec<MoleculeRecord>> {
        let mut molecules = Vec::with_capacity(chembl_ids.len());

        for batch in chembl_ids.chunks(MOLECULE_BATCH) {
            let ids = batch.join(",");
            let url = format!("{}/molecule.json", CHEMBL_API_URL);
            let page_size = PAGE_SIZE.to_string();

            let resp = self
                .client
                .get(&url)?
                .query(&[
                    ("molecule_chembl_id__in", ids.as_str()),
                    ("only", "molecule_chembl_id,molecule_structures"),
                    ("limit", page_size.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let mut json: Value = resp.json().await?;
            molecules.extend(parse_molecule_page(&json));

            while let Some(next) = next_page_url(&json) {
                let resp = self.client.get(&next)?.send().await?.error_for_status()?;
                json = resp.json().await?;
                molecules.extend(parse_molecule_page(&json));
            }
        }

        info!(
            requested = chembl_ids.len(),
            resolved = molecules.len(),
            "Fetched molecule structures"
        );
        Ok(molecules)
    }
}

// ── Page parsing ────────────────────────────────────────────────────────────

fn parse_target_page(json: &Value) -> Vec<TargetRecord> {
    json["targets"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|t| {
                    Some(TargetRecord {
                        target_chembl_id: t["target_chembl_id"].as_str()?.to_string(),
                        pref_name: t["pref_name"].as_str().unwrap_or("").to_string(),
                        organism: t["organism"].as_str().map(String::from),
                        target_type: t["target_type"].as_str().map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_activity_page(json: &Value) -> Result<Vec<ActivityRecord>> {
    let Some(arr) = json["activities"].as_array() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(arr.len());
    for a in arr {
        let Some(molecule_chembl_id) = a["molecule_chembl_id"].as_str() else {
            continue;
        };
        records.push(ActivityRecord {
            molecule_chembl_id: molecule_chembl_id.to_string(),
            standard_value_nm: potency_value(&a["standard_value"])?,
        });
    }
    Ok(records)
}

/// Convert the service's potency field to f64.
///
/// ChEMBL serializes `standard_value` as either a number or a decimal
/// string; anything else is a hard error.
fn potency_value(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| MolscreenError::InvalidPotency(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| MolscreenError::InvalidPotency(s.clone())),
        other => Err(MolscreenError::InvalidPotency(other.to_string())),
    }
}

fn parse_molecule_page(json: &Value) -> Vec<MoleculeRecord> {
    json["molecules"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| {
                    Some(MoleculeRecord {
                        chembl_id: m["molecule_chembl_id"].as_str()?.to_string(),
                        canonical_smiles: m["molecule_structures"]["canonical_smiles"]
                            .as_str()?
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Relative `page_meta.next` link, joined back onto the service base URL.
fn next_page_url(json: &Value) -> Option<String> {
    json["page_meta"]["next"]
        .as_str()
        .map(|next| format!("{}{}", CHEMBL_BASE_URL, next))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_target_page() {
        let json = json!({
            "targets": [
                {
                    "target_chembl_id": "CHEMBL364",
                    "pref_name": "Plasmodium falciparum",
                    "organism": "Plasmodium falciparum",
                    "target_type": "ORGANISM"
                },
                { "pref_name": "missing id, skipped" }
            ]
        });
        let targets = parse_target_page(&json);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_chembl_id, "CHEMBL364");
        assert_eq!(targets[0].pref_name, "Plasmodium falciparum");
    }

    #[test]
    fn test_parse_target_page_empty() {
        assert!(parse_target_page(&json!({ "targets": [] })).is_empty());
        assert!(parse_target_page(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_activity_page_mixed_value_types() {
        let json = json!({
            "activities": [
                { "molecule_chembl_id": "CHEMBL1", "standard_value": "12.5" },
                { "molecule_chembl_id": "CHEMBL2", "standard_value": 40.0 }
            ]
        });
        let records = parse_activity_page(&json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].standard_value_nm, 12.5);
        assert_eq!(records[1].standard_value_nm, 40.0);
    }

    #[test]
    fn test_parse_activity_page_rejects_non_numeric_potency() {
        let json = json!({
            "activities": [
                { "molecule_chembl_id": "CHEMBL1", "standard_value": "n/a" }
            ]
        });
        let err = parse_activity_page(&json).unwrap_err();
        assert!(matches!(err, MolscreenError::InvalidPotency(_)));
    }

    #[test]
    fn test_parse_molecule_page_flattens_structures() {
        let json = json!({
            "molecules": [
                {
                    "molecule_chembl_id": "CHEMBL25",
                    "molecule_structures": { "canonical_smiles": "CC(=O)Oc1ccccc1C(=O)O" }
                },
                {
                    "molecule_chembl_id": "CHEMBL404",
                    "molecule_structures": null
                }
            ]
        });
        let molecules = parse_molecule_page(&json);
        // Compounds with no resolvable structure are absent
        assert_eq!(molecules.len(), 1);
        assert_eq!(molecules[0].chembl_id, "CHEMBL25");
        assert_eq!(molecules[0].canonical_smiles, "CC(=O)Oc1ccccc1C(=O)O");
    }

    #[test]
    fn test_next_page_url() {
        let json = json!({
            "page_meta": {
                "limit": 1000,
                "next": "/chembl/api/data/activity.json?limit=1000&offset=1000",
                "total_count": 2400
            }
        });
        assert_eq!(
            next_page_url(&json).unwrap(),
            "https://www.ebi.ac.uk/chembl/api/data/activity.json?limit=1000&offset=1000"
        );
        assert!(next_page_url(&json!({ "page_meta": { "next": null } })).is_none());
    }

    #[test]
    fn test_activity_record_serialization() {
        let activity = ActivityRecord {
            molecule_chembl_id: "CHEMBL1201496".to_string(),
            standard_value_nm: 3.0,
        };
        let json = serde_json::to_string(&activity).unwrap();
        assert!(json.contains("CHEMBL1201496"));
        assert!(json.contains("3.0"));
    }
}
