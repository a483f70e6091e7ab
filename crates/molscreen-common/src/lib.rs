//! molscreen-common — Shared error type, capped HTTP client, SMILES
//! normalization, and pipeline configuration used across all molscreen crates.

pub mod config;
pub mod error;
pub mod net;
pub mod smiles;

// Re-export commonly used types
pub use config::{target_slug, PipelineConfig};
pub use error::{MolscreenError, Result};
