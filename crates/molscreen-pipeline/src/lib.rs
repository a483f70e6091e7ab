//! molscreen-pipeline — End-to-end orchestration and result visualization
//! for the drug-repurposing screening pipeline.

pub mod pipeline;
pub mod visualize;
