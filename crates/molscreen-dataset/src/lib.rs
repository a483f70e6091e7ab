//! molscreen-dataset — Builds the per-target training set and maintains
//! the cached reference compound library.

pub mod library;
pub mod training;

pub use library::{LibraryLoader, LibrarySummary};
pub use training::{build_training_set, write_training_csv, ClassBalance, TrainingExample};
