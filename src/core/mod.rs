pub mod config;
pub mod document;

pub use config::{
    GenerationConfig, LocatorConfig, RelationOptions, RelationWeights, ScoringWeights,
    ValidationConfig,
};
pub use document::{DocumentQuery, ScanPredicate};
