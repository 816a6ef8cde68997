pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalysisConfig, CategoryVocab};
pub use error::MemeRadarError;
pub use types::*;
