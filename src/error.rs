// Error types for registry configuration and feature extraction

use crate::windows::WindowIndex;

/// Fatal configuration problems, detected before any feature is computed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Feature '{feature}' depends on unknown feature '{dependency}'")]
    UnknownDependency { feature: String, dependency: String },

    #[error("Unknown feature requested: {0}")]
    UnknownFeature(String),

    #[error("Feature registered twice: {0}")]
    DuplicateFeature(String),

    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("Sequential feature '{feature}' depends on overall-only feature '{dependency}'")]
    OverallOnlyDependency { feature: String, dependency: String },

    #[error("Invalid window configuration: {0}")]
    InvalidWindow(String),
}

/// Error type for a feature extraction run
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Feature '{feature}' returned {actual} values for {window}, expected {expected}")]
    Dimensionality {
        feature: String,
        window: WindowIndex,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
