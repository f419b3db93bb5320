// Symfeat - symbolic music feature extraction
// Main library entry point

pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod ir;
pub mod schedule;
pub mod windows;

use std::path::Path;

pub use config::Config;
pub use error::{ConfigurationError, ExtractionError};
pub use events::EventStream;
pub use features::{FeatureRegistry, FeatureValue};
pub use schedule::{ExecutionPlan, ResultTable};
pub use windows::{WindowConfig, WindowIndex, WindowSpec};

/// A validated registry and execution plan, reusable across pieces
pub struct Pipeline {
    registry: FeatureRegistry,
    plan: ExecutionPlan,
    windows: WindowConfig,
    workers: usize,
}

impl Pipeline {
    /// Pipeline over the default catalog
    pub fn new(config: &Config) -> Result<Self, ConfigurationError> {
        Self::with_registry(FeatureRegistry::with_default_catalog(), config)
    }

    /// Pipeline over a custom registry. The whole registry is validated, requested or not.
    pub fn with_registry(registry: FeatureRegistry, config: &Config) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let plan = schedule::resolve(&registry, config.requested_features())?;
        log::info!(
            "Pipeline ready: {} registered features, {} plan steps, {} workers",
            registry.len(),
            plan.len(),
            config.workers.max(1)
        );
        Ok(Self {
            registry,
            plan,
            windows: config.windows.clone(),
            workers: config.workers.max(1),
        })
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Extract features from an event stream
    pub fn extract(&self, stream: &EventStream) -> error::Result<ResultTable> {
        schedule::run(stream, &self.registry, &self.plan, &self.windows, self.workers)
    }

    /// Load a Standard MIDI File and extract features from it
    pub fn extract_file(&self, path: &Path) -> anyhow::Result<ResultTable> {
        let stream = events::parse_midi(path)?;
        Ok(self.extract(&stream)?)
    }
}

/// One-shot extraction with the default catalog
pub fn extract_features(stream: &EventStream, config: &Config) -> error::Result<ResultTable> {
    Pipeline::new(config)?.extract(stream)
}

/// One-shot extraction from a MIDI file with the default catalog
pub fn extract_file(path: &Path, config: &Config) -> anyhow::Result<ResultTable> {
    Pipeline::new(config)?.extract_file(path)
}
