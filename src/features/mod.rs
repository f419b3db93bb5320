// Feature extractors: descriptors, the extractor interface and the default catalog
//
// Every feature is a small pure function over one window's IR and the values of the
// features it declares as dependencies. Catalog modules:
// - pitch: pitch and pitch-class statistics
// - melody: melodic interval statistics
// - harmony: vertical intervals and chord types
// - rhythm: beat histogram, note values, rests, tempo and meter
// - texture: voices and polyphony
// - instrumentation: General MIDI patches and percussion
// - dynamics: velocities
// - sequential: features reading neighbouring windows through offsets

mod dynamics;
mod harmony;
mod instrumentation;
mod melody;
mod pitch;
pub mod registry;
mod rhythm;
mod sequential;
mod stats;
mod texture;

pub use dynamics::*;
pub use harmony::*;
pub use instrumentation::*;
pub use melody::*;
pub use pitch::*;
pub use registry::FeatureRegistry;
pub use rhythm::*;
pub use sequential::*;
pub use texture::*;

use serde::{Deserialize, Serialize};

use crate::ir::IntermediateRepresentation;

/// Value every element takes in the legacy "unavailable" encoding
pub const LEGACY_SENTINEL: f64 = -1.0;

/// A dependency on another feature, read `offset` windows away from the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: &'static str,
    pub offset: i32,
}

/// Static metadata for one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractorDescriptor {
    pub name: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    pub dimensionality: usize,
    /// Whether the feature is evaluated per window, or only over the whole piece
    pub is_sequential: bool,
    /// In the order their values are handed to `compute`
    pub dependencies: Vec<Dependency>,
}

impl ExtractorDescriptor {
    pub fn new(name: &'static str, code: &'static str, dimensionality: usize) -> Self {
        Self {
            name,
            code,
            description: "",
            dimensionality,
            is_sequential: true,
            dependencies: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn overall_only(mut self) -> Self {
        self.is_sequential = false;
        self
    }

    pub fn depends_on(mut self, name: &'static str, offset: i32) -> Self {
        self.dependencies.push(Dependency { name, offset });
        self
    }

    /// Whether any dependency reads a window other than the current one
    pub fn has_offsets(&self) -> bool {
        self.dependencies.iter().any(|d| d.offset != 0)
    }
}

/// A feature formula.
///
/// `dependencies` holds one value per declared dependency, in declaration order. The
/// scheduler never calls `compute` when a dependency value is unavailable, and rejects
/// results whose length differs from the declared dimensionality.
pub trait FeatureExtractor: Send + Sync {
    fn descriptor(&self) -> &ExtractorDescriptor;

    fn compute(&self, ir: &IntermediateRepresentation, dependencies: &[&[f64]]) -> Vec<f64>;
}

/// Extractor backed by a plain function
pub struct FnExtractor {
    descriptor: ExtractorDescriptor,
    compute: fn(&IntermediateRepresentation, &[&[f64]]) -> Vec<f64>,
}

impl FnExtractor {
    pub fn new(
        descriptor: ExtractorDescriptor,
        compute: fn(&IntermediateRepresentation, &[&[f64]]) -> Vec<f64>,
    ) -> Self {
        Self { descriptor, compute }
    }

    pub fn boxed(
        descriptor: ExtractorDescriptor,
        compute: fn(&IntermediateRepresentation, &[&[f64]]) -> Vec<f64>,
    ) -> Box<dyn FeatureExtractor> {
        Box::new(Self::new(descriptor, compute))
    }
}

impl FeatureExtractor for FnExtractor {
    fn descriptor(&self) -> &ExtractorDescriptor {
        &self.descriptor
    }

    fn compute(&self, ir: &IntermediateRepresentation, dependencies: &[&[f64]]) -> Vec<f64> {
        (self.compute)(ir, dependencies)
    }
}

/// One computed feature value for one window.
///
/// `Unavailable` marks "no value": an offset that points outside the window range, or a
/// dependency that was itself unavailable. It never overlaps a genuine value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureValue {
    Available(Vec<f64>),
    Unavailable,
}

impl FeatureValue {
    pub fn is_available(&self) -> bool {
        matches!(self, FeatureValue::Available(_))
    }

    pub fn values(&self) -> Option<&[f64]> {
        match self {
            FeatureValue::Available(values) => Some(values),
            FeatureValue::Unavailable => None,
        }
    }

    /// Legacy flat encoding: unavailable values become `-1.0` repeated `dimensionality` times
    pub fn to_legacy_vec(&self, dimensionality: usize) -> Vec<f64> {
        match self {
            FeatureValue::Available(values) => values.clone(),
            FeatureValue::Unavailable => vec![LEGACY_SENTINEL; dimensionality],
        }
    }
}

/// The full default catalog, in declaration order
pub fn default_catalog() -> Vec<Box<dyn FeatureExtractor>> {
    let mut catalog = Vec::new();
    catalog.extend(pitch::pitch_extractors());
    catalog.extend(melody::melody_extractors());
    catalog.extend(harmony::harmony_extractors());
    catalog.extend(rhythm::rhythm_extractors());
    catalog.extend(texture::texture_extractors());
    catalog.extend(instrumentation::instrumentation_extractors());
    catalog.extend(dynamics::dynamics_extractors());
    catalog.extend(sequential::sequential_extractors());
    catalog
}
