// Feature registry: every extractor the scheduler may run, by declaration order and by name

use std::collections::HashMap;

use super::{default_catalog, ExtractorDescriptor, FeatureExtractor};
use crate::error::ConfigurationError;

#[derive(Default)]
pub struct FeatureRegistry {
    extractors: Vec<Box<dyn FeatureExtractor>>,
    by_name: HashMap<&'static str, usize>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full default catalog
    pub fn with_default_catalog() -> Self {
        let mut registry = Self::new();
        for extractor in default_catalog() {
            // Catalog names are unique constants
            let name = extractor.descriptor().name;
            registry.by_name.insert(name, registry.extractors.len());
            registry.extractors.push(extractor);
        }
        registry
    }

    /// Add an extractor after the ones already registered. Names must be unique.
    pub fn register(&mut self, extractor: Box<dyn FeatureExtractor>) -> Result<(), ConfigurationError> {
        let name = extractor.descriptor().name;
        if self.by_name.contains_key(name) {
            return Err(ConfigurationError::DuplicateFeature(name.to_string()));
        }
        self.by_name.insert(name, self.extractors.len());
        self.extractors.push(extractor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn FeatureExtractor> {
        self.index_of(name).map(|i| self.extractors[i].as_ref())
    }

    /// Declaration index of `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn extractor(&self, index: usize) -> &dyn FeatureExtractor {
        self.extractors[index].as_ref()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ExtractorDescriptor> + '_ {
        self.extractors.iter().map(|e| e.descriptor())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors().map(|d| d.name).collect()
    }
}
