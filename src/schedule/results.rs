// Result table: one column per requested feature, overall row plus one row per window

use ndarray::Array2;
use serde::Serialize;

use crate::features::FeatureValue;
use crate::windows::{Window, WindowIndex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureColumn {
    pub name: String,
    pub code: String,
    pub dimensionality: usize,
    pub overall: FeatureValue,
    /// One value per sequential window; `None` for overall-only features or overall-only runs
    pub sequential: Option<Vec<FeatureValue>>,
}

/// Output of one extraction run. Immutable once the scheduler hands it over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    windows: Vec<Window>,
    features: Vec<FeatureColumn>,
}

impl ResultTable {
    pub(crate) fn new(windows: Vec<Window>, features: Vec<FeatureColumn>) -> Self {
        Self { windows, features }
    }

    /// Sequential windows, in timeline order
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn features(&self) -> &[FeatureColumn] {
        &self.features
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.features.iter().find(|c| c.name == name)
    }

    pub fn overall(&self, name: &str) -> Option<&FeatureValue> {
        self.column(name).map(|c| &c.overall)
    }

    pub fn get(&self, name: &str, window: WindowIndex) -> Option<&FeatureValue> {
        let column = self.column(name)?;
        match window {
            WindowIndex::Overall => Some(&column.overall),
            WindowIndex::Sequential(i) => column.sequential.as_ref()?.get(i),
        }
    }

    /// Windows x dimensions matrix of a sequential feature, `NaN` rows where unavailable
    pub fn sequential_matrix(&self, name: &str) -> Option<Array2<f64>> {
        let column = self.column(name)?;
        let values = column.sequential.as_ref()?;
        let mut matrix = Array2::from_elem((values.len(), column.dimensionality), f64::NAN);
        for (mut row, value) in matrix.rows_mut().into_iter().zip(values) {
            if let Some(v) = value.values() {
                for (cell, &x) in row.iter_mut().zip(v) {
                    *cell = x;
                }
            }
        }
        Some(matrix)
    }

    /// Overall values of every feature concatenated in column order, `-1.0` for unavailable
    pub fn overall_vector(&self) -> Vec<f64> {
        self.features
            .iter()
            .flat_map(|c| c.overall.to_legacy_vec(c.dimensionality))
            .collect()
    }
}
