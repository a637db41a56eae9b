//! Current-model slot shared across request handlers

use crate::data::DataProcessor;
use crate::model::FraudClassifier;
use parking_lot::RwLock;
use std::sync::Arc;

/// A trained model paired with the processor that prepared its features
#[derive(Debug)]
pub struct CurrentModel {
    pub model_id: String,
    pub classifier: FraudClassifier,
    pub processor: DataProcessor,
}

/// Holds the model currently serving predictions.
///
/// Writers build a complete [`CurrentModel`] off to the side and install
/// it with a single swap; concurrent uploads race and the last swap wins.
#[derive(Debug, Default)]
pub struct ModelSlot {
    inner: RwLock<Option<Arc<CurrentModel>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current model, if any
    pub fn get(&self) -> Option<Arc<CurrentModel>> {
        self.inner.read().clone()
    }

    /// Install a new model, replacing any prior one
    pub fn swap(&self, model: Arc<CurrentModel>) {
        *self.inner.write() = Some(model);
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }
}
