//! On-disk persistence for trained models and their processors

use crate::data::DataProcessor;
use crate::error::{FraudError, Result};
use crate::model::FraudClassifier;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Writes and reads model artifacts under a configured directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.model_dir.join(format!("model_{model_id}.json"))
    }

    pub fn processor_path(&self, model_id: &str) -> PathBuf {
        self.model_dir.join(format!("processor_{model_id}.json"))
    }

    /// Persist a trained model and its processor as a pair
    pub fn save(
        &self,
        model_id: &str,
        classifier: &FraudClassifier,
        processor: &DataProcessor,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.model_dir)?;
        classifier.save(&self.model_path(model_id))?;

        let file = File::create(self.processor_path(model_id))?;
        serde_json::to_writer_pretty(BufWriter::new(file), processor)?;
        Ok(())
    }

    /// Load a previously persisted model/processor pair
    pub fn load(&self, model_id: &str) -> Result<(FraudClassifier, DataProcessor)> {
        let model_path = self.model_path(model_id);
        if !model_path.exists() {
            return Err(FraudError::NotFound(format!(
                "no saved model with id {model_id}"
            )));
        }
        let classifier = FraudClassifier::load(&model_path)?;
        let processor = Self::read_processor(&self.processor_path(model_id))?;
        Ok((classifier, processor))
    }

    fn read_processor(path: &Path) -> Result<DataProcessor> {
        let file = File::open(path)?;
        let processor = serde_json::from_reader(BufReader::new(file))?;
        Ok(processor)
    }
}
