//! Upload-triggered training pipeline
//!
//! `TrainingPipeline` runs the whole train-on-upload flow: size check,
//! persist, load, preprocess, split, scale, resample, fit, evaluate,
//! persist artifacts, and finally install the new model in the shared
//! slot. Chart rendering happens last and is best-effort.

pub mod artifacts;
pub mod report;
pub mod slot;

pub use artifacts::ArtifactStore;
pub use report::{CurrentModelResponse, ModelMetrics, PredictionResponse, UploadData, UploadReport};
pub use slot::{CurrentModel, ModelSlot};

use crate::config::Settings;
use crate::data::{DataFormat, DataProcessor, DatasetLoader, LABEL_COLUMN};
use crate::error::{FraudError, Result};
use crate::model::FraudClassifier;
use crate::sampling::{Sampler, Smote};
use crate::viz::{ChartRenderer, SvgChartRenderer};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates training runs and serves the resulting model
pub struct TrainingPipeline {
    settings: Settings,
    store: ArtifactStore,
    slot: Arc<ModelSlot>,
    renderer: Arc<dyn ChartRenderer>,
}

impl TrainingPipeline {
    pub fn new(settings: Settings, slot: Arc<ModelSlot>) -> Self {
        let renderer = SvgChartRenderer {
            sample_cap: settings.chart_sample_cap,
            seed: settings.random_seed,
        };
        let store = ArtifactStore::new(&settings.model_dir);
        Self {
            settings,
            store,
            slot,
            renderer: Arc::new(renderer),
        }
    }

    /// Replace the chart renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn slot(&self) -> &Arc<ModelSlot> {
        &self.slot
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the full train-on-upload flow for one dataset
    pub fn run_upload(&self, original_filename: &str, content: &[u8]) -> Result<UploadReport> {
        if content.len() > self.settings.max_upload_size {
            return Err(FraudError::FileTooLarge {
                limit_mb: self.settings.max_upload_size_mb(),
            });
        }

        // Store the raw upload under a fresh name; the extension comes from
        // sniffing the content, never from the client-supplied filename.
        let format = DataFormat::sniff(content);
        let stored_name = format!("{}.{}", Uuid::new_v4(), format.extension());
        std::fs::create_dir_all(&self.settings.upload_dir)?;
        let stored_path = std::path::Path::new(&self.settings.upload_dir).join(&stored_name);
        std::fs::write(&stored_path, content)?;
        info!(file = %stored_name, bytes = content.len(), "stored upload");

        // The frame is parsed once from the bytes already in memory
        let raw = DatasetLoader::new().load_bytes(content)?;
        let mut processor = DataProcessor::new();
        let df = processor.preprocess(&raw)?;

        let seed = self.settings.random_seed;
        let split = processor
            .split(&df, self.settings.test_size, seed)
            .map_err(|e| FraudError::DataError(format!("Data splitting error: {e}")))?;
        let (train_scaled, test_scaled) = processor
            .scale(&split.x_train, &split.x_test)
            .map_err(|e| FraudError::DataError(format!("Feature scaling error: {e}")))?;

        let feature_columns = processor.feature_columns().to_vec();
        let mut x_train = DataProcessor::to_matrix(&train_scaled, &feature_columns)?;
        let mut y_train = split.y_train.clone();
        let x_test = DataProcessor::to_matrix(&test_scaled, &feature_columns)?;

        // Oversized training partitions are subsampled to keep fits bounded
        if self.settings.sample_large_datasets
            && x_train.nrows() > self.settings.large_dataset_threshold
        {
            let target = self.settings.sample_cap.min(x_train.nrows());
            (x_train, y_train) = Self::subsample(&x_train, &y_train, target, seed);
            info!(rows = target, "subsampled large training partition");
        }

        // SMOTE only runs on partitions small enough to afford it
        let n_synthetic = if self.settings.enable_smote
            && x_train.nrows() <= self.settings.max_smote_samples
        {
            // Degenerate inputs (one-class data) surface as client errors
            let mut smote = Smote::new().with_seed(seed);
            let resampled = smote.fit_resample(&x_train, &y_train)?;
            let n = resampled.n_synthetic;
            x_train = resampled.x;
            y_train = resampled.y;
            n
        } else {
            0
        };
        if n_synthetic > 0 {
            info!(n_synthetic, "oversampled minority class");
        }

        let mut classifier = FraudClassifier::new(100).with_random_state(seed);
        let training_metrics = classifier
            .train(&x_train, &y_train)
            .map_err(|e| FraudError::TrainingError(e.to_string()))?;
        let evaluation_metrics = classifier.evaluate(&x_test, &split.y_test)?;

        let model_id = Uuid::new_v4().to_string();
        self.store.save(&model_id, &classifier, &processor)?;

        self.slot.swap(Arc::new(CurrentModel {
            model_id: model_id.clone(),
            classifier,
            processor,
        }));
        info!(%model_id, "installed new model");

        let class_distribution = Self::class_distribution(&df);
        let model_metrics = ModelMetrics::from_evaluation(&evaluation_metrics);
        let mut report = UploadReport {
            status: "success".to_string(),
            message: "File uploaded and processed successfully".to_string(),
            model_id,
            data: UploadData {
                original_file: original_filename.to_string(),
                processed_rows: df.height(),
                class_distribution: class_distribution.clone(),
                model_metrics: model_metrics.clone(),
                confusion_matrix: evaluation_metrics.confusion_matrix,
            },
            training_metrics,
            evaluation_metrics,
            graphs: HashMap::new(),
        };

        // Chart failures never fail the upload that requested them
        match self
            .renderer
            .render_all(&df, &class_distribution, &model_metrics)
        {
            Ok(graphs) => report.graphs = graphs,
            Err(e) => warn!(error = %e, "chart rendering skipped"),
        }

        Ok(report)
    }

    /// Score one transaction record with the current model
    pub fn predict(&self, record: &HashMap<String, serde_json::Value>) -> Result<PredictionResponse> {
        let current = self.slot.get().ok_or(FraudError::NotReady)?;

        let columns: Vec<Column> = current
            .processor
            .feature_columns()
            .iter()
            .map(|name| {
                let value = record.get(name).and_then(|v| v.as_f64()).ok_or_else(|| {
                    FraudError::ValidationError(format!(
                        "missing or non-numeric feature: {name}"
                    ))
                })?;
                Ok(Column::new(name.as_str().into(), [value]))
            })
            .collect::<Result<_>>()?;
        let df = DataFrame::new(columns).map_err(|e| FraudError::DataError(e.to_string()))?;

        let x = current.processor.transform(&df)?;
        let prediction = current.classifier.predict(&x)?[0];
        let probability = current.classifier.predict_proba(&x)?[0];

        Ok(PredictionResponse {
            status: "success".to_string(),
            prediction,
            probability,
            is_fraud: prediction == 1,
        })
    }

    /// Describe the model currently serving predictions
    pub fn describe_current_model(&self) -> Result<CurrentModelResponse> {
        let current = self
            .slot
            .get()
            .ok_or_else(|| FraudError::NotFound("No model is currently loaded".to_string()))?;

        let importances = current
            .classifier
            .feature_importances()
            .map(|imp| {
                current
                    .processor
                    .feature_columns()
                    .iter()
                    .zip(imp.iter())
                    .map(|(name, &value)| (name.clone(), value))
                    .collect()
            })
            .unwrap_or_default();

        Ok(CurrentModelResponse {
            status: "success".to_string(),
            model_id: current.model_id.clone(),
            model_type: current.classifier.model_type().to_string(),
            feature_importances: importances,
        })
    }

    /// Label counts keyed by label text. Frames without a label column
    /// report every row as genuine.
    pub fn class_distribution(df: &DataFrame) -> HashMap<String, usize> {
        match df.column(LABEL_COLUMN) {
            Ok(_) => {
                let mut counts = HashMap::from([("0".to_string(), 0), ("1".to_string(), 0)]);
                if let Ok(labels) = DataProcessor::extract_labels(df) {
                    for &label in labels.iter() {
                        *counts.entry(label.to_string()).or_insert(0) += 1;
                    }
                }
                counts
            }
            Err(_) => HashMap::from([
                ("0".to_string(), df.height()),
                ("1".to_string(), 0),
            ]),
        }
    }

    /// Draw `target` distinct rows with one shared index draw for x and y
    fn subsample(
        x: &Array2<f64>,
        y: &Array1<i64>,
        target: usize,
        seed: u64,
    ) -> (Array2<f64>, Array1<i64>) {
        let mut indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        indices.truncate(target);

        let x_sub = x.select(Axis(0), &indices);
        let y_sub = Array1::from_vec(indices.iter().map(|&i| y[i]).collect());
        (x_sub, y_sub)
    }
}
