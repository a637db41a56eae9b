//! Response payloads returned by the pipeline

use crate::model::{EvaluationReport, TrainingSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Headline metrics lifted out of the evaluation for quick display.
/// Precision/recall/F1 are for the fraud class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub pr_auc: f64,
}

impl ModelMetrics {
    pub fn from_evaluation(eval: &EvaluationReport) -> Self {
        let fraud = eval.classification_report.get("1");
        Self {
            accuracy: eval.accuracy,
            precision: fraud.map_or(0.0, |c| c.precision),
            recall: fraud.map_or(0.0, |c| c.recall),
            f1_score: fraud.map_or(0.0, |c| c.f1_score),
            roc_auc: eval.roc_auc,
            pr_auc: eval.pr_auc,
        }
    }
}

/// Dataset-level facts reported back to the uploader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadData {
    pub original_file: String,
    pub processed_rows: usize,
    /// Label counts keyed by label text; "1" is 0 when no label column exists
    pub class_distribution: HashMap<String, usize>,
    pub model_metrics: ModelMetrics,
    pub confusion_matrix: [[usize; 2]; 2],
}

/// Full response to a successful upload-and-train run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub status: String,
    pub message: String,
    pub model_id: String,
    pub training_metrics: TrainingSummary,
    pub evaluation_metrics: EvaluationReport,
    pub data: UploadData,
    /// Chart name to base64-encoded image; empty when rendering failed
    pub graphs: HashMap<String, String>,
}

/// Response to a single-record prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub prediction: i64,
    pub probability: f64,
    pub is_fraud: bool,
}

/// Description of the model currently serving predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentModelResponse {
    pub status: String,
    pub model_id: String,
    pub model_type: String,
    /// Importance per feature, keyed by feature column name
    pub feature_importances: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_metrics_use_fraud_class() {
        let y_true = array![0i64, 0, 1, 1];
        let y_pred = array![0i64, 0, 1, 0];
        let scores = array![0.1, 0.2, 0.9, 0.4];
        let eval = EvaluationReport::compute(&y_true, &y_pred, &scores);

        let metrics = ModelMetrics::from_evaluation(&eval);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 0.5);
    }
}
