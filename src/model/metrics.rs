//! Binary classification evaluation

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-class precision/recall/F1 with support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Evaluation metrics on a held-out set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    /// Keyed by label text ("0" for genuine, "1" for fraud)
    pub classification_report: HashMap<String, ClassReport>,
    pub roc_auc: f64,
    pub pr_auc: f64,
    /// Rows are actual class (0 then 1), columns are predicted class
    pub confusion_matrix: [[usize; 2]; 2],
}

impl EvaluationReport {
    pub fn compute(y_true: &Array1<i64>, y_pred: &Array1<i64>, scores: &Array1<f64>) -> Self {
        let n = y_true.len();

        let mut matrix = [[0usize; 2]; 2];
        for (&actual, &predicted) in y_true.iter().zip(y_pred.iter()) {
            let row = if actual == 1 { 1 } else { 0 };
            let col = if predicted == 1 { 1 } else { 0 };
            matrix[row][col] += 1;
        }
        let [[tn, fp], [fn_, tp]] = matrix;

        let accuracy = if n > 0 {
            (tn + tp) as f64 / n as f64
        } else {
            0.0
        };

        let mut classification_report = HashMap::new();
        classification_report.insert(
            "0".to_string(),
            Self::class_report(tn, fn_, fp, tn + fp),
        );
        classification_report.insert(
            "1".to_string(),
            Self::class_report(tp, fp, fn_, fn_ + tp),
        );

        Self {
            accuracy,
            classification_report,
            roc_auc: Self::roc_auc(y_true, scores),
            pr_auc: Self::pr_auc(y_true, scores),
            confusion_matrix: matrix,
        }
    }

    fn class_report(tp: usize, fp: usize, fn_: usize, support: usize) -> ClassReport {
        let precision = Self::safe_div(tp as f64, (tp + fp) as f64);
        let recall = Self::safe_div(tp as f64, (tp + fn_) as f64);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassReport {
            precision,
            recall,
            f1_score,
            support,
        }
    }

    fn safe_div(num: f64, denom: f64) -> f64 {
        if denom > 0.0 {
            num / denom
        } else {
            0.0
        }
    }

    /// Rank-statistic ROC-AUC with average ranks on tied scores.
    /// Returns 0.0 when the test set contains a single class.
    fn roc_auc(y_true: &Array1<i64>, scores: &Array1<f64>) -> f64 {
        let n_pos = y_true.iter().filter(|&&y| y == 1).count();
        let n_neg = y_true.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return 0.0;
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Average ranks within tied groups
        let mut ranks = vec![0.0; scores.len()];
        let mut i = 0;
        while i < order.len() {
            let mut j = i;
            while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
                j += 1;
            }
            let avg_rank = (i + j) as f64 / 2.0 + 1.0;
            for &idx in &order[i..=j] {
                ranks[idx] = avg_rank;
            }
            i = j + 1;
        }

        let rank_sum: f64 = y_true
            .iter()
            .zip(ranks.iter())
            .filter(|(&y, _)| y == 1)
            .map(|(_, &r)| r)
            .sum();

        (rank_sum - n_pos as f64 * (n_pos as f64 + 1.0) / 2.0) / (n_pos as f64 * n_neg as f64)
    }

    /// Average precision, the step-function area under the PR curve.
    /// Returns 0.0 when the test set has no positives.
    fn pr_auc(y_true: &Array1<i64>, scores: &Array1<f64>) -> f64 {
        let n_pos = y_true.iter().filter(|&&y| y == 1).count();
        if n_pos == 0 {
            return 0.0;
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut tp = 0usize;
        let mut seen = 0usize;
        let mut ap = 0.0;
        for &idx in &order {
            seen += 1;
            if y_true[idx] == 1 {
                tp += 1;
                ap += tp as f64 / seen as f64;
            }
        }
        ap / n_pos as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_classifier() {
        let y_true = array![0i64, 0, 1, 1];
        let y_pred = array![0i64, 0, 1, 1];
        let scores = array![0.1, 0.2, 0.8, 0.9];

        let report = EvaluationReport::compute(&y_true, &y_pred, &scores);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.roc_auc, 1.0);
        assert_eq!(report.pr_auc, 1.0);
        assert_eq!(report.confusion_matrix, [[2, 0], [0, 2]]);
        let fraud = &report.classification_report["1"];
        assert_eq!(fraud.precision, 1.0);
        assert_eq!(fraud.recall, 1.0);
        assert_eq!(fraud.support, 2);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = array![0i64, 0, 1, 1];
        let y_pred = array![0i64, 1, 0, 1];
        let scores = array![0.2, 0.6, 0.4, 0.8];

        let report = EvaluationReport::compute(&y_true, &y_pred, &scores);
        // [[tn, fp], [fn, tp]]
        assert_eq!(report.confusion_matrix, [[1, 1], [1, 1]]);
        assert_eq!(report.accuracy, 0.5);
    }

    #[test]
    fn test_single_class_auc_is_zero() {
        let y_true = array![0i64, 0, 0];
        let y_pred = array![0i64, 0, 0];
        let scores = array![0.1, 0.2, 0.3];

        let report = EvaluationReport::compute(&y_true, &y_pred, &scores);
        assert_eq!(report.roc_auc, 0.0);
        assert_eq!(report.pr_auc, 0.0);
        // Matrix stays 2x2 even without positives
        assert_eq!(report.confusion_matrix, [[3, 0], [0, 0]]);
    }

    #[test]
    fn test_tied_scores_average_rank() {
        let y_true = array![0i64, 1];
        let y_pred = array![0i64, 1];
        let scores = array![0.5, 0.5];

        let report = EvaluationReport::compute(&y_true, &y_pred, &scores);
        assert!((report.roc_auc - 0.5).abs() < 1e-9);
    }
}
