//! Random forest fraud classifier

use crate::error::{FraudError, Result};
use crate::model::metrics::EvaluationReport;
use crate::model::tree::{Criterion, DecisionTree};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model_type: String,
    pub n_estimators: usize,
    /// Number of rows the forest was actually fit on, after any resampling
    pub n_samples: usize,
    pub n_features: usize,
    /// Label distribution of the fitted training set, keyed by label text
    pub class_counts: HashMap<String, usize>,
    pub training_time_secs: f64,
}

/// Bagged ensemble of decision trees with majority voting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudClassifier {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for FraudClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FraudClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn model_type(&self) -> &'static str {
        "RandomForestClassifier"
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fit the ensemble and return a summary of the run
    pub fn train(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<TrainingSummary> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(FraudError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(FraudError::TrainingError(
                "cannot train on an empty dataset".to_string(),
            ));
        }

        let started = Instant::now();
        self.n_features = n_features;
        let max_features = Some((n_features as f64).sqrt().ceil() as usize);

        // Derive one deterministic seed per tree so parallel order never matters
        let base_seed = self.random_state.unwrap_or_else(rand::random);
        let tree_seeds: Vec<u64> = {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
            (0..self.n_estimators).map(|_| rng.gen()).collect()
        };

        let trees: Result<Vec<DecisionTree>> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut x_boot = Array2::zeros((n_samples, n_features));
                let mut y_boot = Array1::zeros(n_samples);
                for (boot_idx, &orig_idx) in sample_indices.iter().enumerate() {
                    x_boot.row_mut(boot_idx).assign(&x.row(orig_idx));
                    y_boot[boot_idx] = y[orig_idx];
                }

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_criterion(self.criterion)
                    .with_seed(seed);
                tree.max_depth = self.max_depth;
                tree.max_features = max_features;
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();
        self.trees = trees?;

        // Average feature importances across the ensemble
        let mut importances = Array1::zeros(n_features);
        let mut counted = 0usize;
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                importances = importances + imp;
                counted += 1;
            }
        }
        if counted > 0 {
            importances /= counted as f64;
        }
        self.feature_importances = Some(importances);

        let mut class_counts: HashMap<String, usize> = HashMap::new();
        for &label in y.iter() {
            *class_counts.entry(label.to_string()).or_insert(0) += 1;
        }

        Ok(TrainingSummary {
            model_type: self.model_type().to_string(),
            n_estimators: self.n_estimators,
            n_samples,
            n_features,
            class_counts,
            training_time_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// Predict class labels by majority vote
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1i64 } else { 0i64 }))
    }

    /// Predict the fraction of trees voting for the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(FraudError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(FraudError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let all_predictions: Result<Vec<Array1<i64>>> =
            self.trees.par_iter().map(|tree| tree.predict(x)).collect();
        let all_predictions = all_predictions?;

        let n_trees = self.trees.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .map(|row| {
                let votes = all_predictions
                    .iter()
                    .filter(|preds| preds[row] == 1)
                    .count();
                votes as f64 / n_trees
            })
            .collect();
        Ok(Array1::from_vec(proba))
    }

    /// Evaluate on a held-out set
    pub fn evaluate(&self, x_test: &Array2<f64>, y_test: &Array1<i64>) -> Result<EvaluationReport> {
        let y_pred = self.predict(x_test)?;
        let scores = self.predict_proba(x_test)?;
        Ok(EvaluationReport::compute(y_test, &y_pred, &scores))
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Serialize the fitted model to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a previously saved model
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let model = serde_json::from_reader(BufReader::new(file))?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<i64>) {
        let x = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.2, 0.2],
            [0.1, 0.1],
            [1.0, 1.1],
            [1.1, 1.0],
            [1.2, 1.2],
            [1.1, 1.1],
        ];
        let y = array![0i64, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_train_and_predict() {
        let (x, y) = toy_data();
        let mut forest = FraudClassifier::new(10).with_random_state(42);
        let summary = forest.train(&x, &y).unwrap();

        assert_eq!(summary.n_samples, 8);
        assert_eq!(summary.n_features, 2);
        assert_eq!(summary.class_counts.get("0"), Some(&4));
        assert_eq!(summary.class_counts.get("1"), Some(&4));

        let predictions = forest.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_proba_bounds() {
        let (x, y) = toy_data();
        let mut forest = FraudClassifier::new(10).with_random_state(7);
        forest.train(&x, &y).unwrap();

        let proba = forest.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = toy_data();
        let mut a = FraudClassifier::new(5).with_random_state(123);
        let mut b = FraudClassifier::new(5).with_random_state(123);
        a.train(&x, &y).unwrap();
        b.train(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_split_features_drawn_from_whole_column_range() {
        // Only the last of four columns separates the classes; with the
        // per-split feature draw some trees must still find it
        let x = array![
            [0.0, 0.0, 0.0, 0.1],
            [0.0, 0.0, 0.0, 0.2],
            [0.0, 0.0, 0.0, 0.3],
            [0.0, 0.0, 0.0, 0.4],
            [0.0, 0.0, 0.0, 1.1],
            [0.0, 0.0, 0.0, 1.2],
            [0.0, 0.0, 0.0, 1.3],
            [0.0, 0.0, 0.0, 1.4],
        ];
        let y = array![0i64, 0, 0, 0, 1, 1, 1, 1];

        let mut forest = FraudClassifier::new(20).with_random_state(42);
        forest.train(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert!(importances[3] > 0.0);
        // Constant columns never produce a split candidate
        for i in 0..3 {
            assert_eq!(importances[i], 0.0);
        }
    }

    #[test]
    fn test_predict_unfitted_fails() {
        let forest = FraudClassifier::new(5);
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            forest.predict(&x),
            Err(FraudError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let (x, y) = toy_data();
        let mut forest = FraudClassifier::new(5).with_random_state(42);
        forest.train(&x, &y).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        forest.save(&path).unwrap();

        let loaded = FraudClassifier::load(&path).unwrap();
        assert_eq!(
            forest.predict(&x).unwrap(),
            loaded.predict(&x).unwrap()
        );
    }
}
