//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{FraudError, Result};
use crate::sampling::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Ordered float for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// SMOTE oversampler: interpolates new minority samples between existing
/// minority samples and their nearest same-class neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbors considered per sample
    k_neighbors: usize,
    /// Target minority/majority ratio after resampling
    sampling_strategy: f64,
    /// Random seed
    seed: Option<u64>,
    /// Target samples per class, set by fit
    target_counts: Option<HashMap<i64, usize>>,
}

impl Smote {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            sampling_strategy: 1.0, // balance classes
            seed: None,
            target_counts: None,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_sampling_strategy(mut self, ratio: f64) -> Self {
        self.sampling_strategy = ratio.clamp(0.1, 10.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Find k nearest neighbors using a bounded heap (O(n log k))
    fn find_neighbors(&self, point: &[f64], data: &[Vec<f64>], k: usize) -> Vec<usize> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, d) in data.iter().enumerate() {
            let dist = Self::distance(point, d);
            if dist <= 0.0 {
                continue; // exclude self
            }
            if heap.len() < k {
                heap.push(DistIdx(dist, i));
            } else if let Some(&DistIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistIdx(_, i)| i).collect()
    }

    /// Interpolate a synthetic sample between two points
    fn generate_sample(&self, point: &[f64], neighbor: &[f64], rng: &mut StdRng) -> Vec<f64> {
        let gap: f64 = rng.gen();
        point
            .iter()
            .zip(neighbor.iter())
            .map(|(&p, &n)| p + gap * (n - p))
            .collect()
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Smote {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);

        if counts.len() < 2 {
            return Err(FraudError::ValidationError(
                "need at least 2 classes for SMOTE".to_string(),
            ));
        }

        let max_count = *counts.values().max().unwrap_or(&0);

        let mut targets = HashMap::new();
        for (&class, &count) in &counts {
            let target = (max_count as f64 * self.sampling_strategy) as usize;
            targets.insert(class, target.max(count));
        }

        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or_else(|| FraudError::ValidationError("SMOTE not fitted".to_string()))?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices = class_indices(y);
        let counts = class_counts(y);
        let n_features = x.ncols();

        // Only synthetic samples are collected; originals are reused from x
        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();

        for (&class, &target_count) in targets {
            let current_count = counts.get(&class).copied().unwrap_or(0);
            let n_to_generate = target_count.saturating_sub(current_count);
            if n_to_generate == 0 {
                continue;
            }

            let class_idx = match indices.get(&class) {
                Some(idx) => idx,
                None => continue,
            };
            // Interpolation needs at least two samples of this class
            if class_idx.len() < 2 {
                continue;
            }

            let class_samples: Vec<Vec<f64>> = class_idx
                .iter()
                .map(|&i| x.row(i).iter().copied().collect())
                .collect();

            let k = self.k_neighbors.min(class_samples.len() - 1).max(1);

            let mut generated = 0;
            let mut attempts = 0;
            while generated < n_to_generate && attempts < n_to_generate * 10 {
                attempts += 1;
                let idx = rng.gen_range(0..class_samples.len());
                let sample = &class_samples[idx];

                let neighbors = self.find_neighbors(sample, &class_samples, k);
                if neighbors.is_empty() {
                    continue;
                }

                let neighbor_idx = neighbors[rng.gen_range(0..neighbors.len())];
                let neighbor = &class_samples[neighbor_idx];

                synthetic_x.push(self.generate_sample(sample, neighbor, &mut rng));
                synthetic_y.push(class);
                generated += 1;
            }
        }

        let n_original = x.nrows();
        let n_synthetic = synthetic_x.len();
        let n_total = n_original + n_synthetic;
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });

        let mut all_y: Vec<i64> = y.iter().copied().collect();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        // 20 majority samples around the origin, 5 minority around (10, 10)
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..20 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
        }
        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1i64);
        }

        (
            Array2::from_shape_vec((25, 2), data).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = imbalanced_data();
        let mut smote = Smote::new().with_k_neighbors(3).with_seed(42);

        let result = smote.fit_resample(&x, &y).unwrap();

        assert!(result.x.nrows() > x.nrows());
        let new_counts = class_counts(&result.y);
        assert_eq!(new_counts.get(&1), new_counts.get(&0));
        assert_eq!(result.n_synthetic, 15);
    }

    #[test]
    fn test_smote_preserves_original_rows() {
        let (x, y) = imbalanced_data();
        let mut smote = Smote::new().with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            for j in 0..x.ncols() {
                assert_eq!(result.x[[i, j]], x[[i, j]]);
            }
        }
    }

    #[test]
    fn test_smote_single_class_fails() {
        let x = Array2::zeros((4, 2));
        let y = Array1::from_vec(vec![0i64; 4]);
        let mut smote = Smote::new();
        assert!(smote.fit(&x, &y).is_err());
    }

    #[test]
    fn test_smote_degenerate_minority_skipped() {
        // Single minority sample: nothing to interpolate with, so SMOTE
        // must return the data unchanged instead of spinning
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..8 {
            data.push(i as f64);
            data.push(0.0);
            labels.push(0i64);
        }
        data.push(100.0);
        data.push(100.0);
        labels.push(1i64);

        let x = Array2::from_shape_vec((9, 2), data).unwrap();
        let y = Array1::from_vec(labels);

        let mut smote = Smote::new().with_seed(7);
        let result = smote.fit_resample(&x, &y).unwrap();
        assert_eq!(result.n_synthetic, 0);
        assert_eq!(result.x.nrows(), 9);
    }
}
