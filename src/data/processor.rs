//! Feature pipeline: preprocessing, splitting, scaling
//!
//! `DataProcessor` owns the fitted transform state (feature column order and
//! scaler parameters) and is persisted alongside the classifier it was trained
//! with. Applying it to data with a different schema is a `DataError`.

use crate::data::scaler::{Scaler, ScalerType};
use crate::error::{FraudError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Name of the binary fraud label column
pub const LABEL_COLUMN: &str = "Class";

/// The four artifacts of a train/test split
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Array1<i64>,
    pub y_test: Array1<i64>,
}

/// Stateful feature pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProcessor {
    scaler: Option<Scaler>,
    feature_columns: Vec<String>,
    is_fitted: bool,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProcessor {
    pub fn new() -> Self {
        Self {
            scaler: None,
            feature_columns: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Names of the feature columns fixed at split time
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Clean the raw dataset: cast numeric columns to Float64, keep only
    /// numeric columns, and drop rows containing nulls. The label column, when
    /// present, survives as a numeric column.
    pub fn preprocess(&self, df: &DataFrame) -> Result<DataFrame> {
        if df.height() == 0 {
            return Err(FraudError::DataError("dataset is empty".to_string()));
        }

        let mut numeric: Vec<Column> = Vec::new();
        for col in df.get_columns() {
            match col.dtype() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32 => {
                    let casted = col
                        .cast(&DataType::Float64)
                        .map_err(|e| FraudError::DataError(e.to_string()))?;
                    numeric.push(casted);
                }
                DataType::Float64 => numeric.push(col.clone()),
                _ => {} // non-numeric columns are dropped
            }
        }

        if numeric.is_empty() {
            return Err(FraudError::DataError(
                "dataset contains no numeric feature columns".to_string(),
            ));
        }

        let result = DataFrame::new(numeric).map_err(|e| FraudError::DataError(e.to_string()))?;
        let result = result
            .drop_nulls::<String>(None)
            .map_err(|e| FraudError::DataError(e.to_string()))?;

        if result.height() == 0 {
            return Err(FraudError::DataError(
                "dataset has no complete rows after dropping nulls".to_string(),
            ));
        }

        Ok(result)
    }

    /// Stratified train/test split on the label column. Fixes the feature
    /// column order used by every later transform.
    pub fn split(&mut self, df: &DataFrame, test_size: f64, seed: u64) -> Result<SplitData> {
        let labels = Self::extract_labels(df)?;
        let n = labels.len();
        if n < 2 {
            return Err(FraudError::DataError(format!(
                "need at least 2 rows to split, got {n}"
            )));
        }
        if !(0.0..1.0).contains(&test_size) {
            return Err(FraudError::ValidationError(format!(
                "test_size must be in [0, 1), got {test_size}"
            )));
        }

        self.feature_columns = df
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != LABEL_COLUMN)
            .map(|s| s.to_string())
            .collect();

        // Shuffle indices per class so both partitions preserve the class ratio
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut train_idx: Vec<u32> = Vec::with_capacity(n);
        let mut test_idx: Vec<u32> = Vec::new();

        for class in [0i64, 1i64] {
            let mut class_idx: Vec<u32> = labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == class)
                .map(|(i, _)| i as u32)
                .collect();
            class_idx.shuffle(&mut rng);

            // Train always keeps at least one row of any present class
            let n_test = ((class_idx.len() as f64) * test_size).floor() as usize;
            let n_test = n_test.min(class_idx.len().saturating_sub(1));
            test_idx.extend_from_slice(&class_idx[..n_test]);
            train_idx.extend_from_slice(&class_idx[n_test..]);
        }

        if train_idx.is_empty() {
            return Err(FraudError::DataError(
                "training partition is empty after split".to_string(),
            ));
        }

        let features = df
            .select(self.feature_columns.iter().map(|s| s.as_str()))
            .map_err(|e| FraudError::DataError(e.to_string()))?;

        let take = |idx: &[u32]| -> Result<DataFrame> {
            let ca = IdxCa::from_vec("idx".into(), idx.to_vec());
            features
                .take(&ca)
                .map_err(|e| FraudError::DataError(e.to_string()))
        };

        let y_of = |idx: &[u32]| -> Array1<i64> {
            Array1::from_vec(idx.iter().map(|&i| labels[i as usize]).collect())
        };

        Ok(SplitData {
            x_train: take(&train_idx)?,
            x_test: take(&test_idx)?,
            y_train: y_of(&train_idx),
            y_test: y_of(&test_idx),
        })
    }

    /// Fit a standard scaler on the training partition and scale both partitions
    pub fn scale(
        &mut self,
        x_train: &DataFrame,
        x_test: &DataFrame,
    ) -> Result<(DataFrame, DataFrame)> {
        let cols: Vec<&str> = self.feature_columns.iter().map(|s| s.as_str()).collect();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let train_scaled = scaler.fit_transform(x_train, &cols)?;
        let test_scaled = scaler.transform(x_test)?;
        self.scaler = Some(scaler);
        self.is_fitted = true;
        Ok((train_scaled, test_scaled))
    }

    /// Transform an input frame with the fitted pipeline (no fitting) and
    /// return it as a feature matrix in training column order.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(FraudError::ModelNotFitted);
        }

        for col in &self.feature_columns {
            if df.column(col).is_err() {
                return Err(FraudError::DataError(format!(
                    "missing expected feature column: {col}"
                )));
            }
        }

        let scaler = self.scaler.as_ref().ok_or(FraudError::ModelNotFitted)?;
        let scaled = scaler.transform(df)?;
        Self::to_matrix(&scaled, &self.feature_columns)
    }

    /// Extract the label vector from a preprocessed frame
    pub fn extract_labels(df: &DataFrame) -> Result<Array1<i64>> {
        let column = df.column(LABEL_COLUMN).map_err(|_| {
            FraudError::DataError(format!("label column '{LABEL_COLUMN}' not found"))
        })?;
        let casted = column
            .cast(&DataType::Float64)
            .map_err(|e| FraudError::DataError(e.to_string()))?;
        let labels: Vec<i64> = casted
            .f64()
            .map_err(|e| FraudError::DataError(e.to_string()))?
            .into_iter()
            .map(|v| v.unwrap_or(0.0).round() as i64)
            .collect();
        Ok(Array1::from_vec(labels))
    }

    /// Extract named columns into a row-major Array2<f64>
    pub fn to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let n_cols = col_names.len();

        let col_data: Vec<Vec<f64>> = col_names
            .iter()
            .map(|col_name| {
                let column = df.column(col_name).map_err(|_| {
                    FraudError::DataError(format!("missing expected feature column: {col_name}"))
                })?;
                let casted = column
                    .cast(&DataType::Float64)
                    .map_err(|e| FraudError::DataError(e.to_string()))?;
                let values: Vec<f64> = casted
                    .f64()
                    .map_err(|e| FraudError::DataError(e.to_string()))?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
            col_refs[c][r]
        }))
    }
}
