//! Fraud classification models and evaluation

pub mod forest;
pub mod metrics;
pub mod tree;

pub use forest::{FraudClassifier, TrainingSummary};
pub use metrics::{ClassReport, EvaluationReport};
pub use tree::{Criterion, DecisionTree};
