//! FraudGuard - upload-triggered fraud detection training pipeline
//!
//! Uploading a transaction dataset trains a fresh random forest on it,
//! evaluates it on a held-out split, persists the artifacts, and installs
//! the model for single-record predictions over a small REST API.
//!
//! # Modules
//!
//! - [`data`] - Dataset loading, preprocessing, splitting, scaling
//! - [`sampling`] - Minority-class oversampling (SMOTE)
//! - [`model`] - Random forest classifier and evaluation metrics
//! - [`pipeline`] - The train-on-upload orchestrator and model slot
//! - [`viz`] - Chart rendering for upload reports
//! - [`server`] - HTTP server with REST API

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sampling;
pub mod server;
pub mod viz;

pub use config::Settings;
pub use error::{FraudError, Result};
