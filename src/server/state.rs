//! Shared application state

use crate::config::Settings;
use crate::pipeline::{ModelSlot, TrainingPipeline};
use std::sync::Arc;

/// State shared by all request handlers
pub struct AppState {
    pub pipeline: TrainingPipeline,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let slot = Arc::new(ModelSlot::new());
        Self {
            pipeline: TrainingPipeline::new(settings, slot),
        }
    }

    /// Build state around an existing pipeline, for callers that need to
    /// swap the chart renderer or pre-load the slot
    pub fn with_pipeline(pipeline: TrainingPipeline) -> Self {
        Self { pipeline }
    }

    pub fn settings(&self) -> &Settings {
        self.pipeline.settings()
    }
}
