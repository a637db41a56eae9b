//! Dataset loading and the feature pipeline

mod loader;
mod processor;
mod scaler;

pub use loader::{DataFormat, DatasetLoader};
pub use processor::{DataProcessor, SplitData, LABEL_COLUMN};
pub use scaler::{Scaler, ScalerType};
