//! Service configuration
//!
//! All options are read from environment variables with sensible defaults, so
//! a bare `fraudguard serve` works out of the box.

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Runtime settings for the pipeline and server
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,
    /// Directory for uploaded raw datasets
    pub upload_dir: String,
    /// Directory for persisted model artifacts
    pub model_dir: String,
    /// Subsample oversized training partitions before fitting
    pub sample_large_datasets: bool,
    /// Training-partition size above which subsampling kicks in
    pub large_dataset_threshold: usize,
    /// Subsample target size when the threshold is exceeded
    pub sample_cap: usize,
    /// Apply SMOTE minority oversampling before training
    pub enable_smote: bool,
    /// Skip SMOTE when the training partition exceeds this many rows
    pub max_smote_samples: usize,
    /// Fraction of rows reserved for the evaluation split
    pub test_size: f64,
    /// Seed for splits, subsampling, and SMOTE
    pub random_seed: u64,
    /// CORS origin; "*" allows all
    pub cors_origin: String,
    /// Gzip response bodies
    pub enable_compression: bool,
    /// Only compress responses at least this many bytes long
    pub compression_min_size: u16,
    /// Host header values accepted by the server; "*" allows any
    pub allowed_hosts: Vec<String>,
    /// Rows used at most when rendering charts
    pub chart_sample_cap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("API_PORT", 8000),
            max_upload_size: env_parse("MAX_UPLOAD_SIZE", 100 * 1024 * 1024), // 100MB
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            model_dir: std::env::var("MODEL_DIR").unwrap_or_else(|_| "./models".to_string()),
            sample_large_datasets: env_bool("SAMPLE_LARGE_DATASETS", true),
            large_dataset_threshold: env_parse("LARGE_DATASET_THRESHOLD", 100_000),
            sample_cap: env_parse("SAMPLE_CAP", 50_000),
            enable_smote: env_bool("ENABLE_SMOTE", true),
            max_smote_samples: env_parse("MAX_SMOTE_SAMPLES", 100_000),
            test_size: env_parse("TEST_SIZE", 0.2),
            random_seed: env_parse("RANDOM_SEED", 42),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            enable_compression: env_bool("ENABLE_COMPRESSION", true),
            compression_min_size: env_parse("COMPRESSION_MIN_SIZE", 1000),
            allowed_hosts: std::env::var("ALLOWED_HOSTS")
                .map(|v| {
                    v.split(',')
                        .map(|h| h.trim().to_string())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["*".to_string()]),
            chart_sample_cap: env_parse("CHART_SAMPLE_CAP", 50_000),
        }
    }
}

impl Settings {
    /// Upload size limit in whole megabytes, for client-facing messages
    pub fn max_upload_size_mb(&self) -> u64 {
        (self.max_upload_size / (1024 * 1024)) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(settings.max_upload_size_mb(), 100);
        assert!(settings.sample_large_datasets);
        assert!(settings.enable_smote);
        assert_eq!(settings.sample_cap, 50_000);
        assert!(settings.enable_compression);
        assert_eq!(settings.compression_min_size, 1000);
        assert_eq!(settings.allowed_hosts, vec!["*".to_string()]);
    }
}
