use std::path::PathBuf;

use crate::forest::ForestConfig;

pub const DEFAULT_MODEL_DIR: &str = "models/";
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLES: usize = 1000;
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Train a classifier at startup when none could be loaded
    pub train_on_startup: bool,
    /// Directory holding the classifier and scaler blobs
    pub model_dir: PathBuf,
    pub seed: u64,
    pub n_samples: usize,
    pub train_ratio: f64,
    pub forest: ForestConfig,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            train_on_startup: true,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            seed: DEFAULT_SEED,
            n_samples: DEFAULT_SAMPLES,
            train_ratio: DEFAULT_TRAIN_RATIO,
            forest: ForestConfig::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl RiskConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let train_on_startup = lookup("RISK_MODEL_TRAIN_ON_STARTUP")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.train_on_startup);

        let model_dir = lookup("RISK_MODEL_SAVE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        let seed = lookup("RISK_MODEL_SEED")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.seed);

        let n_samples = lookup("RISK_MODEL_SAMPLES")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.n_samples);

        let n_trees = lookup("RISK_MODEL_TREES")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.forest.n_trees);

        let log_level = lookup("RUST_LOG")
            .or_else(|| lookup("LOG_LEVEL"))
            .map(|v| v.to_lowercase())
            .unwrap_or(defaults.log_level);

        let log_file = lookup("LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            train_on_startup,
            model_dir,
            seed,
            n_samples,
            train_ratio: defaults.train_ratio,
            forest: ForestConfig {
                n_trees,
                seed,
                ..defaults.forest
            },
            log_level,
            log_file,
        }
    }
}

/// Load a `.env` file from the working directory if one exists.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RiskConfig::from_lookup(lookup(&[]));
        assert!(config.train_on_startup);
        assert_eq!(config.model_dir, PathBuf::from("models/"));
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_samples, 1000);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = RiskConfig::from_lookup(lookup(&[
            ("RISK_MODEL_TRAIN_ON_STARTUP", "false"),
            ("RISK_MODEL_SAVE_PATH", "/var/lib/neurolms/models"),
            ("RISK_MODEL_SEED", "7"),
            ("RISK_MODEL_SAMPLES", "200"),
            ("RISK_MODEL_TREES", "12"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FILE", "logs/neurolms.log"),
        ]));
        assert!(!config.train_on_startup);
        assert_eq!(config.model_dir, PathBuf::from("/var/lib/neurolms/models"));
        assert_eq!(config.seed, 7);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.n_samples, 200);
        assert_eq!(config.forest.n_trees, 12);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("logs/neurolms.log")));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = RiskConfig::from_lookup(lookup(&[
            ("RISK_MODEL_SEED", "not-a-number"),
            ("RISK_MODEL_SAMPLES", "0"),
            ("RISK_MODEL_SAVE_PATH", "  "),
        ]));
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.n_samples, DEFAULT_SAMPLES);
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
    }

    #[test]
    fn test_rust_log_wins_over_log_level() {
        let config = RiskConfig::from_lookup(lookup(&[("RUST_LOG", "warn"), ("LOG_LEVEL", "debug")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }
}
