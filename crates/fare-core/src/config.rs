//! TOML config loading for the fare CLI.
//!
//! Deserializes an optional config file with a `[training]` section, then
//! merges it with CLI overrides.

use std::path::Path;

use serde::Deserialize;
use tabular::training::trainer::FareTrainingConfig;

/// Top-level structure of a fare config file.
#[derive(Debug, Default, Deserialize)]
pub struct FareToml {
    /// Training hyperparameter overrides.
    #[serde(default)]
    pub training: TrainingOverrides,
}

/// Optional overrides for `FareTrainingConfig` fields.
///
/// Every field is optional; anything left out keeps the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingOverrides {
    pub epochs: Option<usize>,
    pub batch_rows: Option<usize>,
    pub test_fraction: Option<f64>,
    pub lr: Option<f64>,
    pub log_interval: Option<usize>,
    pub seed: Option<u64>,
    pub sample_count: Option<usize>,
    pub hidden: Option<Vec<usize>>,
    pub dropout: Option<f64>,
}

/// Training values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub epochs: Option<usize>,
    pub batch_rows: Option<usize>,
    pub test_fraction: Option<f64>,
    pub lr: Option<f64>,
    pub seed: Option<u64>,
}

/// Load and deserialize a `FareToml` from a TOML file.
pub fn load_fare_toml(path: &Path) -> anyhow::Result<FareToml> {
    let contents = std::fs::read_to_string(path)?;
    let config: FareToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded fare config");
    Ok(config)
}

/// Build a `FareTrainingConfig` from defaults, TOML overrides, and CLI flags.
///
/// Priority chain: built-in defaults < TOML values < CLI flags.
pub fn build_training_config(overrides: &TrainingOverrides, cli: &CliOverrides) -> FareTrainingConfig {
    let mut config = FareTrainingConfig::new();

    // Apply TOML overrides
    if let Some(n) = overrides.epochs {
        config.epochs = n;
    }
    if let Some(n) = overrides.batch_rows {
        config.batch_rows = n;
    }
    if let Some(f) = overrides.test_fraction {
        config.test_fraction = f;
    }
    if let Some(f) = overrides.lr {
        config.lr = f;
    }
    if let Some(n) = overrides.log_interval {
        config.log_interval = n;
    }
    if let Some(n) = overrides.seed {
        config.seed = n;
    }
    if let Some(n) = overrides.sample_count {
        config.sample_count = n;
    }
    if let Some(hidden) = &overrides.hidden {
        config.hidden = hidden.clone();
    }
    if let Some(p) = overrides.dropout {
        config.dropout = p;
    }

    // CLI overrides take highest priority
    if let Some(n) = cli.epochs {
        config.epochs = n;
    }
    if let Some(n) = cli.batch_rows {
        config.batch_rows = n;
    }
    if let Some(f) = cli.test_fraction {
        config.test_fraction = f;
    }
    if let Some(f) = cli.lr {
        config.lr = f;
    }
    if let Some(n) = cli.seed {
        config.seed = n;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_fare_toml() {
        let toml_str = r#"
[training]
epochs = 150
batch_rows = 12000
test_fraction = 0.25
lr = 0.005
log_interval = 5
seed = 42
sample_count = 20
hidden = [64, 32, 16]
dropout = 0.1
"#;
        let config: FareToml = toml::from_str(toml_str).unwrap();
        let t = &config.training;
        assert_eq!(t.epochs, Some(150));
        assert_eq!(t.batch_rows, Some(12000));
        assert!((t.test_fraction.unwrap() - 0.25).abs() < 1e-12);
        assert!((t.lr.unwrap() - 0.005).abs() < 1e-12);
        assert_eq!(t.log_interval, Some(5));
        assert_eq!(t.seed, Some(42));
        assert_eq!(t.sample_count, Some(20));
        assert_eq!(t.hidden, Some(vec![64, 32, 16]));
        assert!((t.dropout.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_empty_toml() {
        let config: FareToml = toml::from_str("").unwrap();
        assert!(config.training.epochs.is_none());
        assert!(config.training.hidden.is_none());
    }

    #[test]
    fn test_unknown_training_key_rejected() {
        let result: Result<FareToml, _> = toml::from_str("[training]\nepochz = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = build_training_config(&TrainingOverrides::default(), &CliOverrides::default());
        assert_eq!(config.epochs, 300);
        assert_eq!(config.batch_rows, 6000);
        assert_eq!(config.seed, 3349);
    }

    #[test]
    fn test_cli_override_priority() {
        let overrides = TrainingOverrides {
            epochs: Some(50),
            lr: Some(0.01),
            hidden: Some(vec![32]),
            ..Default::default()
        };
        let cli = CliOverrides {
            epochs: Some(7),
            ..Default::default()
        };

        let config = build_training_config(&overrides, &cli);
        // CLI beats TOML
        assert_eq!(config.epochs, 7);
        // TOML beats defaults
        assert!((config.lr - 0.01).abs() < 1e-12);
        assert_eq!(config.hidden, vec![32]);
        // Untouched fields keep defaults
        assert_eq!(config.batch_rows, 6000);
        assert!((config.test_fraction - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_load_fare_toml_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fare.toml");
        std::fs::write(&path, "[training]\nbatch_rows = 300\n").unwrap();

        let config = load_fare_toml(&path).unwrap();
        assert_eq!(config.training.batch_rows, Some(300));
    }
}
