use crate::analyzer::ParallelConfig;
use crate::error::ConfigError;
use crate::remediation::RemediationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "database/solutions_dynamic.json";
pub const DEFAULT_PREDICTION_CACHE_PATH: &str = "database/ai_predictions.json";

/// Configuration for an analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Dynamic knowledge-base layer
    pub knowledge_base_path: PathBuf,

    /// Persisted classifier predictions
    pub prediction_cache_path: PathBuf,

    pub classifier: ClassifierConfig,

    /// Remediation API settings
    pub remediation: RemediationConfig,

    /// Worker pool settings
    pub parallel: ParallelConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH),
            prediction_cache_path: PathBuf::from(DEFAULT_PREDICTION_CACHE_PATH),
            classifier: ClassifierConfig::default(),
            remediation: RemediationConfig::default(),
            parallel: ParallelConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Read a TOML file; missing sections and keys take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// JSON keyword model; the built-in vocabulary when unset
    pub model_path: Option<PathBuf>,
    /// Predictions below this confidence count as "no category"
    pub min_confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::RemediationBackend;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.knowledge_base_path, PathBuf::from("database/solutions_dynamic.json"));
        assert_eq!(config.prediction_cache_path, PathBuf::from("database/ai_predictions.json"));
        assert!(config.classifier.model_path.is_none());
        assert_eq!(config.parallel.num_threads, 0);
        assert_eq!(config.remediation.timeout_secs, 30);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logfix.toml");
        fs::write(
            &path,
            r#"
knowledge_base_path = "/var/lib/logfix/kb.json"

[remediation]
backend = "ollama"
timeout_secs = 5

[parallel]
num_threads = 2
"#,
        )
        .unwrap();

        let config = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(config.knowledge_base_path, PathBuf::from("/var/lib/logfix/kb.json"));
        assert_eq!(config.prediction_cache_path, PathBuf::from(DEFAULT_PREDICTION_CACHE_PATH));
        assert_eq!(config.remediation.backend, RemediationBackend::Ollama);
        assert_eq!(config.remediation.timeout_secs, 5);
        assert_eq!(config.remediation.max_tokens, 150);
        assert_eq!(config.remediation.model(), "llama3");
        assert_eq!(config.parallel.num_threads, 2);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AnalyzerConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));

        let path = dir.path().join("bad.toml");
        fs::write(&path, "parallel = [").unwrap();
        assert!(matches!(AnalyzerConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
