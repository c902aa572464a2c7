//! Category prediction for messages the knowledge base does not know.
//!
//! The classifier is a capability behind [`CategoryClassifier`]; the bundled
//! implementation scores messages against per-category vocabulary, and a
//! model file with the same shape can replace the built-in vocabulary.

use crate::category::Category;
use crate::error::ClassifierError;
use indexmap::IndexMap;
#[cfg(test)]
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A predicted category label with the classifier's confidence, when it reports one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    pub confidence: Option<f64>,
}

impl Prediction {
    pub fn new(category: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            category: category.into(),
            confidence,
        }
    }
}

/// Interface for category classifiers.
///
/// `Ok(None)` means "no confident category"; `Err` means the classifier itself failed.
pub trait CategoryClassifier: Send + Sync {
    fn predict(&self, message: &str) -> Result<Option<Prediction>, ClassifierError>;
    fn name(&self) -> &str;
}

/// Vocabulary per category label, in tie-break order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordModel {
    pub categories: IndexMap<String, Vec<String>>,
}

impl KeywordModel {
    pub fn builtin() -> Self {
        let vocabulary: [(Category, &[&str]); 5] = [
            (
                Category::Network,
                &[
                    "network", "vpn", "firewall", "dns", "socket", "connection", "connect", "unreachable",
                    "host", "ping", "router", "disconnected", "ssl", "handshake", "wan", "lan", "proxy",
                ],
            ),
            (
                Category::Database,
                &[
                    "database", "db", "sql", "query", "jdbc", "oracle", "table", "deadlock", "schema",
                    "rollback", "constraint",
                ],
            ),
            (
                Category::Timeout,
                &["timeout", "timed", "expired", "delay", "delayed", "slow", "deadline", "latency"],
            ),
            (
                Category::Authentication,
                &[
                    "authentication", "auth", "login", "password", "credential", "credentials",
                    "unauthorized", "denied", "token", "session", "forbidden",
                ],
            ),
            (
                Category::File,
                &[
                    "file", "directory", "path", "permission", "permissions", "disk", "missing", "read",
                    "write", "folder", "quota",
                ],
            ),
        ];

        let categories = vocabulary
            .iter()
            .map(|(category, terms)| {
                (
                    category.label().to_string(),
                    terms.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self { categories }
    }
}

/// Token-overlap classifier over a [`KeywordModel`]
pub struct KeywordClassifier {
    model: KeywordModel,
    token_pattern: Regex,
    min_confidence: f64,
}

impl KeywordClassifier {
    pub fn builtin() -> Self {
        Self::from_model(KeywordModel::builtin())
    }

    pub fn from_model(model: KeywordModel) -> Self {
        let categories = model
            .categories
            .into_iter()
            .map(|(label, terms)| {
                let terms = terms.into_iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());
                (label.trim().to_lowercase(), terms.collect())
            })
            .collect();

        Self {
            model: KeywordModel { categories },
            token_pattern: Regex::new(r"[a-z0-9]+").unwrap(),
            min_confidence: 0.0,
        }
    }

    /// Load a JSON model file (`{"categories": {"network": ["vpn", ...], ...}}`)
    pub fn from_path(path: &Path) -> Result<Self, ClassifierError> {
        let invalid = |error_message: String| ClassifierError::InvalidModel {
            path: path.to_path_buf(),
            error_message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let model: KeywordModel = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        if model.categories.is_empty() {
            return Err(invalid("model defines no categories".to_string()));
        }
        Ok(Self::from_model(model))
    }

    /// Predictions below this confidence are reported as "no category"
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    fn score(&self, tokens: &HashSet<&str>) -> Vec<(&str, usize)> {
        self.model
            .categories
            .iter()
            .map(|(label, terms)| {
                let hits = terms.iter().filter(|term| tokens.contains(term.as_str())).count();
                (label.as_str(), hits)
            })
            .collect()
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn predict(&self, message: &str) -> Result<Option<Prediction>, ClassifierError> {
        let lowered = message.to_lowercase();
        let tokens: HashSet<&str> = self.token_pattern.find_iter(&lowered).map(|m| m.as_str()).collect();

        let scores = self.score(&tokens);
        let total: usize = scores.iter().map(|(_, hits)| hits).sum();
        if total == 0 {
            return Ok(None);
        }

        // Earliest category wins a tie
        let (label, best) = scores
            .iter()
            .fold(("", 0), |acc, &(label, hits)| if hits > acc.1 { (label, hits) } else { acc });

        let confidence = best as f64 / total as f64;
        if confidence < self.min_confidence {
            return Ok(None);
        }

        Ok(Some(Prediction::new(label, Some(confidence))))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Classifier that always fails, used when no model could be loaded
pub struct UnavailableClassifier {
    reason: String,
}

impl UnavailableClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl CategoryClassifier for UnavailableClassifier {
    fn predict(&self, _message: &str) -> Result<Option<Prediction>, ClassifierError> {
        Err(ClassifierError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Scripted classifier for tests, counting every call
#[cfg(test)]
pub struct FakeClassifier {
    response: Result<Option<Prediction>, ClassifierError>,
    call_count: Mutex<usize>,
}

#[cfg(test)]
impl FakeClassifier {
    pub fn new(response: Result<Option<Prediction>, ClassifierError>) -> Self {
        Self {
            response,
            call_count: Mutex::new(0),
        }
    }

    pub fn always(category: &str, confidence: Option<f64>) -> Self {
        Self::new(Ok(Some(Prediction::new(category, confidence))))
    }

    pub fn never() -> Self {
        Self::new(Ok(None))
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(Err(ClassifierError::Unavailable(reason.to_string())))
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[cfg(test)]
impl CategoryClassifier for FakeClassifier {
    fn predict(&self, _message: &str) -> Result<Option<Prediction>, ClassifierError> {
        *self.call_count.lock() += 1;
        self.response.clone()
    }

    fn name(&self) -> &str {
        "fake"
    }
}
