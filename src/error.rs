use std::path::PathBuf;
use thiserror::Error;

/// Failures of a durable key/value store (knowledge base file, prediction cache file)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing, locking or renaming the backing file failed
    #[error("I/O error during {operation} on {}: {source}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but does not hold a JSON object of strings
    #[error("corrupt store {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory map could not be encoded
    #[error("failed to encode store {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Rejected knowledge-base edits
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// Key or solution was blank after trimming
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    /// `add` was asked to create a key the dynamic layer already holds
    #[error("an entry for '{key}' already exists")]
    DuplicateEntry { key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Category classifier failures, distinct from "no confident category"
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// No model is loaded; every prediction fails
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    /// The model file could not be read or decoded
    #[error("invalid classifier model {}: {error_message}", .path.display())]
    InvalidModel { path: PathBuf, error_message: String },
}

/// Remediation API failures. Every variant ends resolution with a `none` result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemediationError {
    #[error("remediation API is disabled")]
    Disabled,

    #[error("API key is missing (set remediation.api_key or {0})")]
    MissingCredentials(&'static str),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("HTTP status {0} with an unreadable body")]
    Status(u16),

    #[error("malformed response: {0}")]
    InvalidResponse(String),

    #[error("remediation API returned an empty answer")]
    EmptyResponse,
}

/// Configuration file problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Analyzer setup failures
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to build worker pool with {threads} threads: {error_message}")]
    ThreadPool { threads: usize, error_message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_names_path() {
        let err = StoreError::io(
            "rename",
            "/tmp/solutions.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("rename"));
        assert!(text.contains("/tmp/solutions.json"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_remediation_error_display() {
        assert_eq!(RemediationError::Timeout(30).to_string(), "request timed out after 30 seconds");
        assert!(RemediationError::MissingCredentials("GROQ_API_KEY")
            .to_string()
            .contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_knowledge_base_error_wraps_store_error() {
        let store = StoreError::io("write", "kb.json", std::io::Error::other("disk full"));
        let err: KnowledgeBaseError = store.into();
        assert!(matches!(err, KnowledgeBaseError::Store(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
