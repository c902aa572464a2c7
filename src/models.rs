use crate::timestamp::normalize_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Grammar that produced a [`LogEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grammar {
    /// `TIMESTAMP [LEVEL] (MODULE) - MESSAGE`
    ModuleLine,
    /// `[TIMESTAMP] LEVEL: MESSAGE`
    ColonLine,
}

/// One parsed log line.
///
/// Every field is trimmed and `level` is uppercased. The level vocabulary is
/// open: whatever word token the line carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Raw timestamp text, not interpreted at this layer
    pub timestamp: String,
    pub level: String,
    /// Source component; absent for grammars without a module field
    pub module: Option<String>,
    /// Free text after timestamp/level/module, used as the resolution key
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: &str, level: &str, module: Option<&str>, message: &str) -> Self {
        Self {
            timestamp: timestamp.trim().to_string(),
            level: level.trim().to_uppercase(),
            module: module.map(|m| m.trim().to_string()),
            message: message.trim().to_string(),
        }
    }

    /// Sortable instant for this entry's timestamp (earliest instant when unparsable)
    pub fn instant(&self) -> NaiveDateTime {
        normalize_timestamp(&self.timestamp)
    }
}

/// Which resolution tier produced a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionSource {
    KnowledgeBase,
    MlPrediction,
    ApiFallback,
    None,
}

impl SolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionSource::KnowledgeBase => "knowledge_base",
            SolutionSource::MlPrediction => "ml_prediction",
            SolutionSource::ApiFallback => "api_fallback",
            SolutionSource::None => "none",
        }
    }
}

impl fmt::Display for SolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionResult {
    pub source: SolutionSource,
    /// Display text, never empty
    pub text: String,
    /// Fix text (or failure diagnostic) without the display decoration
    pub fix: String,
    /// Knowledge-base keyword that matched, for `knowledge_base` results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Classifier category, for `ml_prediction` results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Present only when the category came from a fresh prediction that reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// True when an API answer was written to the knowledge base
    pub saved: bool,
}

impl SolutionResult {
    pub fn from_knowledge_base(keyword: &str, fix: &str) -> Self {
        Self {
            source: SolutionSource::KnowledgeBase,
            text: format!("DB Solution: {}", fix),
            fix: fix.to_string(),
            keyword: Some(keyword.to_string()),
            category: None,
            confidence: None,
            saved: false,
        }
    }

    pub fn from_prediction(category: &str, confidence: Option<f64>, fix: &str) -> Self {
        let confidence_text = confidence
            .map(|c| format!(" (confidence: {:.0}%)", c * 100.0))
            .unwrap_or_default();
        Self {
            source: SolutionSource::MlPrediction,
            text: format!("AI Predicted: {}{}. Suggested Fix: {}", category, confidence_text, fix),
            fix: fix.to_string(),
            keyword: None,
            category: Some(category.to_string()),
            confidence,
            saved: false,
        }
    }

    pub fn from_api(answer: &str, saved: bool) -> Self {
        let text = if saved {
            format!("API Fallback: (Saved) {}", answer)
        } else {
            format!("API Fallback: {}", answer)
        };
        Self {
            source: SolutionSource::ApiFallback,
            text,
            fix: answer.to_string(),
            keyword: None,
            category: None,
            confidence: None,
            saved,
        }
    }

    pub fn not_found(detail: &str) -> Self {
        Self {
            source: SolutionSource::None,
            text: format!("No fix found. ({})", detail),
            fix: detail.to_string(),
            keyword: None,
            category: None,
            confidence: None,
            saved: false,
        }
    }
}

/// A parsed entry together with where it came from and its solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEntry {
    pub filename: String,
    /// 1-based line number inside `filename`
    pub line_number: usize,
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Set for actionable levels only
    pub solution: Option<Arc<SolutionResult>>,
}

impl AnnotatedEntry {
    pub fn solution_text(&self) -> &str {
        self.solution.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    pub fn solution_source(&self) -> Option<SolutionSource> {
        self.solution.as_ref().map(|s| s.source)
    }
}

/// A named log file's raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    pub name: String,
    pub content: Vec<u8>,
}

impl LogSource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file, naming the source after the file name
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self { name, content })
    }

    pub fn text(&self) -> String {
        decode_log_bytes(&self.content)
    }
}

/// Decode as UTF-8, falling back to Latin-1 for the whole buffer
pub fn decode_log_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
