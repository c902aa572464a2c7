pub mod models;
pub mod error;
pub mod timestamp;
pub mod severity;
pub mod parsers;
pub mod store;
pub mod knowledge_base;
pub mod prediction_cache;
pub mod category;
pub mod classifier;
pub mod remediation;
pub mod resolver;
pub mod statistics;
pub mod analyzer;
pub mod filter;
pub mod context;
pub mod config;
pub mod cli;
pub mod commands;


pub use models::*;
pub use error::{AnalyzerError, ClassifierError, ConfigError, KnowledgeBaseError, RemediationError, StoreError};
pub use parsers::{LineParser, LogParser};
pub use store::{JsonFileStore, MapStore, MemoryStore, StoreMap};
pub use knowledge_base::{KeywordIndex, KnowledgeBase, KnowledgeMatch};
pub use prediction_cache::PredictionCache;
pub use category::Category;
pub use classifier::{CategoryClassifier, KeywordClassifier, KeywordModel, Prediction};
pub use remediation::{HttpRemediationClient, RemediationApi, RemediationBackend, RemediationConfig};
pub use resolver::SolutionResolver;
pub use statistics::AnalysisStatistics;
pub use analyzer::{AnalysisRun, FileReport, LogAnalyzer, ParallelConfig};
pub use filter::EntryFilter;
pub use context::{ContextExtractor, ContextWindow};
pub use config::AnalyzerConfig;
