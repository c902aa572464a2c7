pub mod analyze;
pub mod kb;
pub mod output;
pub mod resolve;
pub mod view;

pub use analyze::run_analyze;
pub use kb::run_kb;
pub use resolve::{run_predict, run_resolve};
pub use view::{run_context, run_view};

use crate::cli::GlobalArgs;
use crate::config::AnalyzerConfig;
use crate::models::LogSource;
use anyhow::Context;
use glob::glob;
use std::path::{Path, PathBuf};

/// Configuration file (if any) with command-line overrides applied
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match &global.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };

    if let Some(threads) = global.parallel {
        config.parallel.num_threads = threads;
    }
    if let Some(path) = &global.kb_path {
        config.knowledge_base_path = path.clone();
    }
    if let Some(path) = &global.predictions_path {
        config.prediction_cache_path = path.clone();
    }
    if let Some(path) = &global.model {
        config.classifier.model_path = Some(path.clone());
    }
    if global.no_api {
        config.remediation.enabled = false;
    }

    Ok(config)
}

pub fn expand_globs(patterns: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') || pattern_str.contains('[') {
            for entry in glob(&pattern_str).with_context(|| format!("invalid glob pattern '{}'", pattern_str))? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}

/// Read a log file as text (UTF-8, falling back to Latin-1)
pub fn read_log(path: &Path) -> anyhow::Result<String> {
    let source = LogSource::from_path(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(source.text())
}
