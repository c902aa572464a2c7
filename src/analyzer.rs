use crate::error::AnalyzerError;
use crate::models::{AnnotatedEntry, LogSource};
use crate::parsers::LineParser;
use crate::resolver::SolutionResolver;
use crate::severity::is_actionable;
use crate::statistics::AnalysisStatistics;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the worker pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of worker threads to use (0 = available parallelism)
    pub num_threads: usize,
}

/// Per-file outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub name: String,
    pub lines: usize,
    pub entries: usize,
    /// Set when the file could not be read; the rest of the batch is unaffected
    pub error: Option<String>,
}

/// Everything one analysis run produced
#[derive(Debug, Clone, Default)]
pub struct AnalysisRun {
    /// Entries of all files, sorted by normalized timestamp
    pub entries: Vec<AnnotatedEntry>,
    /// One report per input, in input order
    pub files: Vec<FileReport>,
    /// Decoded text per readable file, for raw viewing and context
    pub raw: HashMap<String, String>,
    pub statistics: AnalysisStatistics,
}

impl AnalysisRun {
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.error.is_some())
    }
}

struct FileOutcome {
    report: FileReport,
    entries: Vec<AnnotatedEntry>,
    raw: Option<String>,
    statistics: AnalysisStatistics,
}

/// Parses and annotates log files on a bounded worker pool.
///
/// One task per file; lines within a file are handled in order. The resolver
/// and its caches are shared by all workers.
pub struct LogAnalyzer {
    parser: LineParser,
    resolver: Arc<SolutionResolver>,
    pool: rayon::ThreadPool,
}

impl LogAnalyzer {
    pub fn new(resolver: Arc<SolutionResolver>, config: &ParallelConfig) -> Result<Self, AnalyzerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("logfix-worker-{}", i))
            .build()
            .map_err(|e| AnalyzerError::ThreadPool {
                threads: config.num_threads,
                error_message: e.to_string(),
            })?;

        Ok(Self {
            parser: LineParser::new(),
            resolver,
            pool,
        })
    }

    pub fn resolver(&self) -> &Arc<SolutionResolver> {
        &self.resolver
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Analyze in-memory sources
    pub fn analyze_sources(&self, sources: Vec<LogSource>) -> AnalysisRun {
        let started = Instant::now();
        let outcomes: Vec<FileOutcome> = self.pool.install(|| {
            sources
                .into_par_iter()
                .map(|source| {
                    let text = source.text();
                    self.analyze_text(source.name, text)
                })
                .collect()
        });
        self.finish(outcomes, started)
    }

    /// Read and analyze files; each file is read inside its worker.
    /// An unreadable file is reported in [`AnalysisRun::files`] and skipped.
    pub fn analyze_paths(&self, paths: &[PathBuf]) -> AnalysisRun {
        let started = Instant::now();
        let outcomes: Vec<FileOutcome> = self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| match LogSource::from_path(path) {
                    Ok(source) => {
                        let text = source.text();
                        self.analyze_text(source.name, text)
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to read log file");
                        unreadable(path.display().to_string(), e.to_string())
                    }
                })
                .collect()
        });
        self.finish(outcomes, started)
    }

    fn analyze_text(&self, name: String, text: String) -> FileOutcome {
        let mut statistics = AnalysisStatistics::new();
        let mut entries = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let Some((grammar, entry)) = self.parser.parse_with_grammar(line) else {
                statistics.record_dropped();
                continue;
            };
            statistics.record_parsed(grammar, &entry.level);

            let solution = if is_actionable(&entry) {
                let solution = self.resolver.resolve(&entry.message);
                statistics.record_solution(solution.source);
                Some(solution)
            } else {
                None
            };

            entries.push(AnnotatedEntry {
                filename: name.clone(),
                line_number: index + 1,
                entry,
                solution,
            });
        }
        statistics.record_file(true);
        debug!(file = %name, lines = statistics.total_lines, entries = entries.len(), "file analyzed");

        FileOutcome {
            report: FileReport {
                name: name.clone(),
                lines: statistics.total_lines,
                entries: entries.len(),
                error: None,
            },
            entries,
            raw: Some(text),
            statistics,
        }
    }

    fn finish(&self, outcomes: Vec<FileOutcome>, started: Instant) -> AnalysisRun {
        let mut run = AnalysisRun::default();

        for outcome in outcomes {
            run.statistics.merge(&outcome.statistics);
            if let Some(raw) = outcome.raw {
                run.raw.insert(outcome.report.name.clone(), raw);
            }
            run.entries.extend(outcome.entries);
            run.files.push(outcome.report);
        }

        // Timestamp order with a positional tie-break, so the result does not depend on worker timing
        run.entries
            .sort_by_cached_key(|e| (e.entry.instant(), e.filename.clone(), e.line_number));

        run.statistics.processing_time_micros = started.elapsed().as_micros() as u64;
        info!(
            files = run.statistics.files_processed,
            failed = run.statistics.files_failed,
            entries = run.entries.len(),
            "analysis finished"
        );
        run
    }
}

fn unreadable(name: String, error: String) -> FileOutcome {
    let mut statistics = AnalysisStatistics::new();
    statistics.record_file(false);
    FileOutcome {
        report: FileReport {
            name,
            lines: 0,
            entries: 0,
            error: Some(error),
        },
        entries: Vec::new(),
        raw: None,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FakeClassifier;
    use crate::knowledge_base::KnowledgeBase;
    use crate::models::SolutionSource;
    use crate::prediction_cache::PredictionCache;
    use crate::remediation::FakeRemediation;
    use tempfile::TempDir;

    fn analyzer(threads: usize) -> LogAnalyzer {
        let resolver = SolutionResolver::new(
            Arc::new(KnowledgeBase::in_memory()),
            Arc::new(PredictionCache::in_memory()),
            Arc::new(FakeClassifier::never()),
            Arc::new(FakeRemediation::answering("API Error: offline")),
        );
        LogAnalyzer::new(Arc::new(resolver), &ParallelConfig { num_threads: threads }).unwrap()
    }

    #[test]
    fn test_pool_size_follows_config() {
        assert_eq!(analyzer(3).num_threads(), 3);
        assert!(analyzer(0).num_threads() >= 1);
    }

    #[test]
    fn test_only_actionable_levels_are_resolved() {
        let text = "2025-06-08 02:00:15 [INFO] (Core) - started\n\
                    2025-06-08 02:00:16 [ERROR] (Core) - Database connection failed\n\
                    \tat com.bank.Db.open(Db.java:10)\n\
                    [2025-06-08 02:00:17] warn: printer paper low\n";
        let run = analyzer(1).analyze_sources(vec![LogSource::new("atm.log", text)]);

        assert_eq!(run.entries.len(), 3);
        assert!(run.entries[0].solution.is_none());
        assert_eq!(run.entries[1].solution_source(), Some(SolutionSource::KnowledgeBase));
        assert_eq!(run.entries[1].line_number, 2);
        assert_eq!(run.entries[2].entry.level, "WARN");
        assert_eq!(run.statistics.total_lines, 4);
        assert_eq!(run.statistics.dropped_lines, 1);
        assert_eq!(run.statistics.resolved_entries, 2);
        assert_eq!(run.files[0].entries, 3);
        assert!(run.raw["atm.log"].contains("Db.java"));
    }

    #[test]
    fn test_latin1_content_is_decoded() {
        let mut bytes = b"2025-06-08 02:00:15 [ERROR] (Core) - caf".to_vec();
        bytes.push(0xE9);
        let run = analyzer(1).analyze_sources(vec![LogSource::new("latin.log", bytes)]);
        assert_eq!(run.entries[0].entry.message, "café");
    }

    #[test]
    fn test_unreadable_file_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.log");
        std::fs::write(&good, "2025-06-08 02:00:15 [INFO] (Core) - ok\n").unwrap();
        let missing = dir.path().join("missing.log");

        let run = analyzer(2).analyze_paths(&[missing, good]);
        assert_eq!(run.files.len(), 2);
        assert!(run.files[0].error.is_some());
        assert_eq!(run.files[1].name, "good.log");
        assert_eq!(run.failed_files().count(), 1);
        assert_eq!(run.entries.len(), 1);
        assert_eq!(run.statistics.files_processed, 1);
        assert_eq!(run.statistics.files_failed, 1);
    }

    #[test]
    fn test_unparsable_timestamps_sort_first() {
        let text = "2025-06-08 02:00:15 [ERROR] (Core) - later\n[08/06] ERROR: no real time\n";
        let run = analyzer(1).analyze_sources(vec![LogSource::new("mixed.log", text)]);
        assert_eq!(run.entries[0].entry.message, "no real time");
        assert_eq!(run.entries[1].entry.message, "later");
    }
}
