use crate::models::{Grammar, SolutionSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    /// Files whose content was read and parsed
    pub files_processed: usize,
    /// Files that could not be read
    pub files_failed: usize,
    /// Every line seen, including blank and unmatched ones
    pub total_lines: usize,
    /// Lines that produced an entry
    pub parsed_entries: usize,
    /// Lines matching no grammar
    pub dropped_lines: usize,
    /// Entries that received a solution
    pub resolved_entries: usize,
    pub grammar_distribution: HashMap<Grammar, usize>,
    pub level_distribution: HashMap<String, usize>,
    pub source_distribution: HashMap<SolutionSource, usize>,
    /// Wall-clock time of the run
    pub processing_time_micros: u64,
}

impl AnalysisStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parsed(&mut self, grammar: Grammar, level: &str) {
        self.total_lines += 1;
        self.parsed_entries += 1;
        *self.grammar_distribution.entry(grammar).or_insert(0) += 1;
        *self.level_distribution.entry(level.to_string()).or_insert(0) += 1;
    }

    pub fn record_dropped(&mut self) {
        self.total_lines += 1;
        self.dropped_lines += 1;
    }

    pub fn record_solution(&mut self, source: SolutionSource) {
        self.resolved_entries += 1;
        *self.source_distribution.entry(source).or_insert(0) += 1;
    }

    pub fn record_file(&mut self, readable: bool) {
        if readable {
            self.files_processed += 1;
        } else {
            self.files_failed += 1;
        }
    }

    /// Parsed lines as a percentage of all lines
    pub fn parse_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.parsed_entries as f64 / self.total_lines as f64) * 100.0
        }
    }

    /// Fold another run's (or file's) counters into this one
    pub fn merge(&mut self, other: &AnalysisStatistics) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.total_lines += other.total_lines;
        self.parsed_entries += other.parsed_entries;
        self.dropped_lines += other.dropped_lines;
        self.resolved_entries += other.resolved_entries;
        for (grammar, count) in &other.grammar_distribution {
            *self.grammar_distribution.entry(*grammar).or_insert(0) += count;
        }
        for (level, count) in &other.level_distribution {
            *self.level_distribution.entry(level.clone()).or_insert(0) += count;
        }
        for (source, count) in &other.source_distribution {
            *self.source_distribution.entry(*source).or_insert(0) += count;
        }
        self.processing_time_micros = self.processing_time_micros.saturating_add(other.processing_time_micros);
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Analysis Summary ===\n");
        report.push_str(&format!(
            "Files: {} processed, {} failed\n",
            self.files_processed, self.files_failed
        ));
        report.push_str(&format!("Lines: {}\n", self.total_lines));
        report.push_str(&format!("Parsed entries: {} ({:.2}%)\n", self.parsed_entries, self.parse_rate()));
        report.push_str(&format!("Dropped lines: {}\n", self.dropped_lines));

        if !self.level_distribution.is_empty() {
            report.push_str("\n--- Levels ---\n");
            let mut levels: Vec<_> = self.level_distribution.iter().collect();
            levels.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (level, count) in levels {
                report.push_str(&format!("{}: {}\n", level, count));
            }
        }

        if !self.source_distribution.is_empty() {
            report.push_str("\n--- Solutions ---\n");
            let mut sources: Vec<_> = self.source_distribution.iter().collect();
            sources.sort_by_key(|(source, _)| **source);
            for (source, count) in sources {
                let percentage = (*count as f64 / self.resolved_entries as f64) * 100.0;
                report.push_str(&format!("{}: {} ({:.2}%)\n", source, count, percentage));
            }
        }

        report.push_str(&format!("\nProcessing time: {}μs\n", self.processing_time_micros));
        report
    }
}
