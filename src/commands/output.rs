use crate::analyzer::AnalysisRun;
use crate::cli::OutputFormat;
use crate::filter::natural_sort;
use crate::models::{AnnotatedEntry, SolutionSource};
use crate::severity::is_warning;
use colored::*;
use regex::{Captures, Regex};
use std::io::Write;
use std::sync::LazyLock;

static LEVEL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(ERROR|WARN|INFO|DEBUG)\s*\]").unwrap());

pub struct OutputFormatter {
    format: OutputFormat,
    highlight_pattern: Option<Regex>,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            highlight_pattern: None,
        }
    }

    /// Highlight a literal keyword (case-insensitive) in table output
    pub fn with_highlight(mut self, keyword: Option<&str>) -> Self {
        if let Some(k) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
            self.highlight_pattern = Regex::new(&format!("(?i){}", regex::escape(k))).ok();
        }
        self
    }

    pub fn write_entries(&self, writer: &mut dyn Write, entries: &[&AnnotatedEntry]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, entries)?;
                writeln!(writer)?;
            }
            OutputFormat::Ndjson => {
                for entry in entries {
                    serde_json::to_writer(&mut *writer, entry)?;
                    writeln!(writer)?;
                }
            }
            OutputFormat::Csv => self.write_csv(writer, entries)?,
            OutputFormat::Table => {
                writeln!(writer, "{}", "─".repeat(100).dimmed())?;
                for entry in entries {
                    writeln!(writer, "{}", self.format_table(entry))?;
                }
            }
        }
        Ok(())
    }

    fn format_table(&self, annotated: &AnnotatedEntry) -> String {
        let entry = &annotated.entry;
        let mut output = String::new();

        output.push_str(&format!(
            "{} ",
            format!("{}:{}", annotated.filename, annotated.line_number).dimmed()
        ));
        output.push_str(&format!("{} ", entry.timestamp.cyan()));
        output.push_str(&format!("[{}] ", color_level(&entry.level, &format!("{:^5}", entry.level))));
        if is_warning(entry) {
            output.push_str(&format!("{} ", "⚠".yellow()));
        }
        if let Some(module) = &entry.module {
            output.push_str(&format!("({}) ", module.white()));
        }
        output.push_str(&self.highlight(&entry.message));

        if let Some(solution) = &annotated.solution {
            let text = self.highlight(&solution.text);
            let text = match solution.source {
                SolutionSource::KnowledgeBase => text.green(),
                SolutionSource::MlPrediction => text.blue(),
                SolutionSource::ApiFallback => text.magenta(),
                SolutionSource::None => text.dimmed(),
            };
            output.push_str(&format!("\n    {} {}", "→".dimmed(), text));
        }

        output
    }

    fn highlight(&self, text: &str) -> String {
        match &self.highlight_pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &Captures| caps[0].on_yellow().black().to_string())
                .to_string(),
            None => text.to_string(),
        }
    }

    fn write_csv(&self, writer: &mut dyn Write, entries: &[&AnnotatedEntry]) -> anyhow::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "filename",
            "line_number",
            "timestamp",
            "level",
            "module",
            "message",
            "source",
            "solution",
        ])?;

        for annotated in entries {
            let line_number = annotated.line_number.to_string();
            let source = annotated.solution_source().map(|s| s.as_str()).unwrap_or("");
            csv_writer.write_record([
                annotated.filename.as_str(),
                line_number.as_str(),
                annotated.entry.timestamp.as_str(),
                annotated.entry.level.as_str(),
                annotated.entry.module.as_deref().unwrap_or(""),
                annotated.entry.message.as_str(),
                source,
                annotated.solution_text(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn color_level(level: &str, text: &str) -> ColoredString {
    match level {
        "ERROR" | "FATAL" | "CRITICAL" => text.red().bold(),
        "WARN" | "WARNING" => text.yellow(),
        "INFO" => text.green(),
        "DEBUG" => text.magenta(),
        _ => text.normal(),
    }
}

/// Color bracketed level tags (`[ERROR]`, `[WARN ]`, ...) in raw log text
pub fn highlight_levels(text: &str) -> String {
    LEVEL_TAG.replace_all(text, |caps: &Captures| {
        let level = &caps[1];
        color_level(level, &format!("[{}]", level)).bold().to_string()
    })
    .to_string()
}

/// Run summary on stderr so it never mixes with piped output
pub fn print_run_summary(run: &AnalysisRun, shown: usize) {
    let stats = &run.statistics;
    let mut names: Vec<String> = run.raw.keys().cloned().collect();
    natural_sort(&mut names);

    eprintln!("\n{}", "═".repeat(50).cyan());
    eprintln!("{}", "SUMMARY".cyan().bold());
    eprintln!("{}", "═".repeat(50).cyan());
    eprintln!("Files:            {}", names.join(", ").white());
    if stats.files_failed > 0 {
        eprintln!("Unreadable files: {}", stats.files_failed.to_string().red());
    }
    eprintln!("Total lines:      {}", stats.total_lines.to_string().white().bold());
    eprintln!(
        "Parsed entries:   {} ({:.1}%)",
        stats.parsed_entries.to_string().green(),
        stats.parse_rate()
    );
    eprintln!("Entries shown:    {}", shown.to_string().cyan());

    if !stats.source_distribution.is_empty() {
        eprintln!("\n{}:", "Solution Sources".dimmed());
        let mut sources: Vec<_> = stats.source_distribution.iter().collect();
        sources.sort_by_key(|(source, _)| **source);
        for (source, count) in sources {
            eprintln!("  {}: {}", source.as_str().white(), count);
        }
    }
}
