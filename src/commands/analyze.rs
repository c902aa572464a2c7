use crate::analyzer::LogAnalyzer;
use crate::cli::{AnalyzeArgs, GlobalArgs};
use crate::commands::output::{print_run_summary, OutputFormatter};
use crate::commands::{expand_globs, load_config};
use crate::filter::EntryFilter;
use crate::resolver::SolutionResolver;
use crate::severity::ACTIONABLE_LEVELS;
use crate::timestamp::parse_time_bound;
use anyhow::bail;
use chrono::NaiveDateTime;
use colored::*;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::Arc;

pub fn run_analyze(args: AnalyzeArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;

    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let since = time_bound(args.since.as_deref(), "--since")?;
    let until = time_bound(args.until.as_deref(), "--until")?;

    let resolver = Arc::new(SolutionResolver::from_config(&config));
    let analyzer = LogAnalyzer::new(resolver, &config.parallel)?;
    let run = analyzer.analyze_paths(&files);

    for failed in run.failed_files() {
        eprintln!(
            "{} {}: {}",
            "warning:".yellow().bold(),
            failed.name,
            failed.error.as_deref().unwrap_or("unreadable")
        );
    }

    let mut filter = EntryFilter::new().with_time_range(since, until);
    if let Some(names) = &args.file {
        filter = filter.with_files(names.iter().cloned());
    }
    filter = match (&args.level, args.all_levels) {
        (Some(levels), _) => filter.with_levels(levels),
        (None, true) => filter,
        (None, false) => filter.with_levels(ACTIONABLE_LEVELS),
    };
    if let Some(keyword) = &args.grep {
        filter = filter.with_keyword(keyword);
    }

    let mut selected = filter.apply(&run.entries);
    if let Some(limit) = args.limit {
        selected.truncate(limit);
    }

    let mut output: Box<dyn Write> = match &args.output_file {
        Some(path) => {
            colored::control::set_override(false);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(stdout()),
    };

    OutputFormatter::new(args.output)
        .with_highlight(args.grep.as_deref())
        .write_entries(&mut *output, &selected)?;
    output.flush()?;

    print_run_summary(&run, selected.len());
    if global.verbose > 0 {
        eprintln!("\n{}", run.statistics.generate_report());
    }
    Ok(())
}

fn time_bound(value: Option<&str>, flag: &str) -> anyhow::Result<Option<NaiveDateTime>> {
    match value {
        None => Ok(None),
        Some(raw) => match parse_time_bound(raw) {
            Some(bound) => Ok(Some(bound)),
            None => bail!("invalid time for {}: '{}'", flag, raw),
        },
    }
}
