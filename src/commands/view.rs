use crate::cli::{ContextArgs, GlobalArgs, ViewArgs};
use crate::commands::output::highlight_levels;
use crate::commands::read_log;
use crate::context::{page_lines, search_raw, ContextExtractor, RawLine, DEFAULT_SEARCH_RADIUS};
use anyhow::bail;
use colored::*;

pub fn run_view(args: ViewArgs, _global: &GlobalArgs) -> anyhow::Result<()> {
    let raw = read_log(&args.file)?;

    match &args.grep {
        Some(keyword) => {
            let lines = search_raw(&raw, keyword, args.strict, DEFAULT_SEARCH_RADIUS);
            if lines.is_empty() {
                println!("{}", "No matches".dimmed());
            }
            print_lines(&lines);
        }
        None => {
            let (lines, total_pages) = page_lines(&raw, args.page, args.per_page);
            print_lines(&lines);
            eprintln!("Page {}/{}", args.page.clamp(1, total_pages), total_pages);
        }
    }
    Ok(())
}

pub fn run_context(args: ContextArgs, _global: &GlobalArgs) -> anyhow::Result<()> {
    let raw = read_log(&args.file)?;
    let Some(window) = ContextExtractor::new().entry_context(&raw, &args.message, args.range) else {
        bail!("message not found in {}", args.file.display());
    };

    for record in &window.records {
        let marker = if record.selected { ">>".yellow().bold() } else { "  ".normal() };
        let text = highlight_levels(&record.text);
        if record.is_error {
            println!("{} {}", marker, text.on_red());
        } else {
            println!("{} {}", marker, text);
        }
    }
    Ok(())
}

fn print_lines(lines: &[RawLine]) {
    for line in lines {
        println!("{} {}", format!("{:>6} │", line.number).dimmed(), highlight_levels(&line.text));
    }
}
