use crate::cli::{GlobalArgs, KbAction, KbArgs};
use crate::commands::load_config;
use crate::knowledge_base::KnowledgeBase;
use crate::store::JsonFileStore;
use anyhow::bail;
use colored::*;

pub fn run_kb(args: KbArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let kb = KnowledgeBase::open(Box::new(JsonFileStore::new(&config.knowledge_base_path)));

    match args.action {
        KbAction::List { search } => {
            let entries = match &search {
                Some(query) => kb.search(query),
                None => kb.entries_sorted(),
            };
            if entries.is_empty() {
                println!("{}", "No entries".dimmed());
            }
            for (key, solution) in &entries {
                println!("{}\n    {} {}", key.cyan().bold(), "→".dimmed(), solution);
            }
            eprintln!(
                "{} of {} dynamic entries ({})",
                entries.len(),
                kb.dynamic_entries().len(),
                kb.store_description()
            );
        }
        KbAction::Add { key, solution } => {
            kb.add(&key, &solution)?;
            println!("{} '{}'", "Added".green(), key.trim());
        }
        KbAction::Update { key, solution } => {
            kb.upsert(&key, &solution)?;
            println!("{} '{}'", "Saved".green(), key.trim());
        }
        KbAction::Delete { key } => {
            if !kb.delete(&key)? {
                bail!("no dynamic entry for '{}'", key.trim());
            }
            println!("{} '{}'", "Deleted".green(), key.trim());
        }
    }
    Ok(())
}
