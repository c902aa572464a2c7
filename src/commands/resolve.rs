use crate::category::fix_for_label;
use crate::cli::{GlobalArgs, MessageArgs};
use crate::commands::load_config;
use crate::models::SolutionSource;
use crate::resolver::SolutionResolver;
use anyhow::Context;
use colored::*;

pub fn run_resolve(args: MessageArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let resolver = SolutionResolver::from_config(&config);
    let result = resolver.resolve(&args.message);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*result)?);
        return Ok(());
    }

    let source = format!("[{}]", result.source);
    let source = match result.source {
        SolutionSource::KnowledgeBase => source.green(),
        SolutionSource::MlPrediction => source.blue(),
        SolutionSource::ApiFallback => source.magenta(),
        SolutionSource::None => source.red(),
    };
    println!("{} {}", source.bold(), result.text);
    Ok(())
}

pub fn run_predict(args: MessageArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let resolver = SolutionResolver::from_config(&config);
    let prediction = resolver.predict(&args.message).context("AI prediction failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    match prediction {
        Some(prediction) => {
            let confidence = prediction
                .confidence
                .map(|c| format!(" (confidence: {:.0}%)", c * 100.0))
                .unwrap_or_default();
            println!("Classifier: {}", resolver.classifier_name().dimmed());
            println!("Category: {}{}", prediction.category.cyan().bold(), confidence);
            match fix_for_label(&prediction.category) {
                Some(fix) => println!("Suggested fix: {}", fix),
                None => println!("{}", "No generic fix for this category".dimmed()),
            }
        }
        None => println!("{}", "No confident category".yellow()),
    }
    Ok(())
}
