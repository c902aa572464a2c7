use clap::Parser;
use logfix::cli::{Cli, Commands};
use logfix::commands::{run_analyze, run_context, run_kb, run_predict, run_resolve, run_view};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(args, global),
        Commands::Resolve(args) => run_resolve(args, global),
        Commands::Predict(args) => run_predict(args, global),
        Commands::Kb(args) => run_kb(args, global),
        Commands::View(args) => run_view(args, global),
        Commands::Context(args) => run_context(args, global),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
