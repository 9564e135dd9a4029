//! modelprobe CLI binary entry point.

use clap::Parser;
use modelprobe::cli::commands::{self, CliContext};
use modelprobe::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> modelprobe::error::Result<()> {
    let ctx = CliContext::load(cli.config, cli.cache)?;
    match cli.command {
        Commands::Probe(args) => commands::handle_probe(ctx, args).await,
        Commands::Caps(args) => commands::handle_caps(&ctx, &args),
        Commands::Stats => commands::handle_stats(&ctx),
        Commands::Override(args) => commands::handle_override(&ctx, args.command),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "modelprobe=debug" } else { "modelprobe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
