use clap::Parser;
use tracing_subscriber::EnvFilter;

use qc_summary::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("qc_summary=debug,info")
    } else {
        EnvFilter::new("qc_summary=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Render(args) => {
            cli::render::run(args, cli.verbose)?;
        }
        cli::Commands::Chapters(args) => {
            cli::chapters::run(args, cli.format)?;
        }
    }

    Ok(())
}
