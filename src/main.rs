mod app;
mod cli;
mod config;
mod error;
mod export;
mod git;
mod logging;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Handle shell completion generation
    if let Some(shell) = args.completions {
        cli::generate_completions(shell);
        return Ok(());
    }

    let config = config::load();
    logging::init(args.verbose, args.quiet, &config.log_level);

    let app = app::App::new(args, config)?;
    app.run()?;

    Ok(())
}
