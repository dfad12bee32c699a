//! geckoenv CLI - pinned-toolchain build environments for Gecko

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use geckoenv::util::diagnostic;
use geckoenv::util::Shell;
use geckoenv::ComposeError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color, cli.command.wants_json());

    if let Err(e) = run(cli, &shell) {
        match e.downcast_ref::<ComposeError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), shell.use_color()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("geckoenv=debug")
    } else if cli.quiet {
        EnvFilter::new("geckoenv=warn")
    } else {
        EnvFilter::new("geckoenv=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, config, shell),
        Commands::Print(args) => commands::print::execute(args, config, shell),
        Commands::Doctor(args) => commands::doctor::execute(args, config, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
