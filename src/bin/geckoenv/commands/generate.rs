//! `geckoenv generate` command

use std::path::Path;

use anyhow::Result;

use crate::cli::GenerateArgs;
use geckoenv::ops::{generate, GenerateOptions, OutputState};
use geckoenv::util::shell::Status;
use geckoenv::util::Shell;

pub fn execute(args: GenerateArgs, config_path: Option<&Path>, shell: &Shell) -> Result<()> {
    let config = super::load(config_path, &args.inputs, shell)?;

    shell.status(Status::Composing, config.compose_options().out_dir.display());
    let composition = super::compose_from(&config)?;

    let options = GenerateOptions { force: args.force };
    let report = generate(&composition, &options)?;

    match report.state {
        OutputState::Written => {
            shell.status(Status::Created, report.config_path.display());
            shell.status(Status::Created, report.script_path.display());
        }
        OutputState::Fresh => {
            shell.status(Status::Fresh, report.script_path.display());
        }
    }

    shell.status(
        Status::Finished,
        format!("release {} ({})", composition.release, report.digest),
    );

    Ok(())
}
