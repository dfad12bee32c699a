//! `geckoenv print` command
//!
//! Composes exactly as `generate` would but writes to stdout only.

use std::path::Path;

use anyhow::Result;

use crate::cli::PrintArgs;
use geckoenv::ops::composition_digest;
use geckoenv::util::Shell;

pub fn execute(args: PrintArgs, config_path: Option<&Path>, shell: &Shell) -> Result<()> {
    let config = super::load(config_path, &args.inputs, shell)?;
    let composition = super::compose_from(&config)?;

    if args.json {
        shell.json_event(&serde_json::json!({
            "release": composition.release,
            "digest": composition_digest(&composition),
            "script_path": composition.layout.script_path(),
            "config_path": composition.layout.config_path(),
            "exports": composition.script.exports(),
            "script": composition.script_text(),
            "mozconfig": composition.config_text(),
        }));
    } else {
        match (args.script, args.mozconfig) {
            (false, true) => print!("{}", composition.config_text()),
            _ => print!("{}", composition.script_text()),
        }
    }

    Ok(())
}
