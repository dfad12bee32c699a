//! Command implementations

pub mod completions;
pub mod doctor;
pub mod generate;
pub mod print;

use std::path::Path;

use anyhow::{bail, Context, Result};
use geckoenv::util::config::{global_config_path, load_config, project_config_path};
use geckoenv::util::Shell;
use geckoenv::{compose, Composition, Config, HostEnv};

use crate::cli::InputArgs;

/// Load configuration files and apply command-line overrides.
///
/// An explicit `--config` file must exist; the default locations are
/// optional.
pub fn load(config_path: Option<&Path>, inputs: &InputArgs, shell: &Shell) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    let project_path = match config_path {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => project_config_path(&cwd),
    };

    let global_path = global_config_path();
    if global_path.is_none() {
        shell.warn("cannot locate home directory; skipping global config");
    }

    let mut config = load_config(global_path.as_deref(), &project_path)?;
    config.merge(overrides(inputs));

    // The output path is baked into the script, so it must not depend on
    // where the script is later run from.
    if let Some(ref dir) = config.output.dir {
        config.output.dir = Some(
            std::path::absolute(dir)
                .with_context(|| format!("invalid output directory: {}", dir.display()))?,
        );
    }

    Ok(config)
}

/// Compose from a loaded config and the current process environment.
pub fn compose_from(config: &Config) -> Result<Composition> {
    let mut options = config.compose_options();
    if config.output.dir.is_none() {
        options.out_dir = std::path::absolute(&options.out_dir)
            .context("failed to resolve default output directory")?;
    }

    let composition = compose(
        &config.toolchain,
        &config.release,
        &HostEnv::capture(),
        &options,
    )?;
    Ok(composition)
}

fn overrides(inputs: &InputArgs) -> Config {
    let mut config = Config::default();

    config.toolchain.cc = inputs.cc.clone();
    config.toolchain.cxx = inputs.cxx.clone();
    config.toolchain.ld = inputs.ld.clone();
    config.toolchain.llvm_config = inputs.llvm_config.clone();
    config.toolchain.autoconf = inputs.autoconf.clone();

    config.release.channel = inputs.channel;
    config.release.date = inputs.date.clone();
    config.release.rustc = inputs.rustc.clone();
    config.release.cargo = inputs.cargo.clone();
    config.release.dist_root = inputs.dist_root.clone();

    config.output.dir = inputs.out.clone();
    config.output.script_name = inputs.script_name.clone();
    config.output.interpreter = inputs.interpreter.clone();

    config
}
