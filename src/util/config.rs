//! Configuration file support for geckoenv.
//!
//! geckoenv reads two configuration file locations:
//! - Global: `~/.geckoenv/config.toml` - User-wide defaults
//! - Project: `.geckoenv/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both. Missing files are skipped; a file that
//! exists but cannot be parsed is an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compose::{ComposeOptions, MozconfigOptions};
use crate::core::{LanguageRelease, ToolchainPaths};

/// geckoenv configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler toolchain locations
    pub toolchain: ToolchainPaths,

    /// Pinned Rust release
    pub release: LanguageRelease,

    /// Output layout
    pub output: OutputConfig,

    /// Host variable handling
    pub env: EnvConfig,

    /// Build configuration file contents
    pub mozconfig: MozconfigOptions,
}

/// Output layout settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root (defaults to `./out`)
    pub dir: Option<PathBuf>,

    /// Wrapper script name (defaults to `gecko-env`)
    pub script_name: Option<String>,

    /// Build configuration file name (defaults to `mozconfig`)
    pub config_name: Option<String>,

    /// Shebang interpreter (defaults to `/bin/sh`)
    pub interpreter: Option<PathBuf>,
}

/// Which host variables are read, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Variables forwarded verbatim
    pub forward: Option<Vec<String>>,

    /// Search path prefixed to every include path
    pub include_base: Option<String>,

    /// Source of `LD_LIBRARY_PATH` and `LIBRARY_PATH`
    pub library_path: Option<String>,

    /// Source of `LDFLAGS`
    pub ldflags: Option<String>,

    /// Variable cleared in the wrapper
    pub cleared: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.is_file() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.toolchain.merge(other.toolchain);
        self.release.merge(other.release);
        self.mozconfig.merge(other.mozconfig);

        // Output settings
        if other.output.dir.is_some() {
            self.output.dir = other.output.dir;
        }
        if other.output.script_name.is_some() {
            self.output.script_name = other.output.script_name;
        }
        if other.output.config_name.is_some() {
            self.output.config_name = other.output.config_name;
        }
        if other.output.interpreter.is_some() {
            self.output.interpreter = other.output.interpreter;
        }

        // Env settings
        if other.env.forward.is_some() {
            self.env.forward = other.env.forward;
        }
        if other.env.include_base.is_some() {
            self.env.include_base = other.env.include_base;
        }
        if other.env.library_path.is_some() {
            self.env.library_path = other.env.library_path;
        }
        if other.env.ldflags.is_some() {
            self.env.ldflags = other.env.ldflags;
        }
        if other.env.cleared.is_some() {
            self.env.cleared = other.env.cleared;
        }
    }

    /// Options for composition, with defaults for anything unset.
    pub fn compose_options(&self) -> ComposeOptions {
        let mut options = ComposeOptions::default();

        if let Some(ref dir) = self.output.dir {
            options.out_dir = dir.clone();
        }
        if let Some(ref name) = self.output.script_name {
            options.script_name = name.clone();
        }
        if let Some(ref name) = self.output.config_name {
            options.config_name = name.clone();
        }
        if let Some(ref interpreter) = self.output.interpreter {
            options.interpreter = interpreter.clone();
        }
        if let Some(ref forward) = self.env.forward {
            options.forward = forward.clone();
        }
        if let Some(ref name) = self.env.include_base {
            options.include_base_var = name.clone();
        }
        if let Some(ref name) = self.env.library_path {
            options.library_path_var = name.clone();
        }
        if let Some(ref name) = self.env.ldflags {
            options.ldflags_var = name.clone();
        }
        if let Some(ref name) = self.env.cleared {
            options.cleared_var = name.clone();
        }
        options.mozconfig = self.mozconfig.clone();

        options
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.geckoenv/config.toml or `--config`)
/// 2. Global config (~/.geckoenv/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_if_exists(global)?);
    }

    config.merge(Config::load_if_exists(project_path)?);

    Ok(config)
}

/// Get the global geckoenv config directory (~/.geckoenv).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".geckoenv"))
}

/// Get the global config path (~/.geckoenv/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.geckoenv/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".geckoenv").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channel;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.toolchain.cc.is_none());
        assert!(config.release.date.is_none());

        let options = config.compose_options();
        assert_eq!(options, ComposeOptions::default());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain]
cc = "/tool/clang"
cxx = "/tool/clang++"
ld = "/tool/ld"
llvm_config = "/tool/llvm-config"
c_include_dirs = ["/glibc/include"]

[release]
channel = "nightly"
date = "2018-01-04"
dist_root = "/opt/rust-dist"

[output]
dir = "/out"
script_name = "moz-env"

[env]
forward = ["PATH"]
ldflags = "LDFLAGS_HOST"

[mozconfig]
extra = ["mk_add_options MOZ_OBJDIR=/obj"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.toolchain.cc, Some(PathBuf::from("/tool/clang")));
        assert_eq!(config.release.channel, Some(Channel::Nightly));
        assert_eq!(config.release.dist_root, Some(PathBuf::from("/opt/rust-dist")));

        let options = config.compose_options();
        assert_eq!(options.out_dir, PathBuf::from("/out"));
        assert_eq!(options.script_name, "moz-env");
        assert_eq!(options.config_name, "mozconfig");
        assert_eq!(options.forward, vec!["PATH"]);
        assert_eq!(options.ldflags_var, "LDFLAGS_HOST");
        assert_eq!(options.mozconfig.extra.len(), 1);
    }

    #[test]
    fn test_config_rejects_unknown_channel() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[release]\nchannel = \"lts\"\n").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config file"));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.toolchain.cc = Some(PathBuf::from("/usr/bin/clang"));
        base.output.dir = Some(PathBuf::from("/out"));

        let mut override_cfg = Config::default();
        override_cfg.toolchain.cc = Some(PathBuf::from("/tool/clang"));

        base.merge(override_cfg);

        assert_eq!(base.toolchain.cc, Some(PathBuf::from("/tool/clang")));
        assert_eq!(base.output.dir, Some(PathBuf::from("/out"))); // Not overridden
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[toolchain]
cc = "/usr/bin/gcc"
ld = "/usr/bin/ld"

[release]
date = "2018-01-04"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[toolchain]
cc = "/tool/clang"

[release]
channel = "beta"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path).unwrap();

        assert_eq!(config.toolchain.cc, Some(PathBuf::from("/tool/clang")));
        assert_eq!(config.toolchain.ld, Some(PathBuf::from("/usr/bin/ld")));
        assert_eq!(config.release.channel, Some(Channel::Beta));
        assert_eq!(config.release.date.as_deref(), Some("2018-01-04"));
    }

    #[test]
    fn test_load_config_missing_files() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(
            Some(&tmp.path().join("nope.toml")),
            &project_config_path(tmp.path()),
        )
        .unwrap();
        assert_eq!(config, Config::default());
    }
}
