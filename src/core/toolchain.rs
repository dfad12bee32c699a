//! Pinned compiler toolchain locations.
//!
//! A `ToolchainPaths` is loaded from configuration with every field
//! optional; [`ToolchainPaths::resolve`] turns it into a
//! [`ResolvedToolchain`] or reports the first missing tool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::ComposeError;
use crate::util::diagnostic::suggestions;

/// Compiler, linker and analysis-tool locations for the native build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainPaths {
    /// C compiler (e.g. `/nix/store/...-clang/bin/clang`)
    pub cc: Option<PathBuf>,

    /// C++ compiler
    pub cxx: Option<PathBuf>,

    /// Linker
    pub ld: Option<PathBuf>,

    /// `llvm-config`, used by the static-analysis build to locate clang libraries
    pub llvm_config: Option<PathBuf>,

    /// Autoconf 2.13, exported only when set
    pub autoconf: Option<PathBuf>,

    /// Header dirs for C (libc headers)
    pub c_include_dirs: Vec<PathBuf>,

    /// Header dirs for C++ only (libstdc++ `include/c++/<version>` and its
    /// target-triple subdirectory)
    pub cxx_include_dirs: Vec<PathBuf>,
}

/// A toolchain with every required tool present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToolchain {
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ld: PathBuf,
    pub llvm_config: PathBuf,
    pub autoconf: Option<PathBuf>,
    pub c_include_dirs: Vec<PathBuf>,
    pub cxx_include_dirs: Vec<PathBuf>,
}

impl ToolchainPaths {
    /// Build a toolchain from the three compiler-driver paths.
    pub fn new(cc: impl Into<PathBuf>, cxx: impl Into<PathBuf>, ld: impl Into<PathBuf>) -> Self {
        ToolchainPaths {
            cc: Some(cc.into()),
            cxx: Some(cxx.into()),
            ld: Some(ld.into()),
            ..Default::default()
        }
    }

    /// Set the `llvm-config` path.
    pub fn with_llvm_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.llvm_config = Some(path.into());
        self
    }

    /// Add a C header directory.
    pub fn with_c_include(mut self, dir: impl Into<PathBuf>) -> Self {
        self.c_include_dirs.push(dir.into());
        self
    }

    /// Add a C++-only header directory.
    pub fn with_cxx_include(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cxx_include_dirs.push(dir.into());
        self
    }

    /// Merge another set of paths into this one (other takes precedence).
    ///
    /// Include dir lists are replaced, not concatenated.
    pub fn merge(&mut self, other: ToolchainPaths) {
        if other.cc.is_some() {
            self.cc = other.cc;
        }
        if other.cxx.is_some() {
            self.cxx = other.cxx;
        }
        if other.ld.is_some() {
            self.ld = other.ld;
        }
        if other.llvm_config.is_some() {
            self.llvm_config = other.llvm_config;
        }
        if other.autoconf.is_some() {
            self.autoconf = other.autoconf;
        }
        if !other.c_include_dirs.is_empty() {
            self.c_include_dirs = other.c_include_dirs;
        }
        if !other.cxx_include_dirs.is_empty() {
            self.cxx_include_dirs = other.cxx_include_dirs;
        }
    }

    /// Named tool slots in emission order, for checks and error messages.
    pub fn tools(&self) -> [(&'static str, Option<&Path>); 5] {
        [
            ("cc", self.cc.as_deref()),
            ("cxx", self.cxx.as_deref()),
            ("ld", self.ld.as_deref()),
            ("llvm_config", self.llvm_config.as_deref()),
            ("autoconf", self.autoconf.as_deref()),
        ]
    }

    /// Require every mandatory tool to be set.
    ///
    /// Only presence is checked; whether the file exists is left to
    /// `geckoenv doctor`, since the paths usually point into a store that
    /// is populated by the time the script runs.
    pub fn resolve(&self) -> Result<ResolvedToolchain, ComposeError> {
        Ok(ResolvedToolchain {
            cc: require(&self.cc, "C compiler", "cc")?,
            cxx: require(&self.cxx, "C++ compiler", "cxx")?,
            ld: require(&self.ld, "linker", "ld")?,
            llvm_config: require(&self.llvm_config, "llvm-config", "llvm_config")?,
            autoconf: self.autoconf.clone(),
            c_include_dirs: self.c_include_dirs.clone(),
            cxx_include_dirs: self.cxx_include_dirs.clone(),
        })
    }
}

fn require(slot: &Option<PathBuf>, label: &str, key: &str) -> Result<PathBuf, ComposeError> {
    match slot {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
        _ => Err(ComposeError::configuration_with_help(
            format!("{} (`{}`) is not set", label, key),
            format!(
                "Set [toolchain].{} in the config file or pass --{}. {}",
                key,
                key.replace('_', "-"),
                suggestions::MISSING_TOOL
            ),
        )),
    }
}
