//! The build configuration file (`mozconfig`).
//!
//! Each line is `directive value`, e.g. `ac_add_options --enable-debug`.
//! The file is sourced by sh. Configured values are written verbatim in
//! order; the generated clang path is quoted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{script, ComposeError};
use crate::core::ResolvedToolchain;

/// Options directives written when none are configured.
pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "ac_add_options --enable-clang-plugin",
    "ac_add_options --enable-debug",
    "mk_add_options AUTOCLOBBER=1",
];

/// How the build configuration file is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MozconfigOptions {
    /// Replaces [`DEFAULT_DIRECTIVES`] when set
    pub directives: Option<Vec<String>>,

    /// Appended after the base directives
    pub extra: Vec<String>,

    /// Emit `ac_add_options --with-clang-path=<cc>` (on by default)
    pub clang_path: Option<bool>,
}

impl MozconfigOptions {
    /// Merge another set of options into this one (other takes precedence).
    pub fn merge(&mut self, other: MozconfigOptions) {
        if other.directives.is_some() {
            self.directives = other.directives;
        }
        if !other.extra.is_empty() {
            self.extra = other.extra;
        }
        if other.clang_path.is_some() {
            self.clang_path = other.clang_path;
        }
    }
}

/// One `directive value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub directive: String,
    pub value: String,
}

impl Directive {
    /// Parse a configured line, splitting at the first run of whitespace.
    pub fn parse(line: &str) -> Result<Self, ComposeError> {
        let line = line.trim();
        if line.contains('\n') {
            return Err(ComposeError::configuration(format!(
                "mozconfig directive spans several lines: {:?}",
                line
            )));
        }
        let (directive, value) = match line.split_once(char::is_whitespace) {
            Some((d, v)) => (d, v.trim_start()),
            None => (line, ""),
        };
        if directive.is_empty() {
            return Err(ComposeError::configuration_with_help(
                "empty mozconfig directive",
                "Remove blank entries from [mozconfig].directives",
            ));
        }
        Ok(Directive {
            directive: directive.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.directive)
        } else {
            write!(f, "{} {}", self.directive, self.value)
        }
    }
}

/// The build configuration file, ready to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfigFile {
    directives: Vec<Directive>,
}

impl BuildConfigFile {
    /// Assemble the file for a resolved toolchain.
    pub fn compose(
        options: &MozconfigOptions,
        toolchain: &ResolvedToolchain,
    ) -> Result<Self, ComposeError> {
        let mut directives = Vec::new();

        match &options.directives {
            Some(lines) => {
                for line in lines {
                    directives.push(Directive::parse(line)?);
                }
            }
            None => {
                for line in DEFAULT_DIRECTIVES {
                    directives.push(Directive::parse(line)?);
                }
            }
        }

        if options.clang_path.unwrap_or(true) {
            directives.push(Directive {
                directive: "ac_add_options".to_string(),
                value: format!(
                    "--with-clang-path={}",
                    script::quote(&toolchain.cc.to_string_lossy())
                ),
            });
        }

        for line in &options.extra {
            directives.push(Directive::parse(line)?);
        }

        Ok(BuildConfigFile { directives })
    }

    /// Directives in order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Render the file text, one directive per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for directive in &self.directives {
            out.push_str(&directive.to_string());
            out.push('\n');
        }
        out
    }
}
