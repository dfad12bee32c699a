//! User-facing error diagnostics.
//!
//! A diagnostic is the root cause, the file it concerns (if any) and a
//! numbered list of suggested fixes:
//!
//! ```text
//! error: C compiler (`cc`) is not set
//!
//! help: consider:
//!   1. Set [toolchain].cc in the config file or pass --cc.
//! ```

use std::fmt;
use std::path::PathBuf;

/// Shared suggestion texts.
pub mod suggestions {
    pub const CHECK_CONFIG: &str =
        "Check .geckoenv/config.toml or run `geckoenv doctor` to see what is missing";

    pub const OUTPUT_NOT_WRITABLE: &str =
        "Choose a writable directory with `geckoenv generate --out <dir>`";

    pub const RELEASE_NOT_FOUND: &str =
        "Set [release].rustc and [release].cargo, or point [release].dist_root at the unpacked toolchains";

    pub const MISSING_TOOL: &str = "Run `geckoenv doctor` to check the configured toolchain";
}

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// An error message with an optional location and suggested fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<PathBuf>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            location: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("{}{}{}", code, text, RESET)
            } else {
                text.to_string()
            }
        };

        let mut output = format!("{}: {}\n", paint(RED, "error"), self.message);

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        if !self.suggestions.is_empty() {
            output.push_str(&format!("\n{}: consider:\n", paint(GREEN, "help")));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
