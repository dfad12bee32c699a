//! Centralized shell output.
//!
//! Status lines go to stderr as `{status:>12} {message}`. JSON events and
//! requested artifacts (scripts, reports) go to stdout, so `geckoenv print`
//! can be piped while progress stays visible.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Shell output mode. Human and JSON output are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: failures and warnings only
    Quiet,
    #[default]
    Normal,
    /// --verbose: also debug logging
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status labels, one per kind of event geckoenv reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// An output directory is being composed
    Composing,
    /// A file was written
    Created,
    /// Output already matched; nothing written
    Fresh,
    /// A generate run completed
    Finished,
    /// `doctor` is inspecting the configuration
    Checking,
    /// Every required `doctor` check passed
    Passed,
    /// At least one required `doctor` check failed
    Failed,
    Warning,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Composing => "Composing",
            Status::Created => "Created",
            Status::Fresh => "Fresh",
            Status::Finished => "Finished",
            Status::Checking => "Checking",
            Status::Passed => "Passed",
            Status::Failed => "Failed",
            Status::Warning => "Warning",
        }
    }

    fn color_code(self) -> &'static str {
        match self {
            Status::Created | Status::Fresh | Status::Finished | Status::Passed => "\x1b[1;32m",
            Status::Composing | Status::Checking => "\x1b[1;36m",
            Status::Warning => "\x1b[1;33m",
            Status::Failed => "\x1b[1;31m",
        }
    }

    /// Shown even with `--quiet`.
    fn is_alert(self) -> bool {
        matches!(self, Status::Failed | Status::Warning)
    }
}

/// Width of the right-aligned status column.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags. JSON mode takes precedence over
    /// quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status line to stderr. Nothing is printed in JSON mode, and
    /// quiet mode keeps only failures and warnings.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() || (self.is_quiet() && !status.is_alert()) {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print a JSON value to stdout. Ignored in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.is_json() {
            return;
        }

        let mut out = io::stdout().lock();
        let _ = serde_json::to_writer_pretty(&mut out, event);
        let _ = writeln!(out);
        let _ = out.flush();
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                status.label(),
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", status.label(), width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert_eq!("NEVER".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_from_flags_json_wins() {
        let shell = Shell::from_flags(true, true, ColorChoice::Always, true);
        assert!(shell.is_json());
        assert!(!shell.use_color());
        assert!(!shell.is_verbose());
    }

    #[test]
    fn test_quiet_mode_keeps_alerts() {
        let shell = Shell::from_flags(true, false, ColorChoice::Never, false);
        assert!(shell.is_quiet());
        assert!(Status::Failed.is_alert());
        assert!(Status::Warning.is_alert());
        assert!(!Status::Created.is_alert());
    }

    #[test]
    fn test_format_status_alignment() {
        let shell = Shell::from_flags(false, true, ColorChoice::Never, false);
        assert!(shell.is_verbose());
        assert_eq!(shell.format_status(Status::Created), "     Created");
        assert_eq!(shell.format_status(Status::Fresh), "       Fresh");
    }

    #[test]
    fn test_format_status_color() {
        let shell = Shell::from_flags(false, false, ColorChoice::Always, false);
        let prefix = shell.format_status(Status::Failed);
        assert!(prefix.starts_with("\x1b[1;31m"));
        assert!(prefix.ends_with("\x1b[0m"));
    }
}
