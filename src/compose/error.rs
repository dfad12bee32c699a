//! Composition error types and diagnostics.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while composing or writing a build environment.
///
/// Both variants are fatal. Nothing is retried and no partially written
/// script is ever left executable.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ComposeError {
    /// An input path, release or name could not be resolved.
    #[error("configuration error: {what}")]
    #[diagnostic(code(geckoenv::compose::configuration))]
    Configuration {
        what: String,
        #[help]
        help: Option<String>,
    },

    /// The output directory or one of its files could not be written.
    #[error("failed to write `{}`", path.display())]
    #[diagnostic(code(geckoenv::compose::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ComposeError {
    /// A configuration error without a suggestion.
    pub fn configuration(what: impl Into<String>) -> Self {
        ComposeError::Configuration {
            what: what.into(),
            help: None,
        }
    }

    /// A configuration error with a suggested fix.
    pub fn configuration_with_help(what: impl Into<String>, help: impl Into<String>) -> Self {
        ComposeError::Configuration {
            what: what.into(),
            help: Some(help.into()),
        }
    }

    /// Wrap an I/O failure on `path`.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ComposeError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ComposeError::Configuration { .. })
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ComposeError::Configuration { what, help } => {
                let diag = Diagnostic::error(what.clone());
                match help {
                    Some(help) => diag.with_suggestion(help.clone()),
                    None => diag.with_suggestion(suggestions::CHECK_CONFIG),
                }
            }
            ComposeError::Io { path, source } => {
                Diagnostic::error(format!("cannot write build environment: {}", source))
                    .with_location(path.clone())
                    .with_suggestion(suggestions::OUTPUT_NOT_WRITABLE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_diagnostic_uses_help() {
        let err = ComposeError::configuration_with_help(
            "C compiler (`cc`) is not set",
            "Set [toolchain].cc or pass --cc",
        );
        assert!(err.is_configuration());

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: C compiler (`cc`) is not set"));
        assert!(output.contains("1. Set [toolchain].cc or pass --cc"));
    }

    #[test]
    fn test_io_diagnostic_has_location() {
        let err = ComposeError::io(
            "/out/bin",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "failed to write `/out/bin`");

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("--> /out/bin"));
    }
}
