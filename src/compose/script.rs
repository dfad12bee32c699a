//! The generated wrapper script.
//!
//! A script is a shebang, an ordered list of `export NAME=value` lines and
//! an `exec "$@"` trailer. Values are shell words built from literal and
//! variable-reference segments so that `$PATH` stays unexpanded until the
//! script runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::ComposeError;

static SHELL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Trailer forwarding the wrapper's arguments to `exec`.
pub const EXEC_TRAILER: &str = r#"exec "$@""#;

/// Check that `name` is a valid POSIX shell variable name.
pub fn validate_name(name: &str) -> Result<(), ComposeError> {
    if SHELL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ComposeError::configuration_with_help(
            format!("`{}` is not a valid shell variable name", name),
            "Variable names must match [A-Za-z_][A-Za-z0-9_]*",
        ))
    }
}

/// One segment of a shell word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Segment {
    /// Text taken verbatim, quoted on output if needed
    Literal(String),
    /// A variable expanded when the script runs
    Var(String),
}

/// A shell word assigned to an exported variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShellValue {
    segments: Vec<Segment>,
}

impl ShellValue {
    /// The empty value.
    pub fn empty() -> Self {
        ShellValue::default()
    }

    /// A literal value.
    pub fn literal(text: impl Into<String>) -> Self {
        ShellValue::empty().push_literal(text)
    }

    /// A literal path.
    pub fn path(path: &Path) -> Self {
        ShellValue::literal(path.to_string_lossy())
    }

    /// Colon-join `entries` as one literal.
    pub fn search_path<S: AsRef<str>>(entries: &[S]) -> Self {
        let joined: Vec<&str> = entries.iter().map(AsRef::as_ref).collect();
        ShellValue::literal(joined.join(":"))
    }

    /// `dirs` joined with `:` and followed by `:$name`.
    pub fn prepend(dirs: &[PathBuf], name: &str) -> Self {
        let mut text = String::new();
        for dir in dirs {
            text.push_str(&dir.to_string_lossy());
            text.push(':');
        }
        ShellValue::literal(text).push_var(name)
    }

    /// Append a literal segment.
    pub fn push_literal(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.segments.last_mut() {
            Some(Segment::Literal(prev)) => prev.push_str(&text),
            _ => self.segments.push(Segment::Literal(text)),
        }
        self
    }

    /// Append a variable reference.
    pub fn push_var(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Var(name.into()));
        self
    }

    /// Whether the value renders to nothing.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the variables this value references.
    pub fn referenced_vars(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render as a single POSIX shell word.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => out.push_str(&quote(text)),
                Segment::Var(name) => {
                    let next_is_word = matches!(
                        self.segments.get(i + 1),
                        Some(Segment::Literal(t)) if t.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
                    );
                    if next_is_word {
                        out.push_str(&format!("${{{}}}", name));
                    } else {
                        out.push('$');
                        out.push_str(name);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for ShellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Quote `text` for POSIX sh, leaving it bare when nothing needs quoting.
pub fn quote(text: &str) -> String {
    if text.chars().all(is_safe) {
        return text.to_string();
    }
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// One `export NAME=value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    pub name: String,
    pub value: ShellValue,
}

impl Export {
    pub fn new(name: impl Into<String>, value: ShellValue) -> Self {
        Export {
            name: name.into(),
            value,
        }
    }

    /// Render the line without a trailing newline.
    pub fn render(&self) -> String {
        format!("export {}={}", self.name, self.value.render())
    }
}

/// The wrapper script, ready to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedScript {
    interpreter: PathBuf,
    exports: Vec<Export>,
}

impl GeneratedScript {
    /// Create an empty script run by `interpreter`.
    pub fn new(interpreter: impl Into<PathBuf>) -> Result<Self, ComposeError> {
        let interpreter = interpreter.into();
        let text = interpreter.to_string_lossy();
        if !interpreter.is_absolute() || text.contains(char::is_whitespace) {
            return Err(ComposeError::configuration_with_help(
                format!("interpreter `{}` must be an absolute path without spaces", text),
                "Set [output].interpreter, e.g. /bin/sh",
            ));
        }
        Ok(GeneratedScript {
            interpreter,
            exports: Vec::new(),
        })
    }

    /// Append an export. Order is preserved exactly.
    pub fn export(&mut self, name: &str, value: ShellValue) -> Result<(), ComposeError> {
        validate_name(name)?;
        for referenced in value.referenced_vars() {
            validate_name(referenced)?;
        }
        tracing::debug!("export {}", name);
        self.exports.push(Export::new(name, value));
        Ok(())
    }

    /// The interpreter on the shebang line.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// All exports in emission order.
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// Exports of `name`, in order.
    pub fn exports_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Export> + 'a {
        self.exports.iter().filter(move |e| e.name == name)
    }

    /// Render the full script text.
    pub fn render(&self) -> String {
        let mut out = format!("#!{}\n", self.interpreter.display());
        for export in &self.exports {
            out.push_str(&export.render());
            out.push('\n');
        }
        out.push_str(EXEC_TRAILER);
        out.push('\n');
        out
    }
}
