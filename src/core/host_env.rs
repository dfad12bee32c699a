//! Snapshot of the host environment.

use std::collections::BTreeMap;
use std::ffi::OsString;

/// Host variables visible to the composer.
///
/// Passed explicitly so composition never reads the process environment.
/// Looking up a missing variable yields the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
    vars: BTreeMap<String, String>,
}

impl HostEnv {
    /// An empty environment.
    pub fn new() -> Self {
        HostEnv::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped with
    /// a warning; they read as unset afterwards.
    pub fn capture() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let mut env = HostEnv::new();
        for (name, value) in vars {
            match (name.to_str(), value.to_str()) {
                (Some(name), Some(value)) => env.set(name, value),
                _ => tracing::warn!(
                    "Ignoring host variable {} (not valid UTF-8)",
                    name.to_string_lossy()
                ),
            }
        }
        env
    }

    /// Set a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Builder form of [`HostEnv::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Value of `name`, or `""` when unset.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    /// Split a colon-separated search path, dropping empty entries.
    pub fn search_path(&self, name: &str) -> Vec<&str> {
        self.get(name).split(':').filter(|s| !s.is_empty()).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HostEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        HostEnv {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
