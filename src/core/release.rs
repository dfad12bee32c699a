//! Pinned Rust toolchain release.
//!
//! The native build needs `rustc` and `cargo` from one exact release. A
//! release is identified by channel and date (`stable-2018-01-04`) and
//! resolves to two tool roots, each with a `bin/` directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::compose::ComposeError;
use crate::util::diagnostic::suggestions;

static RELEASE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid regex"));

/// Rust distribution channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Beta,
    Nightly,
}

impl Channel {
    /// Get the channel name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Beta => "beta",
            Channel::Nightly => "nightly",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(Channel::Stable),
            "beta" => Ok(Channel::Beta),
            "nightly" => Ok(Channel::Nightly),
            _ => Err(format!(
                "invalid channel '{}'; expected 'stable', 'beta', or 'nightly'",
                s
            )),
        }
    }
}

/// A validated release identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseId {
    pub channel: Channel,
    pub date: String,
}

impl ReleaseId {
    /// Validate a channel/date pair.
    pub fn new(channel: Channel, date: &str) -> Result<Self, ComposeError> {
        let invalid = || {
            ComposeError::configuration_with_help(
                format!("invalid release date `{}`", date),
                "Release dates use the form YYYY-MM-DD, e.g. 2018-01-04",
            )
        };

        let caps = RELEASE_DATE.captures(date).ok_or_else(invalid)?;
        let year: u32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let day: u32 = caps[3].parse().map_err(|_| invalid())?;
        match days_in_month(year, month) {
            Some(last) if (1..=last).contains(&day) => {}
            _ => return Err(invalid()),
        }

        Ok(ReleaseId {
            channel,
            date: date.to_string(),
        })
    }
}

fn days_in_month(year: u32, month: u32) -> Option<u32> {
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if leap => Some(29),
        2 => Some(28),
        _ => None,
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.date)
    }
}

/// Tool roots of a resolved release. Each contains `bin/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTools {
    pub id: ReleaseId,
    pub rustc: PathBuf,
    pub cargo: PathBuf,
}

impl ReleaseTools {
    /// `bin/` dirs in PATH order: compiler first, then package manager.
    pub fn bin_dirs(&self) -> [PathBuf; 2] {
        [self.rustc.join("bin"), self.cargo.join("bin")]
    }
}

/// Maps a release identifier to its tool roots.
pub trait ReleaseResolver {
    fn locate(&self, id: &ReleaseId) -> Result<ReleaseTools, ComposeError>;
}

/// Resolver over a directory of unpacked distributions, laid out as
/// `<root>/rust-<channel>-<date>` and `<root>/cargo-<channel>-<date>`.
#[derive(Debug, Clone)]
pub struct DistRoot {
    root: PathBuf,
}

impl DistRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DistRoot { root: root.into() }
    }

    /// Root directory for one component of a release.
    pub fn component_dir(&self, component: &str, id: &ReleaseId) -> PathBuf {
        self.root.join(format!("{}-{}", component, id))
    }
}

impl ReleaseResolver for DistRoot {
    fn locate(&self, id: &ReleaseId) -> Result<ReleaseTools, ComposeError> {
        let rustc = self.component_dir("rust", id);
        let cargo = self.component_dir("cargo", id);

        for dir in [&rustc, &cargo] {
            if !dir.is_dir() {
                return Err(ComposeError::configuration_with_help(
                    format!("release {} not found: {} is missing", id, dir.display()),
                    suggestions::RELEASE_NOT_FOUND,
                ));
            }
        }

        tracing::debug!("Resolved release {} under {}", id, self.root.display());
        Ok(ReleaseTools {
            id: id.clone(),
            rustc,
            cargo,
        })
    }
}

/// The pinned release as configured.
///
/// `rustc` and `cargo` set explicitly take precedence over `dist_root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageRelease {
    /// Distribution channel (defaults to stable)
    pub channel: Option<Channel>,

    /// Release date, `YYYY-MM-DD`
    pub date: Option<String>,

    /// Explicit compiler root
    pub rustc: Option<PathBuf>,

    /// Explicit package manager root
    pub cargo: Option<PathBuf>,

    /// Directory of unpacked distributions
    pub dist_root: Option<PathBuf>,
}

impl LanguageRelease {
    /// A release pinned by channel and date.
    pub fn pinned(channel: Channel, date: impl Into<String>) -> Self {
        LanguageRelease {
            channel: Some(channel),
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// Use explicit tool roots.
    pub fn with_roots(mut self, rustc: impl Into<PathBuf>, cargo: impl Into<PathBuf>) -> Self {
        self.rustc = Some(rustc.into());
        self.cargo = Some(cargo.into());
        self
    }

    /// Resolve through a distribution root.
    pub fn with_dist_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dist_root = Some(root.into());
        self
    }

    /// Merge another release into this one (other takes precedence).
    pub fn merge(&mut self, other: LanguageRelease) {
        if other.channel.is_some() {
            self.channel = other.channel;
        }
        if other.date.is_some() {
            self.date = other.date;
        }
        if other.rustc.is_some() {
            self.rustc = other.rustc;
        }
        if other.cargo.is_some() {
            self.cargo = other.cargo;
        }
        if other.dist_root.is_some() {
            self.dist_root = other.dist_root;
        }
    }

    /// Validate the identifier.
    pub fn id(&self) -> Result<ReleaseId, ComposeError> {
        let date = self.date.as_deref().ok_or_else(|| {
            ComposeError::configuration_with_help(
                "release date (`date`) is not set",
                "Pin the Rust release with [release].date or --date",
            )
        })?;
        ReleaseId::new(self.channel.unwrap_or_default(), date)
    }

    /// Resolve to tool roots.
    ///
    /// Explicit `rustc`/`cargo` roots win; otherwise the release is looked
    /// up under `dist_root`.
    pub fn resolve(&self) -> Result<ReleaseTools, ComposeError> {
        match self.dist_root {
            Some(ref root) => self.resolve_with(&DistRoot::new(root)),
            None => self.resolve_with(&Unlocated),
        }
    }

    /// Resolve with a caller-supplied resolver when no explicit roots are set.
    pub fn resolve_with(&self, resolver: &dyn ReleaseResolver) -> Result<ReleaseTools, ComposeError> {
        let id = self.id()?;

        match (&self.rustc, &self.cargo) {
            (Some(rustc), Some(cargo)) => Ok(ReleaseTools {
                id,
                rustc: rustc.clone(),
                cargo: cargo.clone(),
            }),
            (None, None) => resolver.locate(&id),
            _ => Err(ComposeError::configuration_with_help(
                format!("release {}: `rustc` and `cargo` must be set together", id),
                suggestions::RELEASE_NOT_FOUND,
            )),
        }
    }
}

/// Resolver used when neither explicit roots nor a distribution root is set.
struct Unlocated;

impl ReleaseResolver for Unlocated {
    fn locate(&self, id: &ReleaseId) -> Result<ReleaseTools, ComposeError> {
        Err(ComposeError::configuration_with_help(
            format!("release {} has no tool location", id),
            suggestions::RELEASE_NOT_FOUND,
        ))
    }
}

/// Whether `dir` looks like a tool root (has a `bin/` directory).
pub fn has_bin_dir(dir: &Path) -> bool {
    dir.join("bin").is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_channel_parse() {
        assert_eq!("stable".parse::<Channel>().unwrap(), Channel::Stable);
        assert_eq!("Nightly".parse::<Channel>().unwrap(), Channel::Nightly);
        assert!("lts".parse::<Channel>().is_err());
    }

    #[test]
    fn test_release_id_display() {
        let id = ReleaseId::new(Channel::Stable, "2018-01-04").unwrap();
        assert_eq!(id.to_string(), "stable-2018-01-04");
    }

    #[test]
    fn test_release_id_rejects_bad_dates() {
        assert!(ReleaseId::new(Channel::Stable, "2018-1-4").is_err());
        assert!(ReleaseId::new(Channel::Stable, "2018-13-01").is_err());
        assert!(ReleaseId::new(Channel::Beta, "2018-01-00").is_err());
        assert!(ReleaseId::new(Channel::Beta, "latest").is_err());
    }

    #[test]
    fn test_release_id_checks_month_length() {
        assert!(ReleaseId::new(Channel::Stable, "2018-02-31").is_err());
        assert!(ReleaseId::new(Channel::Stable, "2018-02-29").is_err());
        assert!(ReleaseId::new(Channel::Stable, "2018-04-31").is_err());
        assert!(ReleaseId::new(Channel::Nightly, "2020-02-29").is_ok());
        assert!(ReleaseId::new(Channel::Nightly, "2000-02-29").is_ok());
        assert!(ReleaseId::new(Channel::Nightly, "1900-02-29").is_err());
        assert!(ReleaseId::new(Channel::Stable, "2018-12-31").is_ok());
    }

    #[test]
    fn test_resolve_explicit_roots() {
        let tools = LanguageRelease::pinned(Channel::Stable, "2018-01-04")
            .with_roots("/rust", "/cargo")
            .resolve()
            .unwrap();

        assert_eq!(
            tools.bin_dirs(),
            [PathBuf::from("/rust/bin"), PathBuf::from("/cargo/bin")]
        );
    }

    #[test]
    fn test_resolve_requires_date() {
        let release = LanguageRelease::default().with_roots("/rust", "/cargo");
        let err = release.resolve().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn test_resolve_half_explicit_is_error() {
        let mut release = LanguageRelease::pinned(Channel::Stable, "2018-01-04");
        release.rustc = Some(PathBuf::from("/rust"));
        assert!(release.resolve().is_err());
    }

    #[test]
    fn test_resolve_without_location_is_error() {
        let release = LanguageRelease::pinned(Channel::Stable, "2018-01-04");
        let err = release.resolve().unwrap_err();
        assert!(err.to_string().contains("no tool location"));
    }

    #[test]
    fn test_dist_root_layout() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("rust-beta-2018-02-01/bin")).unwrap();
        std::fs::create_dir_all(tmp.path().join("cargo-beta-2018-02-01/bin")).unwrap();

        let tools = LanguageRelease::pinned(Channel::Beta, "2018-02-01")
            .with_dist_root(tmp.path())
            .resolve()
            .unwrap();

        assert_eq!(tools.rustc, tmp.path().join("rust-beta-2018-02-01"));
        assert!(has_bin_dir(&tools.cargo));
    }

    #[test]
    fn test_dist_root_missing_release() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("rust-stable-2018-01-04")).unwrap();

        let err = LanguageRelease::pinned(Channel::Stable, "2018-01-04")
            .with_dist_root(tmp.path())
            .resolve()
            .unwrap_err();

        assert!(err.to_string().contains("cargo-stable-2018-01-04"));
    }

    struct FixedResolver;

    impl ReleaseResolver for FixedResolver {
        fn locate(&self, id: &ReleaseId) -> Result<ReleaseTools, ComposeError> {
            Ok(ReleaseTools {
                id: id.clone(),
                rustc: PathBuf::from("/fixed/rust"),
                cargo: PathBuf::from("/fixed/cargo"),
            })
        }
    }

    #[test]
    fn test_resolve_with_custom_resolver() {
        let release = LanguageRelease::pinned(Channel::Nightly, "2018-03-01");
        let tools = release.resolve_with(&FixedResolver).unwrap();
        assert_eq!(tools.rustc, PathBuf::from("/fixed/rust"));
        assert_eq!(tools.id.to_string(), "nightly-2018-03-01");
    }

    #[test]
    fn test_merge() {
        let mut base = LanguageRelease::pinned(Channel::Stable, "2018-01-04");
        let mut other = LanguageRelease::default();
        other.date = Some("2018-02-15".to_string());

        base.merge(other);

        assert_eq!(base.channel, Some(Channel::Stable));
        assert_eq!(base.date.as_deref(), Some("2018-02-15"));
    }
}
