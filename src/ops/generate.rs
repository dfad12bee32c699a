//! Implementation of `geckoenv generate`.
//!
//! Writes a [`Composition`] to its output directory:
//!
//! ```text
//! <out>/bin/<script>    wrapper script, mode 0755
//! <out>/conf/<config>   build configuration file
//! ```
//!
//! The configuration file is written before the script, and the script is
//! only made executable once its content is in place.

use std::path::PathBuf;

use serde::Serialize;

use crate::compose::{ComposeError, Composition};
use crate::util::fs;
use crate::util::hash::Fingerprint;

/// Options for writing a composition.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Rewrite even when the output is already up to date
    pub force: bool,
}

/// What happened to the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    /// Files were (re)written
    Written,
    /// Files already matched; nothing was touched
    Fresh,
}

/// Result of a generate run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub script_path: PathBuf,
    pub config_path: PathBuf,
    /// Short fingerprint over both files
    pub digest: String,
    pub state: OutputState,
}

/// Short fingerprint identifying a composition's output.
pub fn composition_digest(composition: &Composition) -> String {
    let mut fp = Fingerprint::new();
    fp.update_str(&composition.script_text())
        .update_str(&composition.config_text());
    fp.finish_short()
}

/// Whether the files on disk already match `composition`.
pub fn is_up_to_date(composition: &Composition) -> Result<bool, ComposeError> {
    let script_path = composition.layout.script_path();
    let config_path = composition.layout.config_path();

    let matches = |existing: Option<Vec<u8>>, expected: &str| {
        existing.is_some_and(|bytes| bytes == expected.as_bytes())
    };

    Ok(matches(fs::read_if_exists(&config_path)?, &composition.config_text())
        && matches(fs::read_if_exists(&script_path)?, &composition.script_text())
        && fs::is_executable(&script_path))
}

/// Write the configuration file and the wrapper script.
pub fn generate(
    composition: &Composition,
    options: &GenerateOptions,
) -> Result<GenerateReport, ComposeError> {
    let layout = &composition.layout;
    let mut report = GenerateReport {
        script_path: layout.script_path(),
        config_path: layout.config_path(),
        digest: composition_digest(composition),
        state: OutputState::Fresh,
    };

    if !options.force && is_up_to_date(composition)? {
        tracing::info!("{} is up to date", report.script_path.display());
        return Ok(report);
    }

    fs::ensure_dir(&layout.bin_dir())?;
    fs::ensure_dir(&layout.conf_dir())?;

    fs::write_file(&report.config_path, composition.config_text().as_bytes())?;
    tracing::debug!("Wrote {}", report.config_path.display());

    fs::install_executable(&report.script_path, composition.script_text().as_bytes())?;
    tracing::info!(
        "Wrote {} (release {}, {})",
        report.script_path.display(),
        composition.release,
        report.digest
    );

    report.state = OutputState::Written;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose, ComposeOptions};
    use crate::core::{Channel, HostEnv, LanguageRelease, ToolchainPaths};
    use tempfile::TempDir;

    fn composition(out: &std::path::Path) -> Composition {
        let toolchain = ToolchainPaths::new("/tool/clang", "/tool/clang++", "/tool/ld")
            .with_llvm_config("/tool/llvm-config");
        let release =
            LanguageRelease::pinned(Channel::Stable, "2018-01-04").with_roots("/rust", "/cargo");
        let host = HostEnv::new().with("PATH", "/usr/bin");

        compose(&toolchain, &release, &host, &ComposeOptions::new(out)).unwrap()
    }

    #[test]
    fn test_generate_layout() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let composition = composition(&out);

        let report = generate(&composition, &GenerateOptions::default()).unwrap();

        assert_eq!(report.state, OutputState::Written);
        assert_eq!(report.script_path, out.join("bin/gecko-env"));
        assert_eq!(report.config_path, out.join("conf/mozconfig"));
        assert!(fs::is_executable(&report.script_path));
        assert!(!fs::is_executable(&report.config_path));

        let script = std::fs::read_to_string(&report.script_path).unwrap();
        assert_eq!(script, composition.script_text());
        assert!(script.contains(&format!(
            "export MOZCONFIG={}",
            report.config_path.display()
        )));
    }

    #[test]
    fn test_second_run_is_fresh_and_identical() {
        let tmp = TempDir::new().unwrap();
        let composition = composition(tmp.path());

        let first = generate(&composition, &GenerateOptions::default()).unwrap();
        let bytes = std::fs::read(&first.script_path).unwrap();

        let second = generate(&composition, &GenerateOptions::default()).unwrap();
        assert_eq!(second.state, OutputState::Fresh);
        assert_eq!(first.digest, second.digest);
        assert_eq!(std::fs::read(&second.script_path).unwrap(), bytes);

        let forced = generate(&composition, &GenerateOptions { force: true }).unwrap();
        assert_eq!(forced.state, OutputState::Written);
        assert_eq!(std::fs::read(&forced.script_path).unwrap(), bytes);
    }

    #[test]
    fn test_changed_content_is_rewritten() {
        let tmp = TempDir::new().unwrap();
        let composition = composition(tmp.path());
        generate(&composition, &GenerateOptions::default()).unwrap();

        std::fs::write(composition.layout.config_path(), "stale\n").unwrap();
        assert!(!is_up_to_date(&composition).unwrap());

        let report = generate(&composition, &GenerateOptions::default()).unwrap();
        assert_eq!(report.state, OutputState::Written);
        assert_eq!(
            std::fs::read_to_string(&report.config_path).unwrap(),
            composition.config_text()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_script_is_rewritten() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let composition = composition(tmp.path());
        let report = generate(&composition, &GenerateOptions::default()).unwrap();

        std::fs::set_permissions(&report.script_path, std::fs::Permissions::from_mode(0o644))
            .unwrap();
        assert!(!is_up_to_date(&composition).unwrap());

        generate(&composition, &GenerateOptions::default()).unwrap();
        assert!(fs::is_executable(&report.script_path));
    }

    #[test]
    fn test_unwritable_output_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::write(&out, "a file, not a directory").unwrap();

        let err = generate(&composition(&out), &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, ComposeError::Io { .. }));
    }
}
