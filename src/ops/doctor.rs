//! Toolchain health checks.
//!
//! The `doctor` command verifies that every path the wrapper script would
//! export actually exists, before anything is generated.
//!
//! ## Usage
//!
//! ```bash
//! geckoenv doctor           # Quick check
//! geckoenv doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Compiler, linker and llvm-config (cc, cxx, ld, llvm_config)
//! - Autoconf, when configured
//! - Include directories
//! - Rust release resolution and its `bin/` dirs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::core::release::has_bin_dir;
use crate::util::config::Config;
use crate::util::fs::is_executable;

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tool path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        DoctorReport::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Query `--version` of the compilers
    pub query_versions: bool,
}

/// Run every check against `config`.
pub fn doctor(config: &Config, options: &DoctorOptions) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    for (key, path) in config.toolchain.tools() {
        let required = key != "autoconf";
        match path {
            Some(path) => {
                let query = options.query_versions && matches!(key, "cc" | "cxx");
                let check = check_tool(key, path, query);
                report.add(if required { check } else { check.optional() });
            }
            None if required => {
                report.add(CheckResult::fail(key, "not configured"));
            }
            None => {}
        }
    }

    for dir in config
        .toolchain
        .cxx_include_dirs
        .iter()
        .chain(&config.toolchain.c_include_dirs)
    {
        report.add(check_include_dir(dir));
    }

    report.add(check_release(config));

    report.total_duration = start.elapsed();
    report
}

/// Check one tool given as a path or a bare name.
fn check_tool(name: &str, path: &Path, query_version: bool) -> CheckResult {
    let start = Instant::now();

    let resolved = if path.components().count() == 1 && !path.is_absolute() {
        match which::which(path) {
            Ok(found) => found,
            Err(_) => {
                return CheckResult::fail(name, format!("`{}` not found in PATH", path.display()))
                    .with_duration(start.elapsed())
            }
        }
    } else {
        path.to_path_buf()
    };

    if !is_executable(&resolved) {
        return CheckResult::fail(
            name,
            format!("{} is missing or not executable", resolved.display()),
        )
        .with_path(resolved)
        .with_duration(start.elapsed());
    }

    let mut check = CheckResult::pass(name, format!("Found {}", resolved.display()));
    if query_version {
        if let Some(version) = tool_version(&resolved) {
            check = check.with_version(version);
        }
    }
    check.with_path(resolved).with_duration(start.elapsed())
}

fn check_include_dir(dir: &Path) -> CheckResult {
    let name = format!("include {}", dir.display());
    if dir.is_dir() {
        CheckResult::pass(name, "Directory exists").with_path(dir.to_path_buf())
    } else {
        CheckResult::fail(name, "Directory does not exist").with_path(dir.to_path_buf())
    }
}

fn check_release(config: &Config) -> CheckResult {
    let start = Instant::now();

    let tools = match config.release.resolve() {
        Ok(tools) => tools,
        Err(e) => return CheckResult::fail("release", e.to_string()).with_duration(start.elapsed()),
    };

    for dir in [&tools.rustc, &tools.cargo] {
        if !has_bin_dir(dir) {
            return CheckResult::fail("release", format!("{} has no bin/ directory", dir.display()))
                .with_path(dir.clone())
                .with_duration(start.elapsed());
        }
    }

    CheckResult::pass("release", format!("Resolved {}", tools.id))
        .with_path(tools.rustc.clone())
        .with_version(tools.id.to_string())
        .with_duration(start.elapsed())
}

/// Run `<tool> --version` and keep the first non-empty line.
fn tool_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;

    // Some tools print their version to stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "geckoenv doctor");
    let _ = writeln!(output, "===============\n");

    if verbose {
        let unknown = "unknown".to_string();
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(
            output,
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        );
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
            let _ = writeln!(output, "      Took: {:.1?}", check.duration);
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    if verbose {
        let _ = writeln!(
            output,
            "Summary: {} passed, {} failed in {:.1?}",
            passed, failed, report.total_duration
        );
    } else {
        let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);
    }

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\n{} required check(s) failed. The generated environment will not work.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed.");
    }

    output
}
