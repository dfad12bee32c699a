//! Environment composition.
//!
//! [`compose`] turns toolchain paths, a pinned Rust release and a host
//! environment snapshot into a [`Composition`]: the wrapper script and the
//! build configuration file it points to. Composition writes nothing;
//! writing is done by [`crate::ops::generate`].
//!
//! Export order is part of the contract. `PATH` is set three times: the
//! forwarded host value, the self-path prepend, and finally the Rust
//! toolchain prepend, which must come last so its tools win.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::{HostEnv, LanguageRelease, ReleaseTools, ResolvedToolchain, ToolchainPaths};

mod error;
pub mod mozconfig;
pub mod script;

pub use error::ComposeError;
pub use mozconfig::{BuildConfigFile, Directive, MozconfigOptions};
pub use script::{Export, GeneratedScript, Segment, ShellValue};

/// Default wrapper script name.
pub const DEFAULT_SCRIPT_NAME: &str = "gecko-env";

/// Default build configuration file name.
pub const DEFAULT_CONFIG_NAME: &str = "mozconfig";

/// Default interpreter for the shebang and `SHELL`.
pub const DEFAULT_INTERPRETER: &str = "/bin/sh";

/// Host variables forwarded verbatim by default.
pub const DEFAULT_FORWARD: &[&str] = &["PATH", "PKG_CONFIG_PATH", "CMAKE_INCLUDE_PATH"];

/// Variables the composer sets itself. None may be forwarded or cleared,
/// and `PATH` may only be forwarded.
pub const RESERVED_VARS: &[&str] = &[
    "SHELL",
    "CPLUS_INCLUDE_PATH",
    "C_INCLUDE_PATH",
    "INCLUDE_PATH",
    "LDFLAGS",
    "LD_LIBRARY_PATH",
    "LIBRARY_PATH",
    "CC",
    "CXX",
    "LD",
    "LLVM_CONFIG",
    "AUTOCONF",
    "MOZCONFIG",
];

/// Everything that shapes the output besides the toolchain and release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Output root; the script lands in `bin/`, the config in `conf/`
    pub out_dir: PathBuf,
    pub script_name: String,
    pub config_name: String,
    /// Shebang interpreter, also exported as `SHELL`
    pub interpreter: PathBuf,
    /// Host variables copied into the script, in order
    pub forward: Vec<String>,
    /// Host search path prefixed to every include path
    pub include_base_var: String,
    /// Host variable feeding both library path exports
    pub library_path_var: String,
    /// Host variable feeding `LDFLAGS`
    pub ldflags_var: String,
    /// Variable exported as empty so the host's value cannot leak in
    pub cleared_var: String,
    pub mozconfig: MozconfigOptions,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            out_dir: PathBuf::from("out"),
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            forward: DEFAULT_FORWARD.iter().map(|s| s.to_string()).collect(),
            include_base_var: "CMAKE_INCLUDE_PATH".to_string(),
            library_path_var: "CMAKE_LIBRARY_PATH".to_string(),
            ldflags_var: "NIX_LDFLAGS".to_string(),
            cleared_var: "PYTHONPATH".to_string(),
            mozconfig: MozconfigOptions::default(),
        }
    }
}

impl ComposeOptions {
    /// Default options writing under `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        ComposeOptions {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ComposeError> {
        for (what, name) in [("script", &self.script_name), ("config", &self.config_name)] {
            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                return Err(ComposeError::configuration_with_help(
                    format!("invalid {} file name `{}`", what, name),
                    "File names must be non-empty and contain no `/`",
                ));
            }
        }

        for name in [
            &self.include_base_var,
            &self.library_path_var,
            &self.ldflags_var,
            &self.cleared_var,
        ] {
            script::validate_name(name)?;
        }

        let mut seen = BTreeSet::new();
        for name in &self.forward {
            script::validate_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(ComposeError::configuration_with_help(
                    format!("`{}` is forwarded more than once", name),
                    "Remove the duplicate from [env].forward",
                ));
            }
            if RESERVED_VARS.contains(&name.as_str()) {
                return Err(ComposeError::configuration_with_help(
                    format!("`{}` is set by geckoenv and cannot be forwarded", name),
                    "Remove it from [env].forward",
                ));
            }
        }

        let cleared = self.cleared_var.as_str();
        if cleared == "PATH" || RESERVED_VARS.contains(&cleared) || seen.contains(cleared) {
            return Err(ComposeError::configuration_with_help(
                format!("`{}` cannot be cleared", cleared),
                "[env].cleared must name a variable that is neither set nor forwarded",
            ));
        }
        Ok(())
    }
}

/// Where the two generated files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub script_name: String,
    pub config_name: String,
}

impl OutputLayout {
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.root.join("conf")
    }

    pub fn script_path(&self) -> PathBuf {
        self.bin_dir().join(&self.script_name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.conf_dir().join(&self.config_name)
    }
}

/// The composed artifacts, not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub layout: OutputLayout,
    pub release: String,
    pub script: GeneratedScript,
    pub config: BuildConfigFile,
}

impl Composition {
    pub fn script_text(&self) -> String {
        self.script.render()
    }

    pub fn config_text(&self) -> String {
        self.config.render()
    }
}

/// Compose the wrapper script and build configuration file.
///
/// Fails with [`ComposeError::Configuration`] when a required tool or the
/// release cannot be resolved. Performs no I/O apart from looking up a
/// distribution root when the release is resolved through one.
pub fn compose(
    toolchain: &ToolchainPaths,
    release: &LanguageRelease,
    host: &HostEnv,
    options: &ComposeOptions,
) -> Result<Composition, ComposeError> {
    let toolchain = toolchain.resolve()?;
    let release = release.resolve()?;
    compose_resolved(&toolchain, &release, host, options)
}

/// [`compose`] with the toolchain and release already resolved.
pub fn compose_resolved(
    toolchain: &ResolvedToolchain,
    release: &ReleaseTools,
    host: &HostEnv,
    options: &ComposeOptions,
) -> Result<Composition, ComposeError> {
    options.validate()?;

    let layout = OutputLayout {
        root: options.out_dir.clone(),
        script_name: options.script_name.clone(),
        config_name: options.config_name.clone(),
    };

    let config = BuildConfigFile::compose(&options.mozconfig, toolchain)?;
    let mut script = GeneratedScript::new(&options.interpreter)?;

    script.export("SHELL", ShellValue::path(&options.interpreter))?;

    for name in &options.forward {
        script.export(name, ShellValue::literal(host.get(name)))?;
    }

    let base = host.search_path(&options.include_base_var);
    let c_dirs = paths_to_strings(&toolchain.c_include_dirs);
    let cxx_dirs = paths_to_strings(&toolchain.cxx_include_dirs);
    let cxx_include: Vec<&str> = base
        .iter()
        .copied()
        .chain(cxx_dirs.iter().map(String::as_str))
        .chain(c_dirs.iter().map(String::as_str))
        .collect();
    let c_include: Vec<&str> = base
        .iter()
        .copied()
        .chain(c_dirs.iter().map(String::as_str))
        .collect();
    script.export("CPLUS_INCLUDE_PATH", ShellValue::search_path(&cxx_include))?;
    script.export("C_INCLUDE_PATH", ShellValue::search_path(&c_include))?;
    script.export("INCLUDE_PATH", ShellValue::search_path(&cxx_include))?;

    // Self path, so tools can re-enter the environment by name.
    script.export("PATH", ShellValue::prepend(&[layout.bin_dir()], "PATH"))?;

    script.export(&options.cleared_var, ShellValue::empty())?;

    script.export("LDFLAGS", ShellValue::literal(host.get(&options.ldflags_var)))?;

    let library_path = host.get(&options.library_path_var);
    script.export("LD_LIBRARY_PATH", ShellValue::literal(library_path))?;
    script.export("LIBRARY_PATH", ShellValue::literal(library_path))?;

    script.export("CC", ShellValue::path(&toolchain.cc))?;
    script.export("CXX", ShellValue::path(&toolchain.cxx))?;
    script.export("LD", ShellValue::path(&toolchain.ld))?;
    script.export("LLVM_CONFIG", ShellValue::path(&toolchain.llvm_config))?;
    if let Some(ref autoconf) = toolchain.autoconf {
        script.export("AUTOCONF", ShellValue::path(autoconf))?;
    }

    script.export("MOZCONFIG", ShellValue::path(&layout.config_path()))?;

    // Must stay last: the pinned rustc and cargo shadow anything earlier.
    script.export("PATH", ShellValue::prepend(&release.bin_dirs(), "PATH"))?;

    tracing::debug!(
        "Composed {} exports for release {}",
        script.exports().len(),
        release.id
    );

    Ok(Composition {
        layout,
        release: release.id.to_string(),
        script,
        config,
    })
}

fn paths_to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channel;

    fn toolchain() -> ToolchainPaths {
        ToolchainPaths::new("/tool/clang", "/tool/clang++", "/tool/ld")
            .with_llvm_config("/tool/llvm-config")
            .with_cxx_include("/gcc/include/c++/7.3.0")
            .with_cxx_include("/gcc/include/c++/7.3.0/x86_64-unknown-linux-gnu")
            .with_c_include("/glibc/include")
    }

    fn release() -> LanguageRelease {
        LanguageRelease::pinned(Channel::Stable, "2018-01-04").with_roots("/rust", "/cargo")
    }

    fn host() -> HostEnv {
        HostEnv::new()
            .with("PATH", "/usr/bin")
            .with("PKG_CONFIG_PATH", "/pkg")
    }

    fn lines(composition: &Composition) -> Vec<String> {
        composition.script_text().lines().map(str::to_string).collect()
    }

    fn position(lines: &[String], line: &str) -> usize {
        lines
            .iter()
            .position(|l| l == line)
            .unwrap_or_else(|| panic!("missing line `{}`", line))
    }

    #[test]
    fn test_path_scenario() {
        let composition =
            compose(&toolchain(), &release(), &host(), &ComposeOptions::new("/out")).unwrap();
        let lines = lines(&composition);

        let forwarded = position(&lines, "export PATH=/usr/bin");
        let self_path = position(&lines, "export PATH=/out/bin:$PATH");
        let rust_path = position(&lines, "export PATH=/rust/bin:/cargo/bin:$PATH");

        assert!(forwarded < self_path);
        assert!(self_path < rust_path);
        assert_eq!(rust_path, lines.len() - 2);
        assert_eq!(lines.last().unwrap(), r#"exec "$@""#);
    }

    #[test]
    fn test_every_variable_emitted_once() {
        let composition =
            compose(&toolchain(), &release(), &host(), &ComposeOptions::new("/out")).unwrap();
        let script = &composition.script;

        for name in [
            "SHELL",
            "PKG_CONFIG_PATH",
            "CMAKE_INCLUDE_PATH",
            "CPLUS_INCLUDE_PATH",
            "C_INCLUDE_PATH",
            "INCLUDE_PATH",
            "PYTHONPATH",
            "LDFLAGS",
            "LD_LIBRARY_PATH",
            "LIBRARY_PATH",
            "CC",
            "CXX",
            "LD",
            "LLVM_CONFIG",
            "MOZCONFIG",
        ] {
            assert_eq!(script.exports_of(name).count(), 1, "{} not emitted once", name);
        }
        assert_eq!(script.exports_of("PATH").count(), 3);
        assert_eq!(script.exports_of("AUTOCONF").count(), 0);
    }

    #[test]
    fn test_library_paths_share_source() {
        let host = host().with("CMAKE_LIBRARY_PATH", "/zlib/lib:/nss/lib");
        let composition =
            compose(&toolchain(), &release(), &host, &ComposeOptions::new("/out")).unwrap();
        let lines = lines(&composition);

        position(&lines, "export LD_LIBRARY_PATH=/zlib/lib:/nss/lib");
        position(&lines, "export LIBRARY_PATH=/zlib/lib:/nss/lib");
    }

    #[test]
    fn test_missing_host_vars_are_empty() {
        let composition = compose(
            &toolchain(),
            &release(),
            &HostEnv::new(),
            &ComposeOptions::new("/out"),
        )
        .unwrap();
        let lines = lines(&composition);

        position(&lines, "export PATH=");
        position(&lines, "export LDFLAGS=");
        position(&lines, "export PYTHONPATH=");
        position(&lines, "export C_INCLUDE_PATH=/glibc/include");
    }

    #[test]
    fn test_include_paths() {
        let host = host().with("CMAKE_INCLUDE_PATH", "/zlib/include");
        let composition =
            compose(&toolchain(), &release(), &host, &ComposeOptions::new("/out")).unwrap();
        let lines = lines(&composition);

        let cxx = "/zlib/include:/gcc/include/c++/7.3.0:\
                   /gcc/include/c++/7.3.0/x86_64-unknown-linux-gnu:/glibc/include";
        position(&lines, &format!("export CPLUS_INCLUDE_PATH={}", cxx));
        position(&lines, &format!("export INCLUDE_PATH={}", cxx));
        position(&lines, "export C_INCLUDE_PATH=/zlib/include:/glibc/include");
    }

    #[test]
    fn test_ldflags_are_quoted() {
        let host = host().with("NIX_LDFLAGS", "-L/zlib/lib -rpath /out/lib");
        let composition =
            compose(&toolchain(), &release(), &host, &ComposeOptions::new("/out")).unwrap();

        position(&lines(&composition), "export LDFLAGS='-L/zlib/lib -rpath /out/lib'");
    }

    #[test]
    fn test_mozconfig_pointer_and_autoconf() {
        let mut toolchain = toolchain();
        toolchain.autoconf = Some(PathBuf::from("/autoconf/bin/autoconf"));
        let mut options = ComposeOptions::new("/out");
        options.config_name = "mozconfig.debug".to_string();

        let composition = compose(&toolchain, &release(), &host(), &options).unwrap();
        let lines = lines(&composition);

        let autoconf = position(&lines, "export AUTOCONF=/autoconf/bin/autoconf");
        let mozconfig = position(&lines, "export MOZCONFIG=/out/conf/mozconfig.debug");
        assert!(autoconf < mozconfig);
        assert_eq!(
            composition.layout.config_path(),
            PathBuf::from("/out/conf/mozconfig.debug")
        );
    }

    #[test]
    fn test_deterministic() {
        let options = ComposeOptions::new("/out");
        let a = compose(&toolchain(), &release(), &host(), &options).unwrap();
        let b = compose(&toolchain(), &release(), &host(), &options).unwrap();

        assert_eq!(a.script_text(), b.script_text());
        assert_eq!(a.config_text(), b.config_text());
    }

    #[test]
    fn test_missing_compiler() {
        let mut toolchain = toolchain();
        toolchain.cc = None;

        let err = compose(&toolchain, &release(), &host(), &ComposeOptions::new("/out"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_forward_rejected() {
        let mut options = ComposeOptions::new("/out");
        options.forward.push("PATH".to_string());

        let err = compose(&toolchain(), &release(), &host(), &options).unwrap_err();
        assert!(err.to_string().contains("forwarded more than once"));
    }

    #[test]
    fn test_forwarding_composer_variable_rejected() {
        for name in ["CC", "LD_LIBRARY_PATH", "MOZCONFIG"] {
            let mut options = ComposeOptions::new("/out");
            options.forward.push(name.to_string());

            let err = compose(&toolchain(), &release(), &host(), &options).unwrap_err();
            assert!(err.is_configuration());
            assert!(err.to_string().contains("cannot be forwarded"), "{}", name);
        }
    }

    #[test]
    fn test_clearing_path_rejected() {
        let mut options = ComposeOptions::new("/out");
        options.cleared_var = "PATH".to_string();

        let err = compose(&toolchain(), &release(), &host(), &options).unwrap_err();
        assert!(err.to_string().contains("cannot be cleared"));
    }

    #[test]
    fn test_clearing_forwarded_or_reserved_rejected() {
        let mut options = ComposeOptions::new("/out");
        options.cleared_var = "PKG_CONFIG_PATH".to_string();
        assert!(compose(&toolchain(), &release(), &host(), &options).is_err());

        options.cleared_var = "LDFLAGS".to_string();
        assert!(compose(&toolchain(), &release(), &host(), &options).is_err());
    }

    #[test]
    fn test_script_name_with_slash_rejected() {
        let mut options = ComposeOptions::new("/out");
        options.script_name = "../gecko-env".to_string();

        assert!(compose(&toolchain(), &release(), &host(), &options).is_err());
    }

    #[test]
    fn test_custom_interpreter() {
        let mut options = ComposeOptions::new("/out");
        options.interpreter = PathBuf::from("/nix/store/bash/bin/sh");

        let composition = compose(&toolchain(), &release(), &host(), &options).unwrap();
        let lines = lines(&composition);

        assert_eq!(lines[0], "#!/nix/store/bash/bin/sh");
        assert_eq!(lines[1], "export SHELL=/nix/store/bash/bin/sh");
    }
}
