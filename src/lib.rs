//! geckoenv - pinned-toolchain build environments for Gecko
//!
//! This crate composes a wrapper script that exports compiler, include,
//! library and Rust toolchain paths and then runs `exec "$@"`, plus the
//! `mozconfig` file the script points the build at.
//!
//! ```no_run
//! use geckoenv::{compose, Channel, ComposeOptions, HostEnv, LanguageRelease, ToolchainPaths};
//! use geckoenv::ops::{generate, GenerateOptions};
//!
//! let toolchain = ToolchainPaths::new("/tool/clang", "/tool/clang++", "/tool/ld")
//!     .with_llvm_config("/tool/llvm-config");
//! let release = LanguageRelease::pinned(Channel::Stable, "2018-01-04")
//!     .with_roots("/opt/rust", "/opt/cargo");
//! let composition = compose(&toolchain, &release, &HostEnv::capture(), &ComposeOptions::new("/out"))?;
//! generate(&composition, &GenerateOptions::default())?;
//! # Ok::<(), geckoenv::ComposeError>(())
//! ```

pub mod compose;
pub mod core;
pub mod ops;
pub mod util;

pub use compose::{compose, ComposeError, ComposeOptions, Composition};
pub use core::{Channel, HostEnv, LanguageRelease, ToolchainPaths};
pub use util::config::Config;
