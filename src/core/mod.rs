//! Core data structures for geckoenv.
//!
//! These are the inputs of composition:
//! - Compiler toolchain locations
//! - The pinned Rust release
//! - The host environment snapshot

pub mod host_env;
pub mod release;
pub mod toolchain;

pub use host_env::HostEnv;
pub use release::{Channel, DistRoot, LanguageRelease, ReleaseId, ReleaseResolver, ReleaseTools};
pub use toolchain::{ResolvedToolchain, ToolchainPaths};
