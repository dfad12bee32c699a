//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geckoenv::core::Channel;
use geckoenv::util::shell::ColorChoice;

/// geckoenv - pinned-toolchain build environments for Gecko
#[derive(Parser)]
#[command(name = "geckoenv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file to use instead of .geckoenv/config.toml
    #[arg(long, global = true, env = "GECKOENV_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the wrapper script and mozconfig
    Generate(GenerateArgs),

    /// Compose and print without writing anything
    Print(PrintArgs),

    /// Check that the configured toolchain exists
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Whether output should be machine-readable.
    pub fn wants_json(&self) -> bool {
        matches!(self, Commands::Print(args) if args.json)
    }
}

/// Inputs shared by every command that composes.
///
/// Each flag overrides the corresponding config file value.
#[derive(Args, Debug, Default)]
pub struct InputArgs {
    /// Output directory (script in bin/, mozconfig in conf/)
    #[arg(long, env = "GECKOENV_OUT")]
    pub out: Option<PathBuf>,

    /// C compiler
    #[arg(long, env = "GECKOENV_CC")]
    pub cc: Option<PathBuf>,

    /// C++ compiler
    #[arg(long, env = "GECKOENV_CXX")]
    pub cxx: Option<PathBuf>,

    /// Linker
    #[arg(long, env = "GECKOENV_LD")]
    pub ld: Option<PathBuf>,

    /// llvm-config
    #[arg(long, env = "GECKOENV_LLVM_CONFIG")]
    pub llvm_config: Option<PathBuf>,

    /// Autoconf 2.13
    #[arg(long)]
    pub autoconf: Option<PathBuf>,

    /// Rust release channel (stable, beta, nightly)
    #[arg(long)]
    pub channel: Option<Channel>,

    /// Rust release date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Root of the pinned rustc (contains bin/)
    #[arg(long, requires = "cargo")]
    pub rustc: Option<PathBuf>,

    /// Root of the pinned cargo (contains bin/)
    #[arg(long, requires = "rustc")]
    pub cargo: Option<PathBuf>,

    /// Directory of unpacked Rust distributions
    #[arg(long)]
    pub dist_root: Option<PathBuf>,

    /// Wrapper script name
    #[arg(long)]
    pub script_name: Option<String>,

    /// Interpreter for the shebang line
    #[arg(long)]
    pub interpreter: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Rewrite the output even if it is up to date
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PrintArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Print the wrapper script (the default)
    #[arg(long, conflicts_with = "mozconfig")]
    pub script: bool,

    /// Print the mozconfig instead of the script
    #[arg(long)]
    pub mozconfig: bool,

    /// Print the whole composition as JSON
    #[arg(long, conflicts_with_all = ["mozconfig", "script"])]
    pub json: bool,
}

#[derive(Args)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
