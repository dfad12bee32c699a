//! `geckoenv doctor` command

use std::path::Path;

use anyhow::Result;

use crate::cli::DoctorArgs;
use geckoenv::ops::{doctor, format_report, DoctorOptions};
use geckoenv::util::shell::Status;
use geckoenv::util::Shell;

pub fn execute(args: DoctorArgs, config_path: Option<&Path>, shell: &Shell) -> Result<()> {
    let config = super::load(config_path, &args.inputs, shell)?;
    let verbose = shell.is_verbose();

    shell.status(Status::Checking, "toolchain and release");
    let report = doctor(
        &config,
        &DoctorOptions {
            query_versions: verbose,
        },
    );

    print!("{}", format_report(&report, verbose));

    if !report.all_required_passed() {
        shell.status(
            Status::Failed,
            format!("{} required check(s)", report.required_failed_count()),
        );
        std::process::exit(1);
    }

    shell.status(
        Status::Passed,
        format!("{} check(s) in {:.1?}", report.passed_count(), report.total_duration),
    );
    Ok(())
}
