//! High-level operations.
//!
//! This module contains the implementation of geckoenv commands.

pub mod doctor;
pub mod generate;

pub use doctor::{doctor, format_report, CheckResult, DoctorOptions, DoctorReport};
pub use generate::{
    composition_digest, generate, is_up_to_date, GenerateOptions, GenerateReport, OutputState,
};
