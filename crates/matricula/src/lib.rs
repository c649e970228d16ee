//! Core library for the student enrollment portal: the enrollment stage
//! machine, the shared submission review workflow, the audit ledger, and the
//! notification dispatcher, plus the configuration and telemetry plumbing the
//! API service builds on.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
