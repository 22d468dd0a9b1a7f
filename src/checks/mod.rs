// src/checks/mod.rs

//! Informational static-analysis tasks.
//!
//! Each check hands a file-set to an external checker command and turns its
//! output into a filtered report. Checks are read-only: they never write
//! build artifacts and never fail the orchestrator; a finding is a report
//! entry, not an error.

pub mod exec;
pub mod report;

pub use exec::run_check;
pub use report::{Report, SuppressionList, filter_lines};
