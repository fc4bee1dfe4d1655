//! Grading pipeline for puzzle submissions.
//!
//! The grader loads a level file and a submission file, builds a validated
//! [`engine::Board`], runs it to completion, and renders a verdict. The
//! split mirrors the file formats:
//!
//! - **[`loader`]**: Text parsing into a board. All format errors surface
//!   here, before any cycle runs.
//! - **[`check`]**: Orchestration of load, validate, run, and verdict.
//! - **[`report`]**: The serializable verdict handed to the CLI.

pub mod check;
pub mod exit_codes;
pub mod loader;
pub mod logging;
pub mod report;
