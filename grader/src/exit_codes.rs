//! Stable exit codes for grader CLI commands.

/// The submission passed every test case.
pub const OK: i32 = 0;
/// The submission ran but failed: wrong output, a runtime fault, or an
/// exhausted cycle budget.
pub const FAILED: i32 = 1;
/// The level or submission file could not be parsed or validated.
pub const MALFORMED: i32 = 2;
