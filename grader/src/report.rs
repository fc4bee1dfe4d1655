//! The grading verdict.

use engine::{Board, Color, ErrorReason, Status};
use serde::Serialize;

/// Outcome of one graded run, serializable for `--json` output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub passed: bool,
    pub cycles: usize,
    pub status: Status,
    pub last_color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<ErrorReason>,
}

impl Report {
    pub fn from_board(passed: bool, board: &Board) -> Report {
        Report {
            passed,
            cycles: board.cycle(),
            status: board.status(),
            last_color: board.last_color(),
            error: board.error().map(|e| e.message().to_string()),
            error_reason: board.error_reason(),
        }
    }

    /// One-line human rendering, for the default (non-JSON) output.
    pub fn human(&self) -> String {
        if self.passed {
            format!("passed in {} cycles", self.cycles)
        } else if let Some(error) = &self.error {
            format!("failed after {} cycles: {}", self.cycles, error)
        } else {
            format!("failed after {} cycles", self.cycles)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Report;
    use engine::{Color, Status};

    fn report(passed: bool, error: Option<&str>) -> Report {
        Report {
            passed,
            cycles: 7,
            status: if passed { Status::Done } else { Status::Invalid },
            last_color: Color::Black,
            error: error.map(String::from),
            error_reason: None,
        }
    }

    #[test]
    fn human_lines() {
        assert_eq!(report(true, None).human(), "passed in 7 cycles");
        assert_eq!(
            report(false, Some("Wrong output")).human(),
            "failed after 7 cycles: Wrong output"
        );
    }

    #[test]
    fn json_omits_absent_errors() {
        let json = serde_json::to_string(&report(true, None)).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"passed\":true"));
    }
}
