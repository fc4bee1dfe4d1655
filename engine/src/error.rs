//! Simulation error type with a stable machine-readable reason.

use serde::Serialize;
use thiserror::Error;

/// Coarse failure classification, stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// The level declaration is inconsistent (ports, vectors, START marks).
    InvalidLevelFormat,
    /// The submission contradicts the level or itself.
    InvalidInput,
    /// The machine performed an illegal action while running.
    RuntimeError,
    /// An output check failed.
    WrongOutput,
    /// The cycle budget ran out before the last test vector finished.
    TooManyCycles,
}

/// A failed setup step or a fatal runtime event.
///
/// Cloneable because the board keeps the first fatal error for reporting
/// while also returning it to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    reason: ErrorReason,
}

impl Error {
    pub fn new(reason: ErrorReason, message: impl Into<String>) -> Error {
        Error {
            message: message.into(),
            reason,
        }
    }

    pub fn board_size_mismatch() -> Error {
        Error::new(ErrorReason::InvalidInput, "Board size mismatch")
    }

    pub fn invalid_input(message: impl Into<String>) -> Error {
        Error::new(ErrorReason::InvalidInput, message)
    }

    pub fn invalid_level(message: impl Into<String>) -> Error {
        Error::new(ErrorReason::InvalidLevelFormat, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Error {
        Error::new(ErrorReason::RuntimeError, message)
    }

    pub fn runtime(message: impl Into<String>) -> Error {
        Error::new(ErrorReason::RuntimeError, message)
    }

    pub fn wrong_output(message: impl Into<String>) -> Error {
        Error::new(ErrorReason::WrongOutput, message)
    }

    pub fn too_many_cycles(budget: usize) -> Error {
        Error::new(
            ErrorReason::TooManyCycles,
            format!("Did not complete within {budget} cycles"),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reason(&self) -> ErrorReason {
        self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorReason};

    #[test]
    fn reasons_and_messages() {
        let err = Error::too_many_cycles(999);
        assert_eq!(err.reason(), ErrorReason::TooManyCycles);
        assert_eq!(err.to_string(), "Did not complete within 999 cycles");

        let err = Error::wrong_output("Wrong output");
        assert_eq!(err.reason(), ErrorReason::WrongOutput);
        assert_eq!(err.message(), "Wrong output");
    }
}
