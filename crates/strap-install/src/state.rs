use std::error::Error as _;

use strap_archive::ExtractReport;

use crate::error::{FailureReason, InstallError};

/// Phases of one install attempt.
///
/// `Idle -> Cleaning -> Extracting -> Promoting -> Done`. Any phase may move
/// to `Failed`, which ends the attempt. `Idle -> Done` is the already
/// installed short-circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Cleaning,
    Extracting,
    Promoting,
    Done,
    Failed,
}

impl InstallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor.
    pub fn can_enter(self, next: InstallState) -> bool {
        use InstallState::*;
        matches!(
            (self, next),
            (Idle, Cleaning)
                | (Idle, Done)
                | (Cleaning, Extracting)
                | (Extracting, Promoting)
                | (Promoting, Done)
                | (Idle | Cleaning | Extracting | Promoting, Failed)
        )
    }
}

/// What a successful attempt did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallReport {
    /// `None` when the live root was already complete and nothing was written.
    pub extracted: Option<ExtractReport>,
    pub states: Vec<InstallState>,
}

impl InstallReport {
    pub fn installed(&self) -> bool {
        self.extracted.is_some()
    }
}

#[derive(Debug)]
pub struct InstallFailure {
    pub reason: FailureReason,
    pub recoverable: bool,
    pub error: InstallError,
    pub states: Vec<InstallState>,
}

impl InstallFailure {
    pub fn new(error: InstallError, states: Vec<InstallState>) -> Self {
        Self {
            reason: error.reason(),
            recoverable: error.is_recoverable(),
            error,
            states,
        }
    }

    /// Single-line message with the full cause chain.
    pub fn message(&self) -> String {
        let mut message = format!("bootstrap {} failed: {}", self.reason, self.error);
        let mut source = self.error.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

impl std::fmt::Display for InstallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug)]
pub enum InstallOutcome {
    Success(InstallReport),
    Failure(InstallFailure),
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn states(&self) -> &[InstallState] {
        match self {
            Self::Success(report) => &report.states,
            Self::Failure(failure) => &failure.states,
        }
    }
}
