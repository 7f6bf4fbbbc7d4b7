//! Turns errors into what the user sees. Nothing here is fatal: every error
//! ends as a notice at the screen boundary.

use crate::error::{AppError, ErrorKind};
use crate::logging::AppLogger;

pub const GENERIC_FAILURE: &str = "The operation failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Shown next to the input that caused it
    Inline,
    /// Distinct cue for refused actions, such as deleting a built-in
    Warning,
    /// Generic failure; details go to the log only
    Failure,
    /// Nothing shown (the user backed out)
    Quiet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(error: &AppError) -> Self {
        let kind = error.kind();
        let (level, message) = match kind {
            ErrorKind::Validation
            | ErrorKind::Duplicate
            | ErrorKind::LimitExceeded
            | ErrorKind::PermissionDenied => (NoticeLevel::Inline, error.user_message()),
            ErrorKind::ProtectedEntity => (NoticeLevel::Warning, error.user_message()),
            ErrorKind::Storage | ErrorKind::Playback | ErrorKind::Config => {
                (NoticeLevel::Failure, GENERIC_FAILURE.to_string())
            }
            ErrorKind::Cancelled => (NoticeLevel::Quiet, String::new()),
        };

        Self { level, kind, message }
    }

    pub fn is_visible(&self) -> bool {
        self.level != NoticeLevel::Quiet
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            NoticeLevel::Warning => write!(f, "(!) {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Logs an error at its severity and produces the notice for it
#[derive(Clone)]
pub struct NoticeReporter {
    logger: AppLogger,
}

impl NoticeReporter {
    pub fn new(logger: AppLogger) -> Self {
        Self { logger }
    }

    pub fn report(&self, operation: &str, error: &AppError) -> Notice {
        let notice = Notice::from_error(error);
        log::log!(
            error.severity().log_level(),
            "{} failed [{}]: {}",
            operation,
            error.kind().as_str(),
            error
        );

        if notice.level == NoticeLevel::Failure {
            self.logger.log_operation_failed(operation, error);
        }
        notice
    }
}
