//! Error types for story sessions.

use thiserror::Error;

use crate::filter::Rejection;

/// Everything a session handler can fail with.
///
/// Only `Configuration` is fatal; every other variant is shown to the user
/// as a status message and the action can simply be retried.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("{0}")]
    Validation(#[from] Rejection),

    #[error("AI가 내용을 만들지 못했어요. 다시 시도해 주세요.")]
    EmptyGeneration,

    #[error("이야기 생성 중 문제가 발생했어요: {0}")]
    Service(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Step {0} does not exist")]
    StepOutOfRange(usize),

    #[error("Step {0} is written by the student")]
    NotGenerated(usize),

    #[error("Step {0} is written by the AI")]
    NotManual(usize),

    #[error("Step {0} is finished; unlock it first")]
    StepLocked(usize),

    #[error("아직 저장할 이야기가 없어요.")]
    NothingToExport,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::config::ConfigError> for StoryError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for story operations.
pub type Result<T> = std::result::Result<T, StoryError>;
