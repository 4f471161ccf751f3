use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error("at least 15 words are needed to start a lesson, found {0}")]
    InsufficientWords(usize),
    #[error("answer {0:?} does not match any option")]
    InvalidInput(String),
    #[error("no active lesson for user {0}")]
    NoActiveSession(String),
    #[error("no task is waiting for an answer")]
    NoPendingTask,
    #[error("lesson already finished")]
    SessionFinished,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LessonError {
    /// Errors the caller shows to the user and recovers from by prompting again.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            LessonError::InsufficientWords(_)
                | LessonError::InvalidInput(_)
                | LessonError::NoActiveSession(_)
                | LessonError::SessionFinished
        )
    }
}
