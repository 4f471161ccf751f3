//! Adaptive lesson engine: lesson construction, the per-user session state
//! machine, and the aggregation of finished lessons.

pub mod builder;
pub mod outcome;
pub mod session;
pub mod stats;
pub mod streak;
pub mod types;

pub use builder::{LessonBuilder, HARD_COUNT, LESSON_LEN, OPTIONS_PER_TASK};
pub use outcome::{summarize, OutcomeAggregator, DEFAULT_LESSON_POINTS};
pub use session::{resolve_answer, AnswerOutcome, LessonSession, SessionPhase, TaskStep};
pub use stats::WeeklySeries;
pub use streak::{next_streak, StreakMode, StreakState};
pub use types::{
    normalize, AnswerOption, CardId, Lesson, OptionKey, PromptMode, SessionSummary, Task,
    TaskView, WordCard, WordOutcome,
};
