use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::error::LessonError;
use crate::lesson::outcome::OutcomeAggregator;
use crate::lesson::session::{AnswerOutcome, LessonSession, SessionPhase, TaskStep};
use crate::lesson::stats::{WeeklySeries, DEFAULT_SERIES_DAYS};
use crate::lesson::types::{Lesson, OptionKey, SessionSummary, TaskView, WordOutcome};
use crate::store::{UserProfile, WordStore};

pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStarted {
    pub total_tasks: usize,
    pub pool_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub phase: SessionPhase,
    pub task_index: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum SubmitResult {
    Retry {
        chosen: OptionKey,
        attempts: u32,
    },
    Advanced {
        outcome: WordOutcome,
    },
    SessionComplete {
        outcome: WordOutcome,
        summary: SessionSummary,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsView {
    pub profile: UserProfile,
    pub series: WeeklySeries,
}

type SessionHandle = Arc<Mutex<LessonSession>>;

/// Entry point for transports: holds at most one lesson per user.
///
/// Calls for the same user serialise on that user's session lock; different
/// users never contend beyond the brief map lookup.
pub struct LessonService {
    store: Arc<dyn WordStore>,
    aggregator: OutcomeAggregator,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    today: fn() -> NaiveDate,
}

impl LessonService {
    pub fn new(store: Arc<dyn WordStore>, points: i64) -> Self {
        Self {
            aggregator: OutcomeAggregator::new(Arc::clone(&store), points),
            store,
            sessions: RwLock::new(HashMap::new()),
            today: local_today,
        }
    }

    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn start_session(&self, user_id: &str) -> Result<LessonStarted, LessonError> {
        let mut rng = StdRng::from_os_rng();
        self.start_session_with(user_id, &mut rng).await
    }

    /// Same as [`start_session`](Self::start_session) with a caller-provided RNG.
    pub async fn start_session_with<R: Rng + ?Sized + Send>(
        &self,
        user_id: &str,
        rng: &mut R,
    ) -> Result<LessonStarted, LessonError> {
        let pool = self.store.load_pool(user_id).await?;
        let session = match LessonSession::start(user_id, &pool, rng) {
            Ok(session) => session,
            Err(err) => {
                tracing::info!(user_id, pool_size = pool.len(), error = %err, "lesson not started");
                return Err(err);
            }
        };

        let started = LessonStarted {
            total_tasks: session.lesson().len(),
            pool_size: pool.len(),
        };

        let previous = self
            .sessions
            .write()
            .await
            .insert(user_id.to_string(), Arc::new(Mutex::new(session)));
        if previous.is_some() {
            tracing::info!(user_id, "previous lesson discarded");
        }
        tracing::info!(user_id, pool_size = started.pool_size, "lesson started");
        Ok(started)
    }

    /// Builds a fresh lesson from the current pool, typically after completion.
    pub async fn restart_session(&self, user_id: &str) -> Result<LessonStarted, LessonError> {
        tracing::debug!(user_id, "lesson restart requested");
        self.start_session(user_id).await
    }

    pub async fn cancel_session(&self, user_id: &str) {
        let removed = self.sessions.write().await.remove(user_id);
        if let Some(handle) = removed {
            let session = handle.lock().await;
            tracing::info!(
                user_id,
                solved = session.task_index(),
                "lesson cancelled, progress discarded"
            );
        }
    }

    pub async fn has_session(&self, user_id: &str) -> bool {
        self.sessions.read().await.contains_key(user_id)
    }

    pub async fn progress(&self, user_id: &str) -> Result<SessionProgress, LessonError> {
        let handle = self.session(user_id).await?;
        let session = handle.lock().await;
        Ok(SessionProgress {
            phase: session.phase(),
            task_index: session.task_index(),
            total_tasks: session.lesson().len(),
        })
    }

    /// The full lesson, including which options are correct.
    pub async fn lesson(&self, user_id: &str) -> Result<Lesson, LessonError> {
        let handle = self.session(user_id).await?;
        let session = handle.lock().await;
        Ok(session.lesson().clone())
    }

    pub async fn current_task_view(&self, user_id: &str) -> Result<TaskView, LessonError> {
        let handle = self.session(user_id).await?;
        let mut session = handle.lock().await;
        match session.issue_task()? {
            TaskStep::Task(view) => Ok(view),
            TaskStep::Complete(outcomes) => {
                self.finish(user_id, &outcomes).await;
                Err(LessonError::SessionFinished)
            }
        }
    }

    pub async fn submit_answer(&self, user_id: &str, raw: &str) -> Result<SubmitResult, LessonError> {
        let handle = self.session(user_id).await?;
        let mut session = handle.lock().await;

        if session.phase() == SessionPhase::AwaitingTaskRequest {
            if let TaskStep::Complete(outcomes) = session.issue_task()? {
                self.finish(user_id, &outcomes).await;
                return Err(LessonError::SessionFinished);
            }
        }

        match session.submit_answer(raw)? {
            AnswerOutcome::Retry { chosen, attempts } => Ok(SubmitResult::Retry { chosen, attempts }),
            AnswerOutcome::Advanced { outcome } => {
                if !session.is_exhausted() {
                    return Ok(SubmitResult::Advanced { outcome });
                }
                match session.issue_task()? {
                    TaskStep::Complete(outcomes) => {
                        let summary = self.finish(user_id, &outcomes).await;
                        Ok(SubmitResult::SessionComplete { outcome, summary })
                    }
                    TaskStep::Task(_) => Ok(SubmitResult::Advanced { outcome }),
                }
            }
        }
    }

    /// Profile plus the seven-day series; also lets a lapsed streak expire.
    pub async fn statistics(&self, user_id: &str) -> Result<StatisticsView, LessonError> {
        let today = (self.today)();
        if let Err(err) = self.store.check_streak(user_id, today).await {
            tracing::warn!(user_id, error = %err, "failed to check streak");
        }
        let profile = self.store.user_profile(user_id).await?;
        let stats = self
            .store
            .recent_daily_stats(user_id, DEFAULT_SERIES_DAYS)
            .await?;
        Ok(StatisticsView {
            profile,
            series: WeeklySeries::build(&stats, today, DEFAULT_SERIES_DAYS),
        })
    }

    async fn finish(&self, user_id: &str, outcomes: &[WordOutcome]) -> SessionSummary {
        self.aggregator
            .finalize(user_id, outcomes, (self.today)())
            .await
    }

    async fn session(&self, user_id: &str) -> Result<SessionHandle, LessonError> {
        self.sessions
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| LessonError::NoActiveSession(user_id.to_string()))
    }
}
