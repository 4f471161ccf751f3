use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::error::LessonError;
use crate::lesson::builder::LessonBuilder;
use crate::lesson::types::{
    normalize, Lesson, OptionKey, PromptMode, Task, TaskView, WordCard, WordOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    AwaitingTaskRequest,
    AwaitingAnswer,
    AwaitingNextMove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStep {
    Task(TaskView),
    /// Every task was answered; carries the outcomes in lesson order.
    Complete(Vec<WordOutcome>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Retry { chosen: OptionKey, attempts: u32 },
    Advanced { outcome: WordOutcome },
}

/// One user's pass through a built lesson.
///
/// The lesson is fixed at construction. State only changes after an answer
/// has been resolved to an option, so rejected input never counts as an attempt.
#[derive(Debug, Clone)]
pub struct LessonSession {
    user_id: String,
    lesson: Lesson,
    phase: SessionPhase,
    task_index: usize,
    current: Option<WordOutcome>,
    outcomes: Vec<WordOutcome>,
}

impl LessonSession {
    pub fn new(user_id: impl Into<String>, lesson: Lesson) -> Self {
        Self {
            user_id: user_id.into(),
            outcomes: Vec::with_capacity(lesson.len()),
            lesson,
            phase: SessionPhase::AwaitingTaskRequest,
            task_index: 0,
            current: None,
        }
    }

    pub fn start<R: Rng + ?Sized>(
        user_id: impl Into<String>,
        pool: &[WordCard],
        rng: &mut R,
    ) -> Result<Self, LessonError> {
        let lesson = LessonBuilder::build(pool, rng)?;
        Ok(Self::new(user_id, lesson))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn task_index(&self) -> usize {
        self.task_index
    }

    pub fn current_outcome(&self) -> Option<&WordOutcome> {
        self.current.as_ref()
    }

    pub fn outcomes(&self) -> &[WordOutcome] {
        &self.outcomes
    }

    pub fn is_exhausted(&self) -> bool {
        self.task_index >= self.lesson.len()
    }

    pub fn issue_task(&mut self) -> Result<TaskStep, LessonError> {
        match self.phase {
            SessionPhase::AwaitingNextMove => return Err(LessonError::SessionFinished),
            SessionPhase::AwaitingAnswer => {
                return self.view().map(TaskStep::Task).ok_or(LessonError::NoPendingTask);
            }
            SessionPhase::AwaitingTaskRequest => {}
        }

        if self.is_exhausted() {
            self.phase = SessionPhase::AwaitingNextMove;
            tracing::info!(user_id = %self.user_id, "lesson complete");
            return Ok(TaskStep::Complete(self.outcomes.clone()));
        }

        let Some(task) = self.lesson.task(self.task_index) else {
            return Err(LessonError::NoPendingTask);
        };
        let main = task.main_card();
        if self.current.is_none() {
            self.current = Some(WordOutcome {
                card_id: main.id,
                attempts: 0,
                mistakes: 0,
                final_rating: main.difficulty_rating,
            });
        }

        self.phase = SessionPhase::AwaitingAnswer;
        self.view().map(TaskStep::Task).ok_or(LessonError::NoPendingTask)
    }

    /// Renders the active task; `None` unless an answer is awaited.
    pub fn view(&self) -> Option<TaskView> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return None;
        }
        let task = self.lesson.task(self.task_index)?;
        let mode = PromptMode::for_index(self.task_index);
        let main = task.main_card();

        let options: BTreeMap<OptionKey, String> = task
            .options()
            .map(|(key, option)| {
                let text = match mode {
                    PromptMode::ChooseDescription => option.card.description.clone(),
                    PromptMode::ChooseWord => option.card.word.clone(),
                };
                (key, text)
            })
            .collect();

        let (word, description, example) = match mode {
            PromptMode::ChooseDescription => {
                (Some(main.word.clone()), None, Some(main.example.clone()))
            }
            PromptMode::ChooseWord => (None, Some(main.description.clone()), None),
        };

        Some(TaskView {
            number: self.task_index,
            total: self.lesson.len(),
            mode,
            word,
            description,
            example,
            options,
            attempts: self.current.map(|c| c.attempts).unwrap_or(0),
        })
    }

    pub fn submit_answer(&mut self, raw: &str) -> Result<AnswerOutcome, LessonError> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Err(match self.phase {
                SessionPhase::AwaitingNextMove => LessonError::SessionFinished,
                _ => LessonError::NoPendingTask,
            });
        }
        let task = self
            .lesson
            .task(self.task_index)
            .ok_or(LessonError::NoPendingTask)?;
        let key = resolve_answer(task, PromptMode::for_index(self.task_index), raw)
            .ok_or_else(|| LessonError::InvalidInput(raw.trim().to_string()))?;
        let is_correct = task.option(key).is_correct;
        let main = task.main_card();

        let current = self.current.get_or_insert(WordOutcome {
            card_id: main.id,
            attempts: 0,
            mistakes: 0,
            final_rating: main.difficulty_rating,
        });
        current.attempts += 1;
        self.phase = SessionPhase::AwaitingTaskRequest;

        if is_correct {
            current.final_rating -= 1;
            let outcome = *current;
            self.current = None;
            self.outcomes.push(outcome);
            self.task_index += 1;
            tracing::debug!(
                user_id = %self.user_id,
                task = self.task_index,
                attempts = outcome.attempts,
                "task solved"
            );
            Ok(AnswerOutcome::Advanced { outcome })
        } else {
            current.mistakes += 1;
            current.final_rating += 1;
            Ok(AnswerOutcome::Retry {
                chosen: key,
                attempts: current.attempts,
            })
        }
    }
}

/// Maps raw input to an option position.
///
/// Letters and digits always work; the literal word text is accepted only when
/// the task asks the user to pick a word.
pub fn resolve_answer(task: &Task, mode: PromptMode, raw: &str) -> Option<OptionKey> {
    let input = normalize(raw);
    if input.is_empty() {
        return None;
    }
    if let Some(key) = OptionKey::parse(&input) {
        return Some(key);
    }
    if mode != PromptMode::ChooseWord {
        return None;
    }
    task.options()
        .find(|(_, option)| option.card.normalized_word() == input)
        .map(|(key, _)| key)
}
