//! Storage seam for the lesson engine.
//!
//! The engine reads a user's pool once per lesson and writes results back only
//! when a lesson completes. Every write is independent; a failed write must not
//! undo or block the others.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lesson::types::{CardId, WordCard};

pub use memory::{MemoryWordStore, StoreWrite};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub day: NaiveDate,
    pub first_try: i64,
    pub mistakes: i64,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub points: i64,
    pub streak: i64,
    pub last_use_date: Option<NaiveDate>,
    pub word_count: i64,
}

/// A word submitted together with its example sentence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub word: String,
    pub description: String,
    pub example: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewWord {
    pub fn validate(&self) -> Result<(), StoreError> {
        crate::lesson::types::validate_fields(&self.word, &self.description, &self.example)
    }

    pub fn category_or_unknown(&self) -> String {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(WordCard::UNKNOWN_CATEGORY)
            .to_string()
    }
}

#[async_trait]
pub trait WordStore: Send + Sync {
    async fn load_pool(&self, user_id: &str) -> Result<Vec<WordCard>, StoreError>;

    async fn update_rating(&self, card_id: CardId, new_rating: i64) -> Result<(), StoreError>;

    /// Adds to today's totals, creating the row on first use.
    async fn upsert_daily_stat(
        &self,
        user_id: &str,
        day: NaiveDate,
        first_try: i64,
        mistakes: i64,
        points: i64,
    ) -> Result<(), StoreError>;

    /// Streak update after a completed lesson.
    async fn bump_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError>;

    /// Streak update when statistics are viewed.
    async fn check_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError>;

    async fn add_points(&self, user_id: &str, points: i64) -> Result<(), StoreError>;

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, StoreError>;

    /// Newest first.
    async fn recent_daily_stats(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyStat>, StoreError>;
}
