pub mod operations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::lesson::streak::{next_streak, StreakMode};
use crate::lesson::types::{CardId, WordCard};
use crate::store::{DailyStat, NewWord, StoreError, UserProfile, WordStore};

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("word-lessons")
        .join("data.db")
}

/// `WordStore` backed by a local SQLite file.
#[derive(Clone)]
pub struct SqliteWordStore {
    pool: SqlitePool,
}

impl SqliteWordStore {
    pub async fn open(db_path: &Path) -> Result<Self, DbInitError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DbInitError::Io(e.to_string()))?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| DbInitError::Config(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!(path = %db_path.display(), "word store opened");
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DbInitError> {
        schema::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn add_word(&self, user_id: &str, new_word: &NewWord) -> Result<WordCard, StoreError> {
        new_word.validate()?;
        let card = operations::insert_word(&self.pool, user_id, new_word).await?;
        tracing::debug!(user_id, word_id = card.id, "word added");
        Ok(card)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn apply_streak(
        &self,
        user_id: &str,
        today: NaiveDate,
        mode: StreakMode,
    ) -> Result<(), StoreError> {
        let user = operations::get_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        if let Some(next) = next_streak(user.streak_state(), today, mode) {
            operations::set_user_streak(&self.pool, user_id, next).await?;
            tracing::debug!(user_id, streak = next.streak, ?mode, "streak updated");
        }
        Ok(())
    }
}

#[async_trait]
impl WordStore for SqliteWordStore {
    async fn load_pool(&self, user_id: &str) -> Result<Vec<WordCard>, StoreError> {
        Ok(operations::list_user_words(&self.pool, user_id).await?)
    }

    async fn update_rating(&self, card_id: CardId, new_rating: i64) -> Result<(), StoreError> {
        let touched = operations::update_word_rating(&self.pool, card_id, new_rating).await?;
        if touched == 0 {
            return Err(StoreError::NotFound(format!("word {card_id}")));
        }
        Ok(())
    }

    async fn upsert_daily_stat(
        &self,
        user_id: &str,
        day: NaiveDate,
        first_try: i64,
        mistakes: i64,
        points: i64,
    ) -> Result<(), StoreError> {
        operations::upsert_daily_stat(&self.pool, user_id, day, first_try, mistakes, points).await?;
        Ok(())
    }

    async fn bump_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError> {
        self.apply_streak(user_id, today, StreakMode::Advance).await
    }

    async fn check_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError> {
        self.apply_streak(user_id, today, StreakMode::Check).await
    }

    async fn add_points(&self, user_id: &str, points: i64) -> Result<(), StoreError> {
        let touched = operations::add_user_points(&self.pool, user_id, points).await?;
        if touched == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        let user = operations::get_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        let word_count = operations::count_user_words(&self.pool, user_id).await?;

        Ok(UserProfile {
            user_id: user.id,
            points: user.points,
            streak: user.streak,
            last_use_date: user.last_use_date,
            word_count,
        })
    }

    async fn recent_daily_stats(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyStat>, StoreError> {
        Ok(operations::list_recent_daily_stats(&self.pool, user_id, limit).await?)
    }
}
