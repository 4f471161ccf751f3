use std::path::PathBuf;

use crate::db::default_db_path;
use crate::lesson::outcome::DEFAULT_LESSON_POINTS;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: PathBuf,
    pub lesson_points: i64,
    pub user_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let db_path = std::env::var("WORD_LESSONS_DB")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let lesson_points = std::env::var("LESSON_POINTS")
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|points| *points >= 0)
            .unwrap_or(DEFAULT_LESSON_POINTS);

        let user_id = std::env::var("WORD_LESSONS_USER")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "local".to_string());

        Self {
            log_level,
            db_path,
            lesson_points,
            user_id,
        }
    }
}
