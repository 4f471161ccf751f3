use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::lesson::streak::StreakState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub points: i64,
    pub streak: i64,
    pub last_use_date: Option<NaiveDate>,
}

impl UserRow {
    pub fn streak_state(&self) -> StreakState {
        StreakState {
            streak: self.streak,
            last_use_date: self.last_use_date,
        }
    }
}

pub async fn ensure_user(pool: &SqlitePool, user_id: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    sqlx::query(r#"INSERT OR IGNORE INTO "users" ("id", "createdAt") VALUES (?, ?)"#)
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id", "points", "streak", "lastUseDate" FROM "users" WHERE "id" = ? LIMIT 1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| UserRow {
        id: row.try_get::<String, _>("id").unwrap_or_default(),
        points: row.try_get::<i64, _>("points").unwrap_or(0),
        streak: row.try_get::<i64, _>("streak").unwrap_or(0),
        last_use_date: row
            .try_get::<Option<NaiveDate>, _>("lastUseDate")
            .ok()
            .flatten(),
    }))
}

pub async fn add_user_points(pool: &SqlitePool, user_id: &str, points: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE "users" SET "points" = "points" + ? WHERE "id" = ?"#)
        .bind(points)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn set_user_streak(
    pool: &SqlitePool,
    user_id: &str,
    state: StreakState,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE "users" SET "streak" = ?, "lastUseDate" = ? WHERE "id" = ?"#)
        .bind(state.streak)
        .bind(state.last_use_date)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
