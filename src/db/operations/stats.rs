use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::db::operations::users::ensure_user;
use crate::store::DailyStat;

pub async fn upsert_daily_stat(
    pool: &SqlitePool,
    user_id: &str,
    day: NaiveDate,
    first_try: i64,
    mistakes: i64,
    points: i64,
) -> Result<(), sqlx::Error> {
    ensure_user(pool, user_id).await?;

    sqlx::query(
        r#"
        INSERT INTO "daily_stats" ("userId", "day", "firstTry", "mistakes", "points")
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT ("userId", "day") DO UPDATE SET
          "firstTry" = "firstTry" + excluded."firstTry",
          "mistakes" = "mistakes" + excluded."mistakes",
          "points" = "points" + excluded."points"
        "#,
    )
    .bind(user_id)
    .bind(day)
    .bind(first_try)
    .bind(mistakes)
    .bind(points)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_recent_daily_stats(
    pool: &SqlitePool,
    user_id: &str,
    limit: usize,
) -> Result<Vec<DailyStat>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "day", "firstTry", "mistakes", "points"
        FROM "daily_stats"
        WHERE "userId" = ?
        ORDER BY "day" DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let Ok(day) = row.try_get::<NaiveDate, _>("day") else {
            tracing::warn!(user_id, "skipping daily stat with unreadable day");
            continue;
        };
        out.push(DailyStat {
            day,
            first_try: row.try_get::<i64, _>("firstTry").unwrap_or(0),
            mistakes: row.try_get::<i64, _>("mistakes").unwrap_or(0),
            points: row.try_get::<i64, _>("points").unwrap_or(0),
        });
    }
    Ok(out)
}
