use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::db::operations::users::ensure_user;
use crate::lesson::types::{CardId, WordCard};
use crate::store::NewWord;

pub async fn list_user_words(pool: &SqlitePool, user_id: &str) -> Result<Vec<WordCard>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
          w."id", w."word", w."description", e."example", w."category", w."rating"
        FROM "words" w
        JOIN "examples" e ON e."id" = w."exampleId"
        WHERE e."userId" = ?
        ORDER BY w."id" ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_word_row).collect())
}

pub async fn count_user_words(pool: &SqlitePool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM "words" w
        JOIN "examples" e ON e."id" = w."exampleId"
        WHERE e."userId" = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Returns the number of rows touched; zero means the word does not exist.
pub async fn update_word_rating(
    pool: &SqlitePool,
    word_id: CardId,
    rating: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE "words" SET "rating" = ? WHERE "id" = ?"#)
        .bind(rating)
        .bind(word_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_word(
    pool: &SqlitePool,
    user_id: &str,
    new_word: &NewWord,
) -> Result<WordCard, sqlx::Error> {
    ensure_user(pool, user_id).await?;

    let example_id = sqlx::query(r#"INSERT INTO "examples" ("userId", "example") VALUES (?, ?)"#)
        .bind(user_id)
        .bind(new_word.example.trim())
        .execute(pool)
        .await?
        .last_insert_rowid();

    let category = new_word.category_or_unknown();
    let word_id = sqlx::query(
        r#"
        INSERT INTO "words" ("exampleId", "word", "description", "category", "rating")
        VALUES (?, ?, ?, ?, 0)
        "#,
    )
    .bind(example_id)
    .bind(new_word.word.trim())
    .bind(new_word.description.trim())
    .bind(&category)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(WordCard {
        id: word_id,
        word: new_word.word.trim().to_string(),
        description: new_word.description.trim().to_string(),
        example: new_word.example.trim().to_string(),
        category,
        difficulty_rating: 0,
    })
}

fn map_word_row(row: &SqliteRow) -> WordCard {
    WordCard {
        id: row.try_get::<i64, _>("id").unwrap_or_default(),
        word: row.try_get::<String, _>("word").unwrap_or_default(),
        description: row.try_get::<String, _>("description").unwrap_or_default(),
        example: row.try_get::<String, _>("example").unwrap_or_default(),
        category: row
            .try_get::<String, _>("category")
            .unwrap_or_else(|_| WordCard::UNKNOWN_CATEGORY.to_string()),
        difficulty_rating: row.try_get::<i64, _>("rating").unwrap_or(0),
    }
}
