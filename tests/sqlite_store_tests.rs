use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use word_lessons::db::SqliteWordStore;
use word_lessons::store::{NewWord, StoreError, WordStore};
use word_lessons::{LessonService, SubmitResult};

mod common;

use common::{answer_correctly, new_words, rng, USER};

async fn open_store() -> (TempDir, SqliteWordStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteWordStore::open(&dir.path().join("nested").join("lessons.db"))
        .await
        .unwrap();
    (dir, store)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn fixed_today() -> NaiveDate {
    day(12)
}

#[tokio::test]
async fn test_add_word_and_load_pool() {
    let (_dir, store) = open_store().await;

    let card = store
        .add_word(
            USER,
            &NewWord {
                word: "  Serendipity ".to_string(),
                description: "a happy accident".to_string(),
                example: "It was pure serendipity.".to_string(),
                category: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(card.word, "Serendipity");
    assert_eq!(card.category, "unknown");
    assert_eq!(card.difficulty_rating, 0);

    let pool = store.load_pool(USER).await.unwrap();
    assert_eq!(pool, vec![card]);
    assert!(store.load_pool("someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_word_rejects_invalid_fields() {
    let (_dir, store) = open_store().await;

    let short_example = NewWord {
        word: "cat".to_string(),
        description: "an animal".to_string(),
        example: "cat".to_string(),
        category: None,
    };
    assert!(matches!(
        store.add_word(USER, &short_example).await,
        Err(StoreError::Validation(_))
    ));

    let long_word = NewWord {
        word: "x".repeat(136),
        ..short_example.clone()
    };
    assert!(matches!(
        store.add_word(USER, &long_word).await,
        Err(StoreError::Validation(_))
    ));

    assert!(store.load_pool(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_rating_missing_word() {
    let (_dir, store) = open_store().await;
    let card = store.add_word(USER, &new_words(1)[0]).await.unwrap();

    store.update_rating(card.id, -2).await.unwrap();
    assert_eq!(store.load_pool(USER).await.unwrap()[0].difficulty_rating, -2);

    assert!(matches!(
        store.update_rating(card.id + 1000, 1).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_daily_stats_accumulate_per_day() {
    let (_dir, store) = open_store().await;
    store.add_word(USER, &new_words(1)[0]).await.unwrap();

    store.upsert_daily_stat(USER, day(10), 12, 3, 15).await.unwrap();
    store.upsert_daily_stat(USER, day(10), 15, 0, 15).await.unwrap();
    store.upsert_daily_stat(USER, day(11), 1, 9, 15).await.unwrap();

    let stats = store.recent_daily_stats(USER, 7).await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].day, day(11));
    assert_eq!(stats[1].day, day(10));
    assert_eq!(
        (stats[1].first_try, stats[1].mistakes, stats[1].points),
        (27, 3, 30)
    );
}

#[tokio::test]
async fn test_streak_and_points() {
    let (_dir, store) = open_store().await;
    store.add_word(USER, &new_words(1)[0]).await.unwrap();

    store.bump_streak(USER, day(1)).await.unwrap();
    store.bump_streak(USER, day(2)).await.unwrap();
    store.bump_streak(USER, day(2)).await.unwrap();
    store.add_points(USER, 15).await.unwrap();
    store.add_points(USER, 15).await.unwrap();

    let profile = store.user_profile(USER).await.unwrap();
    assert_eq!(profile.streak, 1);
    assert_eq!(profile.last_use_date, Some(day(2)));
    assert_eq!(profile.points, 30);
    assert_eq!(profile.word_count, 1);

    // one day later only a lesson extends the streak
    store.check_streak(USER, day(3)).await.unwrap();
    assert_eq!(store.user_profile(USER).await.unwrap().streak, 1);

    store.check_streak(USER, day(5)).await.unwrap();
    let profile = store.user_profile(USER).await.unwrap();
    assert_eq!(profile.streak, 0);
    assert_eq!(profile.last_use_date, Some(day(5)));
}

#[tokio::test]
async fn test_unknown_user() {
    let (_dir, store) = open_store().await;
    assert!(matches!(
        store.user_profile("ghost").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.add_points("ghost", 1).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.bump_streak("ghost", day(1)).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reopen_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lessons.db");

    let store = SqliteWordStore::open(&path).await.unwrap();
    store.add_word(USER, &new_words(1)[0]).await.unwrap();
    store.close().await;

    let store = SqliteWordStore::open(&path).await.unwrap();
    assert_eq!(store.load_pool(USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_lesson_persists_results() {
    let (_dir, store) = open_store().await;
    for word in new_words(16) {
        store.add_word(USER, &word).await.unwrap();
    }
    let store = Arc::new(store);
    let service = LessonService::new(store.clone(), 15).with_today(fixed_today);

    service.start_session_with(USER, &mut rng(11)).await.unwrap();
    let lesson = service.lesson(USER).await.unwrap();

    let summary = loop {
        if let SubmitResult::SessionComplete { summary, .. } =
            answer_correctly(&service, USER).await
        {
            break summary;
        }
    };
    assert_eq!(summary.success_percent, 100);
    assert_eq!(summary.failed_writes, 0);

    let pool = store.load_pool(USER).await.unwrap();
    for task in lesson.tasks() {
        let main = task.main_card();
        let stored = pool.iter().find(|c| c.id == main.id).unwrap();
        assert_eq!(stored.difficulty_rating, -1);
    }
    assert_eq!(pool.iter().filter(|c| c.difficulty_rating == 0).count(), 1);

    let stats = service.statistics(USER).await.unwrap();
    assert_eq!(stats.profile.points, 15);
    assert_eq!(stats.profile.streak, 0);
    assert_eq!(stats.profile.last_use_date, Some(fixed_today()));
    assert_eq!(stats.series.first_try.last(), Some(&15));
    assert_eq!(stats.series.mistakes.last(), Some(&0));
}
