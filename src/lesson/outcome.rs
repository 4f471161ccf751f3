use std::sync::Arc;

use chrono::NaiveDate;

use crate::lesson::builder::LESSON_LEN;
use crate::lesson::types::{SessionSummary, WordOutcome};
use crate::store::WordStore;

pub const DEFAULT_LESSON_POINTS: i64 = 15;

/// Summary statistics without any side effects.
pub fn summarize(outcomes: &[WordOutcome]) -> SessionSummary {
    let first_try_count = outcomes.iter().filter(|o| o.attempts == 1).count() as u32;
    let total_mistakes = outcomes.iter().map(|o| o.mistakes).sum();
    SessionSummary {
        success_percent: first_try_count * 100 / LESSON_LEN as u32,
        first_try_count,
        total_mistakes,
        failed_writes: 0,
    }
}

/// Folds a completed lesson back into the store.
///
/// Writes are issued one by one and never rolled back; a failed write is
/// logged, counted in the summary, and the remaining writes still run.
#[derive(Clone)]
pub struct OutcomeAggregator {
    store: Arc<dyn WordStore>,
    points: i64,
}

impl OutcomeAggregator {
    pub fn new(store: Arc<dyn WordStore>, points: i64) -> Self {
        Self { store, points }
    }

    pub async fn finalize(
        &self,
        user_id: &str,
        outcomes: &[WordOutcome],
        today: NaiveDate,
    ) -> SessionSummary {
        let mut summary = summarize(outcomes);
        let mut failed = 0usize;

        for outcome in outcomes {
            if let Err(err) = self
                .store
                .update_rating(outcome.card_id, outcome.final_rating)
                .await
            {
                failed += 1;
                tracing::warn!(
                    user_id,
                    card_id = outcome.card_id,
                    rating = outcome.final_rating,
                    error = %err,
                    "failed to update word rating"
                );
            }
        }

        if let Err(err) = self
            .store
            .upsert_daily_stat(
                user_id,
                today,
                i64::from(summary.first_try_count),
                i64::from(summary.total_mistakes),
                self.points,
            )
            .await
        {
            failed += 1;
            tracing::warn!(user_id, %today, error = %err, "failed to upsert daily stat");
        }

        if let Err(err) = self.store.add_points(user_id, self.points).await {
            failed += 1;
            tracing::warn!(user_id, points = self.points, error = %err, "failed to add points");
        }

        if let Err(err) = self.store.bump_streak(user_id, today).await {
            failed += 1;
            tracing::warn!(user_id, %today, error = %err, "failed to update streak");
        }

        summary.failed_writes = failed;
        tracing::info!(
            user_id,
            success_percent = summary.success_percent,
            first_try = summary.first_try_count,
            mistakes = summary.total_mistakes,
            failed_writes = failed,
            "lesson results saved"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::types::{CardId, WordCard};
    use crate::store::{MemoryWordStore, StoreWrite};

    fn outcome(card_id: CardId, attempts: u32, original: i64) -> WordOutcome {
        let mistakes = attempts - 1;
        WordOutcome {
            card_id,
            attempts,
            mistakes,
            final_rating: original + mistakes as i64 - 1,
        }
    }

    fn cards() -> Vec<WordCard> {
        (0..15)
            .map(|id| WordCard {
                id,
                word: format!("w{id}"),
                description: "d".to_string(),
                example: "example".to_string(),
                category: WordCard::UNKNOWN_CATEGORY.to_string(),
                difficulty_rating: 2,
            })
            .collect()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_summary_perfect_lesson() {
        let outcomes: Vec<_> = (0..15).map(|id| outcome(id, 1, 0)).collect();
        let summary = summarize(&outcomes);
        assert_eq!(summary.success_percent, 100);
        assert_eq!(summary.first_try_count, 15);
        assert_eq!(summary.total_mistakes, 0);
    }

    #[test]
    fn test_summary_floors_percent() {
        let outcomes: Vec<_> = (0..15)
            .map(|id| outcome(id, if id < 7 { 1 } else { 3 }, 0))
            .collect();
        let summary = summarize(&outcomes);
        // 7 / 15 = 46.67%
        assert_eq!(summary.success_percent, 46);
        assert_eq!(summary.first_try_count, 7);
        assert_eq!(summary.total_mistakes, 16);
    }

    #[tokio::test]
    async fn test_finalize_writes_everything() {
        let store = Arc::new(MemoryWordStore::with_cards("u", cards()));
        let aggregator = OutcomeAggregator::new(store.clone(), DEFAULT_LESSON_POINTS);
        let outcomes: Vec<_> = (0..15).map(|id| outcome(id, 1, 2)).collect();

        let summary = aggregator.finalize("u", &outcomes, day()).await;
        assert_eq!(summary.failed_writes, 0);

        let writes = store.writes();
        let ratings: Vec<_> = writes
            .iter()
            .filter_map(|w| match w {
                StoreWrite::Rating { rating, .. } => Some(*rating),
                _ => None,
            })
            .collect();
        assert_eq!(ratings, vec![1; 15]);
        assert!(writes.contains(&StoreWrite::DailyStat {
            user_id: "u".to_string(),
            day: day(),
            first_try: 15,
            mistakes: 0,
            points: 15,
        }));
        assert!(writes.contains(&StoreWrite::Points {
            user_id: "u".to_string(),
            points: 15,
        }));
    }

    #[tokio::test]
    async fn test_failed_rating_write_does_not_stop_others() {
        let store = Arc::new(MemoryWordStore::with_cards("u", cards()));
        store.fail_rating_for(3);
        let aggregator = OutcomeAggregator::new(store.clone(), 20);
        let outcomes: Vec<_> = (0..15).map(|id| outcome(id, 3, 2)).collect();

        let summary = aggregator.finalize("u", &outcomes, day()).await;
        assert_eq!(summary.failed_writes, 1);
        assert_eq!(summary.success_percent, 0);

        let ratings = store
            .writes()
            .iter()
            .filter(|w| matches!(w, StoreWrite::Rating { .. }))
            .count();
        assert_eq!(ratings, 14);
        assert_eq!(store.card(3).unwrap().difficulty_rating, 2);
        assert_eq!(store.card(4).unwrap().difficulty_rating, 3);
        assert!(store.writes().contains(&StoreWrite::Points {
            user_id: "u".to_string(),
            points: 20,
        }));
    }

    #[tokio::test]
    async fn test_user_write_failures_are_counted() {
        let store = Arc::new(MemoryWordStore::with_cards("u", cards()));
        store.fail_user_writes("u");
        let aggregator = OutcomeAggregator::new(store.clone(), DEFAULT_LESSON_POINTS);
        let outcomes: Vec<_> = (0..15).map(|id| outcome(id, 1, 2)).collect();

        let summary = aggregator.finalize("u", &outcomes, day()).await;
        assert_eq!(summary.failed_writes, 3);
        assert_eq!(summary.first_try_count, 15);
    }
}
