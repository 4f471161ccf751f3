use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::lesson::streak::{next_streak, StreakMode, StreakState};
use crate::lesson::types::{CardId, WordCard};
use crate::store::{DailyStat, StoreError, UserProfile, WordStore};

/// One successful write, recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Rating {
        card_id: CardId,
        rating: i64,
    },
    DailyStat {
        user_id: String,
        day: NaiveDate,
        first_try: i64,
        mistakes: i64,
        points: i64,
    },
    Streak {
        user_id: String,
        streak: i64,
        last_use_date: Option<NaiveDate>,
    },
    Points {
        user_id: String,
        points: i64,
    },
}

#[derive(Debug, Default)]
struct UserRecord {
    cards: Vec<WordCard>,
    points: i64,
    streak: StreakState,
    daily: BTreeMap<NaiveDate, DailyStat>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    writes: Vec<StoreWrite>,
    failing_cards: HashSet<CardId>,
    failing_users: HashSet<String>,
}

/// Process-local `WordStore` that keeps a journal of every applied write.
#[derive(Debug, Default)]
pub struct MemoryWordStore {
    state: Mutex<MemoryState>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(user_id: &str, cards: Vec<WordCard>) -> Self {
        let store = Self::new();
        store.insert_cards(user_id, cards);
        store
    }

    pub fn insert_cards(&self, user_id: &str, cards: Vec<WordCard>) {
        let mut state = self.state.lock();
        state
            .users
            .entry(user_id.to_string())
            .or_default()
            .cards
            .extend(cards);
    }

    pub fn set_streak(&self, user_id: &str, streak: i64, last_use_date: Option<NaiveDate>) {
        let mut state = self.state.lock();
        state.users.entry(user_id.to_string()).or_default().streak = StreakState {
            streak,
            last_use_date,
        };
    }

    /// Makes every later rating write for `card_id` fail.
    pub fn fail_rating_for(&self, card_id: CardId) {
        self.state.lock().failing_cards.insert(card_id);
    }

    /// Makes every later per-user write (stats, points, streak) fail.
    pub fn fail_user_writes(&self, user_id: &str) {
        self.state.lock().failing_users.insert(user_id.to_string());
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.state.lock().writes.clone()
    }

    pub fn card(&self, card_id: CardId) -> Option<WordCard> {
        let state = self.state.lock();
        state
            .users
            .values()
            .flat_map(|user| user.cards.iter())
            .find(|card| card.id == card_id)
            .cloned()
    }

    fn user_guard(state: &MemoryState, user_id: &str) -> Result<(), StoreError> {
        if state.failing_users.contains(user_id) {
            return Err(StoreError::Unavailable(format!("writes for {user_id} disabled")));
        }
        Ok(())
    }

    fn apply_streak(&self, user_id: &str, today: NaiveDate, mode: StreakMode) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::user_guard(&state, user_id)?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        if let Some(next) = next_streak(user.streak, today, mode) {
            user.streak = next;
            state.writes.push(StoreWrite::Streak {
                user_id: user_id.to_string(),
                streak: next.streak,
                last_use_date: next.last_use_date,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WordStore for MemoryWordStore {
    async fn load_pool(&self, user_id: &str) -> Result<Vec<WordCard>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .users
            .get(user_id)
            .map(|user| user.cards.clone())
            .unwrap_or_default())
    }

    async fn update_rating(&self, card_id: CardId, new_rating: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.failing_cards.contains(&card_id) {
            return Err(StoreError::Unavailable(format!("rating write for word {card_id}")));
        }
        let card = state
            .users
            .values_mut()
            .flat_map(|user| user.cards.iter_mut())
            .find(|card| card.id == card_id)
            .ok_or_else(|| StoreError::NotFound(format!("word {card_id}")))?;
        card.difficulty_rating = new_rating;
        state.writes.push(StoreWrite::Rating {
            card_id,
            rating: new_rating,
        });
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
        let mut state = self.state.lock();
        Self::user_guard(&state, user_id)?;
        let row = state
            .users
            .entry(user_id.to_string())
            .or_default()
            .daily
            .entry(day)
            .or_insert(DailyStat {
                day,
                first_try: 0,
                mistakes: 0,
                points: 0,
            });
        row.first_try += first_try;
        row.mistakes += mistakes;
        row.points += points;
        state.writes.push(StoreWrite::DailyStat {
            user_id: user_id.to_string(),
            day,
            first_try,
            mistakes,
            points,
        });
        Ok(())
    }

    async fn bump_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError> {
        self.apply_streak(user_id, today, StreakMode::Advance)
    }

    async fn check_streak(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError> {
        self.apply_streak(user_id, today, StreakMode::Check)
    }

    async fn add_points(&self, user_id: &str, points: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::user_guard(&state, user_id)?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        user.points += points;
        state.writes.push(StoreWrite::Points {
            user_id: user_id.to_string(),
            points,
        });
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        let state = self.state.lock();
        let user = state
            .users
            .get(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        Ok(UserProfile {
            user_id: user_id.to_string(),
            points: user.points,
            streak: user.streak.streak,
            last_use_date: user.streak.last_use_date,
            word_count: user.cards.len() as i64,
        })
    }

    async fn recent_daily_stats(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DailyStat>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .users
            .get(user_id)
            .map(|user| user.daily.values().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }
}
