use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakMode {
    /// A lesson was completed today.
    Advance,
    /// Statistics were viewed; only breaks a lapsed streak.
    Check,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub streak: i64,
    pub last_use_date: Option<NaiveDate>,
}

/// Returns the new streak state, or `None` when nothing changes.
pub fn next_streak(state: StreakState, today: NaiveDate, mode: StreakMode) -> Option<StreakState> {
    let days = state
        .last_use_date
        .map(|last| today.signed_duration_since(last).num_days());

    match (days, mode) {
        (Some(0), _) => None,
        (Some(1), StreakMode::Check) => None,
        (Some(1), StreakMode::Advance) => Some(StreakState {
            streak: state.streak + 1,
            last_use_date: Some(today),
        }),
        _ => Some(StreakState {
            streak: 0,
            last_use_date: Some(today),
        }),
    }
}
