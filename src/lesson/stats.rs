use chrono::NaiveDate;
use serde::Serialize;

use crate::store::DailyStat;

pub const DEFAULT_SERIES_DAYS: usize = 7;

/// Daily totals laid out oldest to newest, with today in the last slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySeries {
    pub days: Vec<NaiveDate>,
    pub first_try: Vec<i64>,
    pub mistakes: Vec<i64>,
    pub points: Vec<i64>,
}

impl WeeklySeries {
    pub fn build(stats: &[DailyStat], today: NaiveDate, length: usize) -> Self {
        let mut series = Self {
            days: (0..length)
                .rev()
                .filter_map(|back| today.checked_sub_days(chrono::Days::new(back as u64)))
                .collect(),
            first_try: vec![0; length],
            mistakes: vec![0; length],
            points: vec![0; length],
        };

        for stat in stats {
            let age = today.signed_duration_since(stat.day).num_days();
            if age < 0 || age >= length as i64 {
                continue;
            }
            let slot = length - 1 - age as usize;
            series.first_try[slot] = stat.first_try;
            series.mistakes[slot] = stat.mistakes;
            series.points[slot] = stat.points;
        }

        series
    }
}
