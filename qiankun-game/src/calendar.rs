//! The in-game calendar, anchored to February 2nd, 993.
//!
//! One tick is one in-game day, so the calendar advances a day per tick
//! interval of real time. The world's start timestamp is persisted next to
//! the player file so the date survives restarts.
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::{self, StoreError};

fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(993, 2, 2).expect("calendar anchor is a valid date")
}

/// In-game calendar rooted at the world's first real-time second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCalendar {
    pub start_timestamp: u64,
}

impl GameCalendar {
    #[must_use]
    pub const fn new(start_timestamp: u64) -> Self {
        Self { start_timestamp }
    }

    /// Whole in-game days elapsed since the world opened.
    #[must_use]
    pub fn days_since_start(&self, timestamp: u64, tick_interval_secs: u64) -> u64 {
        timestamp.saturating_sub(self.start_timestamp) / tick_interval_secs.max(1)
    }

    /// Calendar date for a real-time instant.
    #[must_use]
    pub fn date_for_timestamp(&self, timestamp: u64, tick_interval_secs: u64) -> NaiveDate {
        let days = self.days_since_start(timestamp, tick_interval_secs);
        anchor_date()
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Date rendered the way the world announces it: "February 2nd, 993".
    #[must_use]
    pub fn format_date(&self, timestamp: u64, tick_interval_secs: u64) -> String {
        let date = self.date_for_timestamp(timestamp, tick_interval_secs);
        format!(
            "{} {}, {}",
            date.format("%B"),
            ordinal(date.day()),
            date.year()
        )
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{day}{suffix}")
}

/// Persists the world's start timestamp: `<data_dir>/calendar.json`.
#[derive(Debug)]
pub struct CalendarStore {
    path: PathBuf,
}

impl CalendarStore {
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("calendar.json"),
        }
    }

    /// Load the persisted calendar, or open the world at `now` and persist
    /// that instant.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing calendar file is unreadable or
    /// malformed, or a fresh one cannot be written.
    pub fn load_or_create(&self, now: u64) -> Result<GameCalendar, StoreError> {
        if self.path.exists() {
            let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
            let calendar = serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
            return Ok(calendar);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let calendar = GameCalendar::new(now);
        let body = serde_json::to_string_pretty(&calendar).map_err(|err| StoreError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(err),
        })?;
        store::write_atomic(&self.path, &body)?;
        Ok(calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INTERVAL: u64 = 60;

    #[test]
    fn world_opens_on_the_anchor_date() {
        let calendar = GameCalendar::new(5_000);
        assert_eq!(calendar.format_date(5_000, INTERVAL), "February 2nd, 993");
        // sub-interval time has not reached the next day yet
        assert_eq!(calendar.days_since_start(5_059, INTERVAL), 0);
    }

    #[test]
    fn one_tick_interval_advances_one_day() {
        let calendar = GameCalendar::new(0);
        assert_eq!(calendar.format_date(INTERVAL, INTERVAL), "February 3rd, 993");
        // 993 is not a leap year: 27 days after Feb 2nd is March 1st
        assert_eq!(calendar.format_date(27 * INTERVAL, INTERVAL), "March 1st, 993");
    }

    #[test]
    fn ordinals_cover_the_teens() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn start_timestamp_survives_restarts() {
        let dir = TempDir::new().unwrap();
        let store = CalendarStore::new(dir.path());
        let first = store.load_or_create(9_000).unwrap();
        let second = store.load_or_create(77_777).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.start_timestamp, 9_000);
    }

    #[test]
    fn corrupt_calendar_file_is_surfaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calendar.json"), "oops").unwrap();
        let err = CalendarStore::new(dir.path()).load_or_create(0).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
