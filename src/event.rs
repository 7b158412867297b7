use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct EventInfo {
    pub name: String,
    pub slug: String,
    pub starts_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Countdown {
    pub days: u32,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Countdown {
    /// Time left until `starts_at`, all zero once the race has started.
    pub fn until(starts_at: &DateTime<FixedOffset>, now: &DateTime<Utc>) -> Self {
        let remaining = starts_at.with_timezone(&Utc) - *now;
        let total = remaining.num_seconds();
        if total <= 0 {
            return Self::default();
        }
        let total = total as u64;
        Self {
            days: (total / 86_400) as u32,
            hours: ((total % 86_400) / 3_600) as u8,
            minutes: ((total % 3_600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }
}
