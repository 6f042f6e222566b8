use chrono::{DateTime, Datelike, Utc};

/// Source of "now" for the seasonal rule.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar month, zero-based (January = 0), taken in UTC.
    /// Near a month boundary this can differ from the collector's local month
    /// (e.g. 20:00 UTC on 31 October is already November in India).
    fn current_month0(&self) -> u32 {
        self.now().month0()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midday on the 15th of the given month (1-12) of `year`.
    /// Falls back to January when `month` is out of range.
    pub fn in_month(year: i32, month: u32) -> Self {
        use chrono::TimeZone;

        let month = if (1..=12).contains(&month) { month } else { 1 };
        let instant = Utc
            .with_ymd_and_hms(year, month, 15, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
