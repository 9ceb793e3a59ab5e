use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use treasury_core::{EntityId, LedgerError, LedgerResult, PeriodId};

/// Accounting-period lifecycle.
///
/// `closing` is a grace state for finalization work: postings still land.
/// `locked` rejects every posting dated inside the period, reversals and
/// adjustments included. The chain is one-directional; `locked → open`
/// exists only behind the engine's explicit reopen configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Open,
    Closing,
    Locked,
}

impl PeriodStatus {
    pub fn is_postable(self) -> bool {
        !matches!(self, PeriodStatus::Locked)
    }

    /// Forward transitions only. `open → locked` is accepted as the
    /// administrative shortcut of passing through `closing` instantly.
    pub fn can_transition(self, next: PeriodStatus) -> bool {
        matches!(
            (self, next),
            (PeriodStatus::Open, PeriodStatus::Closing)
                | (PeriodStatus::Open, PeriodStatus::Locked)
                | (PeriodStatus::Closing, PeriodStatus::Locked)
        )
    }
}

/// Who locked a period, when, and why. Kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStamp {
    pub locked_at: DateTime<Utc>,
    pub locked_by: String,
    pub reason: String,
}

/// One accounting period of one entity. Absent period records are treated
/// as `open` throughout the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub entity_id: EntityId,
    pub year: i32,
    pub month: u32,
    pub status: PeriodStatus,
    pub lock: Option<LockStamp>,
    /// Day of the *following* month on or after which the period is due
    /// for automatic locking. `None` disables auto-lock.
    pub auto_lock_day: Option<u32>,
}

impl Period {
    pub fn open(entity_id: EntityId, year: i32, month: u32) -> Self {
        Self {
            id: PeriodId::new(),
            entity_id,
            year,
            month,
            status: PeriodStatus::Open,
            lock: None,
            auto_lock_day: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// First and last day of a calendar period.
    pub fn bounds(year: i32, month: u32) -> LedgerResult<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            LedgerError::validation(format!("invalid accounting period {year}-{month:02}"))
        })?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next_first| next_first.pred_opt())
            .ok_or_else(|| {
                LedgerError::validation(format!("accounting period {year}-{month:02} out of range"))
            })?;
        Ok((first, last))
    }

    /// Whether the configured auto-lock day has been reached as of `today`.
    ///
    /// The due date is `auto_lock_day` of the month after the period;
    /// days past that month's end spill into the next one.
    pub fn auto_lock_due(&self, today: NaiveDate) -> bool {
        if self.status == PeriodStatus::Locked {
            return false;
        }
        let Some(day) = self.auto_lock_day else {
            return false;
        };
        let Ok((first, _)) = Self::bounds(self.year, self.month) else {
            return false;
        };
        let due = first
            .checked_add_months(Months::new(1))
            .and_then(|next_first| {
                next_first.checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
            });
        match due {
            Some(due) => today >= due,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn transitions_follow_the_chain() {
        assert!(PeriodStatus::Open.can_transition(PeriodStatus::Closing));
        assert!(PeriodStatus::Open.can_transition(PeriodStatus::Locked));
        assert!(PeriodStatus::Closing.can_transition(PeriodStatus::Locked));

        assert!(!PeriodStatus::Closing.can_transition(PeriodStatus::Open));
        assert!(!PeriodStatus::Locked.can_transition(PeriodStatus::Open));
        assert!(!PeriodStatus::Locked.can_transition(PeriodStatus::Closing));
    }

    #[test]
    fn closing_is_still_postable() {
        assert!(PeriodStatus::Open.is_postable());
        assert!(PeriodStatus::Closing.is_postable());
        assert!(!PeriodStatus::Locked.is_postable());
    }

    #[test]
    fn bounds_handle_month_lengths() {
        assert_eq!(
            Period::bounds(2026, 2).unwrap(),
            (date(2026, 2, 1), date(2026, 2, 28))
        );
        assert_eq!(
            Period::bounds(2024, 2).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            Period::bounds(2026, 12).unwrap(),
            (date(2026, 12, 1), date(2026, 12, 31))
        );
        assert!(Period::bounds(2026, 13).is_err());
    }

    #[test]
    fn contains_matches_year_and_month() {
        let period = Period::open(EntityId::new(), 2026, 3);
        assert!(period.contains(date(2026, 3, 15)));
        assert!(!period.contains(date(2026, 4, 1)));
        assert!(!period.contains(date(2025, 3, 15)));
    }

    #[test]
    fn auto_lock_due_on_configured_day_of_next_month() {
        let mut period = Period::open(EntityId::new(), 2026, 3);
        period.auto_lock_day = Some(10);

        assert!(!period.auto_lock_due(date(2026, 3, 31)));
        assert!(!period.auto_lock_due(date(2026, 4, 9)));
        assert!(period.auto_lock_due(date(2026, 4, 10)));
        assert!(period.auto_lock_due(date(2026, 5, 1)));
    }

    #[test]
    fn auto_lock_never_fires_without_configuration_or_after_lock() {
        let mut period = Period::open(EntityId::new(), 2026, 3);
        assert!(!period.auto_lock_due(date(2027, 1, 1)));

        period.auto_lock_day = Some(1);
        period.status = PeriodStatus::Locked;
        assert!(!period.auto_lock_due(date(2027, 1, 1)));
    }
}
