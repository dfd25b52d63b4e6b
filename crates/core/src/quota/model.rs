use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuotaError;

/// Persisted quota counters for one external service.
///
/// `daily_used <= daily_limit` is enforced by the ledger, not by storage. A
/// row with `daily_used > daily_limit` means two writers raced past the gate
/// and is reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    pub service: String,
    pub daily_limit: i32,
    pub hourly_limit: Option<i32>,
    pub daily_used: i32,
    pub hourly_used: i32,
    pub last_reset_date: NaiveDate,
    /// Hour of day (0-23, UTC) of the last hourly reset.
    pub last_reset_hour: i32,
}

impl QuotaState {
    /// A fresh ledger row stamped with `now`.
    pub fn new(
        service: impl Into<String>,
        daily_limit: i32,
        hourly_limit: Option<i32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            service: service.into(),
            daily_limit,
            hourly_limit,
            daily_used: 0,
            hourly_used: 0,
            last_reset_date: now.date_naive(),
            last_reset_hour: now.hour() as i32,
        }
    }

    /// The state after applying date and hour rollover at `now`, or `None`
    /// when nothing needs resetting.
    ///
    /// Markers only move forward. A clock that jumps backwards never resets.
    pub fn rolled_over(&self, now: DateTime<Utc>) -> Option<QuotaState> {
        let today = now.date_naive();
        let hour = now.hour() as i32;

        if today > self.last_reset_date {
            return Some(QuotaState {
                daily_used: 0,
                hourly_used: 0,
                last_reset_date: today,
                last_reset_hour: hour,
                ..self.clone()
            });
        }

        if today == self.last_reset_date && hour > self.last_reset_hour {
            return Some(QuotaState {
                hourly_used: 0,
                last_reset_hour: hour,
                ..self.clone()
            });
        }

        None
    }

    pub fn remaining(&self) -> i32 {
        (self.daily_limit - self.daily_used).max(0)
    }

    pub fn hourly_remaining(&self) -> Option<i32> {
        self.hourly_limit.map(|limit| (limit - self.hourly_used).max(0))
    }

    /// Calls that may still be made right now, honouring both windows.
    pub fn available(&self) -> i32 {
        match self.hourly_remaining() {
            Some(hourly) => self.remaining().min(hourly),
            None => self.remaining(),
        }
    }

    /// Checks whether one more call is allowed.
    pub fn permits(&self) -> Result<(), QuotaError> {
        if self.daily_used >= self.daily_limit {
            return Err(QuotaError::Exhausted {
                used: self.daily_used,
                limit: self.daily_limit,
            });
        }
        if let Some(limit) = self.hourly_limit {
            if self.hourly_used >= limit {
                return Err(QuotaError::HourlyExhausted {
                    used: self.hourly_used,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// The state after one more call.
    pub fn consumed(&self) -> QuotaState {
        QuotaState {
            daily_used: self.daily_used.saturating_add(1),
            hourly_used: self.hourly_used.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn is_over_committed(&self) -> bool {
        self.daily_used > self.daily_limit
            || self
                .hourly_limit
                .is_some_and(|limit| self.hourly_used > limit)
    }
}

/// Read-only quota view for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub service: String,
    pub used: i32,
    pub limit: i32,
    pub remaining: i32,
    pub hourly_used: i32,
    pub hourly_limit: Option<i32>,
    pub hourly_remaining: Option<i32>,
    pub last_reset_date: NaiveDate,
    pub can_proceed: bool,
    /// False when the value comes from the last successful read because the
    /// store could not be reached.
    pub fresh: bool,
}

impl QuotaStatus {
    pub fn from_state(state: &QuotaState, fresh: bool) -> Self {
        Self {
            service: state.service.clone(),
            used: state.daily_used,
            limit: state.daily_limit,
            remaining: state.remaining(),
            hourly_used: state.hourly_used,
            hourly_limit: state.hourly_limit,
            hourly_remaining: state.hourly_remaining(),
            last_reset_date: state.last_reset_date,
            can_proceed: fresh && state.permits().is_ok(),
            fresh,
        }
    }
}
