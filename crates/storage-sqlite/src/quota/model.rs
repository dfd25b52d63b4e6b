//! Database model for quota rows.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date};
use stockpulse_core::quota::QuotaState;

#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::api_quota)]
#[diesel(primary_key(service))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuotaRowDB {
    pub service: String,
    pub daily_limit: i32,
    pub hourly_limit: Option<i32>,
    pub daily_used: i32,
    pub hourly_used: i32,
    pub last_reset_date: String,
    pub last_reset_hour: i32,
    pub updated_at: String,
}

impl QuotaRowDB {
    pub fn from_state(state: &QuotaState, updated_at: String) -> Self {
        Self {
            service: state.service.clone(),
            daily_limit: state.daily_limit,
            hourly_limit: state.hourly_limit,
            daily_used: state.daily_used,
            hourly_used: state.hourly_used,
            last_reset_date: format_date(state.last_reset_date),
            last_reset_hour: state.last_reset_hour,
            updated_at,
        }
    }
}

impl TryFrom<QuotaRowDB> for QuotaState {
    type Error = StorageError;

    fn try_from(db: QuotaRowDB) -> Result<Self, Self::Error> {
        Ok(Self {
            service: db.service,
            daily_limit: db.daily_limit,
            hourly_limit: db.hourly_limit,
            daily_used: db.daily_used,
            hourly_used: db.hourly_used,
            last_reset_date: parse_date(&db.last_reset_date)?,
            last_reset_hour: db.last_reset_hour,
        })
    }
}
