use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::QuotaRowDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::api_quota::dsl as quota_dsl;
use crate::utils::{format_date, format_timestamp};
use stockpulse_core::quota::{QuotaState, QuotaStore};
use stockpulse_core::Result;

pub struct QuotaRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl QuotaRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_row(conn: &mut SqliteConnection, service: &str) -> Result<Option<QuotaState>> {
    let row = quota_dsl::api_quota
        .find(service)
        .select(QuotaRowDB::as_select())
        .first::<QuotaRowDB>(conn)
        .optional()
        .into_core()?;
    match row {
        Some(row) => Ok(Some(QuotaState::try_from(row)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl QuotaStore for QuotaRepository {
    async fn load(&self, service: &str) -> Result<Option<QuotaState>> {
        let mut conn = get_connection(&self.pool)?;
        load_row(&mut conn, service)
    }

    async fn ensure(&self, initial: &QuotaState, now: DateTime<Utc>) -> Result<QuotaState> {
        let now = format_timestamp(now);
        let row = QuotaRowDB::from_state(initial, now.clone());
        let service = initial.service.clone();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<QuotaState> {
                diesel::insert_or_ignore_into(quota_dsl::api_quota)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                diesel::update(quota_dsl::api_quota.find(&service))
                    .set((
                        quota_dsl::daily_limit.eq(row.daily_limit),
                        quota_dsl::hourly_limit.eq(row.hourly_limit),
                        quota_dsl::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                load_row(conn, &service)?.ok_or_else(|| {
                    StorageError::SerializationError(format!("quota row {} vanished", service))
                        .into()
                })
            })
            .await
    }

    async fn compare_and_swap(
        &self,
        expected: &QuotaState,
        next: &QuotaState,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let service = expected.service.clone();
        let expected_used = expected.daily_used;
        let expected_hourly = expected.hourly_used;
        let expected_date = format_date(expected.last_reset_date);
        let expected_hour = expected.last_reset_hour;
        let next = QuotaRowDB::from_state(next, format_timestamp(now));

        let swapped = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::update(
                    quota_dsl::api_quota
                        .filter(quota_dsl::service.eq(&service))
                        .filter(quota_dsl::daily_used.eq(expected_used))
                        .filter(quota_dsl::hourly_used.eq(expected_hourly))
                        .filter(quota_dsl::last_reset_date.eq(&expected_date))
                        .filter(quota_dsl::last_reset_hour.eq(expected_hour)),
                )
                .set((
                    quota_dsl::daily_used.eq(next.daily_used),
                    quota_dsl::hourly_used.eq(next.hourly_used),
                    quota_dsl::last_reset_date.eq(&next.last_reset_date),
                    quota_dsl::last_reset_hour.eq(next.last_reset_hour),
                    quota_dsl::updated_at.eq(&next.updated_at),
                ))
                .execute(conn)
                .into_core()
            })
            .await?;

        if swapped == 0 {
            debug!("Quota swap for {} found a changed row", expected.service);
        }
        Ok(swapped == 1)
    }
}
