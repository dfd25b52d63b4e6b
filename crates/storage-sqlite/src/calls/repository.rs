use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::{CallRecordDB, CallStatsRow};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::api_calls::dsl as calls_dsl;
use crate::utils::format_timestamp;
use stockpulse_core::calls::{CallLogStore, CallRecord, CallStats};
use stockpulse_core::Result;

const DAILY_STATS_SQL: &str = "
    SELECT substr(created_at, 1, 10) AS day,
           endpoint,
           COUNT(*) AS total,
           SUM(CASE WHEN error IS NULL THEN 1 ELSE 0 END) AS successful,
           CAST(AVG(latency_ms) AS REAL) AS avg_latency_ms
    FROM api_calls
    WHERE created_at >= ?
    GROUP BY day, endpoint
    ORDER BY day DESC, endpoint
";

pub struct CallLogRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CallLogRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CallLogStore for CallLogRepository {
    async fn append(&self, record: &CallRecord) -> Result<()> {
        let row = CallRecordDB::from(record);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(calls_dsl::api_calls)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = format_timestamp(cutoff);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(calls_dsl::api_calls.filter(calls_dsl::created_at.lt(cutoff)))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn recent(&self, limit: i64) -> Result<Vec<CallRecord>> {
        let mut conn = get_connection(&self.pool)?;
        calls_dsl::api_calls
            .order(calls_dsl::created_at.desc())
            .limit(limit)
            .select(CallRecordDB::as_select())
            .load::<CallRecordDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(|row| CallRecord::try_from(row).map_err(Into::into))
            .collect()
    }

    fn daily_stats(&self, since: DateTime<Utc>) -> Result<Vec<CallStats>> {
        let mut conn = get_connection(&self.pool)?;
        sql_query(DAILY_STATS_SQL)
            .bind::<Text, _>(format_timestamp(since))
            .load::<CallStatsRow>(&mut conn)
            .into_core()?
            .into_iter()
            .map(|row| CallStats::try_from(row).map_err(Into::into))
            .collect()
    }
}
