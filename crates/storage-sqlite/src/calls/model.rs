use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Text};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_date, parse_timestamp};
use stockpulse_core::calls::{CallRecord, CallStats};

/// Database model for one provider call.
#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::api_calls)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CallRecordDB {
    pub id: String,
    pub service: String,
    pub endpoint: String,
    pub params: String,
    pub http_status: Option<i32>,
    pub response_snippet: Option<String>,
    pub error: Option<String>,
    pub latency_ms: i64,
    pub created_at: String,
}

impl From<&CallRecord> for CallRecordDB {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: record.id.clone(),
            service: record.service.clone(),
            endpoint: record.endpoint.clone(),
            params: record.params.clone(),
            http_status: record.http_status,
            response_snippet: record.response_snippet.clone(),
            error: record.error.clone(),
            latency_ms: record.latency_ms,
            created_at: format_timestamp(record.created_at),
        }
    }
}

impl TryFrom<CallRecordDB> for CallRecord {
    type Error = StorageError;

    fn try_from(db: CallRecordDB) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&db.created_at)?,
            id: db.id,
            service: db.service,
            endpoint: db.endpoint,
            params: db.params,
            http_status: db.http_status,
            response_snippet: db.response_snippet,
            error: db.error,
            latency_ms: db.latency_ms,
        })
    }
}

/// One row of the per-day aggregate query.
#[derive(QueryableByName, Debug)]
pub struct CallStatsRow {
    #[diesel(sql_type = Text)]
    pub day: String,
    #[diesel(sql_type = Text)]
    pub endpoint: String,
    #[diesel(sql_type = BigInt)]
    pub total: i64,
    #[diesel(sql_type = BigInt)]
    pub successful: i64,
    #[diesel(sql_type = Double)]
    pub avg_latency_ms: f64,
}

impl TryFrom<CallStatsRow> for CallStats {
    type Error = StorageError;

    fn try_from(row: CallStatsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            day: parse_date(&row.day)?,
            endpoint: row.endpoint,
            total: row.total,
            successful: row.successful,
            failed: row.total - row.successful,
            avg_latency_ms: row.avg_latency_ms,
        })
    }
}
