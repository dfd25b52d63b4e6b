use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel::upsert::excluded;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use stockpulse_market_data::DailyBar;

use super::model::HistoryPointDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::daily_history::dsl as history_dsl;
use crate::schema::tracked_entities::dsl as entities_dsl;
use crate::utils::{chunk_for_sqlite, format_timestamp};
use stockpulse_core::errors::{DatabaseError, Error};
use stockpulse_core::history::{Completeness, HistoryPoint, HistoryStore, WriteOutcome};
use stockpulse_core::Result;

pub struct HistoryRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl HistoryRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn count_points(conn: &mut SqliteConnection, symbol: &str) -> Result<i64> {
    history_dsl::daily_history
        .filter(history_dsl::symbol.eq(symbol))
        .count()
        .get_result(conn)
        .into_core()
}

#[async_trait]
impl HistoryStore for HistoryRepository {
    async fn save_series(
        &self,
        symbol: &str,
        bars: &[DailyBar],
        min_points: i64,
        synced_at: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let now = format_timestamp(synced_at);
        let symbol = symbol.to_string();
        let rows: Vec<HistoryPointDB> = bars
            .iter()
            .map(|bar| HistoryPointDB::from_bar(&symbol, bar, &now))
            .collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<WriteOutcome> {
                let dates: Vec<String> = rows.iter().map(|r| r.date.clone()).collect();
                let mut existing: HashSet<String> = HashSet::new();
                for chunk in chunk_for_sqlite(&dates) {
                    existing.extend(
                        history_dsl::daily_history
                            .filter(history_dsl::symbol.eq(&symbol))
                            .filter(history_dsl::date.eq_any(chunk))
                            .select(history_dsl::date)
                            .load::<String>(conn)
                            .map_err(StorageError::from)?,
                    );
                }

                let mut outcome = WriteOutcome::default();
                for row in &rows {
                    diesel::insert_into(history_dsl::daily_history)
                        .values(row)
                        .on_conflict((history_dsl::symbol, history_dsl::date))
                        .do_update()
                        .set((
                            history_dsl::open.eq(excluded(history_dsl::open)),
                            history_dsl::high.eq(excluded(history_dsl::high)),
                            history_dsl::low.eq(excluded(history_dsl::low)),
                            history_dsl::close.eq(excluded(history_dsl::close)),
                            history_dsl::adjusted_close.eq(excluded(history_dsl::adjusted_close)),
                            history_dsl::volume.eq(excluded(history_dsl::volume)),
                            history_dsl::updated_at.eq(excluded(history_dsl::updated_at)),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if existing.contains(&row.date) {
                        outcome.updated += 1;
                    } else {
                        outcome.inserted += 1;
                    }
                }

                let history_count = count_points(conn, &symbol)?;
                let completeness = Completeness::evaluate(history_count, min_points);
                let touched = diesel::update(entities_dsl::tracked_entities.find(&symbol))
                    .set((
                        entities_dsl::has_sufficient_data.eq(completeness.has_sufficient_data),
                        entities_dsl::data_quality_score.eq(completeness.data_quality_score),
                        entities_dsl::last_data_sync.eq(Some(&now)),
                        entities_dsl::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if touched == 0 {
                    // Rolls back the upserts above.
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "tracked entity {}",
                        symbol
                    ))));
                }

                debug!(
                    "Saved {} rows for {} ({} stored)",
                    rows.len(),
                    symbol,
                    history_count
                );
                outcome.history_count = history_count;
                outcome.has_sufficient_data = completeness.has_sufficient_data;
                Ok(outcome)
            })
            .await
    }

    fn count(&self, symbol: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        count_points(&mut conn, symbol)
    }

    fn recent(&self, symbol: &str, limit: i64) -> Result<Vec<HistoryPoint>> {
        let mut conn = get_connection(&self.pool)?;
        history_dsl::daily_history
            .filter(history_dsl::symbol.eq(symbol))
            .order(history_dsl::date.desc())
            .limit(limit)
            .select(HistoryPointDB::as_select())
            .load::<HistoryPointDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(|row| HistoryPoint::try_from(row).map_err(Into::into))
            .collect()
    }
}
