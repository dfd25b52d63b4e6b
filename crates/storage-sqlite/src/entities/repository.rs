use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use log::info;
use std::sync::Arc;

use super::model::{EntityStatsRow, NewEntityDB, PriceRow, TrackedEntityDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::tracked_entities::dsl as entities_dsl;
use crate::utils::format_timestamp;
use stockpulse_core::entities::{EntityStats, EntityStore, NewEntity, TrackedEntity};
use stockpulse_core::market::{MarketViewStore, PriceWindow};
use stockpulse_core::Result;

const ACTIVE_STATS_SQL: &str = "
    SELECT e.*,
           COUNT(h.date) AS history_count,
           MAX(h.date) AS latest_date
    FROM tracked_entities e
    LEFT JOIN daily_history h ON h.symbol = e.symbol
    WHERE e.is_active = 1
    GROUP BY e.symbol
    ORDER BY e.symbol
";

const PRICE_WINDOWS_SQL: &str = "
    SELECT symbol, date, close, volume FROM (
        SELECT h.symbol, h.date, h.close, h.volume,
               ROW_NUMBER() OVER (PARTITION BY h.symbol ORDER BY h.date DESC) AS rn
        FROM daily_history h
        JOIN tracked_entities e ON e.symbol = h.symbol
        WHERE e.is_active = 1
    )
    WHERE rn <= 2
    ORDER BY symbol, date DESC
";

const PRICE_WINDOW_SQL: &str = "
    SELECT symbol, date, close, volume
    FROM daily_history
    WHERE symbol = ?
    ORDER BY date DESC
    LIMIT 2
";

pub struct EntityRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl EntityRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Folds rows ordered by (symbol, date desc) into windows.
fn fold_windows(rows: Vec<PriceRow>) -> Result<Vec<PriceWindow>> {
    let mut windows: Vec<PriceWindow> = Vec::new();
    for row in rows {
        let point = row.to_point()?;
        match windows.last_mut() {
            Some(window) if window.symbol == row.symbol => {
                if window.previous.is_none() {
                    window.previous = Some(point);
                }
            }
            _ => windows.push(PriceWindow {
                symbol: row.symbol,
                latest: point,
                previous: None,
            }),
        }
    }
    Ok(windows)
}

#[async_trait]
impl EntityStore for EntityRepository {
    async fn seed(&self, entities: &[NewEntity]) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        let now = format_timestamp(Utc::now());
        let rows: Vec<NewEntityDB> = entities
            .iter()
            .map(|e| NewEntityDB::from_domain(e, &now))
            .collect();

        let inserted = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut inserted = 0;
                for row in &rows {
                    inserted += diesel::insert_or_ignore_into(entities_dsl::tracked_entities)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(inserted)
            })
            .await?;

        if inserted > 0 {
            info!("Seeded {} new tracked entities", inserted);
        }
        Ok(inserted)
    }

    async fn deactivate(&self, symbol: &str) -> Result<bool> {
        let symbol = symbol.trim().to_uppercase();
        let now = format_timestamp(Utc::now());
        let updated = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::update(entities_dsl::tracked_entities.find(symbol))
                    .set((
                        entities_dsl::is_active.eq(false),
                        entities_dsl::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .into_core()
            })
            .await?;
        Ok(updated > 0)
    }

    fn get(&self, symbol: &str) -> Result<Option<TrackedEntity>> {
        let mut conn = get_connection(&self.pool)?;
        entities_dsl::tracked_entities
            .find(symbol.trim().to_uppercase())
            .select(TrackedEntityDB::as_select())
            .first::<TrackedEntityDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| TrackedEntity::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn list_active(&self) -> Result<Vec<TrackedEntity>> {
        let mut conn = get_connection(&self.pool)?;
        entities_dsl::tracked_entities
            .filter(entities_dsl::is_active.eq(true))
            .order(entities_dsl::symbol.asc())
            .select(TrackedEntityDB::as_select())
            .load::<TrackedEntityDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(|row| TrackedEntity::try_from(row).map_err(Into::into))
            .collect()
    }

    fn list_active_stats(&self) -> Result<Vec<EntityStats>> {
        let mut conn = get_connection(&self.pool)?;
        sql_query(ACTIVE_STATS_SQL)
            .load::<EntityStatsRow>(&mut conn)
            .into_core()?
            .into_iter()
            .map(|row| EntityStats::try_from(row).map_err(Into::into))
            .collect()
    }
}

impl MarketViewStore for EntityRepository {
    fn price_windows(&self) -> Result<Vec<PriceWindow>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sql_query(PRICE_WINDOWS_SQL)
            .load::<PriceRow>(&mut conn)
            .into_core()?;
        fold_windows(rows)
    }

    fn price_window(&self, symbol: &str) -> Result<Option<PriceWindow>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sql_query(PRICE_WINDOW_SQL)
            .bind::<Text, _>(symbol.trim().to_uppercase())
            .load::<PriceRow>(&mut conn)
            .into_core()?;
        Ok(fold_windows(rows)?.into_iter().next())
    }
}
