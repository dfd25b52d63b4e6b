//! Database models for tracked entities.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};

use crate::errors::StorageError;
use crate::utils::{parse_date, parse_decimal, parse_timestamp};
use stockpulse_core::entities::{EntityStats, NewEntity, TrackedEntity};
use stockpulse_core::market::PricePoint;

/// Database model for tracked entities
#[derive(Queryable, QueryableByName, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::tracked_entities)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrackedEntityDB {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<i64>,
    pub is_active: bool,
    pub has_sufficient_data: bool,
    pub data_quality_score: i32,
    pub last_data_sync: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Database model for seeding entities
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::tracked_entities)]
pub struct NewEntityDB {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl NewEntityDB {
    pub fn from_domain(entity: &NewEntity, now: &str) -> Self {
        Self {
            symbol: entity.symbol.trim().to_uppercase(),
            name: entity.name.clone(),
            sector: entity.sector.clone(),
            industry: entity.industry.clone(),
            exchange: entity.exchange.clone(),
            market_cap: entity.market_cap,
            is_active: true,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

impl TryFrom<TrackedEntityDB> for TrackedEntity {
    type Error = StorageError;

    fn try_from(db: TrackedEntityDB) -> Result<Self, Self::Error> {
        Ok(Self {
            last_data_sync: db
                .last_data_sync
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            symbol: db.symbol,
            name: db.name,
            sector: db.sector,
            industry: db.industry,
            exchange: db.exchange,
            market_cap: db.market_cap,
            is_active: db.is_active,
            has_sufficient_data: db.has_sufficient_data,
            data_quality_score: db.data_quality_score,
        })
    }
}

/// An active entity joined with its history aggregates.
#[derive(QueryableByName, Debug)]
pub struct EntityStatsRow {
    #[diesel(embed)]
    pub entity: TrackedEntityDB,
    #[diesel(sql_type = BigInt)]
    pub history_count: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub latest_date: Option<String>,
}

impl TryFrom<EntityStatsRow> for EntityStats {
    type Error = StorageError;

    fn try_from(row: EntityStatsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entity: TrackedEntity::try_from(row.entity)?,
            history_count: row.history_count,
            latest_date: row.latest_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// One of the two most recent closes for an entity.
#[derive(QueryableByName, Debug)]
pub struct PriceRow {
    #[diesel(sql_type = Text)]
    pub symbol: String,
    #[diesel(sql_type = Text)]
    pub date: String,
    #[diesel(sql_type = Text)]
    pub close: String,
    #[diesel(sql_type = BigInt)]
    pub volume: i64,
}

impl PriceRow {
    pub fn to_point(&self) -> Result<PricePoint, StorageError> {
        Ok(PricePoint {
            date: parse_date(&self.date)?,
            close: parse_decimal(&self.close)?,
            volume: self.volume,
        })
    }
}
