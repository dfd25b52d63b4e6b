use diesel::prelude::*;
use stockpulse_market_data::DailyBar;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_decimal, parse_timestamp};
use stockpulse_core::history::HistoryPoint;

/// Database model for daily history. Prices are stored as decimal strings.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::daily_history)]
#[diesel(primary_key(symbol, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoryPointDB {
    pub symbol: String,
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub adjusted_close: String,
    pub volume: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl HistoryPointDB {
    pub fn from_bar(symbol: &str, bar: &DailyBar, now: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: format_date(bar.date),
            open: bar.open.to_string(),
            high: bar.high.to_string(),
            low: bar.low.to_string(),
            close: bar.close.to_string(),
            adjusted_close: bar.adjusted_close.to_string(),
            volume: bar.volume,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

impl TryFrom<HistoryPointDB> for HistoryPoint {
    type Error = StorageError;

    fn try_from(db: HistoryPointDB) -> Result<Self, Self::Error> {
        Ok(Self {
            date: parse_date(&db.date)?,
            open: parse_decimal(&db.open)?,
            high: parse_decimal(&db.high)?,
            low: parse_decimal(&db.low)?,
            close: parse_decimal(&db.close)?,
            adjusted_close: parse_decimal(&db.adjusted_close)?,
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            symbol: db.symbol,
            volume: db.volume,
        })
    }
}
