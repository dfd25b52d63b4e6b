use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Equal to `close` for providers that do not report adjustments.
    pub adjusted_close: Decimal,
    pub volume: i64,
}

impl DailyBar {
    /// Create a bar whose adjusted close equals the raw close.
    pub fn unadjusted(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adjusted_close: close,
            volume,
        }
    }
}

/// A daily series for one symbol, ordered by date ascending.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    pub symbol: String,
    pub bars: Vec<DailyBar>,
}

impl DailySeries {
    /// Build a series, sorting bars by date and keeping the last bar for a
    /// duplicated date.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<DailyBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by(|later, earlier| {
            if later.date == earlier.date {
                std::mem::swap(later, earlier);
                true
            } else {
                false
            }
        });
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&DailyBar> {
        self.bars.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal) -> DailyBar {
        DailyBar::unadjusted(
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            close,
            close,
            close,
            close,
            1_000,
        )
    }

    #[test]
    fn test_new_sorts_by_date() {
        let series = DailySeries::new("AAPL", vec![bar(5, dec!(3)), bar(1, dec!(1)), bar(3, dec!(2))]);
        let days: Vec<u32> = series
            .bars
            .iter()
            .map(|b| chrono::Datelike::day(&b.date))
            .collect();
        assert_eq!(days, vec![1, 3, 5]);
        assert_eq!(series.latest().unwrap().close, dec!(3));
    }

    #[test]
    fn test_new_keeps_last_duplicate() {
        let series = DailySeries::new("AAPL", vec![bar(2, dec!(10)), bar(2, dec!(11))]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].close, dec!(11));
    }

    #[test]
    fn test_unadjusted_copies_close() {
        let b = bar(4, dec!(187.5));
        assert_eq!(b.adjusted_close, dec!(187.5));
    }
}
