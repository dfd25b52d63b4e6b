use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::entities::{EntityStats, EntityStore};
use crate::errors::Result;

/// One entry of the selector's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPriority {
    /// 1-based position in the ordered list.
    pub rank: usize,
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub market_cap: Option<i64>,
    pub history_count: i64,
    pub is_cold: bool,
    pub has_sufficient_data: bool,
    pub latest_date: Option<NaiveDate>,
}

fn compare(a: &EntityStats, b: &EntityStats) -> Ordering {
    b.is_cold()
        .cmp(&a.is_cold())
        .then_with(|| match (a.entity.market_cap, b.entity.market_cap) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.entity.symbol.cmp(&b.entity.symbol))
}

fn to_priority(rank: usize, stats: &EntityStats, min_points: i64) -> EntityPriority {
    EntityPriority {
        rank,
        symbol: stats.entity.symbol.clone(),
        name: stats.entity.name.clone(),
        sector: stats.entity.sector.clone(),
        market_cap: stats.entity.market_cap,
        history_count: stats.history_count,
        is_cold: stats.is_cold(),
        has_sufficient_data: stats.history_count >= min_points,
        latest_date: stats.latest_date,
    }
}

/// Orders every active entity.
pub fn rank_entities(stats: &[EntityStats], min_points: i64) -> Vec<EntityPriority> {
    let mut ordered: Vec<&EntityStats> = stats.iter().filter(|s| s.entity.is_active).collect();
    ordered.sort_by(|a, b| compare(a, b));
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, s)| to_priority(i + 1, s, min_points))
        .collect()
}

/// Entities still below the completeness threshold, in priority order.
pub fn pending_entities(
    stats: &[EntityStats],
    min_points: i64,
    limit: usize,
) -> Vec<EntityPriority> {
    rank_entities(stats, min_points)
        .into_iter()
        .filter(|p| p.history_count < min_points)
        .take(limit)
        .enumerate()
        .map(|(i, p)| EntityPriority { rank: i + 1, ..p })
        .collect()
}

/// The one entity a periodic tick should refresh.
///
/// The first pending entity when there is one. Otherwise the entity whose
/// latest stored date is oldest, ties broken by symbol, so complete entities
/// keep receiving new bars.
pub fn periodic_target(stats: &[EntityStats], min_points: i64) -> Option<EntityPriority> {
    if let Some(first) = pending_entities(stats, min_points, 1).into_iter().next() {
        return Some(first);
    }

    stats
        .iter()
        .filter(|s| s.entity.is_active)
        .min_by(|a, b| {
            a.latest_date
                .cmp(&b.latest_date)
                .then_with(|| a.entity.symbol.cmp(&b.entity.symbol))
        })
        .map(|s| to_priority(1, s, min_points))
}

/// Store-backed front for the pure functions above.
pub struct PrioritySelector {
    entities: Arc<dyn EntityStore>,
    min_points: i64,
}

impl PrioritySelector {
    pub fn new(entities: Arc<dyn EntityStore>, min_points: i64) -> Self {
        Self {
            entities,
            min_points,
        }
    }

    pub fn min_points(&self) -> i64 {
        self.min_points
    }

    pub fn stats(&self) -> Result<Vec<EntityStats>> {
        self.entities.list_active_stats()
    }

    pub fn ranked(&self) -> Result<Vec<EntityPriority>> {
        Ok(rank_entities(&self.stats()?, self.min_points))
    }

    pub fn pending(&self, limit: usize) -> Result<Vec<EntityPriority>> {
        Ok(pending_entities(&self.stats()?, self.min_points, limit))
    }

    pub fn periodic_target(&self) -> Result<Option<EntityPriority>> {
        Ok(periodic_target(&self.stats()?, self.min_points))
    }
}
