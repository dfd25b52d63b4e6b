use std::fmt;

const NAMESPACE: &str = "stockpulse:v1";

/// A read-path view that can be cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheView {
    AllEntities,
    Sectors,
    Sector(String),
    Entity(String),
    Performance,
    Overview,
}

/// Namespaced cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    view: CacheView,
}

impl CacheKey {
    pub fn new(view: CacheView) -> Self {
        Self {
            namespace: NAMESPACE,
            view,
        }
    }

    pub fn all_entities() -> Self {
        Self::new(CacheView::AllEntities)
    }

    pub fn sectors() -> Self {
        Self::new(CacheView::Sectors)
    }

    pub fn sector(sector: &str) -> Self {
        Self::new(CacheView::Sector(sector.to_lowercase()))
    }

    pub fn entity(symbol: &str) -> Self {
        Self::new(CacheView::Entity(symbol.to_uppercase()))
    }

    pub fn performance() -> Self {
        Self::new(CacheView::Performance)
    }

    pub fn overview() -> Self {
        Self::new(CacheView::Overview)
    }

    pub fn view(&self) -> &CacheView {
        &self.view
    }

    /// Every view that can contain `symbol`.
    pub fn invalidation_set(symbol: &str, sector: Option<&str>) -> Vec<CacheKey> {
        let mut keys = vec![
            Self::all_entities(),
            Self::sectors(),
            Self::entity(symbol),
            Self::performance(),
            Self::overview(),
        ];
        if let Some(sector) = sector {
            keys.push(Self::sector(sector));
        }
        keys
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.view {
            CacheView::AllEntities => write!(f, "{}:entities:all", self.namespace),
            CacheView::Sectors => write!(f, "{}:sectors", self.namespace),
            CacheView::Sector(s) => write!(f, "{}:entities:sector:{}", self.namespace, s),
            CacheView::Entity(s) => write!(f, "{}:entity:{}", self.namespace, s),
            CacheView::Performance => write!(f, "{}:market:performance", self.namespace),
            CacheView::Overview => write!(f, "{}:market:overview", self.namespace),
        }
    }
}
