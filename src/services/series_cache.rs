use crate::error::Result;
use crate::types::PriceSeries;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-symbol cache of loaded price series with a TTL.
pub struct SeriesCache {
    data: DashMap<String, CacheEntry>,
    ttl: Duration,
}

struct CacheEntry {
    series: Arc<PriceSeries>,
    expires_at: Instant,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Get an unexpired series.
    pub fn get(&self, symbol: &str) -> Option<Arc<PriceSeries>> {
        let key = symbol.to_uppercase();
        let entry = self.data.get(&key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.series.clone())
        } else {
            drop(entry);
            self.data.remove(&key);
            None
        }
    }

    pub fn insert(&self, series: PriceSeries) -> Arc<PriceSeries> {
        let series = Arc::new(series);
        self.data.insert(
            series.symbol().to_string(),
            CacheEntry {
                series: series.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        series
    }

    /// Cached series, or the loader's result (which is then cached).
    pub fn get_or_load<F>(&self, symbol: &str, load: F) -> Result<Arc<PriceSeries>>
    where
        F: FnOnce(&str) -> Result<PriceSeries>,
    {
        if let Some(series) = self.get(symbol) {
            return Ok(series);
        }
        let series = load(&symbol.to_uppercase())?;
        Ok(self.insert(series))
    }

    pub fn invalidate(&self, symbol: &str) {
        self.data.remove(&symbol.to_uppercase());
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::types::PricePoint;
    use chrono::NaiveDate;

    fn series(symbol: &str) -> PriceSeries {
        PriceSeries::new(
            symbol,
            vec![PricePoint::new(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 100.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_cache_basic() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache.insert(series("SGOV"));
        assert!(cache.get("sgov").is_some());
        assert!(cache.get("BIL").is_none());
    }

    #[test]
    fn test_cache_expiration() {
        let cache = SeriesCache::new(Duration::from_millis(10));
        cache.insert(series("SGOV"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("SGOV").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_load_caches() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        let first = cache.get_or_load("shv", |s| Ok(series(s))).unwrap();
        assert_eq!(first.symbol(), "SHV");

        let second = cache
            .get_or_load("SHV", |_| Err(AppError::Internal("loader called twice".to_string())))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_or_load_propagates_errors() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        let result = cache.get_or_load("TFLO", |_| Err(AppError::Data("bad rows".to_string())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = SeriesCache::new(Duration::from_secs(60));
        cache.insert(series("ICSH"));
        cache.invalidate("icsh");
        assert!(cache.get("ICSH").is_none());
    }
}
