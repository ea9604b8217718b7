pub mod calendar;
pub mod cycles;
pub mod day_stats;
pub mod projection;
pub mod refresh;
pub mod scoring;
pub mod series_cache;
pub mod sqlite_store;

pub use cycles::{detect_cycles, CycleDetector, ProfileRegistry};
pub use day_stats::{trading_day_stats, TradingDayStat};
pub use projection::{ex_date_alignment, project_next, CountdownProjector};
pub use refresh::{RefreshService, RefreshSummary};
pub use scoring::score_same_day;
pub use series_cache::SeriesCache;
pub use sqlite_store::SqliteStore;
