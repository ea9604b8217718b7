//! Cycle detection.

pub mod detector;
pub mod profiles;

pub use detector::CycleDetector;
pub use profiles::{anchor_profile, peer_profile, ProfileRegistry, ANCHOR_SYMBOL, PEER_SYMBOLS};

use crate::error::{AppError, Result};
use crate::types::{CycleRecord, PriceSeries};

/// Detect all cycle records for `symbol` in `series`.
///
/// Fails only for an unknown symbol or a series belonging to another symbol.
/// Months without a qualifying cycle are simply absent from the result.
pub fn detect_cycles(
    symbol: &str,
    series: &PriceSeries,
    profiles: &ProfileRegistry,
    verbose: bool,
) -> Result<Vec<CycleRecord>> {
    let profile = profiles.get(symbol)?;
    if series.symbol() != profile.symbol {
        return Err(AppError::Data(format!(
            "series for {} passed as {}",
            series.symbol(),
            profile.symbol
        )));
    }
    Ok(CycleDetector::new(profile).with_verbose(verbose).detect(series))
}
