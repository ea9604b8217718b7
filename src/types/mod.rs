pub mod cycle;
pub mod price;
pub mod profile;
pub mod projection;
pub mod score;

pub use cycle::*;
pub use price::*;
pub use profile::*;
pub use projection::*;
pub use score::*;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
