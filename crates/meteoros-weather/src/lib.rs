//! OpenWeatherMap client for Meteoros
//!
//! Current conditions and 5-day / 3-hour forecasts, plus the pure helpers
//! that turn a condition code into an icon, a background gradient, or an
//! extreme-weather verdict.

pub mod client;
pub mod conditions;
pub mod types;

pub use client::{WeatherClient, DEFAULT_BASE_URL};
pub use conditions::{gradient_for_code, icon_for_code, is_extreme_weather, ConditionGroup};
pub use meteoros_core::WeatherError;
pub use types::*;
