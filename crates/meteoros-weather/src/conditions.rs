//! Condition-code helpers. Pure functions, no network access.
//!
//! Codes follow the provider's grouping:
//! https://openweathermap.org/weather-conditions

use serde::{Deserialize, Serialize};

const STORM_DARK: [&str; 2] = ["#1A2339", "#090F1E"];
const SNOW_LIGHT: [&str; 2] = ["#B8C6DB", "#F5F7FA"];
const FOG_GREY: [&str; 2] = ["#74859C", "#090F1E"];
const CLEAR_BLUE: [&str; 2] = ["#56CCF2", "#2F80ED"];
const CLOUDS_MIXED: [&str; 2] = ["#1A2339", "#56CCF2"];

const EXTREME_COLD: f64 = -10.0;
const EXTREME_HEAT: f64 = 40.0;
const EXTREME_WIND: f64 = 15.0;

/// Condition bucket derived from a provider code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGroup {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Atmosphere,
    Clear,
    FewClouds,
    Clouds,
    Overcast,
    Unknown,
}

impl ConditionGroup {
    pub fn from_code(code: i32) -> Self {
        match code {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            500..=531 => Self::Rain,
            600..=622 => Self::Snow,
            701..=781 => Self::Atmosphere,
            800 => Self::Clear,
            801 => Self::FewClouds,
            802 => Self::Clouds,
            803..=804 => Self::Overcast,
            _ => Self::Unknown,
        }
    }

    /// Symbol name the UI layer renders for this group
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "cloud.bolt.rain.fill",
            Self::Drizzle => "cloud.drizzle.fill",
            Self::Rain => "cloud.rain.fill",
            Self::Snow => "cloud.snow.fill",
            Self::Atmosphere => "cloud.fog.fill",
            Self::Clear => "sun.max.fill",
            Self::FewClouds => "cloud.sun.fill",
            Self::Clouds => "cloud.fill",
            Self::Overcast => "smoke.fill",
            Self::Unknown => "cloud.fill",
        }
    }

    /// Background gradient as a `[top, bottom]` pair of hex colors
    pub fn gradient(&self) -> [&'static str; 2] {
        match self {
            Self::Thunderstorm | Self::Drizzle | Self::Rain => STORM_DARK,
            Self::Snow => SNOW_LIGHT,
            Self::Atmosphere => FOG_GREY,
            Self::Clear => CLEAR_BLUE,
            Self::FewClouds | Self::Clouds | Self::Overcast => CLOUDS_MIXED,
            Self::Unknown => STORM_DARK,
        }
    }
}

pub fn icon_for_code(code: i32) -> &'static str {
    ConditionGroup::from_code(code).icon_name()
}

pub fn gradient_for_code(code: i32) -> [&'static str; 2] {
    ConditionGroup::from_code(code).gradient()
}

/// True for storms, rain and snow codes, or temperature / wind outside the
/// safe band. Thresholds are in whatever unit system the data was fetched in.
pub fn is_extreme_weather(code: i32, temperature: f64, wind_speed: f64) -> bool {
    let severe_code = (200..300).contains(&code)
        || (500..=531).contains(&code)
        || (600..=622).contains(&code);

    severe_code
        || temperature < EXTREME_COLD
        || temperature > EXTREME_HEAT
        || wind_speed > EXTREME_WIND
}
