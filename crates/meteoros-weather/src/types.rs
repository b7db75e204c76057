use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conditions::{self, ConditionGroup};

/// Temperature unit preference; also selects the provider's unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Value of the provider's `units` query parameter
    pub fn units_param(&self) -> &'static str {
        match self {
            Self::Celsius => "metric",
            Self::Fahrenheit => "imperial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Celsius => "Celsius",
            Self::Fahrenheit => "Fahrenheit",
        }
    }
}

/// Wind speed display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindSpeedUnit {
    #[default]
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl WindSpeedUnit {
    const KMH_PER_MS: f64 = 3.6;
    const MPH_PER_MS: f64 = 2.237;

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MetersPerSecond => "m/s",
            Self::KilometersPerHour => "km/h",
            Self::MilesPerHour => "mph",
        }
    }

    /// Convert `speed` between units, going through m/s.
    pub fn convert(speed: f64, from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
        let mps = match from {
            Self::MetersPerSecond => speed,
            Self::KilometersPerHour => speed / Self::KMH_PER_MS,
            Self::MilesPerHour => speed / Self::MPH_PER_MS,
        };
        match to {
            Self::MetersPerSecond => mps,
            Self::KilometersPerHour => mps * Self::KMH_PER_MS,
            Self::MilesPerHour => mps * Self::MPH_PER_MS,
        }
    }
}

/// Geographic coordinates as the provider reports them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One entry of the provider's `weather` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Provider condition code (2xx thunderstorm ... 80x clouds)
    pub id: i32,
    /// Group name, e.g. "Rain", "Clear"
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i32,
    pub humidity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grnd_level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: i32,
}

/// Rain or snow volume over the last 1 / 3 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default, skip_serializing_if = "Option::is_none")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default, skip_serializing_if = "Option::is_none")]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<i64>,
}

/// Current conditions for one location: one `/weather` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    #[serde(default)]
    pub coord: Option<Coordinates>,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub base: Option<String>,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: Option<i32>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub snow: Option<Precipitation>,
    /// Observation time, unix seconds
    pub dt: i64,
    #[serde(default)]
    pub sys: Option<SystemInfo>,
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: Option<i32>,
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub cod: Option<i32>,
}

impl WeatherObservation {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    /// Code of the primary condition, if the provider sent one
    pub fn condition_code(&self) -> Option<i32> {
        self.primary_condition().map(|c| c.id)
    }

    pub fn temperature(&self) -> f64 {
        self.main.temp
    }

    /// Wind speed in the requested unit system, 0 when `wind` is absent
    pub fn wind_speed(&self) -> f64 {
        self.wind.as_ref().map(|w| w.speed).unwrap_or(0.0)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.dt, 0)
    }

    pub fn condition_group(&self) -> ConditionGroup {
        self.condition_code()
            .map(ConditionGroup::from_code)
            .unwrap_or(ConditionGroup::Unknown)
    }

    pub fn icon_name(&self) -> &'static str {
        self.condition_group().icon_name()
    }

    pub fn gradient(&self) -> [&'static str; 2] {
        self.condition_group().gradient()
    }

    /// Extreme-weather verdict for this observation.
    ///
    /// Without a condition entry only temperature and wind are considered.
    pub fn is_extreme(&self) -> bool {
        conditions::is_extreme_weather(
            self.condition_code().unwrap_or(0),
            self.temperature(),
            self.wind_speed(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSys {
    /// Part of day: "d" or "n"
    pub pod: String,
}

/// One 3-hour step of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub visibility: Option<i32>,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: Option<f64>,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub snow: Option<Precipitation>,
    #[serde(default)]
    pub sys: Option<ForecastSys>,
    pub dt_txt: String,
}

impl ForecastEntry {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn forecast_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.dt, 0)
    }

    pub fn icon_name(&self) -> &'static str {
        self.primary_condition()
            .map(|c| conditions::icon_for_code(c.id))
            .unwrap_or_else(|| ConditionGroup::Unknown.icon_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: i64,
    pub name: String,
    pub coord: Coordinates,
    pub country: String,
    #[serde(default)]
    pub population: Option<i64>,
    pub timezone: i32,
    pub sunrise: i64,
    pub sunset: i64,
}

/// A `/forecast` response: 3-hour steps for the next five days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub cod: String,
    #[serde(default)]
    pub message: Option<i64>,
    pub cnt: i32,
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

impl ForecastSeries {
    pub fn first_entry(&self) -> Option<&ForecastEntry> {
        self.list.first()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn london_json() -> serde_json::Value {
        serde_json::json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "base": "stations",
            "main": {
                "temp": 12.3, "feels_like": 11.1, "temp_min": 10.0, "temp_max": 14.2,
                "pressure": 1012, "humidity": 81
            },
            "visibility": 10000,
            "wind": {"speed": 4.6, "deg": 230},
            "clouds": {"all": 75},
            "rain": {"1h": 0.42},
            "dt": 1700000000,
            "sys": {"type": 2, "id": 2075535, "country": "GB", "sunrise": 1699946000, "sunset": 1699978000},
            "timezone": 0,
            "id": 2643743,
            "name": "London",
            "cod": 200
        })
    }

    #[test]
    fn test_decode_full_observation() {
        let obs: WeatherObservation = serde_json::from_value(london_json()).unwrap();
        assert_eq!(obs.name, "London");
        assert_eq!(obs.condition_code(), Some(500));
        assert_eq!(obs.rain.as_ref().unwrap().one_hour, Some(0.42));
        assert_eq!(obs.sys.as_ref().unwrap().kind, Some(2));
        assert_eq!(obs.coord, Some(Coordinates::new(51.5085, -0.1257)));
        assert_eq!(obs.observed_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_optional_sub_objects_may_be_absent() {
        let obs: WeatherObservation = serde_json::from_value(serde_json::json!({
            "weather": [],
            "main": {
                "temp": -3.0, "feels_like": -7.0, "temp_min": -4.0, "temp_max": -1.0,
                "pressure": 1030, "humidity": 60
            },
            "dt": 1700000000,
            "name": "Oslo"
        }))
        .unwrap();

        assert!(obs.coord.is_none());
        assert!(obs.wind.is_none());
        assert_eq!(obs.wind_speed(), 0.0);
        assert_eq!(obs.condition_group(), ConditionGroup::Unknown);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut json = london_json();
        json["main"].as_object_mut().unwrap().remove("humidity");
        assert!(serde_json::from_value::<WeatherObservation>(json).is_err());
    }

    #[test]
    fn test_units_param() {
        assert_eq!(TemperatureUnit::Celsius.units_param(), "metric");
        assert_eq!(TemperatureUnit::Fahrenheit.units_param(), "imperial");
        assert_eq!(TemperatureUnit::default(), TemperatureUnit::Celsius);
    }

    #[test]
    fn test_wind_speed_conversion() {
        let kmh = WindSpeedUnit::convert(10.0, WindSpeedUnit::MetersPerSecond, WindSpeedUnit::KilometersPerHour);
        assert!((kmh - 36.0).abs() < 1e-9);

        let mph = WindSpeedUnit::convert(36.0, WindSpeedUnit::KilometersPerHour, WindSpeedUnit::MilesPerHour);
        assert!((mph - 22.37).abs() < 1e-9);

        let same = WindSpeedUnit::convert(7.5, WindSpeedUnit::MilesPerHour, WindSpeedUnit::MilesPerHour);
        assert!((same - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_wind_unit_serializes_as_symbol() {
        let json = serde_json::to_string(&WindSpeedUnit::KilometersPerHour).unwrap();
        assert_eq!(json, "\"km/h\"");
    }
}
