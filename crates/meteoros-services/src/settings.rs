//! User preferences, persisted under a single key on every change.

use chrono::NaiveTime;
use meteoros_weather::{TemperatureUnit, WindSpeedUnit};
use serde::{Deserialize, Serialize};

use crate::store::{JsonStore, StorageKey};

fn time_of_day(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default()
}

/// Notification toggles and the two daily delivery times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub morning_weather: bool,
    pub extreme_weather_alerts: bool,
    pub daily_forecast: bool,
    pub morning_time: NaiveTime,
    pub evening_time: NaiveTime,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            morning_weather: true,
            extreme_weather_alerts: true,
            daily_forecast: true,
            morning_time: time_of_day(8),
            evening_time: time_of_day(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub notification_settings: NotificationSettings,
    #[serde(rename = "enableChallenges")]
    pub challenges_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            wind_speed_unit: WindSpeedUnit::MetersPerSecond,
            notification_settings: NotificationSettings::default(),
            challenges_enabled: true,
        }
    }
}

/// Settings holder. Each setter persists immediately.
pub struct SettingsStore {
    store: JsonStore,
    settings: AppSettings,
}

impl SettingsStore {
    /// Load persisted settings, falling back to defaults.
    pub fn load(store: JsonStore) -> Self {
        let loaded = store.load_or_default::<AppSettings>(StorageKey::Settings);
        if loaded.was_default() {
            tracing::debug!("Using default settings ({:?})", loaded.source);
        }
        Self {
            store,
            settings: loaded.value,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.settings.temperature_unit = unit;
        self.save();
    }

    pub fn set_wind_speed_unit(&mut self, unit: WindSpeedUnit) {
        self.settings.wind_speed_unit = unit;
        self.save();
    }

    pub fn set_notification_settings(&mut self, notifications: NotificationSettings) {
        self.settings.notification_settings = notifications;
        self.save();
    }

    pub fn set_challenges_enabled(&mut self, enabled: bool) {
        self.settings.challenges_enabled = enabled;
        self.save();
    }

    /// Restore defaults and persist them.
    pub fn reset(&mut self) {
        self.settings = AppSettings::default();
        self.save();
    }

    /// Wipe every persisted key and fall back to in-memory defaults.
    ///
    /// The defaults are not written back; the next setter call persists them.
    /// Other holders keep their in-memory copies and write them back on their
    /// next save: call `WeatherState::reload` and load a fresh `NoteBook`
    /// afterwards, or an existing `NoteBook` restores the deleted notes.
    pub fn delete_all_data(&mut self) {
        self.store.clear_all();
        self.settings = AppSettings::default();
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.store
            .load_or_default::<bool>(StorageKey::OnboardingCompleted)
            .value
    }

    pub fn set_onboarding_completed(&self, completed: bool) {
        self.store.persist(StorageKey::OnboardingCompleted, &completed);
    }

    fn save(&self) {
        self.store.persist(StorageKey::Settings, &self.settings);
    }
}
