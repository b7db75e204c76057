//! Local notification scheduling.
//!
//! `NotificationCenter` abstracts the platform facility (authorization,
//! add-request, remove-pending). `NotificationService` builds the app's
//! notification content on top of it. Every scheduling call is
//! fire-and-forget: failures are logged and never returned.
//!
//! The service does not enforce authorization. Requests added without it
//! are accepted by the platform but never shown.

use std::sync::Arc;

use chrono::NaiveTime;
use meteoros_core::NotificationError;
use meteoros_weather::{ForecastSeries, WeatherObservation};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::challenges::WeatherChallenge;

/// Fixed id of the recurring morning summary; rescheduling replaces it.
pub const MORNING_WEATHER_ID: &str = "morningWeather";
/// Fixed id of the recurring evening forecast; rescheduling replaces it.
pub const DAILY_FORECAST_ID: &str = "dailyForecast";

const CATEGORY_MORNING: &str = "MORNING_WEATHER";
const CATEGORY_EXTREME: &str = "EXTREME_WEATHER";
const CATEGORY_DAILY: &str = "DAILY_FORECAST";
const CATEGORY_CHALLENGE: &str = "WEATHER_CHALLENGE";

const IMMEDIATE_DELAY_SECS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSound {
    Default,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTrigger {
    /// Repeats every day at the given local hour and minute.
    Daily { hour: u32, minute: u32 },
    /// Fires once after the delay.
    After { seconds: u64 },
}

impl NotificationTrigger {
    pub fn daily_at(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self::Daily {
            hour: time.hour(),
            minute: time.minute(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: NotificationSound,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Platform notification facility.
pub trait NotificationCenter: Send + Sync {
    /// Ask the user for permission. Returns whether it was granted.
    fn request_authorization(&self) -> Result<bool, NotificationError>;

    fn authorization_status(&self) -> AuthorizationStatus;

    /// Add a pending request. A request with an existing identifier replaces it.
    fn add(&self, request: NotificationRequest) -> Result<(), NotificationError>;

    fn remove_pending(&self, identifiers: &[&str]);

    fn remove_all_pending(&self);
}

/// Notification center that only records requests. Used headless and in tests.
pub struct InMemoryNotificationCenter {
    pending: Mutex<Vec<NotificationRequest>>,
    status: Mutex<AuthorizationStatus>,
    grant: bool,
    available: bool,
}

impl Default for InMemoryNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotificationCenter {
    /// A center that grants authorization when asked.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            status: Mutex::new(AuthorizationStatus::NotDetermined),
            grant: true,
            available: true,
        }
    }

    /// A center that denies authorization when asked.
    pub fn denying() -> Self {
        Self {
            grant: false,
            ..Self::new()
        }
    }

    /// A center whose `add` always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn pending(&self) -> Vec<NotificationRequest> {
        self.pending.lock().clone()
    }

    pub fn find(&self, identifier: &str) -> Option<NotificationRequest> {
        self.pending
            .lock()
            .iter()
            .find(|r| r.identifier == identifier)
            .cloned()
    }
}

impl NotificationCenter for InMemoryNotificationCenter {
    fn request_authorization(&self) -> Result<bool, NotificationError> {
        let status = if self.grant {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        *self.status.lock() = status;
        Ok(self.grant)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    fn add(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        if !self.available {
            return Err(NotificationError::Unavailable);
        }
        let mut pending = self.pending.lock();
        pending.retain(|r| r.identifier != request.identifier);
        pending.push(request);
        Ok(())
    }

    fn remove_pending(&self, identifiers: &[&str]) {
        self.pending
            .lock()
            .retain(|r| !identifiers.contains(&r.identifier.as_str()));
    }

    fn remove_all_pending(&self) {
        self.pending.lock().clear();
    }
}

/// App-level scheduler over a `NotificationCenter`.
pub struct NotificationService {
    center: Arc<dyn NotificationCenter>,
    status: Mutex<AuthorizationStatus>,
}

impl NotificationService {
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        let status = center.authorization_status();
        Self {
            center,
            status: Mutex::new(status),
        }
    }

    /// Ask for permission and cache the answer. Errors count as a denial.
    pub fn request_authorization(&self) -> bool {
        let granted = match self.center.request_authorization() {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!("Notification authorization request failed: {}", e);
                false
            }
        };
        *self.status.lock() = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        granted
    }

    /// Cached status from the last check or request.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    /// Re-read the status from the platform.
    pub fn refresh_authorization_status(&self) -> AuthorizationStatus {
        let status = self.center.authorization_status();
        *self.status.lock() = status;
        status
    }

    pub fn schedule_morning_weather(&self, time: NaiveTime, observation: Option<&WeatherObservation>) {
        let body = match observation {
            Some(obs) => {
                let description = obs
                    .primary_condition()
                    .map(|c| capitalize_words(&c.description))
                    .unwrap_or_else(|| "Unknown".to_string());
                format!(
                    "Today's weather: {}, {}°. Have a great day!",
                    description,
                    round_degrees(obs.temperature())
                )
            }
            None => "Check today's weather forecast!".to_string(),
        };

        self.submit(NotificationRequest {
            identifier: MORNING_WEATHER_ID.to_string(),
            content: NotificationContent {
                title: "Good Morning! ☀️".to_string(),
                body,
                sound: NotificationSound::Default,
                category: CATEGORY_MORNING.to_string(),
            },
            trigger: NotificationTrigger::daily_at(time),
        });
    }

    pub fn schedule_extreme_weather_alert(&self, observation: &WeatherObservation) {
        let condition = observation
            .primary_condition()
            .map(|c| c.main.as_str())
            .unwrap_or("Unknown");

        self.submit(NotificationRequest {
            identifier: Uuid::new_v4().to_string(),
            content: NotificationContent {
                title: "⚠️ Extreme Weather Alert".to_string(),
                body: format!(
                    "Extreme weather detected: {}, {}°. Stay safe!",
                    condition,
                    round_degrees(observation.temperature())
                ),
                sound: NotificationSound::Critical,
                category: CATEGORY_EXTREME.to_string(),
            },
            trigger: NotificationTrigger::After {
                seconds: IMMEDIATE_DELAY_SECS,
            },
        });
    }

    /// Evening forecast built from the first entry of the series.
    pub fn schedule_daily_forecast(&self, time: NaiveTime, forecast: Option<&ForecastSeries>) {
        let body = match forecast.and_then(|f| f.first_entry()) {
            Some(entry) => {
                let description = entry
                    .primary_condition()
                    .map(|c| capitalize_words(&c.description))
                    .unwrap_or_else(|| "Unknown".to_string());
                format!("Tomorrow: {}, {}°", description, round_degrees(entry.main.temp))
            }
            None => "Check tomorrow's forecast!".to_string(),
        };

        self.submit(NotificationRequest {
            identifier: DAILY_FORECAST_ID.to_string(),
            content: NotificationContent {
                title: "Daily Weather Forecast 🌤".to_string(),
                body,
                sound: NotificationSound::Default,
                category: CATEGORY_DAILY.to_string(),
            },
            trigger: NotificationTrigger::daily_at(time),
        });
    }

    pub fn schedule_challenge_completed(&self, challenge: &WeatherChallenge) {
        self.submit(NotificationRequest {
            identifier: Uuid::new_v4().to_string(),
            content: NotificationContent {
                title: "🎮 New Weather Challenge!".to_string(),
                body: challenge.title.clone(),
                sound: NotificationSound::Default,
                category: CATEGORY_CHALLENGE.to_string(),
            },
            trigger: NotificationTrigger::After {
                seconds: IMMEDIATE_DELAY_SECS,
            },
        });
    }

    pub fn cancel_all(&self) {
        self.center.remove_all_pending();
        tracing::debug!("Cancelled all pending notifications");
    }

    pub fn cancel(&self, identifier: &str) {
        self.center.remove_pending(&[identifier]);
        tracing::debug!("Cancelled notification {}", identifier);
    }

    fn submit(&self, request: NotificationRequest) {
        if self.authorization_status() != AuthorizationStatus::Authorized {
            tracing::debug!(
                "Scheduling {} without notification authorization",
                request.content.category
            );
        }

        let identifier = request.identifier.clone();
        match self.center.add(request) {
            Ok(()) => tracing::debug!("Scheduled notification {}", identifier),
            Err(e) => tracing::warn!("Failed to schedule notification {}: {}", identifier, e),
        }
    }
}

fn round_degrees(temperature: f64) -> i64 {
    temperature.round() as i64
}

/// Upper-case the first letter of each word and lower-case the rest.
fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
