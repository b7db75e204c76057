//! Application state holder: drives a weather refresh end to end and
//! publishes the result as an immutable snapshot on a watch channel.
//!
//! Refresh order:
//! 1. validate the city name
//! 2. enter loading
//! 3. fetch current weather by city (failure is surfaced and stops here)
//! 4. publish the observation, persist the city, evaluate challenges and
//!    announce newly completed ones
//! 5. fetch the forecast at the observation's coordinates (failure is
//!    logged and swallowed)
//! 6. leave loading
//!
//! Overlapping refreshes: each refresh takes a generation number at step 2.
//! When a fetch returns after a newer refresh has started, its results are
//! dropped and the newer refresh owns the loading and error flags.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use meteoros_core::{AppError, ValidationError};
use meteoros_weather::{ForecastSeries, TemperatureUnit, WeatherClient, WeatherObservation};
use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::challenges::{ChallengeBoard, WeatherChallenge};
use crate::locations::{LocationBook, SavedLocation};
use crate::notifications::{NotificationService, DAILY_FORECAST_ID, MORNING_WEATHER_ID};
use crate::settings::NotificationSettings;
use crate::store::{JsonStore, StorageKey};

/// Everything the UI renders, published as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub current: Option<WeatherObservation>,
    pub forecast: Option<ForecastSeries>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub city_name: String,
    pub saved_locations: Vec<SavedLocation>,
    pub challenges: Vec<WeatherChallenge>,
    pub total_points: u32,
    /// Extreme-weather verdict for `current`. Published only; no alert is scheduled from it.
    pub extreme_weather: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated {
        city_name: String,
        completed: Vec<WeatherChallenge>,
        forecast_loaded: bool,
    },
    /// A newer refresh started while this one was in flight; nothing was published.
    Superseded,
}

pub struct WeatherState {
    client: WeatherClient,
    notifications: Arc<NotificationService>,
    store: JsonStore,
    default_city: String,
    locations: Mutex<LocationBook>,
    board: Mutex<ChallengeBoard>,
    generation: AtomicU64,
    tx: watch::Sender<WeatherSnapshot>,
}

impl WeatherState {
    /// Rebuild state from the store. The current city is the last searched
    /// one, or `default_city` when none was saved.
    pub fn new(
        client: WeatherClient,
        notifications: Arc<NotificationService>,
        store: JsonStore,
        default_city: &str,
    ) -> Self {
        let locations = LocationBook::load(store.clone());
        let board = ChallengeBoard::load(store.clone());

        let snapshot = WeatherSnapshot {
            city_name: initial_city(&store, default_city),
            saved_locations: locations.all().to_vec(),
            challenges: board.challenges().to_vec(),
            total_points: board.total_points(),
            ..WeatherSnapshot::default()
        };
        let (tx, _) = watch::channel(snapshot);

        Self {
            client,
            notifications,
            store,
            default_city: default_city.to_string(),
            locations: Mutex::new(locations),
            board: Mutex::new(board),
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.tx.borrow().clone()
    }

    pub fn current_city(&self) -> String {
        self.tx.borrow().city_name.clone()
    }

    pub fn notifications(&self) -> &Arc<NotificationService> {
        &self.notifications
    }

    /// Refresh current weather and forecast for `city`.
    ///
    /// Current-weather failures set `error_message` and are returned.
    /// Forecast failures are only logged.
    pub async fn refresh(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<RefreshOutcome, AppError> {
        let city = city.trim();
        if city.is_empty() {
            let err = ValidationError::EmptyCityName;
            self.tx
                .send_modify(|s| s.error_message = Some(err.user_message().to_string()));
            return Err(err.into());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|s| {
            s.is_loading = true;
            s.error_message = None;
        });
        tracing::info!("Refreshing weather for {}", city);

        let observation = match self.client.current_by_city(city, unit).await {
            Ok(observation) => observation,
            Err(e) => {
                if !self.is_latest(generation) {
                    tracing::debug!("Dropping superseded failure for {}: {}", city, e);
                    return Ok(RefreshOutcome::Superseded);
                }
                tracing::error!("Failed to fetch weather for {}: {}", city, e);
                self.tx.send_modify(|s| {
                    s.error_message = Some(e.user_message().to_string());
                    s.is_loading = false;
                });
                return Err(e.into());
            }
        };

        if !self.is_latest(generation) {
            tracing::debug!("Dropping superseded result for {}", city);
            return Ok(RefreshOutcome::Superseded);
        }

        let completed = self.apply_observation(&observation);

        let forecast_loaded = self.refresh_forecast(&observation, unit, generation).await;
        if !self.is_latest(generation) {
            return Ok(RefreshOutcome::Superseded);
        }

        self.tx.send_modify(|s| s.is_loading = false);

        Ok(RefreshOutcome::Updated {
            city_name: observation.name,
            completed,
            forecast_loaded,
        })
    }

    pub fn add_location(&self, location: SavedLocation) {
        let saved = {
            let mut locations = self.locations.lock();
            locations.add(location);
            locations.all().to_vec()
        };
        self.tx.send_modify(|s| s.saved_locations = saved);
    }

    pub fn remove_location(&self, id: Uuid) -> bool {
        let (removed, saved) = {
            let mut locations = self.locations.lock();
            let removed = locations.remove(id);
            (removed, locations.all().to_vec())
        };
        if removed {
            self.tx.send_modify(|s| s.saved_locations = saved);
        }
        removed
    }

    /// Regenerate the default challenges. Points are kept.
    pub fn reset_challenges(&self) {
        let challenges = {
            let mut board = self.board.lock();
            board.reset();
            board.challenges().to_vec()
        };
        self.tx.send_modify(|s| s.challenges = challenges);
    }

    /// Schedule or cancel the two recurring notifications to match `settings`,
    /// using the currently published observation and forecast.
    ///
    /// Extreme-weather alerts are never scheduled from here.
    pub fn sync_notifications(&self, settings: &NotificationSettings) {
        let snapshot = self.snapshot();

        if settings.morning_weather {
            self.notifications
                .schedule_morning_weather(settings.morning_time, snapshot.current.as_ref());
        } else {
            self.notifications.cancel(MORNING_WEATHER_ID);
        }

        if settings.daily_forecast {
            self.notifications
                .schedule_daily_forecast(settings.evening_time, snapshot.forecast.as_ref());
        } else {
            self.notifications.cancel(DAILY_FORECAST_ID);
        }
    }

    /// Re-read locations, challenges, points and city from the store,
    /// e.g. after all data was deleted.
    pub fn reload(&self) {
        let locations = LocationBook::load(self.store.clone());
        let board = ChallengeBoard::load(self.store.clone());
        let city_name = initial_city(&self.store, &self.default_city);

        let saved_locations = locations.all().to_vec();
        let challenges = board.challenges().to_vec();
        let total_points = board.total_points();

        *self.locations.lock() = locations;
        *self.board.lock() = board;
        self.tx.send_modify(|s| {
            s.saved_locations = saved_locations;
            s.challenges = challenges;
            s.total_points = total_points;
            s.city_name = city_name;
        });
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Step 4: persist, evaluate, announce, publish.
    fn apply_observation(&self, observation: &WeatherObservation) -> Vec<WeatherChallenge> {
        self.store
            .persist(StorageKey::LastSearchedCity, &observation.name);

        let (completed, challenges, total_points) = {
            let mut board = self.board.lock();
            let completed = board.apply(observation);
            (completed, board.challenges().to_vec(), board.total_points())
        };
        for challenge in &completed {
            self.notifications.schedule_challenge_completed(challenge);
        }

        let extreme = observation.is_extreme();
        if extreme {
            tracing::info!("Extreme weather in {}", observation.name);
        }

        let current = observation.clone();
        self.tx.send_modify(|s| {
            s.city_name = current.name.clone();
            s.current = Some(current);
            s.challenges = challenges;
            s.total_points = total_points;
            s.extreme_weather = extreme;
        });

        completed
    }

    /// Step 5. Returns whether a forecast was published.
    async fn refresh_forecast(
        &self,
        observation: &WeatherObservation,
        unit: TemperatureUnit,
        generation: u64,
    ) -> bool {
        let Some(coord) = observation.coord else {
            tracing::debug!("No coordinates for {}; skipping forecast", observation.name);
            return false;
        };

        match self.client.forecast_by_coordinates(coord, unit).await {
            Ok(forecast) => {
                if !self.is_latest(generation) {
                    return false;
                }
                self.tx.send_modify(|s| s.forecast = Some(forecast));
                true
            }
            Err(e) => {
                tracing::warn!("Forecast fetch for {} failed: {}", observation.name, e);
                false
            }
        }
    }
}

fn initial_city(store: &JsonStore, default_city: &str) -> String {
    let saved = store
        .load_or_default::<String>(StorageKey::LastSearchedCity)
        .into_inner();
    if saved.trim().is_empty() {
        default_city.to_string()
    } else {
        saved
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::notifications::InMemoryNotificationCenter;

    fn state_with(store: JsonStore) -> WeatherState {
        let client = WeatherClient::with_base_url("http://127.0.0.1:9", "k").unwrap();
        let center = Arc::new(InMemoryNotificationCenter::new());
        let notifications = Arc::new(NotificationService::new(center));
        WeatherState::new(client, notifications, store, "Moscow")
    }

    #[test]
    fn test_initial_city_defaults_then_uses_saved() {
        let store = JsonStore::in_memory();
        assert_eq!(state_with(store.clone()).current_city(), "Moscow");

        store.save(StorageKey::LastSearchedCity, "Lisbon").unwrap();
        assert_eq!(state_with(store).current_city(), "Lisbon");
    }

    #[test]
    fn test_initial_snapshot_is_idle_with_defaults() {
        let snapshot = state_with(JsonStore::in_memory()).snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.current.is_none());
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.challenges.len(), 6);
        assert_eq!(snapshot.total_points, 0);
    }

    #[tokio::test]
    async fn test_empty_city_sets_message_without_loading() {
        let state = state_with(JsonStore::in_memory());
        let result = state.refresh("  ", TemperatureUnit::Celsius).await;

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::EmptyCityName))
        ));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.error_message.as_deref(), Some("Please enter a city name"));
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn test_locations_are_published() {
        let state = state_with(JsonStore::in_memory());
        let mut rx = state.subscribe();

        let paris = SavedLocation::new("Paris", 48.85, 2.35).unwrap();
        let id = paris.id;
        state.add_location(paris);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().saved_locations.len(), 1);

        assert!(state.remove_location(id));
        assert!(state.snapshot().saved_locations.is_empty());
    }

    #[test]
    fn test_reload_after_data_wipe() {
        let store = JsonStore::in_memory();
        let state = state_with(store.clone());
        state.add_location(SavedLocation::new("Paris", 48.85, 2.35).unwrap());
        store.save(StorageKey::LastSearchedCity, "Paris").unwrap();

        store.clear_all();
        state.reload();

        let snapshot = state.snapshot();
        assert!(snapshot.saved_locations.is_empty());
        assert_eq!(snapshot.city_name, "Moscow");
        assert_eq!(snapshot.challenges.len(), 6);
    }
}
