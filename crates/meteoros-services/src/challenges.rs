//! Weather challenges: the fixed rule set, the evaluator and the persisted board.
//!
//! Completion is monotonic. A challenge moves from incomplete to complete at
//! most once, keeps its id, and awards its points exactly once.

use meteoros_weather::WeatherObservation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{JsonStore, LoadSource, StorageKey};

const HOT_ABOVE: f64 = 30.0;
const COLD_BELOW: f64 = 0.0;

/// Trigger category attached to a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionTag {
    Rain,
    Clear,
    Snow,
    Hot,
    Cold,
    /// Consecutive-day check-ins. Nothing tracks days, so it never fires.
    Streak,
}

impl ConditionTag {
    /// `condition` is the lower-cased primary condition group ("rain", "clear", ...).
    /// Temperatures are in whatever unit the observation was fetched in.
    fn is_met(&self, condition: &str, temperature: f64) -> bool {
        match self {
            ConditionTag::Rain => condition.contains("rain"),
            ConditionTag::Clear => condition == "clear",
            ConditionTag::Snow => condition.contains("snow"),
            ConditionTag::Hot => temperature > HOT_ABOVE,
            ConditionTag::Cold => temperature < COLD_BELOW,
            ConditionTag::Streak => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherChallenge {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub condition: ConditionTag,
    pub is_completed: bool,
    pub points: u32,
}

impl WeatherChallenge {
    pub fn new(title: &str, description: &str, condition: ConditionTag, points: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            condition,
            is_completed: false,
            points,
        }
    }

    /// Same challenge (same id), marked complete.
    pub fn completed(&self) -> Self {
        Self {
            is_completed: true,
            ..self.clone()
        }
    }
}

/// The six built-in challenges, each with a fresh id.
pub fn default_challenges() -> Vec<WeatherChallenge> {
    vec![
        WeatherChallenge::new(
            "Rainy Day Ready",
            "Don't forget your umbrella on a rainy day!",
            ConditionTag::Rain,
            15,
        ),
        WeatherChallenge::new("Sun Seeker", "Enjoy a sunny day outdoors", ConditionTag::Clear, 10),
        WeatherChallenge::new("Snow Explorer", "Experience a snowy day", ConditionTag::Snow, 20),
        WeatherChallenge::new(
            "Weather Warrior",
            "Check the weather 7 days in a row",
            ConditionTag::Streak,
            25,
        ),
        WeatherChallenge::new(
            "Hot Day Hydration",
            "Stay hydrated when temperature is above 30°C",
            ConditionTag::Hot,
            15,
        ),
        WeatherChallenge::new(
            "Cold Day Cozy",
            "Stay warm when temperature is below 0°C",
            ConditionTag::Cold,
            15,
        ),
    ]
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeOutcome {
    /// Input list, same order, with newly completed entries replaced in place.
    pub challenges: Vec<WeatherChallenge>,
    pub points_awarded: u32,
    /// Challenges that completed in this pass, in list order.
    pub newly_completed: Vec<WeatherChallenge>,
}

/// Evaluate every incomplete challenge against `observation`.
///
/// Pure and idempotent: feeding the output back in with the same observation
/// awards nothing. An observation without condition entries completes nothing.
pub fn evaluate(observation: &WeatherObservation, challenges: &[WeatherChallenge]) -> ChallengeOutcome {
    let mut outcome = ChallengeOutcome {
        challenges: challenges.to_vec(),
        points_awarded: 0,
        newly_completed: Vec::new(),
    };

    let Some(primary) = observation.primary_condition() else {
        return outcome;
    };
    let condition = primary.main.to_lowercase();
    let temperature = observation.temperature();

    for slot in outcome.challenges.iter_mut() {
        if slot.is_completed || !slot.condition.is_met(&condition, temperature) {
            continue;
        }
        let done = slot.completed();
        outcome.points_awarded = outcome.points_awarded.saturating_add(done.points);
        outcome.newly_completed.push(done.clone());
        *slot = done;
    }

    outcome
}

/// Persisted challenge list plus the running point total.
pub struct ChallengeBoard {
    store: JsonStore,
    challenges: Vec<WeatherChallenge>,
    total_points: u32,
    /// False when a load could not read the store. Nothing is written back
    /// until a later load succeeds.
    writable: bool,
}

impl ChallengeBoard {
    /// Load from the store, generating (and saving) the defaults when none are
    /// stored or the stored list is undecodable.
    ///
    /// A failed read yields the defaults in memory only; the board stays
    /// read-only so stored progress is not overwritten.
    pub fn load(store: JsonStore) -> Self {
        let loaded = store.load_or_else(StorageKey::Challenges, default_challenges);
        let points = store.load_or_default::<u32>(StorageKey::TotalPoints);
        let writable = !loaded.read_failed() && !points.read_failed();

        match loaded.source {
            LoadSource::Missing | LoadSource::Corrupt => {
                tracing::info!("Generated default challenges");
                store.persist(StorageKey::Challenges, &loaded.value);
            }
            LoadSource::Unavailable => {
                tracing::warn!("Challenges unreadable; progress will not be saved this session");
            }
            LoadSource::Stored => {}
        }

        Self {
            store,
            challenges: loaded.value,
            total_points: points.into_inner(),
            writable,
        }
    }

    pub fn challenges(&self) -> &[WeatherChallenge] {
        &self.challenges
    }

    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    /// Evaluate and persist. Returns the challenges completed by this observation.
    ///
    /// Challenges are written before points; the two keys are not updated atomically.
    pub fn apply(&mut self, observation: &WeatherObservation) -> Vec<WeatherChallenge> {
        let outcome = evaluate(observation, &self.challenges);
        if outcome.newly_completed.is_empty() {
            return Vec::new();
        }

        self.challenges = outcome.challenges;
        self.total_points = self.total_points.saturating_add(outcome.points_awarded);
        tracing::info!(
            "{} challenge(s) completed, +{} points (total {})",
            outcome.newly_completed.len(),
            outcome.points_awarded,
            self.total_points
        );

        self.save();
        outcome.newly_completed
    }

    /// Regenerate the defaults with fresh ids. Points are kept.
    pub fn reset(&mut self) {
        self.challenges = default_challenges();
        if self.writable {
            self.store.persist(StorageKey::Challenges, &self.challenges);
        }
    }

    fn save(&self) {
        if !self.writable {
            tracing::warn!("Skipping challenge save after a failed load");
            return;
        }
        self.store.persist(StorageKey::Challenges, &self.challenges);
        self.store.persist(StorageKey::TotalPoints, &self.total_points);
    }
}
