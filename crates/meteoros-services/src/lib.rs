pub mod challenges;
pub mod locations;
pub mod notes;
pub mod notifications;
pub mod settings;
pub mod state;
pub mod store;

pub use challenges::{
    default_challenges, evaluate, ChallengeBoard, ChallengeOutcome, ConditionTag,
    WeatherChallenge,
};
pub use locations::{LocationBook, SavedLocation};
pub use notes::{NoteBook, WeatherNote};
pub use notifications::{
    AuthorizationStatus, InMemoryNotificationCenter, NotificationCenter, NotificationContent,
    NotificationRequest, NotificationService, NotificationSound, NotificationTrigger,
    DAILY_FORECAST_ID, MORNING_WEATHER_ID,
};
pub use settings::{AppSettings, NotificationSettings, SettingsStore};
pub use state::{RefreshOutcome, WeatherSnapshot, WeatherState};
pub use store::{
    JsonStore, KeyValueStore, LoadSource, Loaded, MemoryKvStore, SqliteKvStore, StorageKey,
};
