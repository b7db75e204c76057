//! Personal weather journal, kept newest-first.

use chrono::{DateTime, Local, NaiveDate, Utc};
use meteoros_core::ValidationError;
use meteoros_weather::WeatherObservation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{JsonStore, StorageKey};

fn validate_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyNoteText);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherNote {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub text: String,
    pub city_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl WeatherNote {
    /// New note stamped now. Text is trimmed and must not be empty.
    pub fn new(text: &str, city_name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            text: validate_text(text)?,
            city_name: city_name.into(),
            temperature: None,
            weather_condition: None,
            emoji: None,
        })
    }

    /// Attach the temperature and primary condition description of `observation`.
    pub fn with_snapshot(mut self, observation: &WeatherObservation) -> Self {
        self.temperature = Some(observation.temperature());
        self.weather_condition = observation
            .primary_condition()
            .map(|c| c.description.clone());
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Calendar day of the note in local time.
    pub fn local_date(&self) -> NaiveDate {
        self.date.with_timezone(&Local).date_naive()
    }
}

pub struct NoteBook {
    store: JsonStore,
    notes: Vec<WeatherNote>,
}

impl NoteBook {
    pub fn load(store: JsonStore) -> Self {
        let mut notes = store
            .load_or_default::<Vec<WeatherNote>>(StorageKey::Notes)
            .into_inner();
        notes.sort_by(|a, b| b.date.cmp(&a.date));
        Self { store, notes }
    }

    pub fn all(&self) -> &[WeatherNote] {
        &self.notes
    }

    /// Insert at the front.
    pub fn add(&mut self, note: WeatherNote) {
        self.notes.insert(0, note);
        self.save();
    }

    /// Replace the text of note `id`. Returns `Ok(false)` when no such note exists.
    pub fn update_text(&mut self, id: Uuid, text: &str) -> Result<bool, ValidationError> {
        let text = validate_text(text)?;
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.text = text;
        self.save();
        Ok(true)
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    pub fn notes_on(&self, date: NaiveDate) -> Vec<&WeatherNote> {
        self.notes.iter().filter(|n| n.local_date() == date).collect()
    }

    pub fn today(&self) -> Vec<&WeatherNote> {
        self.notes_on(Local::now().date_naive())
    }

    pub fn clear_all(&mut self) {
        self.notes.clear();
        self.save();
    }

    fn save(&self) {
        self.store.persist(StorageKey::Notes, &self.notes);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_empty_text_rejected() {
        assert_eq!(
            WeatherNote::new("   ", "Oslo").unwrap_err(),
            ValidationError::EmptyNoteText
        );
    }

    #[test]
    fn test_add_inserts_at_front_and_persists() {
        let store = JsonStore::in_memory();
        let mut book = NoteBook::load(store.clone());

        book.add(WeatherNote::new("first", "Oslo").unwrap());
        book.add(WeatherNote::new("second", "Oslo").unwrap().with_emoji("☔"));

        assert_eq!(book.all()[0].text, "second");

        let reloaded = NoteBook::load(store);
        assert_eq!(reloaded.all().len(), 2);
        assert_eq!(reloaded.all()[0].emoji.as_deref(), Some("☔"));
    }

    #[test]
    fn test_load_sorts_newest_first() {
        let store = JsonStore::in_memory();
        let mut older = WeatherNote::new("older", "Rome").unwrap();
        older.date -= Duration::days(2);
        let newer = WeatherNote::new("newer", "Rome").unwrap();
        store.save(StorageKey::Notes, &vec![older, newer]).unwrap();

        let book = NoteBook::load(store);
        assert_eq!(book.all()[0].text, "newer");
        assert_eq!(book.all()[1].text, "older");
    }

    #[test]
    fn test_update_and_delete() {
        let mut book = NoteBook::load(JsonStore::in_memory());
        let note = WeatherNote::new("draft", "Kyiv").unwrap();
        let id = note.id;
        book.add(note);

        assert!(book.update_text(id, " final ").unwrap());
        assert_eq!(book.all()[0].text, "final");
        assert!(book.update_text(id, "").is_err());
        assert!(!book.update_text(Uuid::new_v4(), "x").unwrap());

        assert!(book.delete(id));
        assert!(book.all().is_empty());
    }

    #[test]
    fn test_notes_on_filters_by_local_day() {
        let mut book = NoteBook::load(JsonStore::in_memory());
        let mut old = WeatherNote::new("last week", "Lima").unwrap();
        old.date -= Duration::days(7);
        book.add(old);
        book.add(WeatherNote::new("today", "Lima").unwrap());

        let today = book.today();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].text, "today");

        let week_ago = (Local::now() - Duration::days(7)).date_naive();
        assert_eq!(book.notes_on(week_ago).len(), 1);
    }

    #[test]
    fn test_with_snapshot_records_reading() {
        let obs: WeatherObservation = serde_json::from_value(serde_json::json!({
            "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
            "main": {"temp": 14.5, "feels_like": 13.0, "temp_min": 12.0, "temp_max": 16.0, "pressure": 1012, "humidity": 60},
            "dt": 1700000000,
            "name": "Dublin"
        }))
        .unwrap();

        let note = WeatherNote::new("cloudy walk", "Dublin").unwrap().with_snapshot(&obs);
        assert_eq!(note.temperature, Some(14.5));
        assert_eq!(note.weather_condition.as_deref(), Some("few clouds"));
    }

    #[test]
    fn test_clear_all() {
        let store = JsonStore::in_memory();
        let mut book = NoteBook::load(store.clone());
        book.add(WeatherNote::new("a", "x").unwrap());

        book.clear_all();

        assert!(NoteBook::load(store).all().is_empty());
    }
}
