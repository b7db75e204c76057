//! User-managed saved locations.
//!
//! No duplicate detection: adding the same city twice stores it twice.

use meteoros_core::ValidationError;
use meteoros_weather::Coordinates;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{JsonStore, StorageKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl SavedLocation {
    /// New location with a fresh id. Rejects coordinates outside the globe.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(ValidationError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latitude,
            longitude,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

pub struct LocationBook {
    store: JsonStore,
    locations: Vec<SavedLocation>,
    /// False after a load that could not read the store.
    writable: bool,
}

impl LocationBook {
    /// Load the saved list. After a failed read the book starts empty and
    /// changes stay in memory until a later load succeeds.
    pub fn load(store: JsonStore) -> Self {
        let loaded = store.load_or_default::<Vec<SavedLocation>>(StorageKey::SavedLocations);
        let writable = !loaded.read_failed();
        if !writable {
            tracing::warn!("Saved locations unreadable; changes will not be saved this session");
        }
        Self {
            store,
            locations: loaded.into_inner(),
            writable,
        }
    }

    pub fn all(&self) -> &[SavedLocation] {
        &self.locations
    }

    pub fn add(&mut self, location: SavedLocation) {
        tracing::debug!("Saving location {} ({})", location.name, location.id);
        self.locations.push(location);
        self.save();
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.locations.len();
        self.locations.retain(|l| l.id != id);
        let removed = self.locations.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    fn save(&self) {
        if !self.writable {
            tracing::warn!("Skipping location save after a failed load");
            return;
        }
        self.store.persist(StorageKey::SavedLocations, &self.locations);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::store::FlakyKvStore;
    use std::sync::Arc;

    #[test]
    fn test_add_keeps_duplicates_and_persists() {
        let store = JsonStore::in_memory();
        let mut book = LocationBook::load(store.clone());

        book.add(SavedLocation::new("Paris", 48.8566, 2.3522).unwrap());
        book.add(SavedLocation::new("Paris", 48.8566, 2.3522).unwrap());

        let reloaded = LocationBook::load(store);
        assert_eq!(reloaded.all().len(), 2);
        assert_ne!(reloaded.all()[0].id, reloaded.all()[1].id);
    }

    #[test]
    fn test_remove_by_id() {
        let mut book = LocationBook::load(JsonStore::in_memory());
        let oslo = SavedLocation::new("Oslo", 59.91, 10.75).unwrap();
        let oslo_id = oslo.id;
        book.add(oslo);
        book.add(SavedLocation::new("Lima", -12.05, -77.04).unwrap());

        assert!(book.remove(oslo_id));
        assert!(!book.remove(oslo_id));
        assert_eq!(book.all().len(), 1);
        assert_eq!(book.all()[0].name, "Lima");
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let err = SavedLocation::new("Nowhere", 91.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCoordinates {
                latitude: 91.0,
                longitude: 0.0
            }
        );
        assert!(SavedLocation::new("Nowhere", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_failed_read_does_not_overwrite_saved_list() {
        let backend = Arc::new(FlakyKvStore::default());
        let store = JsonStore::new(backend.clone());
        let mut book = LocationBook::load(store.clone());
        book.add(SavedLocation::new("Paris", 48.8566, 2.3522).unwrap());
        book.add(SavedLocation::new("Oslo", 59.9139, 10.7522).unwrap());

        backend.fail_next_reads(1);
        let mut degraded = LocationBook::load(store.clone());
        assert!(degraded.all().is_empty());
        degraded.add(SavedLocation::new("Rome", 41.9028, 12.4964).unwrap());
        assert_eq!(degraded.all().len(), 1);

        let reloaded = LocationBook::load(store);
        let names: Vec<&str> = reloaded.all().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Oslo"]);
    }
}
