use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, MARKERS_KEY};

use super::record::{creation_timestamp, MarkerId, MarkerPatch, MarkerRecord, DEFAULT_MARKER_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("X"),
            Axis::Y => f.write_str("Y"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerInputError {
    #[error("Please enter both X and Y coordinates")]
    MissingCoordinates,
    #[error("{axis} coordinate '{value}' is not a valid number")]
    InvalidCoordinate { axis: Axis, value: String },
}

/// Ordered marker list mirrored into the key/value store under
/// [`MARKERS_KEY`]. Every mutation rewrites the whole list.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    records: Vec<MarkerRecord>,
}

impl MarkerStore {
    pub fn load_all(storage: &dyn KeyValueStore) -> Self {
        let Some(raw) = storage.get(MARKERS_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<Vec<MarkerRecord>>(&raw) {
            Ok(records) => {
                info!(marker_count = records.len(), "markers_loaded");
                Self { records }
            }
            Err(error) => {
                warn!(error = %error, "storage_load_failed");
                Self::default()
            }
        }
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &MarkerId) -> Option<&MarkerRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn contains(&self, id: &MarkerId) -> bool {
        self.get(id).is_some()
    }

    pub fn create(
        &mut self,
        storage: &mut dyn KeyValueStore,
        raw_x: &str,
        raw_y: &str,
        name: Option<&str>,
    ) -> Result<MarkerRecord, MarkerInputError> {
        let (x, y) = parse_coordinate_pair(raw_x, raw_y)?;
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_marker_name(self.records.len()),
        };

        let record = MarkerRecord {
            id: self.unused_id(),
            x,
            y,
            name,
            timestamp: creation_timestamp(),
            color: DEFAULT_MARKER_COLOR.to_string(),
        };
        self.records.push(record.clone());
        self.persist(storage);
        info!(
            id = %record.id,
            x = record.x,
            y = record.y,
            name = record.name.as_str(),
            "marker_created"
        );
        Ok(record)
    }

    pub fn update(
        &mut self,
        storage: &mut dyn KeyValueStore,
        id: &MarkerId,
        patch: &MarkerPatch,
    ) -> Option<MarkerRecord> {
        let Some(record) = self.records.iter_mut().find(|record| &record.id == id) else {
            debug!(id = %id, "marker_update_ignored_unknown_id");
            return None;
        };
        record.apply(patch);
        let updated = record.clone();
        self.persist(storage);
        info!(
            id = %updated.id,
            x = updated.x,
            y = updated.y,
            name = updated.name.as_str(),
            "marker_updated"
        );
        Some(updated)
    }

    pub fn delete(&mut self, storage: &mut dyn KeyValueStore, id: &MarkerId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        if self.records.len() == before {
            debug!(id = %id, "marker_delete_ignored_unknown_id");
            return false;
        }
        self.persist(storage);
        info!(id = %id, marker_count = self.records.len(), "marker_deleted");
        true
    }

    fn unused_id(&self) -> MarkerId {
        loop {
            let candidate = MarkerId::generate();
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn persist(&self, storage: &mut dyn KeyValueStore) {
        let json = match serde_json::to_string(&self.records) {
            Ok(json) => json,
            Err(error) => {
                warn!(error = %error, "marker_encode_failed");
                return;
            }
        };
        if let Err(error) = storage.set(MARKERS_KEY, &json) {
            warn!(error = %error, "marker_persist_failed");
        }
    }
}

pub fn default_marker_name(current_count: usize) -> String {
    format!("Marker {}", current_count + 1)
}

pub fn parse_coordinate_pair(raw_x: &str, raw_y: &str) -> Result<(f64, f64), MarkerInputError> {
    let raw_x = raw_x.trim();
    let raw_y = raw_y.trim();
    if raw_x.is_empty() || raw_y.is_empty() {
        return Err(MarkerInputError::MissingCoordinates);
    }
    Ok((
        parse_coordinate(Axis::X, raw_x)?,
        parse_coordinate(Axis::Y, raw_y)?,
    ))
}

pub fn parse_coordinate(axis: Axis, raw: &str) -> Result<f64, MarkerInputError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| MarkerInputError::InvalidCoordinate {
            axis,
            value: raw.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn persisted_len(storage: &MemoryKeyValueStore) -> usize {
        storage
            .get(MARKERS_KEY)
            .map(|raw| {
                serde_json::from_str::<Vec<MarkerRecord>>(&raw)
                    .expect("persisted json")
                    .len()
            })
            .unwrap_or(0)
    }

    #[test]
    fn create_parses_fields_and_persists_one_entry() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::load_all(&storage);
        let before = persisted_len(&storage);

        let record = store
            .create(&mut storage, "12.5", "-3.0", Some("Bank"))
            .expect("create");

        assert_eq!(record.x, 12.5);
        assert_eq!(record.y, -3.0);
        assert_eq!(record.name, "Bank");
        assert_eq!(record.color, DEFAULT_MARKER_COLOR);
        assert_eq!(store.len(), 1);
        assert_eq!(persisted_len(&storage), before + 1);
    }

    #[test]
    fn create_with_empty_x_is_rejected_without_side_effects() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();

        let result = store.create(&mut storage, "", "4", Some("Nope"));

        assert_eq!(result, Err(MarkerInputError::MissingCoordinates));
        assert!(store.is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn create_rejects_non_numeric_and_non_finite() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();

        assert!(matches!(
            store.create(&mut storage, "abc", "1", None),
            Err(MarkerInputError::InvalidCoordinate { axis: Axis::X, .. })
        ));
        assert!(matches!(
            store.create(&mut storage, "1", "inf", None),
            Err(MarkerInputError::InvalidCoordinate { axis: Axis::Y, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn default_name_reuses_store_size() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        let first = store.create(&mut storage, "1", "1", None).expect("first");
        let second = store.create(&mut storage, "2", "2", Some("  ")).expect("second");
        assert_eq!(first.name, "Marker 1");
        assert_eq!(second.name, "Marker 2");

        store.delete(&mut storage, &first.id);
        let third = store.create(&mut storage, "3", "3", None).expect("third");
        assert_eq!(third.name, "Marker 2");
    }

    #[test]
    fn ids_are_unique_across_rapid_creates() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        for index in 0..50 {
            store
                .create(&mut storage, &index.to_string(), "0", None)
                .expect("create");
        }
        let mut ids: Vec<_> = store.records().iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        let created = store
            .create(&mut storage, "5", "6", Some("Bank"))
            .expect("create");

        let updated = store
            .update(&mut storage, &created.id, &MarkerPatch::name("Vault"))
            .expect("update");

        assert_eq!(updated.name, "Vault");
        assert_eq!((updated.x, updated.y), (5.0, 6.0));
        assert_eq!(updated.timestamp, created.timestamp);
        let reloaded = MarkerStore::load_all(&storage);
        assert_eq!(reloaded.get(&created.id), Some(&updated));
    }

    #[test]
    fn update_of_unknown_id_returns_none_and_keeps_store() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        store.create(&mut storage, "1", "2", None).expect("create");
        let writes_before = storage.write_count();
        let snapshot = store.records().to_vec();

        let result = store.update(
            &mut storage,
            &MarkerId::new("missing-id"),
            &MarkerPatch::name("x"),
        );

        assert!(result.is_none());
        assert_eq!(store.records(), snapshot.as_slice());
        assert_eq!(storage.write_count(), writes_before);
    }

    #[test]
    fn delete_absent_id_is_noop() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        store.create(&mut storage, "1", "2", None).expect("create");

        assert!(!store.delete(&mut storage, &MarkerId::new("nope")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reload_restores_identical_records_in_order() {
        let mut storage = MemoryKeyValueStore::new();
        let mut store = MarkerStore::default();
        for (x, y, name) in [("1", "2", "A"), ("-3.25", "4", "B"), ("5", "-6.5", "C")] {
            store.create(&mut storage, x, y, Some(name)).expect("create");
        }

        let reloaded = MarkerStore::load_all(&storage);

        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn load_all_fails_soft_on_garbage() {
        let storage = MemoryKeyValueStore::new().with_entry(MARKERS_KEY, "[{\"id\": 3}");
        assert!(MarkerStore::load_all(&storage).is_empty());

        let storage = MemoryKeyValueStore::new().with_entry(MARKERS_KEY, "{\"not\":\"a list\"}");
        assert!(MarkerStore::load_all(&storage).is_empty());
    }

    #[test]
    fn load_all_accepts_browser_style_records() {
        let raw = r##"[{"id":"marker_1700000000000_abc123def","x":-1234.5,"y":250.75,"name":"Pier","timestamp":"2023-11-14T22:13:20.000Z","color":"#e74c3c"}]"##;
        let storage = MemoryKeyValueStore::new().with_entry(MARKERS_KEY, raw);

        let store = MarkerStore::load_all(&storage);

        assert_eq!(store.len(), 1);
        let record = &store.records()[0];
        assert_eq!(record.id.as_str(), "marker_1700000000000_abc123def");
        assert_eq!(record.position().x, -1234.5);
        assert_eq!(record.name, "Pier");
    }
}
