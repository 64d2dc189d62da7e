use std::fmt;

use tracing::{info, warn};

use crate::storage::{KeyValueStore, BASE_LAYER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BaseLayer {
    #[default]
    Satellite,
    Atlas,
    Grid,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Satellite, BaseLayer::Atlas, BaseLayer::Grid];

    pub fn id(self) -> &'static str {
        match self {
            BaseLayer::Satellite => "satellite",
            BaseLayer::Atlas => "atlas",
            BaseLayer::Grid => "grid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BaseLayer::Satellite => "Satellite",
            BaseLayer::Atlas => "Atlas",
            BaseLayer::Grid => "Grid",
        }
    }

    pub fn from_id(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.id() == raw)
    }

    /// Deepest zoom with real imagery; deeper views upscale these tiles.
    pub fn native_max_zoom(self) -> i32 {
        match self {
            BaseLayer::Satellite => 8,
            BaseLayer::Atlas | BaseLayer::Grid => 5,
        }
    }

    pub fn tile_extension(self) -> &'static str {
        match self {
            BaseLayer::Satellite | BaseLayer::Atlas => "jpg",
            BaseLayer::Grid => "png",
        }
    }

    pub fn load(storage: &dyn KeyValueStore) -> Self {
        match storage.get(BASE_LAYER_KEY) {
            Some(raw) => Self::from_id(&raw).unwrap_or_else(|| {
                warn!(stored = raw.as_str(), "base_layer_unknown");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn persist(self, storage: &mut dyn KeyValueStore) {
        if let Err(error) = storage.set(BASE_LAYER_KEY, self.id()) {
            warn!(error = %error, "base_layer_persist_failed");
        }
        info!(layer = self.id(), "base_layer_changed");
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayGroup {
    Examples,
    SavedMarkers,
}

impl OverlayGroup {
    pub const ALL: [OverlayGroup; 2] = [OverlayGroup::Examples, OverlayGroup::SavedMarkers];

    pub fn label(self) -> &'static str {
        match self {
            OverlayGroup::Examples => "Example Markers",
            OverlayGroup::SavedMarkers => "Saved Markers",
        }
    }
}

/// Session-only visibility of the overlay groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayVisibility {
    examples: bool,
    saved_markers: bool,
}

impl Default for OverlayVisibility {
    fn default() -> Self {
        Self {
            examples: true,
            saved_markers: true,
        }
    }
}

impl OverlayVisibility {
    pub fn is_visible(&self, group: OverlayGroup) -> bool {
        match group {
            OverlayGroup::Examples => self.examples,
            OverlayGroup::SavedMarkers => self.saved_markers,
        }
    }

    pub fn toggle(&mut self, group: OverlayGroup) -> bool {
        let flag = match group {
            OverlayGroup::Examples => &mut self.examples,
            OverlayGroup::SavedMarkers => &mut self.saved_markers,
        };
        *flag = !*flag;
        *flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[test]
    fn layer_choice_round_trips() {
        let mut storage = MemoryKeyValueStore::new();
        assert_eq!(BaseLayer::load(&storage), BaseLayer::Satellite);

        BaseLayer::Grid.persist(&mut storage);

        assert_eq!(storage.get(BASE_LAYER_KEY).as_deref(), Some("grid"));
        assert_eq!(BaseLayer::load(&storage), BaseLayer::Grid);
    }

    #[test]
    fn unknown_stored_layer_falls_back_to_satellite() {
        let storage = MemoryKeyValueStore::new().with_entry(BASE_LAYER_KEY, "terrain");
        assert_eq!(BaseLayer::load(&storage), BaseLayer::Satellite);
    }

    #[test]
    fn native_zoom_limits_match_imagery() {
        assert_eq!(BaseLayer::Satellite.native_max_zoom(), 8);
        assert_eq!(BaseLayer::Atlas.native_max_zoom(), 5);
        assert_eq!(BaseLayer::Grid.tile_extension(), "png");
    }

    #[test]
    fn overlays_start_visible_and_toggle() {
        let mut overlays = OverlayVisibility::default();
        assert!(overlays.is_visible(OverlayGroup::Examples));
        assert!(!overlays.toggle(OverlayGroup::Examples));
        assert!(!overlays.is_visible(OverlayGroup::Examples));
        assert!(overlays.is_visible(OverlayGroup::SavedMarkers));
        assert!(overlays.toggle(OverlayGroup::Examples));
    }
}
