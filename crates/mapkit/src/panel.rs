use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::projection::{ScreenPoint, ScreenRect, Viewport};
use crate::storage::{KeyValueStore, PANEL_COLLAPSED_KEY, PANEL_POSITION_KEY};

pub const DEFAULT_PANEL_POSITION: PanelPosition = PanelPosition { x: 20.0, y: 20.0 };
pub const PANEL_EDGE_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanelGrab {
    kind: PointerKind,
    offset_x: f32,
    offset_y: f32,
}

/// Floating control panel placement: drag with margin clamping, collapse
/// toggle, and both persisted through the key/value store.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDragController {
    position: PanelPosition,
    collapsed: bool,
    grab: Option<PanelGrab>,
}

impl Default for PanelDragController {
    fn default() -> Self {
        Self {
            position: DEFAULT_PANEL_POSITION,
            collapsed: false,
            grab: None,
        }
    }
}

impl PanelDragController {
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let position = storage
            .get(PANEL_POSITION_KEY)
            .and_then(|raw| match serde_json::from_str::<PanelPosition>(&raw) {
                Ok(position) if position.x.is_finite() && position.y.is_finite() => Some(position),
                Ok(_) => None,
                Err(error) => {
                    warn!(error = %error, "panel_position_unparseable");
                    None
                }
            })
            .unwrap_or(DEFAULT_PANEL_POSITION);
        let collapsed = storage.get(PANEL_COLLAPSED_KEY).as_deref() == Some("true");
        debug!(x = position.x, y = position.y, collapsed, "panel_loaded");
        Self {
            position,
            collapsed,
            grab: None,
        }
    }

    pub fn position(&self) -> PanelPosition {
        self.position
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.collapsed {
            "Maximize"
        } else {
            "Minimize"
        }
    }

    /// Starts a grab when `pointer` lands on the header but outside every
    /// interactive region in `exclusions`.
    pub fn begin_drag(
        &mut self,
        kind: PointerKind,
        pointer: ScreenPoint,
        header: ScreenRect,
        exclusions: &[ScreenRect],
    ) -> bool {
        if self.grab.is_some() || !header.contains(pointer) {
            return false;
        }
        if exclusions.iter().any(|region| region.contains(pointer)) {
            return false;
        }
        self.grab = Some(PanelGrab {
            kind,
            offset_x: pointer.x - self.position.x,
            offset_y: pointer.y - self.position.y,
        });
        true
    }

    /// Moves the grabbed panel. Events from the other pointer kind are ignored.
    pub fn drag_to(
        &mut self,
        kind: PointerKind,
        pointer: ScreenPoint,
        panel_size: (f32, f32),
        viewport: Viewport,
    ) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };
        if grab.kind != kind {
            return false;
        }
        self.position = clamp_to_viewport(
            pointer.x - grab.offset_x,
            pointer.y - grab.offset_y,
            panel_size,
            viewport,
        );
        true
    }

    pub fn end_drag(&mut self, storage: &mut dyn KeyValueStore, kind: PointerKind) -> bool {
        match self.grab {
            Some(grab) if grab.kind == kind => {}
            _ => return false,
        }
        self.grab = None;
        match serde_json::to_string(&self.position) {
            Ok(json) => {
                if let Err(error) = storage.set(PANEL_POSITION_KEY, &json) {
                    warn!(error = %error, "panel_position_persist_failed");
                }
            }
            Err(error) => warn!(error = %error, "panel_position_encode_failed"),
        }
        info!(x = self.position.x, y = self.position.y, "panel_moved");
        true
    }

    pub fn toggle_collapsed(&mut self, storage: &mut dyn KeyValueStore) -> bool {
        self.collapsed = !self.collapsed;
        let value = if self.collapsed { "true" } else { "false" };
        if let Err(error) = storage.set(PANEL_COLLAPSED_KEY, value) {
            warn!(error = %error, "panel_collapsed_persist_failed");
        }
        debug!(collapsed = self.collapsed, "panel_collapse_toggled");
        self.collapsed
    }
}

/// Keeps the panel `PANEL_EDGE_MARGIN` inside the viewport. The far edges
/// win when the panel is larger than the viewport.
fn clamp_to_viewport(
    mut x: f32,
    mut y: f32,
    (width, height): (f32, f32),
    viewport: Viewport,
) -> PanelPosition {
    let viewport_w = viewport.width as f32;
    let viewport_h = viewport.height as f32;
    if x < PANEL_EDGE_MARGIN {
        x = PANEL_EDGE_MARGIN;
    }
    if y < PANEL_EDGE_MARGIN {
        y = PANEL_EDGE_MARGIN;
    }
    if x + width > viewport_w - PANEL_EDGE_MARGIN {
        x = viewport_w - width - PANEL_EDGE_MARGIN;
    }
    if y + height > viewport_h - PANEL_EDGE_MARGIN {
        y = viewport_h - height - PANEL_EDGE_MARGIN;
    }
    PanelPosition { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };
    const PANEL_SIZE: (f32, f32) = (300.0, 200.0);

    fn header_at(position: PanelPosition) -> ScreenRect {
        ScreenRect::new(position.x, position.y, PANEL_SIZE.0, 30.0)
    }

    fn assert_inside_margin(position: PanelPosition) {
        assert!(position.x >= PANEL_EDGE_MARGIN, "{position:?}");
        assert!(position.y >= PANEL_EDGE_MARGIN, "{position:?}");
        assert!(position.x + PANEL_SIZE.0 <= VIEWPORT.width as f32 - PANEL_EDGE_MARGIN);
        assert!(position.y + PANEL_SIZE.1 <= VIEWPORT.height as f32 - PANEL_EDGE_MARGIN);
    }

    #[test]
    fn defaults_when_nothing_stored() {
        let panel = PanelDragController::load(&MemoryKeyValueStore::new());
        assert_eq!(panel.position(), DEFAULT_PANEL_POSITION);
        assert!(!panel.is_collapsed());
        assert_eq!(panel.toggle_label(), "Minimize");
    }

    #[test]
    fn drag_stays_inside_margin_for_both_pointer_kinds() {
        for kind in [PointerKind::Mouse, PointerKind::Touch] {
            let mut storage = MemoryKeyValueStore::new();
            let mut panel = PanelDragController::default();
            let grab_point = ScreenPoint::new(30.0, 25.0);
            assert!(panel.begin_drag(kind, grab_point, header_at(panel.position()), &[]));

            for target in [
                ScreenPoint::new(-500.0, -500.0),
                ScreenPoint::new(5000.0, 25.0),
                ScreenPoint::new(400.0, 9000.0),
                ScreenPoint::new(200.0, 150.0),
            ] {
                assert!(panel.drag_to(kind, target, PANEL_SIZE, VIEWPORT));
                assert_inside_margin(panel.position());
            }
            assert!(panel.end_drag(&mut storage, kind));
            assert!(!panel.is_dragging());
        }
    }

    #[test]
    fn press_on_excluded_region_does_not_grab() {
        let mut panel = PanelDragController::default();
        let toggle = ScreenRect::new(290.0, 22.0, 24.0, 24.0);
        let on_toggle = ScreenPoint::new(300.0, 30.0);

        assert!(!panel.begin_drag(
            PointerKind::Mouse,
            on_toggle,
            header_at(panel.position()),
            &[toggle]
        ));
        assert!(!panel.is_dragging());
        assert!(!panel.drag_to(PointerKind::Mouse, ScreenPoint::new(400.0, 400.0), PANEL_SIZE, VIEWPORT));
        assert_eq!(panel.position(), DEFAULT_PANEL_POSITION);
    }

    #[test]
    fn press_outside_header_does_not_grab() {
        let mut panel = PanelDragController::default();
        assert!(!panel.begin_drag(
            PointerKind::Mouse,
            ScreenPoint::new(100.0, 150.0),
            header_at(panel.position()),
            &[]
        ));
    }

    #[test]
    fn other_pointer_kind_is_ignored_mid_grab() {
        let mut storage = MemoryKeyValueStore::new();
        let mut panel = PanelDragController::default();
        panel.begin_drag(
            PointerKind::Touch,
            ScreenPoint::new(25.0, 25.0),
            header_at(panel.position()),
            &[],
        );

        assert!(!panel.drag_to(PointerKind::Mouse, ScreenPoint::new(300.0, 300.0), PANEL_SIZE, VIEWPORT));
        assert!(!panel.end_drag(&mut storage, PointerKind::Mouse));
        assert!(panel.is_dragging());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn position_and_collapsed_round_trip_through_storage() {
        let mut storage = MemoryKeyValueStore::new();
        let mut panel = PanelDragController::default();
        panel.begin_drag(
            PointerKind::Mouse,
            ScreenPoint::new(25.0, 25.0),
            header_at(panel.position()),
            &[],
        );
        panel.drag_to(PointerKind::Mouse, ScreenPoint::new(105.0, 65.0), PANEL_SIZE, VIEWPORT);
        panel.end_drag(&mut storage, PointerKind::Mouse);
        assert!(panel.toggle_collapsed(&mut storage));

        assert_eq!(storage.get(PANEL_COLLAPSED_KEY).as_deref(), Some("true"));
        let reloaded = PanelDragController::load(&storage);
        assert_eq!(reloaded.position(), PanelPosition { x: 100.0, y: 60.0 });
        assert!(reloaded.is_collapsed());
        assert_eq!(reloaded.toggle_label(), "Maximize");
    }

    #[test]
    fn unparseable_position_falls_back_to_default() {
        let storage = MemoryKeyValueStore::new().with_entry(PANEL_POSITION_KEY, "{\"x\":\"left\"}");
        assert_eq!(
            PanelDragController::load(&storage).position(),
            DEFAULT_PANEL_POSITION
        );
    }

    #[test]
    fn oversized_panel_pins_to_far_edges() {
        let position = clamp_to_viewport(50.0, 50.0, (900.0, 700.0), VIEWPORT);
        assert_eq!(position, PanelPosition { x: -110.0, y: -110.0 });
    }
}
