use std::fmt;
use std::time::Instant;

use tracing::{debug, info};

use crate::feedback::Feedback;
use crate::interaction::{MapEvent, MapInteraction};
use crate::layers::{BaseLayer, OverlayGroup, OverlayVisibility};
use crate::markers::{parse_hex_color, MarkerId, MarkerInputError, MarkerPatch, MarkerRecord, MarkerStore};
use crate::panel::{PanelDragController, PointerKind};
use crate::projection::{MapCamera, ScreenPoint, ScreenRect, Viewport, WorldPoint};
use crate::session::{CoordinateFill, EditFormError, EditSession};
use crate::storage::KeyValueStore;
use crate::surface::{GlyphState, MapSurface, MarkerGlyph, MarkerLayer, Popup, PopupAction};

pub const EXAMPLE_MARKER_ID: &str = "example_welcome";
const EXAMPLE_MARKER_COLOR: &str = "#3498db";
const EXAMPLE_POPUP_TITLE: &str = "Welcome to the map!";
const EXAMPLE_POPUP_LINES: [&str; 4] = [
    "Double-click anywhere on the map to copy coordinates",
    "Drag markers to move them (edit mode only)",
    "Click markers to edit them",
    "Drag the control panel anywhere",
];

/// Blocking message shown to the user until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAlert {
    message: String,
}

impl UserAlert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for UserAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<MarkerInputError> for UserAlert {
    fn from(error: MarkerInputError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<EditFormError> for UserAlert {
    fn from(error: EditFormError) -> Self {
        Self::new(error.to_string())
    }
}

/// Application state for one map session. Every mutation goes through the
/// marker store and ends with a full rebuild of the marker layer.
#[derive(Debug)]
pub struct MapController<S: KeyValueStore> {
    storage: S,
    markers: MarkerStore,
    session: EditSession,
    panel: PanelDragController,
    base_layer: BaseLayer,
    overlays: OverlayVisibility,
    feedback: Feedback,
    layer: MarkerLayer,
    interaction: MapInteraction,
}

impl<S: KeyValueStore> MapController<S> {
    pub fn new(storage: S, camera: MapCamera, now: Instant) -> Self {
        let markers = MarkerStore::load_all(&storage);
        let panel = PanelDragController::load(&storage);
        let base_layer = BaseLayer::load(&storage);
        info!(
            marker_count = markers.len(),
            base_layer = base_layer.id(),
            panel_collapsed = panel.is_collapsed(),
            "map_session_restored"
        );
        let mut controller = Self {
            storage,
            markers,
            session: EditSession::new(),
            panel,
            base_layer,
            overlays: OverlayVisibility::default(),
            feedback: Feedback::new(now),
            layer: MarkerLayer::new(camera),
            interaction: MapInteraction::new(),
        };
        controller.rerender();
        controller
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Form text editing only; selection changes go through the controller.
    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    pub fn panel(&self) -> &PanelDragController {
        &self.panel
    }

    pub fn base_layer(&self) -> BaseLayer {
        self.base_layer
    }

    pub fn overlays(&self) -> &OverlayVisibility {
        &self.overlays
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    pub fn is_dragging_marker(&self) -> bool {
        self.interaction.is_dragging_marker()
    }

    pub fn place_marker(&mut self, now: Instant) -> Result<MarkerRecord, UserAlert> {
        let form = self.session.entry_form().clone();
        let record = self
            .markers
            .create(&mut self.storage, &form.x, &form.y, Some(&form.name))?;
        self.session.entry_form_mut().clear();
        self.feedback
            .show_toast(format!("Marker placed: {}", record.name), now);
        self.select_marker(&record.id);
        Ok(record)
    }

    pub fn select_marker(&mut self, id: &MarkerId) -> bool {
        let Some(record) = self.markers.get(id).cloned() else {
            debug!(id = %id, "select_ignored_unknown_id");
            return false;
        };
        self.session.select(&record);
        self.layer.pan_to(record.position());
        self.layer.open_popup(marker_popup(&record));
        self.rerender();
        debug!(id = %id, "marker_selected");
        true
    }

    pub fn exit_edit(&mut self) {
        self.session.exit_edit();
        self.layer.close_popup();
        self.rerender();
    }

    /// Applies the edit form to the selected marker. `Ok(None)` when nothing
    /// is selected.
    pub fn save_edit(&mut self) -> Result<Option<MarkerRecord>, UserAlert> {
        let Some(id) = self.session.selected_id().cloned() else {
            return Ok(None);
        };
        let patch = self.session.edit_form().to_patch()?;
        let updated = self.apply_update(&id, &patch);
        self.exit_edit();
        Ok(updated)
    }

    /// Leaves edit mode without saving the form. Positions already committed
    /// by a drag stay committed.
    pub fn cancel_edit(&mut self) {
        self.exit_edit();
    }

    pub fn delete_marker(&mut self, id: &MarkerId) -> bool {
        if !self.markers.delete(&mut self.storage, id) {
            return false;
        }
        if self.session.is_selected(id) {
            self.exit_edit();
        } else {
            self.rerender();
        }
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.session.selected_id().cloned() {
            Some(id) => self.delete_marker(&id),
            None => false,
        }
    }

    pub fn handle_map_double_click(&mut self, position: WorldPoint, now: Instant) -> CoordinateFill {
        let fill = self.session.fill_coordinates(position);
        self.feedback.show_ripple(position, now);
        self.feedback.hide_tooltip();
        self.feedback.show_toast(fill.notification(), now);
        fill
    }

    pub fn handle_marker_drag_release(
        &mut self,
        id: &MarkerId,
        position: WorldPoint,
    ) -> Option<MarkerRecord> {
        if !self.session.is_draggable(id) {
            self.rerender();
            return None;
        }
        let updated = self.apply_update(id, &MarkerPatch::position(position))?;
        self.session.echo_drag_position(updated.position());
        Some(updated)
    }

    pub fn show_example_popup(&mut self) {
        self.layer.open_popup(Popup {
            marker: MarkerId::new(EXAMPLE_MARKER_ID),
            group: OverlayGroup::Examples,
            position: WorldPoint::default(),
            title: EXAMPLE_POPUP_TITLE.to_string(),
            lines: EXAMPLE_POPUP_LINES.iter().map(|line| line.to_string()).collect(),
            actions: Vec::new(),
        });
    }

    /// Runs a button from the open popup against the marker it belongs to.
    pub fn apply_popup_action(&mut self, action: PopupAction) -> bool {
        let Some(popup) = self.layer.popup() else {
            return false;
        };
        if !popup.actions.contains(&action) {
            return false;
        }
        let id = popup.marker.clone();
        debug!(id = %id, action = action.label(), "popup_action");
        match action {
            PopupAction::Edit => self.select_marker(&id),
            PopupAction::Delete => self.delete_marker(&id),
        }
    }

    pub fn map_pointer_down(&mut self, point: ScreenPoint, viewport: Viewport) {
        self.interaction.pointer_down(&self.layer, point, viewport);
    }

    pub fn map_pointer_moved(&mut self, point: ScreenPoint, viewport: Viewport) {
        self.interaction
            .pointer_moved(&mut self.layer, point, viewport);
    }

    pub fn map_pointer_up(
        &mut self,
        point: ScreenPoint,
        viewport: Viewport,
        now: Instant,
    ) -> Option<CoordinateFill> {
        let event = self
            .interaction
            .pointer_up(&mut self.layer, point, viewport, now)?;
        match event {
            MapEvent::MarkerClicked {
                group: OverlayGroup::Examples,
                ..
            } => {
                self.show_example_popup();
                None
            }
            MapEvent::MarkerClicked { id, .. } => {
                self.select_marker(&id);
                None
            }
            MapEvent::MarkerDragReleased { id, position } => {
                self.handle_marker_drag_release(&id, position);
                None
            }
            MapEvent::MapClicked => {
                self.layer.close_popup();
                None
            }
            MapEvent::DoubleClicked { position } => Some(self.handle_map_double_click(position, now)),
        }
    }

    pub fn cancel_map_pointer(&mut self) {
        self.interaction.cancel(&mut self.layer);
    }

    pub fn zoom_by(&mut self, steps: i32) {
        self.layer.camera_mut().apply_zoom_steps(steps);
    }

    pub fn set_base_layer(&mut self, layer: BaseLayer) {
        if self.base_layer == layer {
            return;
        }
        self.base_layer = layer;
        layer.persist(&mut self.storage);
    }

    pub fn toggle_overlay(&mut self, group: OverlayGroup) -> bool {
        let visible = self.overlays.toggle(group);
        debug!(group = group.label(), visible, "overlay_toggled");
        self.rerender();
        visible
    }

    pub fn toggle_panel_collapsed(&mut self) -> bool {
        self.panel.toggle_collapsed(&mut self.storage)
    }

    pub fn begin_panel_drag(
        &mut self,
        kind: PointerKind,
        pointer: ScreenPoint,
        header: ScreenRect,
        exclusions: &[ScreenRect],
    ) -> bool {
        self.panel.begin_drag(kind, pointer, header, exclusions)
    }

    pub fn drag_panel(
        &mut self,
        kind: PointerKind,
        pointer: ScreenPoint,
        panel_size: (f32, f32),
        viewport: Viewport,
    ) -> bool {
        self.panel.drag_to(kind, pointer, panel_size, viewport)
    }

    pub fn end_panel_drag(&mut self, kind: PointerKind) -> bool {
        self.panel.end_drag(&mut self.storage, kind)
    }

    pub fn dismiss_welcome(&mut self) {
        self.feedback.dismiss_welcome();
    }

    pub fn tick(&mut self, now: Instant) {
        self.feedback.tick(now);
    }

    fn apply_update(&mut self, id: &MarkerId, patch: &MarkerPatch) -> Option<MarkerRecord> {
        let updated = self.markers.update(&mut self.storage, id, patch);
        if let Some(record) = updated.as_ref() {
            self.session.refresh_selected(record);
        }
        self.rerender();
        updated
    }

    /// Tears down every glyph and rebuilds them from the store.
    fn rerender(&mut self) {
        self.layer.clear_markers();
        if self.overlays.is_visible(OverlayGroup::Examples) {
            self.layer.place_marker(MarkerGlyph {
                id: MarkerId::new(EXAMPLE_MARKER_ID),
                group: OverlayGroup::Examples,
                position: WorldPoint::default(),
                name: "Welcome".to_string(),
                rgba: parse_hex_color(EXAMPLE_MARKER_COLOR).unwrap_or([52, 152, 219, 255]),
                state: GlyphState::Normal,
                draggable: false,
            });
        }
        if self.overlays.is_visible(OverlayGroup::SavedMarkers) {
            for record in self.markers.records() {
                self.layer.place_marker(MarkerGlyph {
                    id: record.id.clone(),
                    group: OverlayGroup::SavedMarkers,
                    position: record.position(),
                    name: record.name.clone(),
                    rgba: record.rgba(),
                    state: self.session.glyph_state_for(&record.id),
                    draggable: self.session.is_draggable(&record.id),
                });
            }
        }
        self.refresh_popup();
    }

    fn refresh_popup(&mut self) {
        let Some(popup) = self.layer.popup() else {
            return;
        };
        if !self.overlays.is_visible(popup.group) {
            self.layer.close_popup();
            return;
        }
        if popup.group == OverlayGroup::Examples {
            return;
        }
        match self.markers.get(&popup.marker) {
            Some(record) => {
                let refreshed = marker_popup(record);
                self.layer.open_popup(refreshed);
            }
            None => self.layer.close_popup(),
        }
    }
}

fn marker_popup(record: &MarkerRecord) -> Popup {
    Popup {
        marker: record.id.clone(),
        group: OverlayGroup::SavedMarkers,
        position: record.position(),
        title: record.name.clone(),
        lines: vec![record.coords_label()],
        actions: vec![PopupAction::Edit, PopupAction::Delete],
    }
}
