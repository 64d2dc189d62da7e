use std::time::Instant;

use tracing::{debug, info};

use crate::controller::{MapController, UserAlert};
use crate::panel::PointerKind;
use crate::projection::{ScreenPoint, Viewport, WorldPoint};
use crate::session::PanelForm;
use crate::storage::KeyValueStore;

use super::input::{InputEvent, UiKey};
use super::ui::modal::{
    layout_modal, ModalHit, ModalLayout, ALERT_BUTTON, WELCOME_BUTTON, WELCOME_LINES,
    WELCOME_TITLE,
};
use super::ui::panel_view::{layout_panel, Field, PanelAction, PanelInputs, PanelLayout};
use super::ui::popup_view::{layout_popup, PopupLayout};

const MAX_FIELD_CHARS: usize = 64;
const ALERT_TITLE: &str = "Notice";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerTarget {
    Map,
    Panel(PointerKind),
    Ui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalKind {
    Alert,
    Welcome,
}

/// Routes pointer and keyboard input to modals, the control panel, or the
/// map, in that order, and owns the text-focus and alert state the panel
/// needs.
pub(crate) struct Frontend<S: KeyValueStore> {
    controller: MapController<S>,
    focus: Option<Field>,
    alert: Option<UserAlert>,
    list_scroll: usize,
    viewport: Viewport,
    cursor: Option<ScreenPoint>,
    pointer: Option<PointerTarget>,
}

impl<S: KeyValueStore> Frontend<S> {
    pub(crate) fn new(controller: MapController<S>, viewport: Viewport) -> Self {
        Self {
            controller,
            focus: None,
            alert: None,
            list_scroll: 0,
            viewport,
            cursor: None,
            pointer: None,
        }
    }

    pub(crate) fn controller(&self) -> &MapController<S> {
        &self.controller
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub(crate) fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// World position under the mouse cursor, for the status line.
    pub(crate) fn cursor_world(&self) -> Option<WorldPoint> {
        let cursor = self.cursor?;
        Some(
            self.controller
                .layer()
                .camera()
                .screen_to_world(cursor, self.viewport),
        )
    }

    pub(crate) fn panel_layout(&self) -> PanelLayout {
        let panel = self.controller.panel();
        layout_panel(&PanelInputs {
            position: panel.position(),
            collapsed: panel.is_collapsed(),
            toggle_label: panel.toggle_label(),
            base_layer: self.controller.base_layer(),
            overlays: self.controller.overlays(),
            session: self.controller.session(),
            markers: self.controller.markers().records(),
            focus: self.focus,
            list_scroll: self.list_scroll,
            viewport_height: self.viewport.height as f32,
        })
    }

    pub(crate) fn popup_layout(&self) -> Option<PopupLayout> {
        let layer = self.controller.layer();
        let popup = layer.popup()?;
        let anchor = layer.camera().world_to_screen(popup.position, self.viewport);
        Some(layout_popup(popup, anchor, self.viewport))
    }

    /// The alert takes precedence over the welcome dialog.
    pub(crate) fn active_modal(&self) -> Option<ModalLayout> {
        match self.modal_kind()? {
            ModalKind::Alert => {
                let message = self.alert.as_ref().map(UserAlert::message).unwrap_or_default();
                Some(layout_modal(self.viewport, ALERT_TITLE, &[message], ALERT_BUTTON))
            }
            ModalKind::Welcome => Some(layout_modal(
                self.viewport,
                WELCOME_TITLE,
                &WELCOME_LINES,
                WELCOME_BUTTON,
            )),
        }
    }

    fn modal_kind(&self) -> Option<ModalKind> {
        if self.alert.is_some() {
            Some(ModalKind::Alert)
        } else if self.controller.feedback().welcome_visible() {
            Some(ModalKind::Welcome)
        } else {
            None
        }
    }

    pub(crate) fn tick(&mut self, now: Instant) {
        self.controller.tick(now);
    }

    pub(crate) fn handle(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::PointerDown { kind, point } => self.pointer_down(kind, point, now),
            InputEvent::PointerMoved { kind, point } => self.pointer_moved(kind, point),
            InputEvent::PointerUp { kind, point } => self.pointer_up(kind, point, now),
            InputEvent::PointerCancelled { kind } => self.pointer_cancelled(kind),
            InputEvent::Wheel { point, steps } => self.wheel(point, steps),
            InputEvent::Key(key) => self.key(key, now),
            InputEvent::Text(text) => self.text(&text),
        }
        self.sync_focus();
    }

    fn pointer_down(&mut self, kind: PointerKind, point: ScreenPoint, now: Instant) {
        if kind == PointerKind::Mouse {
            self.cursor = Some(point);
        }
        if self.pointer.is_some() {
            return;
        }
        if let Some(modal_kind) = self.modal_kind() {
            self.pointer = Some(PointerTarget::Ui);
            let Some(modal) = self.active_modal() else {
                return;
            };
            match (modal.hit(point), modal_kind) {
                (ModalHit::Button, _) | (ModalHit::Backdrop, ModalKind::Welcome) => {
                    self.dismiss_modal(modal_kind)
                }
                _ => {}
            }
            return;
        }

        let layout = self.panel_layout();
        if layout.contains(point) {
            if let Some(action) = layout.hit(point).cloned() {
                self.pointer = Some(PointerTarget::Ui);
                self.dispatch(action, now);
            } else if self.controller.begin_panel_drag(
                kind,
                point,
                layout.header,
                &layout.drag_exclusions(),
            ) {
                self.pointer = Some(PointerTarget::Panel(kind));
            } else {
                self.pointer = Some(PointerTarget::Ui);
            }
            return;
        }

        if let Some(popup) = self.popup_layout().filter(|popup| popup.contains(point)) {
            self.pointer = Some(PointerTarget::Ui);
            if let Some(action) = popup.hit(point) {
                self.focus = None;
                self.controller.apply_popup_action(action);
            }
            return;
        }

        self.focus = None;
        self.controller.map_pointer_down(point, self.viewport);
        self.pointer = Some(PointerTarget::Map);
    }

    fn pointer_moved(&mut self, kind: PointerKind, point: ScreenPoint) {
        if kind == PointerKind::Mouse {
            self.cursor = Some(point);
        }
        match self.pointer {
            Some(PointerTarget::Map) => self.controller.map_pointer_moved(point, self.viewport),
            Some(PointerTarget::Panel(grab)) if grab == kind => {
                let size = self.panel_layout().size();
                self.controller.drag_panel(kind, point, size, self.viewport);
            }
            _ => {}
        }
    }

    fn pointer_up(&mut self, kind: PointerKind, point: ScreenPoint, now: Instant) {
        match self.release_pointer(kind) {
            Some(PointerTarget::Map) => {
                let fill = self.controller.map_pointer_up(point, self.viewport, now);
                if fill.is_some_and(|fill| fill.target == PanelForm::Entry) {
                    self.focus = Some(Field::EntryName);
                }
            }
            Some(PointerTarget::Panel(_)) => {
                self.controller.end_panel_drag(kind);
            }
            Some(PointerTarget::Ui) | None => {}
        }
    }

    fn pointer_cancelled(&mut self, kind: PointerKind) {
        match self.release_pointer(kind) {
            Some(PointerTarget::Map) => self.controller.cancel_map_pointer(),
            Some(PointerTarget::Panel(_)) => {
                self.controller.end_panel_drag(kind);
            }
            Some(PointerTarget::Ui) | None => {}
        }
    }

    /// A panel grab only ends with the pointer kind that started it.
    fn release_pointer(&mut self, kind: PointerKind) -> Option<PointerTarget> {
        if matches!(self.pointer, Some(PointerTarget::Panel(grab)) if grab != kind) {
            return None;
        }
        self.pointer.take()
    }

    fn wheel(&mut self, point: Option<ScreenPoint>, steps: i32) {
        if self.modal_kind().is_some() {
            return;
        }
        let over_panel = point.is_some_and(|point| self.panel_layout().contains(point));
        if over_panel {
            let delta = steps.unsigned_abs() as usize;
            self.list_scroll = if steps > 0 {
                self.list_scroll.saturating_sub(delta)
            } else {
                self.list_scroll
                    .saturating_add(delta)
                    .min(self.controller.markers().len())
            };
        } else {
            self.controller.zoom_by(steps);
        }
    }

    fn key(&mut self, key: UiKey, now: Instant) {
        if let Some(modal_kind) = self.modal_kind() {
            if matches!(key, UiKey::Escape | UiKey::Enter) {
                self.dismiss_modal(modal_kind);
            }
            return;
        }
        match key {
            UiKey::Escape => {
                if self.controller.session().is_editing() {
                    self.controller.cancel_edit();
                }
                self.focus = None;
            }
            UiKey::Tab => {
                let form = self.controller.session().visible_form();
                self.focus = Some(match self.focus {
                    Some(field) if field.form() == form => field.next(),
                    _ => Field::first_of(form),
                });
            }
            UiKey::Enter => match self.controller.session().visible_form() {
                PanelForm::Entry => self.submit_entry(now),
                PanelForm::Edit => self.submit_edit(),
            },
            UiKey::Backspace => {
                if let Some(field) = self.focus {
                    field.value_mut(self.controller.session_mut()).pop();
                }
            }
            UiKey::Delete => {
                if self.focus.is_none() && self.controller.delete_selected() {
                    debug!("selected_marker_deleted_by_key");
                }
            }
            UiKey::ZoomIn if self.focus.is_none() => self.controller.zoom_by(1),
            UiKey::ZoomOut if self.focus.is_none() => self.controller.zoom_by(-1),
            UiKey::ZoomIn | UiKey::ZoomOut => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.modal_kind().is_some() {
            return;
        }
        let Some(field) = self.focus else {
            return;
        };
        let value = field.value_mut(self.controller.session_mut());
        for ch in text.chars() {
            if value.chars().count() >= MAX_FIELD_CHARS {
                break;
            }
            value.push(ch);
        }
    }

    fn dispatch(&mut self, action: PanelAction, now: Instant) {
        match action {
            PanelAction::ToggleCollapsed => {
                if self.controller.toggle_panel_collapsed() {
                    self.focus = None;
                }
            }
            PanelAction::SelectLayer(layer) => self.controller.set_base_layer(layer),
            PanelAction::ToggleOverlay(group) => {
                self.controller.toggle_overlay(group);
            }
            PanelAction::Focus(field) => self.focus = Some(field),
            PanelAction::Place => self.submit_entry(now),
            PanelAction::Save => self.submit_edit(),
            PanelAction::Cancel => {
                self.controller.cancel_edit();
                self.focus = None;
            }
            PanelAction::DeleteSelected => {
                self.controller.delete_selected();
                self.focus = None;
            }
            PanelAction::SelectMarker(id) => {
                self.controller.select_marker(&id);
                self.focus = None;
            }
            PanelAction::DeleteMarker(id) => {
                self.controller.delete_marker(&id);
            }
        }
    }

    fn submit_entry(&mut self, now: Instant) {
        match self.controller.place_marker(now) {
            Ok(_) => self.focus = None,
            Err(alert) => self.raise(alert),
        }
    }

    fn submit_edit(&mut self) {
        match self.controller.save_edit() {
            Ok(_) => self.focus = None,
            Err(alert) => self.raise(alert),
        }
    }

    fn raise(&mut self, alert: UserAlert) {
        info!(message = alert.message(), "alert_shown");
        self.alert = Some(alert);
    }

    fn dismiss_modal(&mut self, kind: ModalKind) {
        match kind {
            ModalKind::Alert => self.alert = None,
            ModalKind::Welcome => self.controller.dismiss_welcome(),
        }
    }

    /// Drops focus from a field whose form is no longer on screen.
    fn sync_focus(&mut self) {
        let form = self.controller.session().visible_form();
        if self.controller.panel().is_collapsed()
            || self.focus.is_some_and(|field| field.form() != form)
        {
            self.focus = None;
        }
    }

    #[cfg(test)]
    fn focus(&self) -> Option<Field> {
        self.focus
    }

    #[cfg(test)]
    fn alert(&self) -> Option<&UserAlert> {
        self.alert.as_ref()
    }
}
