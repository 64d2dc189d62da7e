use std::time::{Duration, Instant};

use crate::layers::OverlayGroup;
use crate::markers::MarkerId;
use crate::projection::{ScreenPoint, Viewport, WorldPoint};
use crate::surface::MarkerLayer;

/// Pointer travel below this is still a click.
pub const DRAG_THRESHOLD_PX: f32 = 3.0;
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
pub const DOUBLE_CLICK_RADIUS_PX: f32 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MarkerClicked { id: MarkerId, group: OverlayGroup },
    MarkerDragReleased { id: MarkerId, position: WorldPoint },
    /// Single click on empty map. The second click of a pair reports
    /// `DoubleClicked` instead.
    MapClicked,
    DoubleClicked { position: WorldPoint },
}

#[derive(Debug, Clone, PartialEq)]
enum PressTarget {
    Glyph {
        id: MarkerId,
        group: OverlayGroup,
        draggable: bool,
        anchor_offset: (f32, f32),
    },
    Map,
}

#[derive(Debug, Clone, PartialEq)]
struct Press {
    origin: ScreenPoint,
    last: ScreenPoint,
    target: PressTarget,
    moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Click {
    at: Instant,
    point: ScreenPoint,
}

/// Turns raw pointer input over the map into marker clicks, marker drags,
/// camera pans and double-clicks.
#[derive(Debug, Clone, Default)]
pub struct MapInteraction {
    press: Option<Press>,
    last_map_click: Option<Click>,
}

impl MapInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_dragging_marker(&self) -> bool {
        matches!(
            &self.press,
            Some(Press {
                target: PressTarget::Glyph { draggable: true, .. },
                moved: true,
                ..
            })
        )
    }

    pub fn pointer_down(&mut self, layer: &MarkerLayer, point: ScreenPoint, viewport: Viewport) {
        let target = match layer.glyph_at(point, viewport) {
            Some(glyph) => {
                let anchor = layer
                    .camera()
                    .world_to_screen(layer.display_position(glyph), viewport);
                PressTarget::Glyph {
                    id: glyph.id.clone(),
                    group: glyph.group,
                    draggable: glyph.draggable,
                    anchor_offset: (anchor.x - point.x, anchor.y - point.y),
                }
            }
            None => PressTarget::Map,
        };
        self.press = Some(Press {
            origin: point,
            last: point,
            target,
            moved: false,
        });
    }

    pub fn pointer_moved(&mut self, layer: &mut MarkerLayer, point: ScreenPoint, viewport: Viewport) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        if !press.moved {
            if press.origin.distance_to(point) <= DRAG_THRESHOLD_PX {
                return;
            }
            press.moved = true;
        }

        match &press.target {
            PressTarget::Glyph {
                id,
                draggable: true,
                anchor_offset,
                ..
            } => {
                let anchor = ScreenPoint::new(point.x + anchor_offset.0, point.y + anchor_offset.1);
                let position = layer.camera().screen_to_world(anchor, viewport);
                layer.set_drag_preview(id.clone(), position);
            }
            _ => {
                let dx = point.x - press.last.x;
                let dy = point.y - press.last.y;
                layer.camera_mut().pan_by_screen_delta(dx, dy);
            }
        }
        press.last = point;
    }

    pub fn pointer_up(
        &mut self,
        layer: &mut MarkerLayer,
        point: ScreenPoint,
        viewport: Viewport,
        now: Instant,
    ) -> Option<MapEvent> {
        let press = self.press.take()?;
        match press.target {
            PressTarget::Glyph {
                id,
                draggable: true,
                anchor_offset,
                ..
            } if press.moved => {
                let anchor = ScreenPoint::new(point.x + anchor_offset.0, point.y + anchor_offset.1);
                let position = layer.camera().screen_to_world(anchor, viewport);
                layer.clear_drag_preview();
                Some(MapEvent::MarkerDragReleased { id, position })
            }
            PressTarget::Glyph { id, group, .. } if !press.moved => {
                self.last_map_click = None;
                Some(MapEvent::MarkerClicked { id, group })
            }
            PressTarget::Map if !press.moved => self.register_map_click(layer, point, viewport, now),
            _ => None,
        }
    }

    /// Drops an in-flight press, e.g. when the window loses focus.
    pub fn cancel(&mut self, layer: &mut MarkerLayer) {
        self.press = None;
        layer.clear_drag_preview();
    }

    fn register_map_click(
        &mut self,
        layer: &MarkerLayer,
        point: ScreenPoint,
        viewport: Viewport,
        now: Instant,
    ) -> Option<MapEvent> {
        let is_double = self.last_map_click.is_some_and(|previous| {
            now.saturating_duration_since(previous.at) <= DOUBLE_CLICK_WINDOW
                && previous.point.distance_to(point) <= DOUBLE_CLICK_RADIUS_PX
        });
        if is_double {
            self.last_map_click = None;
            return Some(MapEvent::DoubleClicked {
                position: layer.camera().screen_to_world(point, viewport),
            });
        }
        self.last_map_click = Some(Click { at: now, point });
        Some(MapEvent::MapClicked)
    }
}
