use std::collections::VecDeque;

use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::panel::PointerKind;
use crate::projection::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum UiKey {
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,
    ZoomIn,
    ZoomOut,
}

/// One user input, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InputEvent {
    PointerDown { kind: PointerKind, point: ScreenPoint },
    PointerMoved { kind: PointerKind, point: ScreenPoint },
    PointerUp { kind: PointerKind, point: ScreenPoint },
    PointerCancelled { kind: PointerKind },
    Wheel { point: Option<ScreenPoint>, steps: i32 },
    Key(UiKey),
    Text(String),
}

/// Turns window events into an ordered queue drained once per frame.
/// Only the first active touch is tracked; extra fingers are ignored.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    events: VecDeque<InputEvent>,
    cursor_position_px: Option<ScreenPoint>,
    left_mouse_is_down: bool,
    active_touch: Option<u64>,
    zoom_in_key_is_down: bool,
    zoom_out_key_is_down: bool,
    escape_is_down: bool,
    tab_is_down: bool,
    enter_is_down: bool,
}

impl InputCollector {
    pub(crate) fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        let point = ScreenPoint::new(x, y);
        self.cursor_position_px = Some(point);
        self.events.push_back(InputEvent::PointerMoved {
            kind: PointerKind::Mouse,
            point,
        });
    }

    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        let Some(point) = self.cursor_position_px else {
            return;
        };
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.events.push_back(InputEvent::PointerDown {
                        kind: PointerKind::Mouse,
                        point,
                    });
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => {
                if self.left_mouse_is_down {
                    self.events.push_back(InputEvent::PointerUp {
                        kind: PointerKind::Mouse,
                        point,
                    });
                }
                self.left_mouse_is_down = false;
            }
        }
    }

    pub(crate) fn handle_touch(&mut self, touch: Touch) {
        let point = ScreenPoint::new(touch.location.x as f32, touch.location.y as f32);
        let kind = PointerKind::Touch;
        match touch.phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return;
                }
                self.active_touch = Some(touch.id);
                self.events.push_back(InputEvent::PointerDown { kind, point });
            }
            TouchPhase::Moved => {
                if self.active_touch == Some(touch.id) {
                    self.events.push_back(InputEvent::PointerMoved { kind, point });
                }
            }
            TouchPhase::Ended => {
                if self.active_touch == Some(touch.id) {
                    self.active_touch = None;
                    self.events.push_back(InputEvent::PointerUp { kind, point });
                }
            }
            TouchPhase::Cancelled => {
                if self.active_touch == Some(touch.id) {
                    self.active_touch = None;
                    self.events.push_back(InputEvent::PointerCancelled { kind });
                }
            }
        }
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = zoom_steps_from_scroll_delta(delta);
        if steps == 0 {
            return;
        }
        self.events.push_back(InputEvent::Wheel {
            point: self.cursor_position_px,
            steps,
        });
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.handle_physical_key(key_event.physical_key, key_event.state);
        if is_pressed {
            if let Some(text) = key_event.text.as_ref() {
                self.handle_text(text);
            }
        }
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Equal | KeyCode::NumpadAdd => {
                edge_key(&mut self.events, &mut self.zoom_in_key_is_down, UiKey::ZoomIn, state)
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                edge_key(&mut self.events, &mut self.zoom_out_key_is_down, UiKey::ZoomOut, state)
            }
            KeyCode::Escape => edge_key(&mut self.events, &mut self.escape_is_down, UiKey::Escape, state),
            KeyCode::Tab => edge_key(&mut self.events, &mut self.tab_is_down, UiKey::Tab, state),
            KeyCode::Enter | KeyCode::NumpadEnter => {
                edge_key(&mut self.events, &mut self.enter_is_down, UiKey::Enter, state)
            }
            // Editing keys repeat while held.
            KeyCode::Backspace if state == ElementState::Pressed => {
                self.events.push_back(InputEvent::Key(UiKey::Backspace));
            }
            KeyCode::Delete if state == ElementState::Pressed => {
                self.events.push_back(InputEvent::Key(UiKey::Delete));
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        let printable: String = text.chars().filter(|ch| !ch.is_control()).collect();
        if !printable.is_empty() {
            self.events.push_back(InputEvent::Text(printable));
        }
    }

    pub(crate) fn drain_events(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }
}

fn edge_key(events: &mut VecDeque<InputEvent>, is_down: &mut bool, key: UiKey, state: ElementState) {
    match state {
        ElementState::Pressed => {
            if !*is_down {
                events.push_back(InputEvent::Key(key));
            }
            *is_down = true;
        }
        ElementState::Released => *is_down = false,
    }
}

pub(crate) fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    use super::*;

    fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> Touch {
        Touch {
            // SAFETY: test-only placeholder device id.
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id,
        }
    }

    #[test]
    fn mouse_press_and_release_follow_cursor() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.drain_events().is_empty());

        input.set_cursor_position_px(10.0, 20.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.set_cursor_position_px(15.0, 25.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);

        let events = input.drain_events();
        assert_eq!(
            events,
            vec![
                InputEvent::PointerMoved {
                    kind: PointerKind::Mouse,
                    point: ScreenPoint::new(10.0, 20.0)
                },
                InputEvent::PointerDown {
                    kind: PointerKind::Mouse,
                    point: ScreenPoint::new(10.0, 20.0)
                },
                InputEvent::PointerMoved {
                    kind: PointerKind::Mouse,
                    point: ScreenPoint::new(15.0, 25.0)
                },
                InputEvent::PointerUp {
                    kind: PointerKind::Mouse,
                    point: ScreenPoint::new(15.0, 25.0)
                },
            ]
        );
        assert!(input.drain_events().is_empty());
    }

    #[test]
    fn right_button_is_ignored() {
        let mut input = InputCollector::default();
        input.set_cursor_position_px(1.0, 1.0);
        input.drain_events();
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        assert!(input.drain_events().is_empty());
    }

    #[test]
    fn only_first_touch_is_tracked() {
        let mut input = InputCollector::default();
        input.handle_touch(touch(1, TouchPhase::Started, 5.0, 5.0));
        input.handle_touch(touch(2, TouchPhase::Started, 50.0, 50.0));
        input.handle_touch(touch(2, TouchPhase::Moved, 55.0, 55.0));
        input.handle_touch(touch(1, TouchPhase::Cancelled, 6.0, 6.0));

        let events = input.drain_events();
        assert_eq!(
            events,
            vec![
                InputEvent::PointerDown {
                    kind: PointerKind::Touch,
                    point: ScreenPoint::new(5.0, 5.0)
                },
                InputEvent::PointerCancelled {
                    kind: PointerKind::Touch
                },
            ]
        );
    }

    #[test]
    fn zoom_keys_are_edge_triggered_only() {
        let mut input = InputCollector::default();
        let zoom_in = PhysicalKey::Code(KeyCode::Equal);
        input.handle_physical_key(zoom_in, ElementState::Pressed);
        input.handle_physical_key(zoom_in, ElementState::Pressed);
        input.handle_physical_key(zoom_in, ElementState::Released);
        input.handle_physical_key(zoom_in, ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::NumpadSubtract), ElementState::Pressed);

        assert_eq!(
            input.drain_events(),
            vec![
                InputEvent::Key(UiKey::ZoomIn),
                InputEvent::Key(UiKey::ZoomIn),
                InputEvent::Key(UiKey::ZoomOut),
            ]
        );
    }

    #[test]
    fn backspace_repeats_while_held() {
        let mut input = InputCollector::default();
        let backspace = PhysicalKey::Code(KeyCode::Backspace);
        input.handle_physical_key(backspace, ElementState::Pressed);
        input.handle_physical_key(backspace, ElementState::Pressed);
        assert_eq!(input.drain_events().len(), 2);
    }

    #[test]
    fn control_characters_are_not_text() {
        let mut input = InputCollector::default();
        input.handle_text("\r");
        input.handle_text("\u{8}");
        input.handle_text("-12.5");
        assert_eq!(
            input.drain_events(),
            vec![InputEvent::Text("-12.5".to_string())]
        );
    }

    #[test]
    fn wheel_carries_cursor_and_skips_zero_steps() {
        let mut input = InputCollector::default();
        input.handle_mouse_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 0.0)));
        assert!(input.drain_events().is_empty());

        input.set_cursor_position_px(3.0, 4.0);
        input.drain_events();
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -2.0));
        assert_eq!(
            input.drain_events(),
            vec![InputEvent::Wheel {
                point: Some(ScreenPoint::new(3.0, 4.0)),
                steps: -2
            }]
        );
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_discrete_step_direction() {
        let positive = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            PhysicalPosition::new(0.0, 3.0),
        ));
        let negative = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            PhysicalPosition::new(0.0, -5.0),
        ));
        assert_eq!(positive, 1);
        assert_eq!(negative, -1);
    }
}
