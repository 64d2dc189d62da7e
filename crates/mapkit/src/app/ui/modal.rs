use crate::projection::{ScreenPoint, ScreenRect, Viewport};

use super::font::{fit_text, text_width, LINE_ADVANCE, TEXT_HEIGHT};

pub(crate) const WELCOME_TITLE: &str = "Welcome to the map!";
pub(crate) const WELCOME_LINES: [&str; 5] = [
    "Double-click the map to copy coordinates",
    "into the form, then press Place Marker.",
    "Click a saved marker to edit it.",
    "Drag it to move it while editing.",
    "Drag the panel header to move the panel.",
];
pub(crate) const WELCOME_BUTTON: &str = "Got it!";
pub(crate) const ALERT_BUTTON: &str = "OK";
pub(crate) const INSTRUCTION_TOOLTIP: &str = "Double-click anywhere to get coordinates";

const DIALOG_WIDTH: f32 = 420.0;
const DIALOG_PADDING: f32 = 16.0;
const BUTTON_HEIGHT: f32 = 26.0;

/// Centered dialog over a full-window backdrop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModalLayout {
    pub(crate) backdrop: ScreenRect,
    pub(crate) dialog: ScreenRect,
    pub(crate) button: ScreenRect,
    pub(crate) button_label: &'static str,
    pub(crate) title: String,
    pub(crate) lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModalHit {
    Button,
    Dialog,
    Backdrop,
}

impl ModalLayout {
    pub(crate) fn hit(&self, point: ScreenPoint) -> ModalHit {
        if self.button.contains(point) {
            ModalHit::Button
        } else if self.dialog.contains(point) {
            ModalHit::Dialog
        } else {
            ModalHit::Backdrop
        }
    }

    pub(crate) fn title_origin(&self) -> (f32, f32) {
        (self.dialog.x + DIALOG_PADDING, self.dialog.y + DIALOG_PADDING)
    }

    pub(crate) fn line_origin(&self, index: usize) -> (f32, f32) {
        let (x, y) = self.title_origin();
        (x, y + LINE_ADVANCE as f32 * (index as f32 + 1.5))
    }
}

pub(crate) fn layout_modal(
    viewport: Viewport,
    title: &str,
    lines: &[&str],
    button_label: &'static str,
) -> ModalLayout {
    let width = DIALOG_WIDTH.min(viewport.width as f32 - 2.0 * DIALOG_PADDING).max(80.0);
    let text_room = (width - 2.0 * DIALOG_PADDING) as i32;
    let height = DIALOG_PADDING * 3.0
        + LINE_ADVANCE as f32 * (lines.len() as f32 + 1.5)
        + BUTTON_HEIGHT;
    let x = ((viewport.width as f32 - width) * 0.5).max(0.0);
    let y = ((viewport.height as f32 - height) * 0.5).max(0.0);
    let button_width = text_width(button_label) as f32 + 24.0;
    ModalLayout {
        backdrop: ScreenRect::new(0.0, 0.0, viewport.width as f32, viewport.height as f32),
        dialog: ScreenRect::new(x, y, width, height),
        button: ScreenRect::new(
            x + (width - button_width) * 0.5,
            y + height - DIALOG_PADDING - BUTTON_HEIGHT,
            button_width,
            BUTTON_HEIGHT,
        ),
        button_label,
        title: fit_text(title, text_room).to_string(),
        lines: lines
            .iter()
            .map(|line| fit_text(line, text_room).to_string())
            .collect(),
    }
}

/// Vertical offset that centers one text row inside `rect`.
pub(crate) fn centered_text_y(rect: ScreenRect) -> f32 {
    rect.y + (rect.height - TEXT_HEIGHT as f32) * 0.5
}
