use crate::projection::{ScreenPoint, ScreenRect, Viewport};
use crate::surface::{Popup, PopupAction, SELECTED_GLYPH_SIZE_PX};

use super::font::{fit_text, text_width, LINE_ADVANCE};

const PADDING: f32 = 8.0;
const EDGE_MARGIN: f32 = 12.0;
const BUTTON_HEIGHT: f32 = 22.0;
const BUTTON_GAP: f32 = 8.0;

/// Screen placement of the open popup: text rows, then a centered row of
/// action buttons.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PopupLayout {
    pub(crate) rect: ScreenRect,
    pub(crate) lines: Vec<String>,
    pub(crate) buttons: Vec<(PopupAction, ScreenRect)>,
}

impl PopupLayout {
    pub(crate) fn contains(&self, point: ScreenPoint) -> bool {
        self.rect.contains(point)
    }

    pub(crate) fn hit(&self, point: ScreenPoint) -> Option<PopupAction> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(action, _)| *action)
    }

    pub(crate) fn line_origin(&self, index: usize) -> (f32, f32) {
        (
            self.rect.x + PADDING,
            self.rect.y + PADDING + index as f32 * LINE_ADVANCE as f32,
        )
    }
}

/// Lays the popup out above `anchor`, nudged to stay inside the viewport.
pub(crate) fn layout_popup(popup: &Popup, anchor: ScreenPoint, viewport: Viewport) -> PopupLayout {
    let texts: Vec<&str> = std::iter::once(popup.title.as_str())
        .chain(popup.lines.iter().map(String::as_str))
        .collect();
    let button_widths: Vec<f32> = popup
        .actions
        .iter()
        .map(|action| text_width(action.label()) as f32 + 16.0)
        .collect();
    let buttons_width = button_widths.iter().sum::<f32>()
        + BUTTON_GAP * button_widths.len().saturating_sub(1) as f32;

    let widest = texts
        .iter()
        .map(|line| text_width(line) as f32)
        .fold(buttons_width, f32::max);
    let max_width = (viewport.width as f32 - 2.0 * EDGE_MARGIN).max(2.0 * PADDING);
    let width = (widest + 2.0 * PADDING).min(max_width);
    let button_row = if popup.actions.is_empty() {
        0.0
    } else {
        BUTTON_HEIGHT + PADDING
    };
    let height = texts.len() as f32 * LINE_ADVANCE as f32 + 2.0 * PADDING + button_row;

    let lift = SELECTED_GLYPH_SIZE_PX + 8.0;
    let max_x = (viewport.width as f32 - width - EDGE_MARGIN).max(0.0);
    let x = (anchor.x - width * 0.5).clamp(0.0, max_x);
    let y = (anchor.y - lift - height).max(0.0);
    let rect = ScreenRect::new(x, y, width, height);

    let room = (width - 2.0 * PADDING) as i32;
    let mut button_x = x + (width - buttons_width) * 0.5;
    let button_y = y + height - PADDING - BUTTON_HEIGHT;
    let buttons = popup
        .actions
        .iter()
        .zip(button_widths)
        .map(|(action, button_width)| {
            let rect = ScreenRect::new(button_x, button_y, button_width, BUTTON_HEIGHT);
            button_x += button_width + BUTTON_GAP;
            (*action, rect)
        })
        .collect();

    PopupLayout {
        rect,
        lines: texts
            .iter()
            .map(|line| fit_text(line, room).to_string())
            .collect(),
        buttons,
    }
}
