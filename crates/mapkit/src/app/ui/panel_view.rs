use crate::layers::{BaseLayer, OverlayGroup, OverlayVisibility};
use crate::markers::{MarkerId, MarkerRecord};
use crate::panel::PanelPosition;
use crate::projection::{ScreenPoint, ScreenRect};
use crate::session::{EditSession, PanelForm};

use super::font::{fit_text, LINE_ADVANCE, TEXT_HEIGHT};

pub(crate) const PANEL_WIDTH: f32 = 300.0;
const PADDING: f32 = 10.0;
const HEADER_HEIGHT: f32 = 30.0;
const ROW_HEIGHT: f32 = 24.0;
const ROW_GAP: f32 = 6.0;
const LABEL_WIDTH: f32 = 48.0;
const LIST_ROW_HEIGHT: f32 = 36.0;
const LIST_BOTTOM_RESERVE: f32 = 40.0;
const MIN_LIST_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    EntryX,
    EntryY,
    EntryName,
    EditName,
    EditX,
    EditY,
}

impl Field {
    pub(crate) fn form(self) -> PanelForm {
        match self {
            Field::EntryX | Field::EntryY | Field::EntryName => PanelForm::Entry,
            Field::EditName | Field::EditX | Field::EditY => PanelForm::Edit,
        }
    }

    /// Tab order within the visible form.
    pub(crate) fn next(self) -> Field {
        match self {
            Field::EntryX => Field::EntryY,
            Field::EntryY => Field::EntryName,
            Field::EntryName => Field::EntryX,
            Field::EditName => Field::EditX,
            Field::EditX => Field::EditY,
            Field::EditY => Field::EditName,
        }
    }

    pub(crate) fn first_of(form: PanelForm) -> Field {
        match form {
            PanelForm::Entry => Field::EntryX,
            PanelForm::Edit => Field::EditName,
        }
    }

    pub(crate) fn value(self, session: &EditSession) -> &str {
        match self {
            Field::EntryX => &session.entry_form().x,
            Field::EntryY => &session.entry_form().y,
            Field::EntryName => &session.entry_form().name,
            Field::EditName => &session.edit_form().name,
            Field::EditX => &session.edit_form().x,
            Field::EditY => &session.edit_form().y,
        }
    }

    pub(crate) fn value_mut(self, session: &mut EditSession) -> &mut String {
        match self {
            Field::EntryX => &mut session.entry_form_mut().x,
            Field::EntryY => &mut session.entry_form_mut().y,
            Field::EntryName => &mut session.entry_form_mut().name,
            Field::EditName => &mut session.edit_form_mut().name,
            Field::EditX => &mut session.edit_form_mut().x,
            Field::EditY => &mut session.edit_form_mut().y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PanelAction {
    ToggleCollapsed,
    SelectLayer(BaseLayer),
    ToggleOverlay(OverlayGroup),
    Focus(Field),
    Place,
    Save,
    Cancel,
    DeleteSelected,
    SelectMarker(MarkerId),
    DeleteMarker(MarkerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonStyle {
    Neutral,
    Active,
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WidgetKind {
    Button { label: String, style: ButtonStyle },
    Input { field: Field, focused: bool },
    ListRow { title: String, detail: String, selected: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Widget {
    pub(crate) rect: ScreenRect,
    pub(crate) kind: WidgetKind,
    pub(crate) action: PanelAction,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Label {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) text: String,
    pub(crate) dim: bool,
}

/// Everything the panel shows this frame, positioned in screen space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PanelLayout {
    pub(crate) outer: ScreenRect,
    pub(crate) header: ScreenRect,
    pub(crate) editing: bool,
    pub(crate) labels: Vec<Label>,
    pub(crate) widgets: Vec<Widget>,
    pub(crate) list_rows_hidden: usize,
}

impl PanelLayout {
    pub(crate) fn size(&self) -> (f32, f32) {
        (self.outer.width, self.outer.height)
    }

    pub(crate) fn contains(&self, point: ScreenPoint) -> bool {
        self.outer.contains(point)
    }

    /// Buttons and inputs; a press on one of these never grabs the panel.
    pub(crate) fn drag_exclusions(&self) -> Vec<ScreenRect> {
        self.widgets
            .iter()
            .filter(|widget| !matches!(widget.kind, WidgetKind::ListRow { .. }))
            .map(|widget| widget.rect)
            .collect()
    }

    /// Topmost widget under `point`. Row buttons are laid out after their row.
    pub(crate) fn hit(&self, point: ScreenPoint) -> Option<&PanelAction> {
        self.widgets
            .iter()
            .rev()
            .find(|widget| widget.rect.contains(point))
            .map(|widget| &widget.action)
    }
}

pub(crate) struct PanelInputs<'a> {
    pub(crate) position: PanelPosition,
    pub(crate) collapsed: bool,
    pub(crate) toggle_label: &'static str,
    pub(crate) base_layer: BaseLayer,
    pub(crate) overlays: &'a OverlayVisibility,
    pub(crate) session: &'a EditSession,
    pub(crate) markers: &'a [MarkerRecord],
    pub(crate) focus: Option<Field>,
    pub(crate) list_scroll: usize,
    pub(crate) viewport_height: f32,
}

struct Cursor {
    left: f32,
    right: f32,
    y: f32,
}

impl Cursor {
    fn inner_width(&self) -> f32 {
        self.right - self.left
    }
}

pub(crate) fn layout_panel(inputs: &PanelInputs<'_>) -> PanelLayout {
    let left = inputs.position.x;
    let top = inputs.position.y;
    let header = ScreenRect::new(left, top, PANEL_WIDTH, HEADER_HEIGHT);
    let mut labels = Vec::new();
    let mut widgets = Vec::new();

    labels.push(Label {
        x: left + PADDING,
        y: top + (HEADER_HEIGHT - TEXT_HEIGHT as f32) * 0.5,
        text: "Map Markers".to_string(),
        dim: false,
    });
    let toggle_width = button_width(inputs.toggle_label);
    widgets.push(Widget {
        rect: ScreenRect::new(
            left + PANEL_WIDTH - PADDING - toggle_width,
            top + 3.0,
            toggle_width,
            HEADER_HEIGHT - 6.0,
        ),
        kind: WidgetKind::Button {
            label: inputs.toggle_label.to_string(),
            style: ButtonStyle::Neutral,
        },
        action: PanelAction::ToggleCollapsed,
    });

    if inputs.collapsed {
        return PanelLayout {
            outer: header,
            header,
            editing: false,
            labels,
            widgets,
            list_rows_hidden: 0,
        };
    }

    let mut cursor = Cursor {
        left: left + PADDING,
        right: left + PANEL_WIDTH - PADDING,
        y: top + HEADER_HEIGHT + ROW_GAP,
    };

    let layer_buttons: Vec<_> = BaseLayer::ALL
        .into_iter()
        .map(|layer| {
            let style = if layer == inputs.base_layer {
                ButtonStyle::Active
            } else {
                ButtonStyle::Neutral
            };
            (layer.label().to_string(), style, PanelAction::SelectLayer(layer))
        })
        .collect();
    push_button_row(&mut cursor, &mut widgets, layer_buttons);

    let overlay_buttons: Vec<_> = OverlayGroup::ALL
        .into_iter()
        .map(|group| {
            let visible = inputs.overlays.is_visible(group);
            let mark = if visible { "[x]" } else { "[ ]" };
            let short = match group {
                OverlayGroup::Examples => "Examples",
                OverlayGroup::SavedMarkers => "Saved",
            };
            (
                format!("{mark} {short}"),
                ButtonStyle::Neutral,
                PanelAction::ToggleOverlay(group),
            )
        })
        .collect();
    push_button_row(&mut cursor, &mut widgets, overlay_buttons);
    cursor.y += ROW_GAP;

    let editing = inputs.session.visible_form() == PanelForm::Edit;
    if editing {
        let selected_name = inputs
            .session
            .selected()
            .map(|record| record.name.as_str())
            .unwrap_or_default();
        let heading = format!("Editing: {selected_name}");
        push_label(&mut cursor, &mut labels, &heading, false);
        for (caption, field) in [
            ("Name", Field::EditName),
            ("X", Field::EditX),
            ("Y", Field::EditY),
        ] {
            push_input_row(&mut cursor, &mut labels, &mut widgets, caption, field, inputs.focus);
        }
        push_button_row(
            &mut cursor,
            &mut widgets,
            vec![
                ("Save".to_string(), ButtonStyle::Primary, PanelAction::Save),
                ("Cancel".to_string(), ButtonStyle::Neutral, PanelAction::Cancel),
                ("Delete".to_string(), ButtonStyle::Danger, PanelAction::DeleteSelected),
            ],
        );
        push_label(&mut cursor, &mut labels, "Drag the marker to move it", true);
    } else {
        push_label(&mut cursor, &mut labels, "Add marker", false);
        for (caption, field) in [
            ("X", Field::EntryX),
            ("Y", Field::EntryY),
            ("Name", Field::EntryName),
        ] {
            push_input_row(&mut cursor, &mut labels, &mut widgets, caption, field, inputs.focus);
        }
        push_button_row(
            &mut cursor,
            &mut widgets,
            vec![("Place Marker".to_string(), ButtonStyle::Primary, PanelAction::Place)],
        );
    }
    cursor.y += ROW_GAP;

    let heading = format!("Saved markers ({})", inputs.markers.len());
    push_label(&mut cursor, &mut labels, &heading, false);
    let mut list_rows_hidden = 0;
    if inputs.markers.is_empty() {
        push_label(&mut cursor, &mut labels, "No markers saved yet", true);
        push_label(&mut cursor, &mut labels, "Double-click the map", true);
    } else {
        let room = inputs.viewport_height - LIST_BOTTOM_RESERVE - cursor.y;
        let capacity = ((room / LIST_ROW_HEIGHT).floor().max(0.0) as usize).max(MIN_LIST_ROWS);
        let first = inputs
            .list_scroll
            .min(inputs.markers.len().saturating_sub(capacity));
        let selected_id = inputs.session.selected_id();
        for record in inputs.markers.iter().skip(first).take(capacity) {
            push_list_row(&mut cursor, &mut widgets, record, selected_id == Some(&record.id));
        }
        list_rows_hidden = inputs.markers.len() - inputs.markers.len().min(capacity);
    }

    let height = cursor.y + PADDING - top;
    PanelLayout {
        outer: ScreenRect::new(left, top, PANEL_WIDTH, height),
        header,
        editing,
        labels,
        widgets,
        list_rows_hidden,
    }
}

fn button_width(label: &str) -> f32 {
    super::font::text_width(label) as f32 + 12.0
}

fn push_label(cursor: &mut Cursor, labels: &mut Vec<Label>, text: &str, dim: bool) {
    let fitted = fit_text(text, cursor.inner_width() as i32);
    labels.push(Label {
        x: cursor.left,
        y: cursor.y,
        text: fitted.to_string(),
        dim,
    });
    cursor.y += LINE_ADVANCE as f32 + 2.0;
}

fn push_input_row(
    cursor: &mut Cursor,
    labels: &mut Vec<Label>,
    widgets: &mut Vec<Widget>,
    caption: &str,
    field: Field,
    focus: Option<Field>,
) {
    labels.push(Label {
        x: cursor.left,
        y: cursor.y + (ROW_HEIGHT - TEXT_HEIGHT as f32) * 0.5,
        text: caption.to_string(),
        dim: true,
    });
    widgets.push(Widget {
        rect: ScreenRect::new(
            cursor.left + LABEL_WIDTH,
            cursor.y,
            cursor.inner_width() - LABEL_WIDTH,
            ROW_HEIGHT,
        ),
        kind: WidgetKind::Input {
            field,
            focused: focus == Some(field),
        },
        action: PanelAction::Focus(field),
    });
    cursor.y += ROW_HEIGHT + ROW_GAP;
}

/// Splits the row evenly between the buttons.
fn push_button_row(
    cursor: &mut Cursor,
    widgets: &mut Vec<Widget>,
    buttons: Vec<(String, ButtonStyle, PanelAction)>,
) {
    if buttons.is_empty() {
        return;
    }
    let count = buttons.len() as f32;
    let gap = 6.0;
    let width = (cursor.inner_width() - gap * (count - 1.0)) / count;
    for (index, (label, style, action)) in buttons.into_iter().enumerate() {
        widgets.push(Widget {
            rect: ScreenRect::new(
                cursor.left + index as f32 * (width + gap),
                cursor.y,
                width,
                ROW_HEIGHT,
            ),
            kind: WidgetKind::Button { label, style },
            action,
        });
    }
    cursor.y += ROW_HEIGHT + ROW_GAP;
}

fn push_list_row(
    cursor: &mut Cursor,
    widgets: &mut Vec<Widget>,
    record: &MarkerRecord,
    selected: bool,
) {
    let row = ScreenRect::new(cursor.left, cursor.y, cursor.inner_width(), LIST_ROW_HEIGHT - 4.0);
    widgets.push(Widget {
        rect: row,
        kind: WidgetKind::ListRow {
            title: record.name.clone(),
            detail: record.coords_label(),
            selected,
        },
        action: PanelAction::SelectMarker(record.id.clone()),
    });
    let delete_width = button_width("Del");
    widgets.push(Widget {
        rect: ScreenRect::new(
            row.x + row.width - delete_width - 4.0,
            row.y + 4.0,
            delete_width,
            row.height - 8.0,
        ),
        kind: WidgetKind::Button {
            label: "Del".to_string(),
            style: ButtonStyle::Danger,
        },
        action: PanelAction::DeleteMarker(record.id.clone()),
    });
    cursor.y += LIST_ROW_HEIGHT;
}
