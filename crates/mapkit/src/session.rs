use thiserror::Error;

use crate::markers::{parse_coordinate, Axis, MarkerId, MarkerInputError, MarkerPatch, MarkerRecord};
use crate::projection::WorldPoint;
use crate::surface::GlyphState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    View,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Selected {
        record: MarkerRecord,
        mode: SelectionMode,
    },
}

/// Which form the panel currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelForm {
    Entry,
    Edit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub x: String,
    pub y: String,
    pub name: String,
}

impl EntryForm {
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.name.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    pub name: String,
    pub x: String,
    pub y: String,
}

impl EditForm {
    fn populate(record: &MarkerRecord) -> Self {
        Self {
            name: record.name.clone(),
            x: format_coordinate(record.x),
            y: format_coordinate(record.y),
        }
    }

    /// Validates the form into a patch covering every field.
    pub fn to_patch(&self) -> Result<MarkerPatch, EditFormError> {
        let name = self.name.trim();
        let x = self.x.trim();
        let y = self.y.trim();
        if name.is_empty() || x.is_empty() || y.is_empty() {
            return Err(EditFormError::MissingFields);
        }
        Ok(MarkerPatch {
            name: Some(name.to_string()),
            x: Some(parse_coordinate(Axis::X, x)?),
            y: Some(parse_coordinate(Axis::Y, y)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditFormError {
    #[error("Please fill all fields")]
    MissingFields,
    #[error(transparent)]
    InvalidCoordinate(#[from] MarkerInputError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFill {
    pub target: PanelForm,
    pub x: String,
    pub y: String,
}

impl CoordinateFill {
    pub fn notification(&self) -> String {
        let form = match self.target {
            PanelForm::Entry => "form",
            PanelForm::Edit => "edit form",
        };
        format!("Coordinates copied to {form}: X={}, Y={}", self.x, self.y)
    }
}

pub fn format_coordinate(value: f64) -> String {
    format!("{value:.2}")
}

/// Selection plus the two panel forms. Only one marker is ever selected and
/// only the selected marker in edit mode may be dragged.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
    entry: EntryForm,
    edit: EditForm,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn entry_form(&self) -> &EntryForm {
        &self.entry
    }

    pub fn entry_form_mut(&mut self) -> &mut EntryForm {
        &mut self.entry
    }

    pub fn edit_form(&self) -> &EditForm {
        &self.edit
    }

    pub fn edit_form_mut(&mut self) -> &mut EditForm {
        &mut self.edit
    }

    pub fn selected(&self) -> Option<&MarkerRecord> {
        match &self.state {
            EditState::Selected { record, .. } => Some(record),
            EditState::Idle => None,
        }
    }

    pub fn selected_id(&self) -> Option<&MarkerId> {
        self.selected().map(|record| &record.id)
    }

    pub fn is_editing(&self) -> bool {
        matches!(
            self.state,
            EditState::Selected {
                mode: SelectionMode::Edit,
                ..
            }
        )
    }

    pub fn visible_form(&self) -> PanelForm {
        if self.is_editing() {
            PanelForm::Edit
        } else {
            PanelForm::Entry
        }
    }

    /// Selecting always enters edit mode and loads the record into the edit
    /// form, replacing any previous selection.
    pub fn select(&mut self, record: &MarkerRecord) {
        self.edit = EditForm::populate(record);
        self.state = EditState::Selected {
            record: record.clone(),
            mode: SelectionMode::Edit,
        };
    }

    pub fn exit_edit(&mut self) {
        self.state = EditState::Idle;
        self.edit = EditForm::default();
    }

    /// Replaces the selected snapshot when `record` is the selected marker.
    pub fn refresh_selected(&mut self, record: &MarkerRecord) -> bool {
        match &mut self.state {
            EditState::Selected { record: current, .. } if current.id == record.id => {
                *current = record.clone();
                true
            }
            _ => false,
        }
    }

    pub fn is_selected(&self, id: &MarkerId) -> bool {
        self.selected_id() == Some(id)
    }

    pub fn glyph_state_for(&self, id: &MarkerId) -> GlyphState {
        match &self.state {
            EditState::Selected { record, mode } if &record.id == id => match mode {
                SelectionMode::View => GlyphState::SelectedView,
                SelectionMode::Edit => GlyphState::SelectedEdit,
            },
            _ => GlyphState::Normal,
        }
    }

    pub fn is_draggable(&self, id: &MarkerId) -> bool {
        self.glyph_state_for(id) == GlyphState::SelectedEdit
    }

    /// Writes a double-clicked position into whichever form is visible.
    pub fn fill_coordinates(&mut self, position: WorldPoint) -> CoordinateFill {
        let x = format_coordinate(position.x);
        let y = format_coordinate(position.y);
        let target = self.visible_form();
        match target {
            PanelForm::Edit => {
                self.edit.x = x.clone();
                self.edit.y = y.clone();
            }
            PanelForm::Entry => {
                self.entry.x = x.clone();
                self.entry.y = y.clone();
            }
        }
        CoordinateFill { target, x, y }
    }

    pub fn echo_drag_position(&mut self, position: WorldPoint) {
        if self.is_editing() {
            self.edit.x = format_coordinate(position.x);
            self.edit.y = format_coordinate(position.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, x: f64, y: f64) -> MarkerRecord {
        MarkerRecord {
            id: MarkerId::new(id),
            x,
            y,
            name: format!("name-{id}"),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            color: "#e74c3c".to_string(),
        }
    }

    #[test]
    fn select_enters_edit_and_populates_form() {
        let mut session = EditSession::new();
        session.select(&record("a", 12.345, -0.5));

        assert!(session.is_editing());
        assert_eq!(session.visible_form(), PanelForm::Edit);
        assert_eq!(session.edit_form().name, "name-a");
        assert_eq!(session.edit_form().x, "12.35");
        assert_eq!(session.edit_form().y, "-0.50");
    }

    #[test]
    fn selecting_another_replaces_previous() {
        let mut session = EditSession::new();
        let a = record("a", 1.0, 1.0);
        let b = record("b", 2.0, 2.0);
        session.select(&a);
        session.select(&b);

        assert_eq!(session.glyph_state_for(&a.id), GlyphState::Normal);
        assert_eq!(session.glyph_state_for(&b.id), GlyphState::SelectedEdit);
        assert!(!session.is_draggable(&a.id));
        assert!(session.is_draggable(&b.id));
    }

    #[test]
    fn exit_edit_clears_everything() {
        let mut session = EditSession::new();
        let a = record("a", 1.0, 1.0);
        session.select(&a);
        session.exit_edit();

        assert_eq!(session.state(), &EditState::Idle);
        assert_eq!(session.edit_form(), &EditForm::default());
        assert_eq!(session.visible_form(), PanelForm::Entry);
        assert!(!session.is_draggable(&a.id));
    }

    #[test]
    fn double_click_fill_targets_visible_form() {
        let mut session = EditSession::new();
        let fill = session.fill_coordinates(WorldPoint::new(100.0, -2.456));
        assert_eq!(fill.target, PanelForm::Entry);
        assert_eq!(session.entry_form().x, "100.00");
        assert_eq!(session.entry_form().y, "-2.46");
        assert_eq!(
            fill.notification(),
            "Coordinates copied to form: X=100.00, Y=-2.46"
        );

        session.select(&record("a", 0.0, 0.0));
        let fill = session.fill_coordinates(WorldPoint::new(3.0, 4.0));
        assert_eq!(fill.target, PanelForm::Edit);
        assert_eq!(session.edit_form().x, "3.00");
        assert_eq!(session.entry_form().x, "100.00");
        assert!(fill.notification().starts_with("Coordinates copied to edit form"));
    }

    #[test]
    fn edit_form_requires_all_fields() {
        let form = EditForm {
            name: "Bank".to_string(),
            x: " ".to_string(),
            y: "2".to_string(),
        };
        assert_eq!(form.to_patch(), Err(EditFormError::MissingFields));
        assert_eq!(EditFormError::MissingFields.to_string(), "Please fill all fields");
    }

    #[test]
    fn edit_form_rejects_non_numeric_values() {
        let form = EditForm {
            name: "Bank".to_string(),
            x: "1".to_string(),
            y: "north".to_string(),
        };
        assert!(matches!(
            form.to_patch(),
            Err(EditFormError::InvalidCoordinate(MarkerInputError::InvalidCoordinate {
                axis: Axis::Y,
                ..
            }))
        ));
    }

    #[test]
    fn edit_form_builds_full_patch() {
        let form = EditForm {
            name: " Vault ".to_string(),
            x: "1.5".to_string(),
            y: "-2".to_string(),
        };
        assert_eq!(
            form.to_patch().expect("patch"),
            MarkerPatch {
                name: Some("Vault".to_string()),
                x: Some(1.5),
                y: Some(-2.0),
            }
        );
    }

    #[test]
    fn refresh_only_touches_selected_record() {
        let mut session = EditSession::new();
        session.select(&record("a", 1.0, 1.0));

        assert!(!session.refresh_selected(&record("b", 9.0, 9.0)));
        assert!(session.refresh_selected(&record("a", 5.0, 6.0)));
        assert_eq!(session.selected().map(|r| (r.x, r.y)), Some((5.0, 6.0)));
    }
}
