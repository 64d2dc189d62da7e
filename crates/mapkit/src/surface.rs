use crate::layers::OverlayGroup;
use crate::markers::MarkerId;
use crate::projection::{MapCamera, ScreenPoint, ScreenRect, Viewport, WorldPoint};

pub const NORMAL_GLYPH_SIZE_PX: f32 = 20.0;
pub const SELECTED_GLYPH_SIZE_PX: f32 = 26.0;
pub const SELECTED_GLYPH_RGBA: [u8; 4] = [0x34, 0x98, 0xdb, 255];
pub const EDIT_BORDER_RGBA: [u8; 4] = [0x2e, 0xcc, 0x71, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphState {
    #[default]
    Normal,
    SelectedView,
    SelectedEdit,
}

impl GlyphState {
    pub fn size_px(self) -> f32 {
        match self {
            GlyphState::Normal => NORMAL_GLYPH_SIZE_PX,
            GlyphState::SelectedView | GlyphState::SelectedEdit => SELECTED_GLYPH_SIZE_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerGlyph {
    pub id: MarkerId,
    pub group: OverlayGroup,
    pub position: WorldPoint,
    pub name: String,
    pub rgba: [u8; 4],
    pub state: GlyphState,
    pub draggable: bool,
}

impl MarkerGlyph {
    pub fn fill_rgba(&self) -> [u8; 4] {
        match self.state {
            GlyphState::Normal => self.rgba,
            GlyphState::SelectedView | GlyphState::SelectedEdit => SELECTED_GLYPH_RGBA,
        }
    }

    /// Icon box anchored at its bottom-center on the marker position.
    pub fn screen_box(&self, camera: &MapCamera, viewport: Viewport) -> ScreenRect {
        glyph_box(
            camera.world_to_screen(self.position, viewport),
            self.state.size_px(),
        )
    }
}

pub fn glyph_box(anchor: ScreenPoint, size: f32) -> ScreenRect {
    ScreenRect::new(anchor.x - size * 0.5, anchor.y - size, size, size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Edit,
    Delete,
}

impl PopupAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }
}

/// Info bubble attached to one glyph. It closes when its overlay group is
/// hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub marker: MarkerId,
    pub group: OverlayGroup,
    pub position: WorldPoint,
    pub title: String,
    pub lines: Vec<String>,
    pub actions: Vec<PopupAction>,
}

/// Rendering collaborator driven by the controller. Glyphs are never patched
/// in place: the controller clears and re-places them after each mutation.
pub trait MapSurface {
    fn clear_markers(&mut self);
    fn place_marker(&mut self, glyph: MarkerGlyph);
    fn pan_to(&mut self, position: WorldPoint);
    fn open_popup(&mut self, popup: Popup);
    fn close_popup(&mut self);
}

/// Retained marker layer read by the renderer each frame.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    camera: MapCamera,
    glyphs: Vec<MarkerGlyph>,
    popup: Option<Popup>,
    drag_preview: Option<(MarkerId, WorldPoint)>,
}

impl MarkerLayer {
    pub fn new(camera: MapCamera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn camera(&self) -> &MapCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut MapCamera {
        &mut self.camera
    }

    pub fn glyphs(&self) -> &[MarkerGlyph] {
        &self.glyphs
    }

    pub fn glyph(&self, id: &MarkerId) -> Option<&MarkerGlyph> {
        self.glyphs.iter().find(|glyph| &glyph.id == id)
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Position a glyph is drawn at, honoring a live drag preview.
    pub fn display_position(&self, glyph: &MarkerGlyph) -> WorldPoint {
        match &self.drag_preview {
            Some((id, position)) if id == &glyph.id => *position,
            _ => glyph.position,
        }
    }

    pub fn set_drag_preview(&mut self, id: MarkerId, position: WorldPoint) {
        self.drag_preview = Some((id, position));
    }

    pub fn clear_drag_preview(&mut self) {
        self.drag_preview = None;
    }

    /// Topmost glyph whose icon box contains `point`. Later glyphs draw on top.
    pub fn glyph_at(&self, point: ScreenPoint, viewport: Viewport) -> Option<&MarkerGlyph> {
        self.glyphs.iter().rev().find(|glyph| {
            let anchor = self
                .camera
                .world_to_screen(self.display_position(glyph), viewport);
            glyph_box(anchor, glyph.state.size_px()).contains(point)
        })
    }
}

impl MapSurface for MarkerLayer {
    fn clear_markers(&mut self) {
        self.glyphs.clear();
        self.drag_preview = None;
    }

    fn place_marker(&mut self, glyph: MarkerGlyph) {
        self.glyphs.push(glyph);
    }

    fn pan_to(&mut self, position: WorldPoint) {
        self.camera.center = position;
    }

    fn open_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }
}
