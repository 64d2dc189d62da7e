use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::feedback::{RIPPLE_LIFETIME, RIPPLE_RADIUS_WORLD};
use crate::projection::{MapCamera, Viewport, WorldPoint};
use crate::session::format_coordinate;
use crate::storage::KeyValueStore;
use crate::surface::{GlyphState, PopupAction, EDIT_BORDER_RGBA};

use crate::app::frontend::Frontend;
use crate::app::ui::draw::Canvas;
use crate::app::ui::font::{draw_text, fit_text, fit_text_tail, text_width, LINE_ADVANCE, TEXT_HEIGHT};
use crate::app::ui::modal::{centered_text_y, ModalLayout, INSTRUCTION_TOOLTIP};
use crate::app::ui::panel_view::{ButtonStyle, PanelLayout, WidgetKind};
use super::tiles::TileCache;

const CLEAR_COLOR: [u8; 4] = [18, 22, 28, 255];
const PIN_BORDER_COLOR: [u8; 4] = [30, 30, 30, 255];
const RIPPLE_COLOR: [u8; 3] = [255, 255, 255];
const POPUP_BG: [u8; 4] = [250, 250, 250, 245];
const POPUP_BORDER: [u8; 4] = [120, 120, 120, 255];
const POPUP_TEXT: [u8; 4] = [33, 33, 33, 255];
const PANEL_BG: [u8; 4] = [32, 36, 44, 235];
const PANEL_HEADER_BG: [u8; 4] = [44, 62, 80, 255];
const PANEL_BORDER: [u8; 4] = [70, 78, 92, 255];
const TEXT_COLOR: [u8; 4] = [236, 240, 241, 255];
const DIM_TEXT_COLOR: [u8; 4] = [149, 165, 166, 255];
const INPUT_BG: [u8; 4] = [250, 250, 250, 255];
const INPUT_TEXT: [u8; 4] = [33, 33, 33, 255];
const FOCUS_BORDER: [u8; 4] = [52, 152, 219, 255];
const ROW_BG: [u8; 4] = [48, 54, 64, 255];
const ROW_SELECTED_BG: [u8; 4] = [41, 98, 140, 255];
const TOAST_BG: [u8; 4] = [46, 204, 113, 240];
const TOOLTIP_BG: [u8; 4] = [0, 0, 0, 180];
const STATUS_BG: [u8; 4] = [0, 0, 0, 160];
const BACKDROP: [u8; 4] = [0, 0, 0, 140];
const DIALOG_BG: [u8; 4] = [255, 255, 255, 255];
const DIALOG_TEXT: [u8; 4] = [44, 62, 80, 255];
const EDGE_MARGIN: i32 = 12;
const BOX_PADDING: i32 = 8;

pub(crate) struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    tiles: TileCache,
}

impl Renderer {
    pub(crate) fn new(window: Arc<Window>, tiles_dir: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            tiles: TileCache::new(tiles_dir),
        })
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_frame<S: KeyValueStore>(
        &mut self,
        frontend: &Frontend<S>,
        now: Instant,
    ) -> Result<(), Error> {
        let viewport = self.viewport;
        if viewport.width == 0 || viewport.height == 0 {
            return Ok(());
        }
        let frame = self.pixels.frame_mut();
        let mut canvas = Canvas::new(frame, viewport.width, viewport.height);
        draw_frame(&mut canvas, &mut self.tiles, frontend, now);
        self.pixels.render()
    }
}

/// Paints one frame back to front: tiles, ripple, markers, popup, panel,
/// hud text, then any modal on top.
pub(crate) fn draw_frame<S: KeyValueStore>(
    canvas: &mut Canvas<'_>,
    tiles: &mut TileCache,
    frontend: &Frontend<S>,
    now: Instant,
) {
    let controller = frontend.controller();
    let viewport = frontend.viewport();
    let layer = controller.layer();
    let camera = layer.camera();
    canvas.clear(CLEAR_COLOR);

    let base_layer = controller.base_layer();
    for key in camera.visible_tiles(viewport, base_layer.native_max_zoom()) {
        let origin = camera.tile_screen_origin(key, viewport);
        let tile = tiles.tile(base_layer, key);
        canvas.blit_scaled(
            origin.x.floor() as i32,
            origin.y.floor() as i32,
            tile.view(),
            tile.scale_to_tile(),
        );
    }

    if let Some(ripple) = controller.feedback().ripple() {
        let remaining = ripple.expires_at.saturating_duration_since(now);
        let progress = 1.0 - remaining.as_secs_f32() / RIPPLE_LIFETIME.as_secs_f32();
        let full = ripple_radius_px(camera, ripple.position, viewport);
        let center = camera.world_to_screen(ripple.position, viewport);
        let radius = (full * (0.3 + 0.7 * progress.clamp(0.0, 1.0))).round() as i32;
        let alpha = (200.0 * (1.0 - progress.clamp(0.0, 1.0))) as u8;
        let [r, g, b] = RIPPLE_COLOR;
        canvas.ring(
            center.x.round() as i32,
            center.y.round() as i32,
            radius.max(2),
            2,
            [r, g, b, alpha],
        );
    }

    for glyph in layer.glyphs() {
        let anchor = camera.world_to_screen(layer.display_position(glyph), viewport);
        let tip_x = anchor.x.round() as i32;
        let tip_y = anchor.y.round() as i32;
        let size = glyph.state.size_px() as i32;
        let border = if glyph.state == GlyphState::SelectedEdit {
            EDIT_BORDER_RGBA
        } else {
            PIN_BORDER_COLOR
        };
        canvas.pin(tip_x, tip_y, size, glyph.fill_rgba(), border);
        if glyph.state == GlyphState::SelectedEdit {
            canvas.ring(tip_x, tip_y, 4, 2, EDIT_BORDER_RGBA);
        }
    }

    if let Some(popup) = frontend.popup_layout() {
        canvas.fill_screen_rect(popup.rect, POPUP_BG);
        canvas.outline_screen_rect(popup.rect, POPUP_BORDER);
        for (index, line) in popup.lines.iter().enumerate() {
            let (x, y) = popup.line_origin(index);
            draw_text(canvas, x as i32, y as i32, line, POPUP_TEXT);
        }
        for (action, rect) in &popup.buttons {
            let style = match action {
                PopupAction::Edit => ButtonStyle::Active,
                PopupAction::Delete => ButtonStyle::Danger,
            };
            canvas.fill_screen_rect(*rect, button_color(style));
            let label_x = rect.x as i32 + (rect.width as i32 - text_width(action.label())) / 2;
            draw_text(canvas, label_x, centered_text_y(*rect) as i32, action.label(), TEXT_COLOR);
        }
    }

    if controller.feedback().tooltip_visible() {
        let width = text_width(INSTRUCTION_TOOLTIP) + 2 * BOX_PADDING;
        let x = (viewport.width as i32 - width) / 2;
        canvas.fill_rect(x, EDGE_MARGIN, width, TEXT_HEIGHT + 2 * BOX_PADDING, TOOLTIP_BG);
        draw_text(
            canvas,
            x + BOX_PADDING,
            EDGE_MARGIN + BOX_PADDING,
            INSTRUCTION_TOOLTIP,
            TEXT_COLOR,
        );
    }

    draw_panel(canvas, &frontend.panel_layout(), frontend);
    draw_status_line(canvas, frontend, viewport);

    if let Some(toast) = controller.feedback().toast() {
        let width = text_width(&toast.message) + 2 * BOX_PADDING;
        let height = TEXT_HEIGHT + 2 * BOX_PADDING;
        let x = viewport.width as i32 - EDGE_MARGIN - width;
        let y = viewport.height as i32 - EDGE_MARGIN - height;
        canvas.fill_rect(x, y, width, height, TOAST_BG);
        draw_text(canvas, x + BOX_PADDING, y + BOX_PADDING, &toast.message, TEXT_COLOR);
    }

    if let Some(modal) = frontend.active_modal() {
        draw_modal(canvas, &modal);
    }
}

/// Screen radius of the ripple circle, which is sized in world units.
fn ripple_radius_px(camera: &MapCamera, center: WorldPoint, viewport: Viewport) -> f32 {
    let a = camera.world_to_screen(center, viewport);
    let b = camera.world_to_screen(
        WorldPoint::new(center.x + RIPPLE_RADIUS_WORLD, center.y),
        viewport,
    );
    a.distance_to(b)
}

fn draw_panel<S: KeyValueStore>(canvas: &mut Canvas<'_>, layout: &PanelLayout, frontend: &Frontend<S>) {
    canvas.fill_screen_rect(layout.outer, PANEL_BG);
    canvas.fill_screen_rect(layout.header, PANEL_HEADER_BG);
    canvas.outline_screen_rect(layout.outer, PANEL_BORDER);

    for label in &layout.labels {
        let color = if label.dim { DIM_TEXT_COLOR } else { TEXT_COLOR };
        draw_text(canvas, label.x as i32, label.y as i32, &label.text, color);
    }

    let session = frontend.controller().session();
    for widget in &layout.widgets {
        let rect = widget.rect;
        match &widget.kind {
            WidgetKind::Button { label, style } => {
                canvas.fill_screen_rect(rect, button_color(*style));
                let fitted = fit_text(label, rect.width as i32 - 4);
                let x = rect.x as i32 + (rect.width as i32 - text_width(fitted)) / 2;
                draw_text(canvas, x, centered_text_y(rect) as i32, fitted, TEXT_COLOR);
            }
            WidgetKind::Input { field, focused } => {
                canvas.fill_screen_rect(rect, INPUT_BG);
                let border = if *focused { FOCUS_BORDER } else { PANEL_BORDER };
                canvas.outline_screen_rect(rect, border);
                let room = rect.width as i32 - 2 * 4 - if *focused { 4 } else { 0 };
                let shown = fit_text_tail(field.value(session), room);
                let text_x = rect.x as i32 + 4;
                let text_y = centered_text_y(rect) as i32;
                draw_text(canvas, text_x, text_y, shown, INPUT_TEXT);
                if *focused {
                    let caret_x = text_x + text_width(shown) + 1;
                    canvas.fill_rect(caret_x, text_y - 1, 2, TEXT_HEIGHT + 2, INPUT_TEXT);
                }
            }
            WidgetKind::ListRow {
                title,
                detail,
                selected,
            } => {
                let bg = if *selected { ROW_SELECTED_BG } else { ROW_BG };
                canvas.fill_screen_rect(rect, bg);
                // Leave room for the row's delete button.
                let room = rect.width as i32 - text_width("Del") - 24;
                let x = rect.x as i32 + 6;
                let y = rect.y as i32 + 3;
                draw_text(canvas, x, y, fit_text(title, room), TEXT_COLOR);
                draw_text(canvas, x, y + LINE_ADVANCE, fit_text(detail, room), DIM_TEXT_COLOR);
            }
        }
    }

    if layout.list_rows_hidden > 0 {
        let note = format!("+{} more (scroll)", layout.list_rows_hidden);
        let outer = layout.outer;
        draw_text(
            canvas,
            outer.x as i32 + 10,
            (outer.y + outer.height) as i32 - 4 - TEXT_HEIGHT,
            &note,
            DIM_TEXT_COLOR,
        );
    }
}

fn button_color(style: ButtonStyle) -> [u8; 4] {
    match style {
        ButtonStyle::Neutral => [74, 84, 100, 255],
        ButtonStyle::Active => [52, 152, 219, 255],
        ButtonStyle::Primary => [39, 174, 96, 255],
        ButtonStyle::Danger => [192, 57, 43, 255],
    }
}

fn status_text<S: KeyValueStore>(frontend: &Frontend<S>) -> String {
    let zoom = frontend.controller().layer().camera().zoom();
    let layer = frontend.controller().base_layer().label();
    match frontend.cursor_world() {
        Some(world) => format!(
            "X: {}  Y: {}  Zoom: {zoom}  {layer}",
            format_coordinate(world.x),
            format_coordinate(world.y)
        ),
        None => format!("Zoom: {zoom}  {layer}"),
    }
}

fn draw_status_line<S: KeyValueStore>(canvas: &mut Canvas<'_>, frontend: &Frontend<S>, viewport: Viewport) {
    let text = status_text(frontend);
    let width = text_width(&text) + 2 * BOX_PADDING;
    let height = TEXT_HEIGHT + 2 * BOX_PADDING;
    let y = viewport.height as i32 - EDGE_MARGIN - height;
    canvas.fill_rect(EDGE_MARGIN, y, width, height, STATUS_BG);
    draw_text(canvas, EDGE_MARGIN + BOX_PADDING, y + BOX_PADDING, &text, TEXT_COLOR);
}

fn draw_modal(canvas: &mut Canvas<'_>, modal: &ModalLayout) {
    canvas.fill_screen_rect(modal.backdrop, BACKDROP);
    canvas.fill_screen_rect(modal.dialog, DIALOG_BG);
    canvas.outline_screen_rect(modal.dialog, PANEL_BORDER);
    let (title_x, title_y) = modal.title_origin();
    draw_text(canvas, title_x as i32, title_y as i32, &modal.title, DIALOG_TEXT);
    for (index, line) in modal.lines.iter().enumerate() {
        let (x, y) = modal.line_origin(index);
        draw_text(canvas, x as i32, y as i32, line, DIALOG_TEXT);
    }
    canvas.fill_screen_rect(modal.button, button_color(ButtonStyle::Active));
    let label_x = modal.button.x as i32 + (modal.button.width as i32 - text_width(modal.button_label)) / 2;
    draw_text(
        canvas,
        label_x,
        centered_text_y(modal.button) as i32,
        modal.button_label,
        TEXT_COLOR,
    );
}
