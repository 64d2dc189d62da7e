use serde::{Deserialize, Serialize};

pub const TILE_SIZE_PX: f64 = 256.0;
pub const MIN_ZOOM: i32 = 1;
pub const MAX_ZOOM: i32 = 5;
pub const DEFAULT_ZOOM: i32 = 3;

/// Game map calibration: world units to zoom-0 projected pixels.
pub const GAME_MAP_TRANSFORM: AffineTransform = AffineTransform {
    scale_x: 0.02072,
    offset_x: 117.3,
    scale_y: -0.0205,
    offset_y: 172.8,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned screen rectangle, `max` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub scale_x: f64,
    pub offset_x: f64,
    pub scale_y: f64,
    pub offset_y: f64,
}

impl AffineTransform {
    pub fn forward(&self, world: WorldPoint) -> ProjectedPoint {
        ProjectedPoint {
            x: self.scale_x * world.x + self.offset_x,
            y: self.scale_y * world.y + self.offset_y,
        }
    }

    pub fn inverse(&self, projected: ProjectedPoint) -> WorldPoint {
        WorldPoint {
            x: (projected.x - self.offset_x) / self.scale_x,
            y: (projected.y - self.offset_y) / self.scale_y,
        }
    }
}

pub fn scale_from_zoom(zoom: f64) -> f64 {
    2f64.powf(zoom)
}

pub fn zoom_from_scale(scale: f64) -> f64 {
    scale.log2()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    fn half_extent(self) -> (f64, f64) {
        (self.width as f64 * 0.5, self.height as f64 * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub zoom: i32,
    pub x: i64,
    pub y: i64,
}

/// View onto the projected map. `center` is kept in world units so zoom
/// changes pivot around the same place on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    pub center: WorldPoint,
    zoom: i32,
    transform: AffineTransform,
}

impl Default for MapCamera {
    fn default() -> Self {
        Self::new(WorldPoint::default(), DEFAULT_ZOOM)
    }
}

impl MapCamera {
    pub fn new(center: WorldPoint, zoom: i32) -> Self {
        Self {
            center,
            zoom: clamp_zoom(zoom),
            transform: GAME_MAP_TRANSFORM,
        }
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn set_zoom_clamped(&mut self, zoom: i32) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        self.set_zoom_clamped(self.zoom.saturating_add(steps));
    }

    pub fn scale(&self) -> f64 {
        scale_from_zoom(self.zoom as f64)
    }

    /// Projected pixel position at the current zoom.
    pub fn world_to_pixel(&self, world: WorldPoint) -> ProjectedPoint {
        let projected = self.transform.forward(world);
        let scale = self.scale();
        ProjectedPoint {
            x: projected.x * scale,
            y: projected.y * scale,
        }
    }

    pub fn pixel_to_world(&self, pixel: ProjectedPoint) -> WorldPoint {
        let scale = self.scale();
        self.transform.inverse(ProjectedPoint {
            x: pixel.x / scale,
            y: pixel.y / scale,
        })
    }

    /// Projected pixel coordinate sitting at the viewport's top-left corner.
    pub fn pixel_origin(&self, viewport: Viewport) -> ProjectedPoint {
        let center = self.world_to_pixel(self.center);
        let (half_w, half_h) = viewport.half_extent();
        ProjectedPoint {
            x: center.x - half_w,
            y: center.y - half_h,
        }
    }

    pub fn world_to_screen(&self, world: WorldPoint, viewport: Viewport) -> ScreenPoint {
        let pixel = self.world_to_pixel(world);
        let origin = self.pixel_origin(viewport);
        ScreenPoint {
            x: (pixel.x - origin.x) as f32,
            y: (pixel.y - origin.y) as f32,
        }
    }

    pub fn screen_to_world(&self, screen: ScreenPoint, viewport: Viewport) -> WorldPoint {
        let origin = self.pixel_origin(viewport);
        self.pixel_to_world(ProjectedPoint {
            x: screen.x as f64 + origin.x,
            y: screen.y as f64 + origin.y,
        })
    }

    /// Moves the view so the map follows a pointer moved by `(dx, dy)` pixels.
    pub fn pan_by_screen_delta(&mut self, dx: f32, dy: f32) {
        let center = self.world_to_pixel(self.center);
        self.center = self.pixel_to_world(ProjectedPoint {
            x: center.x - dx as f64,
            y: center.y - dy as f64,
        });
    }

    pub fn visible_tiles(&self, viewport: Viewport, native_max_zoom: i32) -> Vec<TileKey> {
        if viewport.width == 0 || viewport.height == 0 {
            return Vec::new();
        }
        let origin = self.pixel_origin(viewport);
        let x_min = (origin.x / TILE_SIZE_PX).floor() as i64;
        let y_min = (origin.y / TILE_SIZE_PX).floor() as i64;
        let x_max = ((origin.x + viewport.width as f64) / TILE_SIZE_PX).floor() as i64;
        let y_max = ((origin.y + viewport.height as f64) / TILE_SIZE_PX).floor() as i64;
        let tiles_per_axis = 1i64 << self.zoom.clamp(0, native_max_zoom.max(0));

        let mut tiles = Vec::new();
        for y in y_min.max(0)..=y_max.min(tiles_per_axis - 1) {
            for x in x_min.max(0)..=x_max.min(tiles_per_axis - 1) {
                tiles.push(TileKey {
                    zoom: self.zoom,
                    x,
                    y,
                });
            }
        }
        tiles
    }

    pub fn tile_screen_origin(&self, tile: TileKey, viewport: Viewport) -> ScreenPoint {
        let origin = self.pixel_origin(viewport);
        ScreenPoint {
            x: (tile.x as f64 * TILE_SIZE_PX - origin.x) as f32,
            y: (tile.y as f64 * TILE_SIZE_PX - origin.y) as f32,
        }
    }
}

fn clamp_zoom(zoom: i32) -> i32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_world_close(actual: WorldPoint, expected: WorldPoint, epsilon: f64) {
        let tolerance_x = epsilon * expected.x.abs().max(1.0);
        let tolerance_y = epsilon * expected.y.abs().max(1.0);
        assert!(
            (actual.x - expected.x).abs() <= tolerance_x,
            "x {} vs {}",
            actual.x,
            expected.x
        );
        assert!(
            (actual.y - expected.y).abs() <= tolerance_y,
            "y {} vs {}",
            actual.y,
            expected.y
        );
    }

    #[test]
    fn inverse_undoes_forward_for_sampled_points() {
        let samples = [
            (0.0, 0.0),
            (12.5, -3.0),
            (-5661.0, 8429.0),
            (6694.0, -4058.0),
            (1e-7, -1e-7),
            (123456.789, -98765.4321),
        ];
        for (x, y) in samples {
            let world = WorldPoint::new(x, y);
            let back = GAME_MAP_TRANSFORM.inverse(GAME_MAP_TRANSFORM.forward(world));
            assert_world_close(back, world, EPSILON);
        }
    }

    #[test]
    fn forward_matches_calibration_constants() {
        let projected = GAME_MAP_TRANSFORM.forward(WorldPoint::new(0.0, 0.0));
        assert!((projected.x - 117.3).abs() < EPSILON);
        assert!((projected.y - 172.8).abs() < EPSILON);

        let projected = GAME_MAP_TRANSFORM.forward(WorldPoint::new(100.0, 100.0));
        assert!((projected.x - (2.072 + 117.3)).abs() < EPSILON);
        assert!((projected.y - (172.8 - 2.05)).abs() < EPSILON);
    }

    #[test]
    fn zoom_and_scale_are_inverse() {
        for zoom in [-3.0, 0.0, 0.5, 1.0, 3.0, 5.0, 8.25] {
            let round_trip = zoom_from_scale(scale_from_zoom(zoom));
            assert!((round_trip - zoom).abs() < EPSILON, "zoom {zoom}");
        }
        for scale in [0.125, 1.0, 3.0, 32.0, 1000.0] {
            let round_trip = scale_from_zoom(zoom_from_scale(scale));
            assert!((round_trip - scale).abs() < EPSILON * scale, "scale {scale}");
        }
    }

    #[test]
    fn camera_center_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = MapCamera::new(WorldPoint::new(250.0, -40.0), 3);
        let screen = camera.world_to_screen(WorldPoint::new(250.0, -40.0), viewport);
        assert!((screen.x - 400.0).abs() < 0.001);
        assert!((screen.y - 300.0).abs() < 0.001);
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let viewport = Viewport {
            width: 1280,
            height: 720,
        };
        let camera = MapCamera::new(WorldPoint::new(-300.0, 1200.0), 4);
        let world = WorldPoint::new(-260.5, 1180.25);
        let screen = camera.world_to_screen(world, viewport);
        let back = camera.screen_to_world(screen, viewport);
        assert_world_close(back, world, 1e-4);
    }

    #[test]
    fn world_y_grows_upward_on_screen() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = MapCamera::default();
        let low = camera.world_to_screen(WorldPoint::new(0.0, 0.0), viewport);
        let high = camera.world_to_screen(WorldPoint::new(0.0, 100.0), viewport);
        assert!(high.y < low.y);
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut camera = MapCamera::default();
        assert_eq!(camera.zoom(), DEFAULT_ZOOM);
        camera.apply_zoom_steps(10);
        assert_eq!(camera.zoom(), MAX_ZOOM);
        camera.apply_zoom_steps(-10);
        assert_eq!(camera.zoom(), MIN_ZOOM);
        assert_eq!(MapCamera::new(WorldPoint::default(), 99).zoom(), MAX_ZOOM);
    }

    #[test]
    fn pan_moves_map_with_pointer() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let mut camera = MapCamera::default();
        let anchor = WorldPoint::new(10.0, 10.0);
        let before = camera.world_to_screen(anchor, viewport);
        camera.pan_by_screen_delta(30.0, -12.0);
        let after = camera.world_to_screen(anchor, viewport);
        assert!((after.x - before.x - 30.0).abs() < 0.01);
        assert!((after.y - before.y + 12.0).abs() < 0.01);
    }

    #[test]
    fn visible_tiles_stay_inside_the_tile_grid() {
        let viewport = Viewport {
            width: 1280,
            height: 720,
        };
        let camera = MapCamera::new(WorldPoint::default(), 1);
        let tiles = camera.visible_tiles(viewport, 5);
        assert!(!tiles.is_empty());
        for tile in &tiles {
            assert!(tile.x >= 0 && tile.x < 2);
            assert!(tile.y >= 0 && tile.y < 2);
        }
        assert!(camera
            .visible_tiles(
                Viewport {
                    width: 0,
                    height: 10
                },
                5
            )
            .is_empty());
    }
}
