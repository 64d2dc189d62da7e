use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

use crate::app::ui::draw::ImageView;
use crate::layers::BaseLayer;
use crate::projection::{TileKey, TILE_SIZE_PX};

const FALLBACK_TILE_SIZE: u32 = TILE_SIZE_PX as u32;
/// About 48 MiB of decoded 256 px tiles; several screens' worth at any size.
pub(crate) const DEFAULT_MAX_CACHED_TILES: usize = 192;

pub(crate) struct LoadedTile {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedTile {
    pub(crate) fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            rgba: &self.rgba,
        }
    }

    /// Scale that stretches this image over one map tile.
    pub(crate) fn scale_to_tile(&self) -> f32 {
        if self.width == 0 {
            1.0
        } else {
            TILE_SIZE_PX as f32 / self.width as f32
        }
    }
}

struct CachedTile {
    image: Option<LoadedTile>,
    last_used: u64,
}

/// Decoded tile images keyed by layer and tile, bounded by evicting the
/// least recently drawn entry. Misses are cached too, so a missing file is
/// read once and then drawn from the layer's fallback.
pub(crate) struct TileCache {
    tiles_dir: PathBuf,
    max_tiles: usize,
    clock: u64,
    tiles: HashMap<(BaseLayer, TileKey), CachedTile>,
    fallbacks: HashMap<BaseLayer, LoadedTile>,
    warned_layers: HashSet<BaseLayer>,
}

impl TileCache {
    pub(crate) fn new(tiles_dir: PathBuf) -> Self {
        Self::with_capacity(tiles_dir, DEFAULT_MAX_CACHED_TILES)
    }

    pub(crate) fn with_capacity(tiles_dir: PathBuf, max_tiles: usize) -> Self {
        Self {
            tiles_dir,
            max_tiles: max_tiles.max(1),
            clock: 0,
            tiles: HashMap::new(),
            fallbacks: HashMap::new(),
            warned_layers: HashSet::new(),
        }
    }

    pub(crate) fn tile(&mut self, layer: BaseLayer, key: TileKey) -> &LoadedTile {
        self.clock += 1;
        let now = self.clock;
        match self.tiles.get_mut(&(layer, key)) {
            Some(cached) => cached.last_used = now,
            None => {
                let path = tile_path(&self.tiles_dir, layer, key);
                let image = match load_tile_rgba(&path) {
                    Ok(tile) => Some(tile),
                    Err(reason) => {
                        warn_layer_once(&mut self.warned_layers, layer, &path, &reason);
                        None
                    }
                };
                self.evict_to(self.max_tiles - 1);
                self.tiles.insert(
                    (layer, key),
                    CachedTile {
                        image,
                        last_used: now,
                    },
                );
            }
        }
        if let Some(CachedTile {
            image: Some(tile), ..
        }) = self.tiles.get(&(layer, key))
        {
            return tile;
        }
        self.fallbacks
            .entry(layer)
            .or_insert_with(|| procedural_tile(layer))
    }

    fn evict_to(&mut self, limit: usize) {
        while self.tiles.len() > limit {
            let Some(oldest) = self
                .tiles
                .iter()
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(slot, _)| *slot)
            else {
                return;
            };
            self.tiles.remove(&oldest);
        }
    }
}

pub(crate) fn tile_path(tiles_dir: &Path, layer: BaseLayer, key: TileKey) -> PathBuf {
    tiles_dir
        .join(layer.id())
        .join(key.zoom.to_string())
        .join(key.x.to_string())
        .join(format!("{}.{}", key.y, layer.tile_extension()))
}

fn load_tile_rgba(path: &Path) -> Result<LoadedTile, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedTile {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_layer_once(warned: &mut HashSet<BaseLayer>, layer: BaseLayer, path: &Path, reason: &str) {
    if !warned.insert(layer) {
        return;
    }
    warn!(
        layer = layer.id(),
        path = %path.display(),
        reason,
        "tile_load_failed_using_fallback"
    );
}

fn procedural_tile(layer: BaseLayer) -> LoadedTile {
    let (base, alt, line) = match layer {
        BaseLayer::Satellite => ([28, 54, 66, 255], [34, 62, 58, 255], [44, 78, 84, 255]),
        BaseLayer::Atlas => ([222, 214, 190, 255], [214, 205, 178, 255], [190, 180, 150, 255]),
        BaseLayer::Grid => ([242, 244, 246, 255], [242, 244, 246, 255], [170, 180, 192, 255]),
    };
    let size = FALLBACK_TILE_SIZE;
    let cell = size / 8;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let color = if x % cell == 0 || y % cell == 0 {
                line
            } else if ((x / cell) + (y / cell)) % 2 == 0 {
                base
            } else {
                alt
            };
            rgba.extend_from_slice(&color);
        }
    }
    LoadedTile {
        width: size,
        height: size,
        rgba,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: TileKey = TileKey { zoom: 3, x: 4, y: 5 };

    #[test]
    fn tile_path_follows_layer_layout() {
        let path = tile_path(Path::new("/tiles"), BaseLayer::Grid, KEY);
        assert_eq!(path, PathBuf::from("/tiles/grid/3/4/5.png"));
        let path = tile_path(Path::new("/tiles"), BaseLayer::Atlas, KEY);
        assert_eq!(path, PathBuf::from("/tiles/atlas/3/4/5.jpg"));
    }

    #[test]
    fn missing_tiles_fall_back_and_warn_once_per_layer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = TileCache::new(dir.path().to_path_buf());

        let tile = cache.tile(BaseLayer::Satellite, KEY);
        assert_eq!(tile.width, FALLBACK_TILE_SIZE);
        cache.tile(BaseLayer::Satellite, TileKey { zoom: 3, x: 0, y: 0 });

        assert_eq!(cache.warned_layers.len(), 1);
        assert_eq!(cache.tiles.len(), 2);
        assert_eq!(cache.fallbacks.len(), 1);
    }

    #[test]
    fn real_png_tiles_are_decoded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = tile_path(dir.path(), BaseLayer::Grid, KEY);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        image::RgbaImage::from_pixel(128, 128, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .expect("save png");

        let mut cache = TileCache::new(dir.path().to_path_buf());
        let tile = cache.tile(BaseLayer::Grid, KEY);

        assert_eq!((tile.width, tile.height), (128, 128));
        assert_eq!(&tile.rgba[..4], &[1, 2, 3, 255]);
        assert_eq!(tile.scale_to_tile(), 2.0);
        assert!(cache.warned_layers.is_empty());
    }

    #[test]
    fn panning_and_zooming_keeps_cache_bounded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = TileCache::with_capacity(dir.path().to_path_buf(), 16);

        for zoom in 1..=5 {
            for x in 0..8 {
                for y in 0..4 {
                    cache.tile(BaseLayer::Atlas, TileKey { zoom, x, y });
                    assert!(cache.tiles.len() <= 16);
                }
            }
        }
        assert_eq!(cache.tiles.len(), 16);
        assert!(cache.tiles.contains_key(&(BaseLayer::Atlas, TileKey { zoom: 5, x: 7, y: 3 })));
        assert!(!cache.tiles.contains_key(&(BaseLayer::Atlas, TileKey { zoom: 1, x: 0, y: 0 })));
    }

    #[test]
    fn recently_drawn_tiles_survive_eviction() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = TileCache::with_capacity(dir.path().to_path_buf(), 2);
        let first = TileKey { zoom: 2, x: 0, y: 0 };
        let second = TileKey { zoom: 2, x: 1, y: 0 };

        cache.tile(BaseLayer::Grid, first);
        cache.tile(BaseLayer::Grid, second);
        cache.tile(BaseLayer::Grid, first);
        cache.tile(BaseLayer::Grid, TileKey { zoom: 2, x: 2, y: 0 });

        assert!(cache.tiles.contains_key(&(BaseLayer::Grid, first)));
        assert!(!cache.tiles.contains_key(&(BaseLayer::Grid, second)));
    }
}
