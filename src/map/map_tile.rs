use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;

/// `(zoom, x, y)` of a base-layer tile.
pub type TileKey = (u32, u32, u32);

pub const TILE_CACHE_SIZE: usize = 512;

pub struct MapTile {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
    image: egui::ColorImage,
    texture: Option<egui::TextureHandle>, // Loaded lazily, the retriever has no egui context
}

impl MapTile {
    pub fn new(x: u32, y: u32, zoom: u32, image: egui::ColorImage) -> Self {
        Self {
            x,
            y,
            zoom,
            image,
            texture: None,
        }
    }

    pub fn key(&self) -> TileKey {
        (self.zoom, self.x, self.y)
    }

    pub fn texture(&mut self, ctx: &egui::Context) -> &egui::TextureHandle {
        let name = format!("tile_{}_{}_zoom{}", self.x, self.y, self.zoom);
        let image = &self.image;
        self.texture
            .get_or_insert_with(|| ctx.load_texture(name, image.clone(), egui::TextureOptions::LINEAR))
    }
}

/// Decoded base-layer tiles plus the set of requests still in flight.
pub struct TileCache {
    tiles: LruCache<TileKey, MapTile>,
    pending: HashSet<TileKey>,
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(TILE_CACHE_SIZE)
    }
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            pending: HashSet::new(),
        }
    }

    pub fn get_mut(&mut self, key: &TileKey) -> Option<&mut MapTile> {
        self.tiles.get_mut(key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &TileKey) -> bool {
        self.tiles.contains(key)
    }

    /// Marks a tile as requested. Returns false when it is already cached or
    /// on its way.
    pub fn request(&mut self, key: TileKey) -> bool {
        if self.tiles.contains(&key) || self.pending.contains(&key) {
            return false;
        }
        self.pending.insert(key)
    }

    pub fn insert(&mut self, tile: MapTile) {
        let key = tile.key();
        self.pending.remove(&key);
        self.tiles.put(key, tile);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
