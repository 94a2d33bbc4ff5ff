//! Pyramid tile rendering.
//!
//! Resamples one raster into fixed-size Web-Mercator-addressed pixel
//! grids. The output carries an explicit validity mask instead of
//! sentinel values so the downstream image encoder can make its own
//! transparency decisions.

use crate::math::{latlon_to_tile, tile_bounds};
use geo::geometry::Coord;
use tessadem::{Raster, Sampling, C};

/// Pyramid tile indices (zoom / x / y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// The tile containing `coord` at `zoom`.
    pub fn containing(coord: Coord<C>, zoom: u32) -> Self {
        let (x, y) = latlon_to_tile(coord.y, coord.x, zoom);
        Self { z: zoom, x, y }
    }

    /// Geographic bounds as `(lon_min, lat_min, lon_max, lat_max)`,
    /// degrees.
    pub fn bounds(&self) -> (C, C, C, C) {
        tile_bounds(self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Output grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output tile edge length in pixels.
    pub tile_size: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { tile_size: 256 }
    }
}

/// A rendered pyramid tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    /// Edge length in pixels.
    pub size: usize,

    /// Row-major bilinear elevations; invalid pixels hold the source
    /// raster's nodata value.
    pub pixels: Vec<C>,

    /// Parallel mask; true = valid sample, false = nodata or outside
    /// the raster.
    pub mask: Vec<bool>,
}

impl TileImage {
    /// Number of valid pixels.
    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|valid| **valid).count()
    }

    /// Lowest and highest valid pixel values, if any pixel is valid.
    pub fn value_range(&self) -> Option<(C, C)> {
        self.pixels
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, valid)| **valid)
            .map(|(value, _)| *value)
            .fold(None, |acc, value| {
                let (min, max) = acc.unwrap_or((value, value));
                Some((min.min(value), max.max(value)))
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Resamples `raster` into the pixel grid of pyramid tile `tile`.
    ///
    /// Each output pixel is the bilinear sample at its geographic
    /// center. A tile that misses the raster entirely comes back with
    /// an all-false mask; that is an empty result, not an error.
    pub fn render(&self, raster: &Raster, tile: TileCoord) -> TileImage {
        let size = self.options.tile_size;
        let (lon_min, lat_min, lon_max, lat_max) = tile.bounds();
        let lon_span = lon_max - lon_min;
        let lat_span = lat_max - lat_min;

        let placeholder = C::from(raster.spec().nodata);
        let mut pixels = vec![placeholder; size * size];
        let mut mask = vec![false; size * size];

        #[allow(clippy::cast_precision_loss)]
        let size_f = size as C;
        for r in 0..size {
            #[allow(clippy::cast_precision_loss)]
            let lat = lat_max - (r as C + 0.5) / size_f * lat_span;
            for c in 0..size {
                #[allow(clippy::cast_precision_loss)]
                let lon = lon_min + (c as C + 0.5) / size_f * lon_span;
                let coord = Coord { x: lon, y: lat };
                if let Some(elevation) = raster.sample(coord, Sampling::Bilinear) {
                    pixels[r * size + c] = elevation;
                    mask[r * size + c] = true;
                }
            }
        }

        TileImage { size, pixels, mask }
    }
}

/// Renders `raster` into pyramid tile `(zoom, x, y)` with the default
/// 256x256 output grid.
pub fn render_tile(raster: &Raster, zoom: u32, x: u32, y: u32) -> TileImage {
    Renderer::default().render(raster, TileCoord::new(zoom, x, y))
}
