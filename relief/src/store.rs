//! Raw tile file aggregator.

use crate::ReliefError;
use dashmap::DashMap;
use geo::geometry::Coord;
use log::debug;
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tessadem::{DemError, Raster, TileKey, C};

/// On-demand, sparse mapping from [`TileKey`] to decoded [`Raster`].
///
/// Missing source files are not errors: they are cached as void
/// rasters, so every lookup through them comes back absent.
#[derive(Clone)]
pub struct RasterStore {
    /// Directory containing raw `<lat>_<lon>` tile files.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    mode: StoreMode,

    /// Rasters which have been decoded on demand.
    rasters: DashMap<TileKey, Arc<Raster>>,
}

impl RasterStore {
    /// Opens a store over `tile_dir`.
    ///
    /// Fails early with [`ReliefError::Path`] when the directory
    /// contains no entry with a parseable `<lat>_<lon>` name.
    pub fn new(tile_dir: PathBuf, mode: StoreMode) -> Result<Self, ReliefError> {
        let mut has_tiles = false;

        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            let key = path
                .file_stem()
                .and_then(std::ffi::OsStr::to_str)
                .and_then(TileKey::from_name);
            if key.is_some() {
                has_tiles = true;
                break;
            }
        }

        if has_tiles {
            let rasters = DashMap::new();
            Ok(Self {
                tile_dir,
                mode,
                rasters,
            })
        } else {
            Err(ReliefError::Path(tile_dir))
        }
    }

    /// Returns the raster covering `coord`.
    ///
    /// The raster is decoded from disk on first access; concurrent
    /// first accesses to one key decode it at most once, and no caller
    /// ever observes a partially decoded raster.
    pub fn get(&self, coord: Coord<C>) -> Result<Arc<Raster>, ReliefError> {
        let key = key_for(coord);
        self.rasters
            .entry(key)
            .or_try_insert_with(|| match self.load_raster(key) {
                Ok(raster) => Ok(Arc::new(raster)),
                Err(ReliefError::Dem(DemError::Io(e))) if e.kind() == ErrorKind::NotFound => {
                    debug!("no tile on disk for {key}, caching a void raster");
                    Ok(Arc::new(Raster::void(key)))
                }
                Err(e) => Err(e),
            })
            .map(|r| r.clone())
    }
}

/// Private API.
impl RasterStore {
    fn load_raster(&self, key: TileKey) -> Result<Raster, ReliefError> {
        let tile_path = self.tile_dir.join(key.to_string());
        debug!("loading {tile_path:?}");
        match self.mode {
            StoreMode::InMem => Ok(Raster::load(tile_path)?),
            StoreMode::MemMap => Ok(Raster::memmap(tile_path)?),
        }
    }
}

/// How to hold tile data.
///
/// The trade off between decoding tiles into memory and memory mapping
/// them is not obvious; measure both before deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Decode the tile into memory.
    ///
    /// Note that this can consume gigabytes of RAM when touching many
    /// tiles.
    InMem,

    /// Memory map file contents and decode samples on access.
    MemMap,
}

/// Returns the key of the one-degree tile containing `coord`.
fn key_for(Coord { x, y }: Coord<C>) -> TileKey {
    #[allow(clippy::cast_possible_truncation)]
    TileKey {
        lat: y.floor() as i32,
        lon: x.floor() as i32,
    }
}
