//! Raw one-degree DEM elevation tile format.
//!
//! One tile covers a one-degree square of the Earth's surface and is
//! named after the integer coordinates of its southwest corner, e.g.
//! `42_45` or `-12_30`. The payload is a bare row-major grid of signed
//! 16-bit little-endian elevation samples with no header. Every tile
//! has 3600 rows, the first row being the northernmost; the column
//! count shrinks in latitude bands to keep sample spacing roughly
//! uniform on the ground:
//!
//! | abs(sw latitude) | columns |
//! |------------------|---------|
//! | < 50             | 3600    |
//! | 50..60           | 2400    |
//! | 60..70           | 1800    |
//! | 70..80           | 1200    |
//! | >= 80            | 720     |
//!
//! The value `-9999` marks a cell with no measurement.

mod error;
mod transform;

pub use crate::{error::DemError, transform::GeoTransform};
use byteorder::{ByteOrder, LittleEndian as LE};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{
    fmt,
    fs::File,
    mem::size_of,
    path::Path,
    sync::atomic::{AtomicI16, Ordering},
};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Elevation sample type, meters above sea level.
pub type Elev = i16;

/// Rows per tile.
pub const ROWS: usize = 3600;

/// Sample value meaning "no measurement".
pub const NODATA: Elev = -9999;

/// Returns the column count for a tile whose southwest corner sits at
/// integer latitude `lat_ll`. Total over all integers.
pub fn cols_for_lat(lat_ll: i32) -> usize {
    match lat_ll.unsigned_abs() {
        0..=49 => 3600,
        50..=59 => 2400,
        60..=69 => 1800,
        70..=79 => 1200,
        _ => 720,
    }
}

/// Integer southwest corner naming one source tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Latitude of the southwest corner.
    pub lat: i32,
    /// Longitude of the southwest corner.
    pub lon: i32,
}

impl TileKey {
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Parses a `<lat>_<lon>` tile name, e.g. `42_45` or `-12_30`.
    pub fn from_name(name: &str) -> Option<Self> {
        let (lat, lon) = name.split_once('_')?;
        Some(Self {
            lat: lat.parse().ok()?,
            lon: lon.parse().ok()?,
        })
    }

    /// Southwest corner as a geographic coordinate.
    pub fn sw_corner(&self) -> Coord<C> {
        Coord {
            x: C::from(self.lon),
            y: C::from(self.lat),
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lat, self.lon)
    }
}

/// Grid parameters a [`Raster`] is decoded against.
///
/// Carried explicitly so multiple configurations can coexist in one
/// process; the default matches the raw tile format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    /// Rows per tile.
    pub rows: usize,
    /// Sample value meaning "no measurement".
    pub nodata: Elev,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: ROWS,
            nodata: NODATA,
        }
    }
}

/// Value lookup policy for [`Raster::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Round to the nearest cell and return its raw value.
    Nearest,
    /// Weighted average of the four surrounding cells. Refuses to
    /// blend if any of the four is nodata.
    Bilinear,
}

/// A georeferenced elevation grid decoded from one source tile.
///
/// Immutable after construction; share it behind an `Arc` and read it
/// from as many threads as you like.
pub struct Raster {
    /// Source tile this raster was decoded from.
    key: TileKey,

    /// Grid parameters used at decode time.
    spec: GridSpec,

    /// Columns per row.
    cols: usize,

    /// Geographic <-> pixel mapping.
    transform: GeoTransform,

    /// Lowest valid elevation sample, computed lazily.
    min_elevation: AtomicI16,

    /// Highest valid elevation sample, computed lazily.
    max_elevation: AtomicI16,

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    /// Stands in for a tile with no data; every lookup is nodata.
    Void,
    InMem(Box<[Elev]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize, nodata: Elev) -> Elev {
        match self {
            Self::Void => nodata,
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<Elev>();
                LE::read_i16(&raw.as_ref()[start..start + size_of::<Elev>()])
            }
        }
    }

    /// Lowest and highest sample not equal to `nodata`, or `None` if
    /// the store holds no valid sample at all.
    fn extremes(&self, nodata: Elev) -> Option<(Elev, Elev)> {
        let fold = |acc: Option<(Elev, Elev)>, sample: Elev| {
            if sample == nodata {
                acc
            } else {
                let (min, max) = acc.unwrap_or((sample, sample));
                Some((min.min(sample), max.max(sample)))
            }
        };
        match self {
            Self::Void => None,
            Self::InMem(samples) => samples.iter().copied().fold(None, fold),
            Self::MemMap(raw) => (*raw)
                .chunks_exact(size_of::<Elev>())
                .map(LE::read_i16)
                .fold(None, fold),
        }
    }
}

impl Raster {
    /// Decodes a raw little-endian sample buffer with the default
    /// [`GridSpec`].
    pub fn from_bytes(key: TileKey, bytes: &[u8]) -> Result<Self, DemError> {
        Self::from_bytes_with(key, GridSpec::default(), bytes)
    }

    /// Decodes a raw little-endian sample buffer.
    ///
    /// The buffer must hold exactly `spec.rows * cols_for_lat(key.lat)`
    /// samples; anything else fails with
    /// [`DemError::FormatMismatch`]. Decoding is deterministic and
    /// allocates only the sample grid.
    pub fn from_bytes_with(key: TileKey, spec: GridSpec, bytes: &[u8]) -> Result<Self, DemError> {
        let cols = cols_for_lat(key.lat);
        let expected = spec.rows * cols;
        if bytes.len() != expected * size_of::<Elev>() {
            return Err(DemError::FormatMismatch {
                key,
                expected,
                actual: bytes.len() / size_of::<Elev>(),
            });
        }
        let mut samples = vec![0 as Elev; expected];
        LE::read_i16_into(bytes, &mut samples);
        Ok(Self::with_store(
            key,
            spec,
            cols,
            SampleStore::InMem(samples.into_boxed_slice()),
        ))
    }

    /// Wraps already-decoded samples.
    ///
    /// This is the seam for byte sources other than raw tile files;
    /// `cols` is explicit so callers are not tied to the banding rule.
    pub fn from_samples(
        key: TileKey,
        spec: GridSpec,
        cols: usize,
        samples: Vec<Elev>,
    ) -> Result<Self, DemError> {
        let expected = spec.rows * cols;
        if samples.len() != expected {
            return Err(DemError::FormatMismatch {
                key,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self::with_store(
            key,
            spec,
            cols,
            SampleStore::InMem(samples.into_boxed_slice()),
        ))
    }

    /// Reads and decodes the tile file at `path`, taking the
    /// [`TileKey`] from the file stem.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let key = parse_tile_key(&path)?;
        let bytes = std::fs::read(&path)?;
        Self::from_bytes(key, &bytes)
    }

    /// Returns a raster backed by the memory-mapped file at `path`.
    ///
    /// Samples are read lazily, but the file length is validated up
    /// front against the same count invariant as [`Raster::from_bytes`].
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let key = parse_tile_key(&path)?;
        let spec = GridSpec::default();
        let cols = cols_for_lat(key.lat);
        let expected = spec.rows * cols;
        let file = File::open(&path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() != expected * size_of::<Elev>() {
            return Err(DemError::FormatMismatch {
                key,
                expected,
                actual: mmap.len() / size_of::<Elev>(),
            });
        }
        Ok(Self::with_store(key, spec, cols, SampleStore::MemMap(mmap)))
    }

    /// Returns a raster whose every sample is nodata.
    ///
    /// Stands in for tiles with no source data so lookups degrade to
    /// absent values instead of errors.
    pub fn void(key: TileKey) -> Self {
        let spec = GridSpec::default();
        let cols = cols_for_lat(key.lat);
        Self::with_store(key, spec, cols, SampleStore::Void)
    }

    fn with_store(key: TileKey, spec: GridSpec, cols: usize, samples: SampleStore) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let transform = GeoTransform::new(
            C::from(key.lon),
            C::from(key.lat + 1),
            1.0 / cols as C,
            1.0 / spec.rows as C,
        );
        Self {
            key,
            spec,
            cols,
            transform,
            min_elevation: AtomicI16::new(Elev::MAX),
            max_elevation: AtomicI16::new(Elev::MAX),
            samples,
        }
    }

    /// The source tile this raster was decoded from.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Grid parameters used at decode time.
    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    pub fn rows(&self) -> usize {
        self.spec.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the number of samples in this raster.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.spec.rows * self.cols
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// True if the geographic position falls inside this raster's
    /// one-degree extent.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        let sw = self.key.sw_corner();
        coord.x >= sw.x && coord.x < sw.x + 1.0 && coord.y >= sw.y && coord.y < sw.y + 1.0
    }

    /// Raw cell value, nodata included. `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Elev> {
        if row < self.spec.rows && col < self.cols {
            Some(self.samples.get_unchecked(row * self.cols + col, self.spec.nodata))
        } else {
            None
        }
    }

    /// Elevation at the geographic position, or `None` when the
    /// position is outside the raster or the lookup touches nodata.
    pub fn sample(&self, coord: Coord<C>, method: Sampling) -> Option<C> {
        match method {
            Sampling::Nearest => self.sample_nearest(coord),
            Sampling::Bilinear => self.sample_bilinear(coord),
        }
    }

    /// Lowest valid elevation sample, or `None` for a raster with no
    /// valid sample. Computed on first use and cached.
    pub fn min_elevation(&self) -> Option<Elev> {
        let mut min = self.min_elevation.load(Ordering::Relaxed);
        if min == Elev::MAX {
            let (lo, hi) = self.samples.extremes(self.spec.nodata)?;
            self.min_elevation.store(lo, Ordering::SeqCst);
            self.max_elevation.store(hi, Ordering::SeqCst);
            min = lo;
        }
        Some(min)
    }

    /// Highest valid elevation sample, or `None` for a raster with no
    /// valid sample. Computed on first use and cached.
    pub fn max_elevation(&self) -> Option<Elev> {
        let mut max = self.max_elevation.load(Ordering::Relaxed);
        if max == Elev::MAX {
            let (lo, hi) = self.samples.extremes(self.spec.nodata)?;
            self.min_elevation.store(lo, Ordering::SeqCst);
            self.max_elevation.store(hi, Ordering::SeqCst);
            max = hi;
        }
        Some(max)
    }
}

/// Private API.
impl Raster {
    fn sample_nearest(&self, coord: Coord<C>) -> Option<C> {
        let (row, col) = self.transform.to_pixel(coord.y, coord.x);
        #[allow(clippy::cast_precision_loss)]
        let in_bounds = row.floor() >= 0.0
            && row.floor() < self.spec.rows as C
            && col.floor() >= 0.0
            && col.floor() < self.cols as C;
        if !in_bounds {
            return None;
        }
        // Index by the rounded coordinate, clamped to the grid edge so
        // the outermost half-cell still maps to the outermost cell.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let r = (row.round() as usize).min(self.spec.rows - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = (col.round() as usize).min(self.cols - 1);
        let elevation = self.samples.get_unchecked(r * self.cols + c, self.spec.nodata);
        (elevation != self.spec.nodata).then(|| C::from(elevation))
    }

    fn sample_bilinear(&self, coord: Coord<C>) -> Option<C> {
        let (row, col) = self.transform.to_pixel(coord.y, coord.x);
        if row < 0.0 || col < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (r0, c0) = (row.floor() as usize, col.floor() as usize);
        let (r1, c1) = (r0 + 1, c0 + 1);
        if r1 >= self.spec.rows || c1 >= self.cols {
            return None;
        }
        // Never blend a valid sample with nodata.
        let corner = |r: usize, c: usize| {
            let elevation = self.samples.get_unchecked(r * self.cols + c, self.spec.nodata);
            (elevation != self.spec.nodata).then(|| C::from(elevation))
        };
        let v00 = corner(r0, c0)?;
        let v01 = corner(r0, c1)?;
        let v10 = corner(r1, c0)?;
        let v11 = corner(r1, c1)?;
        let (dy, dx) = (row - row.floor(), col - col.floor());
        let north = v00 * (1.0 - dx) + v01 * dx;
        let south = v10 * (1.0 - dx) + v11 * dx;
        Some(north * (1.0 - dy) + south * dy)
    }
}

fn parse_tile_key<P: AsRef<Path>>(path: P) -> Result<TileKey, DemError> {
    let mk_err = || DemError::TileName(path.as_ref().to_owned());
    path.as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .and_then(TileKey::from_name)
        .ok_or_else(mk_err)
}

#[cfg(test)]
mod tests {
    use super::{
        cols_for_lat, Coord, DemError, GridSpec, Raster, Sampling, TileKey, NODATA, ROWS,
    };
    use approx::assert_abs_diff_eq;
    use byteorder::{ByteOrder, LittleEndian as LE};
    use std::io::Write;

    fn raw_tile_bytes(cols: usize, value: i16) -> Vec<u8> {
        let mut bytes = vec![0u8; ROWS * cols * 2];
        let samples = vec![value; ROWS * cols];
        LE::write_i16_into(&samples, &mut bytes);
        bytes
    }

    #[test]
    fn test_cols_for_lat_bands() {
        for (lat, cols) in [
            (0, 3600),
            (49, 3600),
            (50, 2400),
            (59, 2400),
            (60, 1800),
            (69, 1800),
            (70, 1200),
            (79, 1200),
            (80, 720),
            (89, 720),
        ] {
            assert_eq!(cols_for_lat(lat), cols, "lat {lat}");
            assert_eq!(cols_for_lat(-lat), cols, "lat {}", -lat);
        }
    }

    #[test]
    fn test_tile_key_name_round_trip() {
        for name in ["42_45", "-12_30", "80_-170", "-1_-1"] {
            let key = TileKey::from_name(name).unwrap();
            assert_eq!(key.to_string(), name);
        }
        assert_eq!(TileKey::from_name("N44W072"), None);
        assert_eq!(TileKey::from_name("42"), None);
        assert_eq!(TileKey::from_name("42_45_7"), None);
    }

    #[test]
    fn test_decode_exact_length() {
        let key = TileKey::new(80, 10);
        let raster = Raster::from_bytes(key, &raw_tile_bytes(720, 7)).unwrap();
        assert_eq!(raster.cols(), 720);
        assert_eq!(raster.rows(), ROWS);
        assert_eq!(raster.len(), ROWS * 720);
        assert_eq!(raster.get(0, 0), Some(7));
        assert_eq!(raster.get(ROWS - 1, 719), Some(7));
        assert_eq!(raster.get(ROWS, 0), None);
    }

    #[test]
    fn test_decode_reports_mismatched_counts() {
        let key = TileKey::new(80, 10);
        let expected = ROWS * 720;

        let mut short = raw_tile_bytes(720, 0);
        short.truncate(short.len() - 2);
        match Raster::from_bytes(key, &short) {
            Err(DemError::FormatMismatch {
                key: k,
                expected: e,
                actual,
            }) => {
                assert_eq!(k, key);
                assert_eq!(e, expected);
                assert_eq!(actual, expected - 1);
            }
            other => panic!("expected FormatMismatch, got {other:?}", other = other.err()),
        }

        let mut long = raw_tile_bytes(720, 0);
        long.extend_from_slice(&[0, 0]);
        match Raster::from_bytes(key, &long) {
            Err(DemError::FormatMismatch { expected: e, actual, .. }) => {
                assert_eq!(e, expected);
                assert_eq!(actual, expected + 1);
            }
            other => panic!("expected FormatMismatch, got {other:?}", other = other.err()),
        }
    }

    #[test]
    fn test_decode_row_order() {
        // First decoded row is the northern edge.
        let key = TileKey::new(80, 10);
        let cols = 720;
        let mut samples = vec![0i16; ROWS * cols];
        samples[0] = 1234; // northwest corner
        let mut bytes = vec![0u8; samples.len() * 2];
        LE::write_i16_into(&samples, &mut bytes);
        let raster = Raster::from_bytes(key, &bytes).unwrap();

        let near_north = Coord { x: 10.000_1, y: 80.999_9 };
        assert_eq!(raster.sample(near_north, Sampling::Nearest), Some(1234.0));
        let near_south = Coord { x: 10.000_1, y: 80.000_1 };
        assert_eq!(raster.sample(near_south, Sampling::Nearest), Some(0.0));
    }

    #[test]
    fn test_constant_raster_point_lookup() {
        let key = TileKey::new(42, 45);
        let cols = cols_for_lat(42);
        let raster =
            Raster::from_samples(key, GridSpec::default(), cols, vec![100; ROWS * cols]).unwrap();

        assert_eq!(
            raster.sample(Coord { x: 45.5, y: 42.5 }, Sampling::Nearest),
            Some(100.0)
        );
        // South of the tile's extent.
        assert_eq!(raster.sample(Coord { x: 45.5, y: 41.9 }, Sampling::Nearest), None);
        assert!(raster.contains(Coord { x: 45.5, y: 42.5 }));
        assert!(!raster.contains(Coord { x: 45.5, y: 41.9 }));
    }

    #[test]
    fn test_memmap_matches_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("80_10");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&raw_tile_bytes(720, 42)).unwrap();
        drop(file);

        let loaded = Raster::load(&path).unwrap();
        let mapped = Raster::memmap(&path).unwrap();
        assert_eq!(loaded.key(), TileKey::new(80, 10));
        assert_eq!(mapped.key(), TileKey::new(80, 10));
        for (row, col) in [(0, 0), (1799, 360), (3599, 719)] {
            assert_eq!(loaded.get(row, col), mapped.get(row, col));
        }
    }

    #[test]
    fn test_load_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N44W072.hgt");
        std::fs::write(&path, [0u8; 4]).unwrap();
        assert!(matches!(Raster::load(&path), Err(DemError::TileName(_))));
    }

    /// 2x2 grid over one degree; cell values are laid out
    /// `[nw, ne, sw, se]`.
    fn quad(values: [i16; 4]) -> Raster {
        let key = TileKey::new(0, 0);
        let spec = GridSpec { rows: 2, ..GridSpec::default() };
        Raster::from_samples(key, spec, 2, values.to_vec()).unwrap()
    }

    #[test]
    fn test_bilinear_blends_four_cells() {
        let raster = quad([10, 20, 30, 40]);
        // Grid point (0.5, 0.5) mixes all four corners equally.
        let (lat, lon) = raster.transform().to_geo(0.5, 0.5);
        let value = raster.sample(Coord { x: lon, y: lat }, Sampling::Bilinear).unwrap();
        assert_abs_diff_eq!(value, 25.0, epsilon = 1e-9);
        // On a grid point the blend collapses to the cell value.
        let (lat, lon) = raster.transform().to_geo(0.0, 0.0);
        let value = raster.sample(Coord { x: lon, y: lat }, Sampling::Bilinear).unwrap();
        assert_abs_diff_eq!(value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bilinear_refuses_nodata_neighbor() {
        let raster = quad([10, NODATA, 30, 40]);
        let (lat, lon) = raster.transform().to_geo(0.5, 0.5);
        assert_eq!(raster.sample(Coord { x: lon, y: lat }, Sampling::Bilinear), None);
        // Nearest still resolves: (0.6, 0.4) rounds to cell (1, 0).
        let (lat, lon) = raster.transform().to_geo(0.6, 0.4);
        assert_eq!(raster.sample(Coord { x: lon, y: lat }, Sampling::Nearest), Some(30.0));
    }

    #[test]
    fn test_nearest_nodata_cell_is_absent() {
        let raster = quad([10, NODATA, 30, 40]);
        // (0.3, 0.8) rounds to the nodata cell (0, 1).
        let (lat, lon) = raster.transform().to_geo(0.3, 0.8);
        assert_eq!(raster.sample(Coord { x: lon, y: lat }, Sampling::Nearest), None);
    }

    #[test]
    fn test_bilinear_needs_all_four_neighbors_in_bounds() {
        let raster = quad([10, 20, 30, 40]);
        // Row 1.5 would need row 2, which does not exist.
        let (lat, lon) = raster.transform().to_geo(1.5, 0.5);
        assert_eq!(raster.sample(Coord { x: lon, y: lat }, Sampling::Bilinear), None);
        // Nearest is still in bounds there.
        assert_eq!(
            raster.sample(Coord { x: lon, y: lat }, Sampling::Nearest),
            Some(40.0)
        );
    }

    #[test]
    fn test_void_raster_is_all_absent() {
        let raster = Raster::void(TileKey::new(42, 45));
        assert_eq!(raster.sample(Coord { x: 45.5, y: 42.5 }, Sampling::Nearest), None);
        assert_eq!(raster.sample(Coord { x: 45.5, y: 42.5 }, Sampling::Bilinear), None);
        assert_eq!(raster.min_elevation(), None);
        assert_eq!(raster.max_elevation(), None);
    }

    #[test]
    fn test_min_max_skip_nodata() {
        let raster = quad([10, NODATA, 30, 40]);
        assert_eq!(raster.min_elevation(), Some(10));
        assert_eq!(raster.max_elevation(), Some(40));
        // Second call hits the cached values.
        assert_eq!(raster.min_elevation(), Some(10));
    }
}
