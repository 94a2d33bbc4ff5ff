use crate::{
    math::{haversine_m, linspace},
    RasterStore, ReliefError,
};
use geo::geometry::{Coord, Point};
use log::debug;
use tessadem::{Elev, Sampling, C};

/// One elevation sample along a profile path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub lat: C,
    pub lon: C,
    /// `None` when no tile covers the point or the covering cell is
    /// nodata.
    pub elevation: Option<Elev>,
}

/// Elevation samples along the path between two geographic points.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Great-circle distance from start to end, meters.
    pub distance_m: C,

    /// Requested maximum spacing between samples, meters.
    pub step_m: C,

    /// Ordered samples from start to end, both ends included. Always
    /// full length; unreachable points are carried as absent entries,
    /// never dropped.
    pub samples: Vec<ElevationSample>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            start: None,
            end: None,
            step_size_m: None,
        }
    }
}

pub struct ProfileBuilder {
    start: Option<Coord<C>>,

    end: Option<Coord<C>>,

    /// Maximum distance between samples (meters).
    step_size_m: Option<C>,
}

impl ProfileBuilder {
    pub fn start(mut self, coord: Coord<C>) -> Self {
        self.start = Some(coord);
        self
    }

    pub fn end(mut self, coord: Coord<C>) -> Self {
        self.end = Some(coord);
        self
    }

    /// Maximum distance between samples, in meters.
    ///
    /// Sample locations are linear in latitude and longitude, not
    /// great-circle intermediates, so over very long paths the sampled
    /// track bows away from the geodesic.
    pub fn step_size_m(mut self, meters: C) -> Self {
        self.step_size_m = Some(meters);
        self
    }

    pub fn build(&self, store: &RasterStore) -> Result<Profile, ReliefError> {
        let (Some(start), Some(end), Some(step_m)) = (self.start, self.end, self.step_size_m)
        else {
            return Err(ReliefError::Builder);
        };

        let distance_m = haversine_m(Point::from(start), Point::from(end));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = ((distance_m / step_m).floor() as usize + 1).max(2);

        let now = std::time::Instant::now();
        let mut samples = Vec::with_capacity(n);
        let mut raster = store.get(start)?;
        for (lat, lon) in linspace(start.y, end.y, n).zip(linspace(start.x, end.x, n)) {
            let coord = Coord { x: lon, y: lat };
            if !raster.contains(coord) {
                raster = store.get(coord)?;
            }
            #[allow(clippy::cast_possible_truncation)]
            let elevation = raster.sample(coord, Sampling::Nearest).map(|e| e as Elev);
            samples.push(ElevationSample { lat, lon, elevation });
        }
        debug!("profile; len: {}, exec: {:?}", samples.len(), now.elapsed());

        Ok(Profile {
            distance_m,
            step_m,
            samples,
        })
    }
}
