mod haversine;
mod linspace;
mod mercator;

pub(crate) use {
    haversine::haversine_m,
    linspace::linspace,
    mercator::{latlon_to_tile, tile_bounds},
};

use tessadem::C;

/// Mean Earth radius in meters, the sphere all distances here are
/// measured on.
pub(crate) const MEAN_EARTH_RADIUS: C = 6_371_000.0;
