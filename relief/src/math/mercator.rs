//! Web-Mercator (slippy) tile arithmetic.

use std::f64::consts::PI;
use tessadem::C;

/// Geographic bounds of pyramid tile `(z, x, y)` as
/// `(lon_min, lat_min, lon_max, lat_max)`, degrees.
pub fn tile_bounds(z: u32, x: u32, y: u32) -> (C, C, C, C) {
    let n = 2u32.pow(z) as C;

    let lon_min = x as C / n * 360.0 - 180.0;
    let lon_max = (x + 1) as C / n * 360.0 - 180.0;

    let lat_max = (PI * (1.0 - 2.0 * y as C / n)).sinh().atan().to_degrees();
    let lat_min = (PI * (1.0 - 2.0 * (y + 1) as C / n)).sinh().atan().to_degrees();

    (lon_min, lat_min, lon_max, lat_max)
}

/// `(x, y)` of the pyramid tile containing `(lat, lon)` at `zoom`.
pub fn latlon_to_tile(lat: C, lon: C, zoom: u32) -> (u32, u32) {
    let n = 2u32.pow(zoom) as C;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x = ((lon + 180.0) / 360.0 * n).floor() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let y = ((1.0 - lat.to_radians().tan().asinh() / PI) / 2.0 * n).floor() as u32;

    (x, y)
}
