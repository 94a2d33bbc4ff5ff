//! Affine mapping between geographic and fractional pixel coordinates.

use crate::C;

/// North-up affine transform for one raster: upper-left corner plus
/// pixel sizes, all in degrees.
///
/// `to_pixel` and `to_geo` are exact algebraic inverses. Neither does
/// any bounds checking; results outside `[0, rows) x [0, cols)` are
/// the caller's problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    ul_lon: C,
    ul_lat: C,
    px_w: C,
    px_h: C,
}

impl GeoTransform {
    pub(crate) fn new(ul_lon: C, ul_lat: C, px_w: C, px_h: C) -> Self {
        Self {
            ul_lon,
            ul_lat,
            px_w,
            px_h,
        }
    }

    /// Fractional `(row, col)` of the geographic position. Row 0 is
    /// the northern edge.
    pub fn to_pixel(&self, lat: C, lon: C) -> (C, C) {
        let row = (self.ul_lat - lat) / self.px_h;
        let col = (lon - self.ul_lon) / self.px_w;
        (row, col)
    }

    /// Geographic `(lat, lon)` of the fractional pixel position.
    pub fn to_geo(&self, row: C, col: C) -> (C, C) {
        let lat = self.ul_lat - row * self.px_h;
        let lon = self.ul_lon + col * self.px_w;
        (lat, lon)
    }

    /// Pixel width in degrees of longitude.
    pub fn px_w(&self) -> C {
        self.px_w
    }

    /// Pixel height in degrees of latitude.
    pub fn px_h(&self) -> C {
        self.px_h
    }
}

#[cfg(test)]
mod tests {
    use super::GeoTransform;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pixel_geo_round_trip() {
        let transform = GeoTransform::new(45.0, 43.0, 1.0 / 3600.0, 1.0 / 3600.0);
        for (lat, lon) in [
            (42.000_1, 45.000_1),
            (42.5, 45.5),
            (42.999_9, 45.999_9),
            (42.123_456_789, 45.987_654_321),
        ] {
            let (row, col) = transform.to_pixel(lat, lon);
            let (lat2, lon2) = transform.to_geo(row, col);
            assert_abs_diff_eq!(lat, lat2, epsilon = 1e-9);
            assert_abs_diff_eq!(lon, lon2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_corners() {
        let transform = GeoTransform::new(45.0, 43.0, 1.0 / 3600.0, 1.0 / 3600.0);
        // Northwest corner is pixel (0, 0).
        assert_eq!(transform.to_pixel(43.0, 45.0), (0.0, 0.0));
        // Southeast corner is one full grid away.
        let (row, col) = transform.to_pixel(42.0, 46.0);
        assert_abs_diff_eq!(row, 3600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(col, 3600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_to_geo_row_zero_is_north_edge() {
        let transform = GeoTransform::new(10.0, 81.0, 1.0 / 720.0, 1.0 / 3600.0);
        let (lat, lon) = transform.to_geo(0.0, 0.0);
        assert_eq!((lat, lon), (81.0, 10.0));
    }
}
