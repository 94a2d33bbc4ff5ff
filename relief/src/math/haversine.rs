use crate::math::MEAN_EARTH_RADIUS;
use geo::geometry::Point;
use tessadem::C;

/// Great-circle surface distance between `a` and `b` in meters,
/// by the haversine formula on the mean-radius sphere.
pub fn haversine_m(a: Point<C>, b: Point<C>) -> C {
    let lat1_cos = a.y().to_radians().cos();
    let lat2_cos = b.y().to_radians().cos();

    let half_dlat = ((b.y() - a.y()).to_radians() / 2.0).sin();
    let half_dlon = ((b.x() - a.x()).to_radians() / 2.0).sin();

    let h = half_dlat * half_dlat + lat1_cos * lat2_cos * half_dlon * half_dlon;
    2.0 * MEAN_EARTH_RADIUS * h.sqrt().asin()
}
