//! Spherical-earth helpers used by the motion model. Accuracy is adequate for shipping speeds and
//! tick intervals, not for navigation.

/// Mean earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;
/// Nautical miles per degree of latitude.
pub const NM_PER_DEGREE: f64 = 60.0;
pub const MAX_LATITUDE: f64 = 85.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Haversine great-circle distance in nautical miles.
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_NM * c
}

/// Initial great-circle bearing from the first to the second point, in `[0, 360)`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_heading(y.atan2(x).to_degrees())
}

/// Moves a position `distance_nm` along `heading_deg` using a flat projection.
///
/// The result is clamped to latitude `[-85, 85]` and longitude `[-180, 180]`. Clamping instead of
/// wrapping means routes crossing the antimeridian stop at the boundary.
pub fn advance(lat: f64, lon: f64, heading_deg: f64, distance_nm: f64) -> (f64, f64) {
    let heading = heading_deg.to_radians();
    let degrees = distance_nm / NM_PER_DEGREE;

    let lat = lat + degrees * heading.cos();
    let lon = lon + degrees * heading.sin();

    (
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        lon.clamp(-MAX_LONGITUDE, MAX_LONGITUDE),
    )
}

/// Linear interpolation between two waypoints, `fraction` is clamped to `[0, 1]`.
pub fn interpolate(lat1: f64, lon1: f64, lat2: f64, lon2: f64, fraction: f64) -> (f64, f64) {
    let f = fraction.clamp(0.0, 1.0);
    (lat1 + (lat2 - lat1) * f, lon1 + (lon2 - lon1) * f)
}

pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    if h >= 360.0 { 0.0 } else { h }
}
