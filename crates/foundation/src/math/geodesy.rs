/// WGS84 semi-major axis (meters). Also the sphere radius used by Web Mercator.
pub const WGS84_A: f64 = 6_378_137.0;

/// Half the Web Mercator world width; the projection extent is `±HALF_WORLD_M` on both axes.
pub const HALF_WORLD_M: f64 = std::f64::consts::PI * WGS84_A;

/// Latitude at which the square Web Mercator extent is cut off.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_6;

pub fn wrap_lon_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
