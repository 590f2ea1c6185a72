use super::geodesy::{HALF_WORLD_M, MERCATOR_MAX_LAT_DEG, WGS84_A, wrap_lon_deg};
use crate::bounds::Aabb2;

/// Coordinate reference systems the viewer moves data between.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Geographic lon/lat in degrees (storage CRS of region datasets).
    Epsg4326,
    /// Spherical Web Mercator in meters (display CRS of the tile grid).
    Epsg3857,
}

impl Crs {
    /// Valid coordinate extent of the CRS in its own units.
    pub fn extent(self) -> Aabb2 {
        match self {
            Crs::Epsg4326 => Aabb2::new([-180.0, -90.0], [180.0, 90.0]),
            Crs::Epsg3857 => {
                Aabb2::new([-HALF_WORLD_M, -HALF_WORLD_M], [HALF_WORLD_M, HALF_WORLD_M])
            }
        }
    }

    pub fn transform(self, to: Crs, p: [f64; 2]) -> [f64; 2] {
        match (self, to) {
            (Crs::Epsg4326, Crs::Epsg3857) => lon_lat_to_mercator(p),
            (Crs::Epsg3857, Crs::Epsg4326) => mercator_to_lon_lat(p),
            _ => p,
        }
    }
}

/// `[lon_deg, lat_deg]` to `[x_m, y_m]`. Latitudes beyond the Mercator cut-off are clamped.
pub fn lon_lat_to_mercator(p: [f64; 2]) -> [f64; 2] {
    let lat = p[1]
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    let x = WGS84_A * p[0].to_radians();
    let y = WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln();
    [x, y]
}

/// `[x_m, y_m]` to `[lon_deg, lat_deg]`, with longitude wrapped into [-180, 180).
pub fn mercator_to_lon_lat(p: [f64; 2]) -> [f64; 2] {
    let lon = (p[0] / WGS84_A).to_degrees();
    let lat = 2.0 * (p[1] / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2;
    let lon = if lon.abs() > 180.0 { wrap_lon_deg(lon) } else { lon };
    [lon, lat.to_degrees()]
}

#[cfg(test)]
mod tests {
    use super::{Crs, lon_lat_to_mercator, mercator_to_lon_lat};
    use crate::math::HALF_WORLD_M;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_origin() {
        let p = lon_lat_to_mercator([0.0, 0.0]);
        assert_close(p[0], 0.0, 1e-9);
        assert_close(p[1], 0.0, 1e-6);
    }

    #[test]
    fn antimeridian_maps_to_extent_edge() {
        let p = lon_lat_to_mercator([180.0, 0.0]);
        assert_close(p[0], HALF_WORLD_M, 1e-6);
    }

    #[test]
    fn utrecht_matches_reference_values() {
        let p = lon_lat_to_mercator([5.117, 52.09]);
        assert_close(p[0], 569_621.834, 0.01);
        assert_close(p[1], 6_816_414.996, 0.01);
    }

    #[test]
    fn polar_latitudes_are_clamped() {
        let p = lon_lat_to_mercator([0.0, 89.9]);
        assert_close(p[1], HALF_WORLD_M, 1e-3);
    }

    #[test]
    fn round_trip_lon_lat() {
        let src = [5.417633, 52.152916];
        let back = mercator_to_lon_lat(lon_lat_to_mercator(src));
        assert_close(back[0], src[0], 1e-9);
        assert_close(back[1], src[1], 1e-9);
    }

    #[test]
    fn inverse_wraps_longitude() {
        let p = mercator_to_lon_lat([HALF_WORLD_M * 1.5, 0.0]);
        assert_close(p[0], -90.0, 1e-9);
    }

    #[test]
    fn transform_between_same_crs_is_identity() {
        let p = [1.0, 2.0];
        assert_eq!(Crs::Epsg3857.transform(Crs::Epsg3857, p), p);
    }
}
