use foundation::Aabb2;
use foundation::math::Crs;

pub const TILE_SIZE_PX: u32 = 256;
/// Number of zoom levels published by the PDOK WMTS services.
pub const DEFAULT_LEVELS: u32 = 20;

/// WMTS tile address: tile matrix (zoom), column and row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub z: u32,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    pub fn len(&self) -> usize {
        ((self.max_x - self.min_x + 1) as usize) * ((self.max_y - self.min_y + 1) as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major iteration, top row first.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| TileCoord::new(self.z, x, y)))
    }
}

/// Tile pyramid with a top-left origin and a fixed list of resolutions.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    extent: Aabb2,
    origin: [f64; 2],
    tile_size_px: u32,
    resolutions: Vec<f64>,
}

impl TileGrid {
    /// Grid over the full EPSG:3857 extent, halving the resolution per level.
    pub fn web_mercator(levels: u32) -> Self {
        let extent = Crs::Epsg3857.extent();
        let base = extent.width() / TILE_SIZE_PX as f64;
        let resolutions = (0..levels.max(1))
            .map(|z| base / 2f64.powi(z as i32))
            .collect();
        Self {
            origin: [extent.min[0], extent.max[1]],
            extent,
            tile_size_px: TILE_SIZE_PX,
            resolutions,
        }
    }

    pub fn extent(&self) -> Aabb2 {
        self.extent
    }

    pub fn tile_size_px(&self) -> u32 {
        self.tile_size_px
    }

    pub fn max_zoom(&self) -> u32 {
        (self.resolutions.len() - 1) as u32
    }

    pub fn resolution(&self, z: u32) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    pub fn min_resolution(&self) -> f64 {
        self.resolutions[self.resolutions.len() - 1]
    }

    /// Resolution for a fractional zoom, extrapolated from level 0.
    pub fn resolution_for_zoom(&self, zoom: f64) -> f64 {
        self.resolutions[0] / 2f64.powf(zoom)
    }

    /// WMTS tile matrix identifier; the PDOK matrix sets use the plain level number.
    pub fn matrix_id(&self, z: u32) -> String {
        z.to_string()
    }

    /// Level whose resolution is nearest to `resolution`. Ties go to the coarser level.
    pub fn z_for_resolution(&self, resolution: f64) -> u32 {
        let mut best = 0usize;
        let mut best_diff = f64::INFINITY;
        for (z, r) in self.resolutions.iter().enumerate() {
            let diff = (r - resolution).abs();
            if diff < best_diff {
                best = z;
                best_diff = diff;
            }
        }
        best as u32
    }

    pub fn tile_extent(&self, coord: TileCoord) -> Aabb2 {
        let span = self.tile_span_m(coord.z);
        let min_x = self.origin[0] + coord.x as f64 * span;
        let max_y = self.origin[1] - coord.y as f64 * span;
        Aabb2::new([min_x, max_y - span], [min_x + span, max_y])
    }

    /// Tiles at level `z` touching `extent`, or `None` when the extent misses the grid.
    pub fn tile_range(&self, extent: &Aabb2, z: u32) -> Option<TileRange> {
        let z = z.min(self.max_zoom());
        let clipped = self.extent.intersection(extent)?;
        let span = self.tile_span_m(z);
        let last = (1u64 << z) as f64 - 1.0;

        let col = |m: f64| ((m - self.origin[0]) / span).clamp(0.0, last + 1.0);
        let row = |m: f64| ((self.origin[1] - m) / span).clamp(0.0, last + 1.0);

        let min_x = col(clipped.min[0]).floor().min(last);
        let max_x = (col(clipped.max[0]).ceil() - 1.0).clamp(min_x, last);
        let min_y = row(clipped.max[1]).floor().min(last);
        let max_y = (row(clipped.min[1]).ceil() - 1.0).clamp(min_y, last);

        Some(TileRange {
            z,
            min_x: min_x as u32,
            max_x: max_x as u32,
            min_y: min_y as u32,
            max_y: max_y as u32,
        })
    }

    fn tile_span_m(&self, z: u32) -> f64 {
        let res = self
            .resolution(z)
            .unwrap_or_else(|| self.resolution_for_zoom(z as f64));
        res * self.tile_size_px as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LEVELS, TileCoord, TileGrid};
    use foundation::Aabb2;
    use foundation::math::{Crs, lon_lat_to_mercator};

    fn utrecht_extent() -> Aabb2 {
        Aabb2::from_points([
            lon_lat_to_mercator([4.97, 52.03]),
            lon_lat_to_mercator([5.2, 52.16]),
        ])
    }

    #[test]
    fn level_zero_is_one_tile_for_the_world() {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        let range = grid
            .tile_range(&Crs::Epsg3857.extent(), 0)
            .expect("world range");
        assert_eq!(range.len(), 1);
        assert_eq!(range.iter().next(), Some(TileCoord::new(0, 0, 0)));

        let range = grid.tile_range(&Crs::Epsg3857.extent(), 1).expect("z1");
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn resolutions_halve_per_level() {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        assert_eq!(grid.max_zoom(), 19);
        let r0 = grid.resolution(0).expect("z0");
        assert!((r0 - 156_543.033_928_041).abs() < 1e-6);
        assert_eq!(grid.resolution(1), Some(r0 / 2.0));
        assert_eq!(grid.z_for_resolution(r0 / 3.9), 2);
        assert_eq!(grid.z_for_resolution(1e9), 0);
        assert_eq!(grid.z_for_resolution(1e-9), 19);
    }

    #[test]
    fn region_extent_maps_to_slippy_tiles() {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        let z10 = grid.tile_range(&utrecht_extent(), 10).expect("z10");
        assert_eq!((z10.min_x, z10.max_x, z10.min_y, z10.max_y), (526, 526, 337, 338));

        let z12 = grid.tile_range(&utrecht_extent(), 12).expect("z12");
        assert_eq!((z12.min_x, z12.max_x), (2104, 2107));
        assert_eq!((z12.min_y, z12.max_y), (1350, 1352));
        assert_eq!(z12.len(), 12);
    }

    #[test]
    fn tile_extent_contains_its_region() {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        let e = grid.tile_extent(TileCoord::new(10, 526, 337));
        let p = lon_lat_to_mercator([5.1, 52.1]);
        assert!(e.contains(p));
    }

    #[test]
    fn disjoint_extent_has_no_tiles() {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        let outside = Aabb2::new([3.0e7, 3.0e7], [3.1e7, 3.1e7]);
        assert!(grid.tile_range(&outside, 5).is_none());
    }
}
