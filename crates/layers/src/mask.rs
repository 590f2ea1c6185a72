//! Aerial raster clipped to the selected region boundary.
//!
//! The layer paints into its own offscreen layer: tiles first, then the boundary is filled with
//! `destination-in` so only the pixels under the region survive, and the result is composited
//! over whatever was drawn before. The fill colour is irrelevant, only its alpha counts.

use earcutr::earcut;
use foundation::Aabb2;
use formats::{Boundary, Polygon, Ring};
use tracing::{debug, warn};

use crate::clip::ClipSource;
use crate::layer::{Layer, LayerId};
use crate::raster::RasterLayer;
use crate::surface::{CompositeOp, PaintSurface};
use crate::symbology::{LayerStyle, MASK_FILL};
use crate::view::MapView;

#[derive(Debug, Clone, PartialEq)]
pub struct ClipMaskedRasterLayer {
    raster: RasterLayer,
    pub mask_style: LayerStyle,
}

impl ClipMaskedRasterLayer {
    /// Wraps `raster`; nothing is drawn until a clip feature has been synced.
    pub fn new(mut raster: RasterLayer) -> Self {
        raster.set_extent(None);
        Self {
            raster,
            mask_style: MASK_FILL,
        }
    }

    pub fn raster(&self) -> &RasterLayer {
        &self.raster
    }

    /// Limits tile loading to the extent of the current clip feature.
    pub fn sync_extent(&mut self, clip: &ClipSource) {
        self.raster.set_extent(clip.extent());
    }

    /// Draws the masked raster. Returns the number of tiles drawn.
    ///
    /// Nothing is drawn when the surface cannot open an offscreen layer, since masking
    /// directly on the shared surface would erase everything painted below.
    pub fn render(
        &self,
        surface: &mut dyn PaintSurface,
        view: &MapView,
        clip: &ClipSource,
    ) -> usize {
        let Some(feature) = clip.feature() else {
            return 0;
        };
        if !self.raster.style.visible {
            return 0;
        }

        if !surface.push_layer() {
            warn!(code = %feature.code, "no offscreen layer, skipping masked raster");
            return 0;
        }
        let drawn = self.raster.render(surface, view);

        let triangles: Vec<[f64; 2]> = triangulate_boundary(&feature.geometry)
            .into_iter()
            .map(|p| view.to_pixel(p))
            .collect();

        surface.set_composite(CompositeOp::DestinationIn);
        surface.fill_triangles(&triangles, self.mask_style.color);
        surface.set_composite(CompositeOp::SourceOver);
        surface.pop_layer();

        debug!(
            code = %feature.code,
            tiles = drawn,
            triangles = triangles.len() / 3,
            "masked raster rendered"
        );
        drawn
    }
}

impl Layer for ClipMaskedRasterLayer {
    fn id(&self) -> LayerId {
        self.raster.id()
    }

    fn extent(&self) -> Option<Aabb2> {
        self.raster.extent()
    }
}

/// Flat triangle list (3 vertices per triangle) covering every polygon of `boundary`.
pub fn triangulate_boundary(boundary: &Boundary) -> Vec<[f64; 2]> {
    boundary
        .polygons
        .iter()
        .flat_map(triangulate_polygon)
        .collect()
}

fn triangulate_polygon(polygon: &Polygon) -> Vec<[f64; 2]> {
    let Some(outer) = polygon.outer().map(open_ring) else {
        return Vec::new();
    };
    // A degenerate outer ring leaves nothing to fill.
    if outer.len() < 3 {
        return Vec::new();
    }

    let mut vertices = outer;
    let mut hole_indices: Vec<usize> = Vec::new();
    for hole in polygon.holes().iter().map(open_ring) {
        if hole.len() < 3 {
            continue;
        }
        hole_indices.push(vertices.len());
        vertices.extend(hole);
    }
    let coords: Vec<f64> = vertices.iter().flat_map(|p| [p[0], p[1]]).collect();

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };
    indices
        .into_iter()
        .filter_map(|i| vertices.get(i).copied())
        .collect()
}

fn open_ring(ring: &Ring) -> Vec<[f64; 2]> {
    let mut pts = ring.clone();
    drop_closing_duplicate(&mut pts);
    pts
}

fn drop_closing_duplicate(points: &mut Vec<[f64; 2]>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first[0] - last[0]).abs() < 1e-9 && (first[1] - last[1]).abs() < 1e-9 {
            points.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipMaskedRasterLayer, triangulate_boundary};
    use crate::clip::ClipSource;
    use crate::layer::Layer;
    use crate::raster::RasterLayer;
    use crate::surface::{CompositeOp, PaintSurface, PixelRect, PixelSurface, TileImage};
    use crate::tile_grid::{DEFAULT_LEVELS, TileGrid};
    use crate::view::MapView;
    use crate::wmts::WmtsSource;
    use formats::{Boundary, Polygon, RegionDataset, RegionRecord};
    use foundation::Aabb2;
    use foundation::math::Crs;

    const TILE_COLOR: [u8; 4] = [90, 120, 60, 255];

    fn square(min: f64, max: f64) -> Vec<[f64; 2]> {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    // A 1 km square in EPSG:3857 with a 200 m hole in the middle.
    fn dataset() -> RegionDataset {
        let record = RegionRecord {
            code: "GM9000".to_string(),
            name: "Proefdorp".to_string(),
            province: "Utrecht".to_string(),
            boundary: Boundary {
                polygons: vec![Polygon {
                    rings: vec![square(0.0, 1000.0), square(400.0, 600.0)],
                }],
            },
        };
        RegionDataset::from_records(Crs::Epsg3857, vec![record]).expect("dataset")
    }

    fn layer() -> ClipMaskedRasterLayer {
        ClipMaskedRasterLayer::new(RasterLayer::new(
            2,
            WmtsSource::pdok_luchtfoto_2020(),
            TileGrid::web_mercator(DEFAULT_LEVELS),
        ))
    }

    // 200x200 px at 10 m/px centred on the square: the square spans pixels 50..150.
    fn view() -> MapView {
        MapView::new([500.0, 500.0], 10.0, [200, 200])
    }

    fn surface_with_tiles(layer: &ClipMaskedRasterLayer, view: &MapView) -> PixelSurface {
        let raster = layer.raster();
        let mut surface = PixelSurface::new(200, 200).expect("surface");
        for coord in raster.visible_tiles(view) {
            let url = raster.source.tile_url(raster.grid(), coord);
            surface.insert_tile(url, TileImage::solid(256, 256, TILE_COLOR));
        }
        surface
    }

    #[test]
    fn empty_source_requests_no_tiles() {
        let layer = layer();
        let clip = ClipSource::new(Crs::Epsg3857);
        assert!(layer.extent().is_none());

        let mut surface = PixelSurface::new(200, 200).expect("surface");
        assert_eq!(layer.render(&mut surface, &view(), &clip), 0);
        assert!(surface.requested_tiles().is_empty());
        assert_eq!(surface.pixel(100, 100), [0, 0, 0, 0]);
    }

    #[test]
    fn pixels_outside_the_boundary_are_erased() {
        let ds = dataset();
        let mut clip = ClipSource::new(Crs::Epsg3857);
        assert!(clip.reload(Some("GM9000"), &ds));

        let mut layer = layer();
        layer.sync_extent(&clip);
        assert_eq!(
            layer.extent(),
            Some(Aabb2::new([0.0, 0.0], [1000.0, 1000.0]))
        );

        let view = view();
        let mut surface = surface_with_tiles(&layer, &view);
        assert!(layer.render(&mut surface, &view, &clip) > 0);

        // Inside the ring.
        assert_eq!(surface.pixel(60, 60), TILE_COLOR);
        assert_eq!(surface.pixel(140, 140), TILE_COLOR);
        // Covered by the tile but east of the square.
        assert_eq!(surface.pixel(170, 60)[3], 0);
        // Inside the hole.
        assert_eq!(surface.pixel(100, 100)[3], 0);
        assert_eq!(surface.composite(), CompositeOp::SourceOver);
    }

    // Pixel surface that cannot allocate offscreen layers.
    struct FlatSurface(PixelSurface);

    impl PaintSurface for FlatSurface {
        fn size_px(&self) -> [u32; 2] {
            self.0.size_px()
        }
        fn composite(&self) -> CompositeOp {
            self.0.composite()
        }
        fn set_composite(&mut self, op: CompositeOp) {
            self.0.set_composite(op);
        }
        fn push_layer(&mut self) -> bool {
            false
        }
        fn pop_layer(&mut self) {
            self.0.pop_layer();
        }
        fn draw_tile(&mut self, url: &str, dest: PixelRect) -> bool {
            self.0.draw_tile(url, dest)
        }
        fn fill_triangles(&mut self, triangles: &[[f64; 2]], color: [f32; 4]) {
            self.0.fill_triangles(triangles, color);
        }
    }

    #[test]
    fn keeps_the_base_when_no_layer_can_be_pushed() {
        let ds = dataset();
        let mut clip = ClipSource::new(Crs::Epsg3857);
        assert!(clip.reload(Some("GM9000"), &ds));
        let mut layer = layer();
        layer.sync_extent(&clip);
        let view = view();

        let base = [200, 200, 200, 255];
        let mut inner = surface_with_tiles(&layer, &view);
        inner.insert_tile("base", TileImage::solid(4, 4, base));
        inner.draw_tile("base", PixelRect::from_corners([0.0, 0.0], [200.0, 200.0]));
        let mut surface = FlatSurface(inner);

        assert_eq!(layer.render(&mut surface, &view, &clip), 0);
        assert_eq!(surface.0.requested_tiles(), ["base".to_string()]);
        assert_eq!(surface.0.pixel(170, 60), base);
        assert_eq!(surface.0.pixel(60, 60), base);
        assert_eq!(surface.composite(), CompositeOp::SourceOver);
    }

    #[test]
    fn failed_reload_stops_drawing() {
        let ds = dataset();
        let mut clip = ClipSource::new(Crs::Epsg3857);
        clip.reload(Some("GM9000"), &ds);
        clip.reload(Some("GM0000"), &ds);

        let mut layer = layer();
        layer.sync_extent(&clip);
        let view = view();
        let mut surface = surface_with_tiles(&layer, &view);
        assert_eq!(layer.render(&mut surface, &view, &clip), 0);
        assert!(surface.requested_tiles().is_empty());
    }

    #[test]
    fn triangulation_covers_holes_and_parts() {
        let boundary = Boundary {
            polygons: vec![
                Polygon {
                    rings: vec![square(0.0, 10.0), square(4.0, 6.0)],
                },
                Polygon {
                    rings: vec![square(20.0, 30.0)],
                },
                Polygon {
                    rings: vec![vec![[0.0, 0.0], [1.0, 1.0]]],
                },
            ],
        };
        let tris = triangulate_boundary(&boundary);
        assert_eq!(tris.len() % 3, 0);

        let area: f64 = tris
            .chunks_exact(3)
            .map(|t| {
                0.5 * ((t[1][0] - t[0][0]) * (t[2][1] - t[0][1])
                    - (t[2][0] - t[0][0]) * (t[1][1] - t[0][1]))
                    .abs()
            })
            .sum();
        assert!((area - (100.0 - 4.0 + 100.0)).abs() < 1e-9);
    }
}
