use foundation::Aabb2;
use tracing::debug;

use crate::layer::{Layer, LayerId};
use crate::surface::{PaintSurface, PixelRect};
use crate::symbology::LayerStyle;
use crate::tile_grid::{TileCoord, TileGrid};
use crate::view::MapView;
use crate::wmts::WmtsSource;

/// Tiled raster layer drawing WMTS tiles for the part of the view inside its extent.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    id: LayerId,
    pub style: LayerStyle,
    pub source: WmtsSource,
    grid: TileGrid,
    extent: Option<Aabb2>,
}

impl RasterLayer {
    /// Layer covering the whole tile grid.
    pub fn new(id: u64, source: WmtsSource, grid: TileGrid) -> Self {
        let extent = Some(grid.extent());
        Self {
            id: LayerId(id),
            style: LayerStyle::default(),
            source,
            grid,
            extent,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Restricts drawing to `extent`; `None` disables drawing entirely.
    pub fn set_extent(&mut self, extent: Option<Aabb2>) {
        self.extent = extent.filter(|e| !e.is_empty());
    }

    /// Tiles needed to cover the visible part of the layer extent.
    pub fn visible_tiles(&self, view: &MapView) -> Vec<TileCoord> {
        if !self.style.visible {
            return Vec::new();
        }
        let Some(extent) = self.extent else {
            return Vec::new();
        };
        let Some(visible) = view.extent().intersection(&extent) else {
            return Vec::new();
        };
        let z = self.grid.z_for_resolution(view.resolution);
        match self.grid.tile_range(&visible, z) {
            Some(range) => range.iter().collect(),
            None => Vec::new(),
        }
    }

    /// Draws the visible tiles; returns how many were available on the surface.
    pub fn render(&self, surface: &mut dyn PaintSurface, view: &MapView) -> usize {
        let tiles = self.visible_tiles(view);
        let mut drawn = 0;
        for coord in &tiles {
            let e = self.grid.tile_extent(*coord);
            let dest = PixelRect::from_corners(
                view.to_pixel([e.min[0], e.max[1]]),
                view.to_pixel([e.max[0], e.min[1]]),
            );
            let url = self.source.tile_url(&self.grid, *coord);
            if surface.draw_tile(&url, dest) {
                drawn += 1;
            }
        }
        debug!(layer = self.id.0, requested = tiles.len(), drawn, "raster layer rendered");
        drawn
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn extent(&self) -> Option<Aabb2> {
        self.extent
    }
}
