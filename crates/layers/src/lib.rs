pub mod clip;
pub mod layer;
pub mod mask;
pub mod raster;
pub mod surface;
pub mod symbology;
pub mod tile_grid;
pub mod view;
pub mod wmts;

pub use clip::{ClipEvent, ClipFeature, ClipSource, NotFound, resolve};
pub use layer::*;
pub use mask::ClipMaskedRasterLayer;
pub use raster::RasterLayer;
pub use surface::{CompositeOp, PaintSurface, PixelRect, PixelSurface, TileImage};
pub use tile_grid::{TileCoord, TileGrid};
pub use view::{MapView, Padding};
pub use wmts::WmtsSource;
