//! Headless map rendering: the viewer paints into a software surface after its tiles are
//! fetched over HTTP.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use formats::RegionDataset;
use gemeente_viewer::{MemoryUi, Viewer, ViewerConfig};
use layers::{NotFound, PixelSurface, TileImage};
use reqwest::Client;
use runtime::Locator;
use tracing::{info, warn};

#[derive(Debug)]
pub enum RenderError {
    NotFound(NotFound),
    Http(String),
    Image(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::NotFound(e) => write!(f, "{e}"),
            RenderError::Http(e) => write!(f, "tile request failed: {e}"),
            RenderError::Image(e) => write!(f, "image error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<NotFound> for RenderError {
    fn from(e: NotFound) -> Self {
        RenderError::NotFound(e)
    }
}

/// Viewer fitted to `code`, as the web page would show it at `size`.
pub fn fitted_viewer(
    config: ViewerConfig,
    dataset: Arc<RegionDataset>,
    code: &str,
    size: [u32; 2],
) -> Result<(Viewer, MemoryUi), RenderError> {
    let mut ui = MemoryUi::new(size);
    let mut viewer = Viewer::new(config, dataset, size);
    let locator = Locator::for_selection(&viewer.config().selection_key, code);
    viewer.navigate(locator, &mut ui)?;
    Ok((viewer, ui))
}

/// Distinct tile URLs a paint of `viewer` needs.
pub fn tile_requests(viewer: &Viewer) -> BTreeSet<String> {
    let [w, h] = viewer.view().size_px;
    let Some(mut dry_run) = PixelSurface::new(w, h) else {
        return BTreeSet::new();
    };
    viewer.paint(&mut dry_run);
    dry_run.requested_tiles().iter().cloned().collect()
}

pub fn decode_tile(bytes: &[u8]) -> Result<TileImage, RenderError> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Image(e.to_string()))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    TileImage::new(w, h, rgba.into_raw())
        .ok_or_else(|| RenderError::Image("empty or truncated tile image".to_string()))
}

async fn fetch_tile(client: &Client, url: &str) -> Result<TileImage, RenderError> {
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| RenderError::Http(e.to_string()))?
        .bytes()
        .await
        .map_err(|e| RenderError::Http(e.to_string()))?;
    decode_tile(&bytes)
}

/// Renders `code` with base map and clipped aerial imagery. Tiles that fail to load are
/// left blank.
pub async fn render_region(
    client: &Client,
    config: ViewerConfig,
    dataset: Arc<RegionDataset>,
    code: &str,
    size: [u32; 2],
) -> Result<PixelSurface, RenderError> {
    let (viewer, _) = fitted_viewer(config, dataset, code, size)?;
    let urls = tile_requests(&viewer);

    let mut surface = PixelSurface::new(size[0], size[1])
        .ok_or_else(|| RenderError::Image(format!("cannot allocate a {}x{} surface", size[0], size[1])))?;
    let mut failed = 0usize;
    for url in &urls {
        match fetch_tile(client, url).await {
            Ok(tile) => surface.insert_tile(url.clone(), tile),
            Err(err) => {
                failed += 1;
                warn!(%url, error = %err, "tile skipped");
            }
        }
    }
    viewer.paint(&mut surface);
    info!(code, tiles = urls.len(), failed, "region rendered");
    Ok(surface)
}

pub fn save_png(surface: PixelSurface, path: impl AsRef<Path>) -> Result<(), RenderError> {
    let [w, h] = layers::PaintSurface::size_px(&surface);
    let img = image::RgbaImage::from_raw(w, h, surface.into_rgba())
        .ok_or_else(|| RenderError::Image("surface buffer size mismatch".to_string()))?;
    img.save_with_format(path.as_ref(), image::ImageFormat::Png)
        .map_err(|e| RenderError::Image(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::{RenderError, decode_tile, fitted_viewer, save_png, tile_requests};
    use formats::RegionDataset;
    use gemeente_viewer::ViewerConfig;
    use layers::{NotFound, PixelSurface};

    const SAMPLE: &str = include_str!("../../apps/viewer_web/assets/gemeenten-sample-4326.json");

    fn dataset() -> Arc<RegionDataset> {
        Arc::new(RegionDataset::from_geojson_str(SAMPLE).expect("dataset"))
    }

    #[test]
    fn requests_base_and_aerial_tiles() {
        let (viewer, ui) =
            fitted_viewer(ViewerConfig::default(), dataset(), "GM0060", [600, 400]).expect("fit");
        assert!(ui.title.contains("Ameland"));

        let urls = tile_requests(&viewer);
        assert!(urls.iter().any(|u| u.contains("LAYER=grijs")));
        assert!(urls.iter().any(|u| u.contains("LAYER=2020_ortho25")));
    }

    #[test]
    fn unknown_code_is_an_error() {
        let err = fitted_viewer(ViewerConfig::default(), dataset(), "GM9999", [600, 400]);
        assert!(matches!(
            err,
            Err(RenderError::NotFound(NotFound::UnknownIdentifier(ref c))) if c == "GM9999"
        ));
    }

    #[test]
    fn decodes_png_tiles() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode");

        let tile = decode_tile(&bytes).expect("decode");
        assert_eq!((tile.width, tile.height), (3, 2));
        assert_eq!(&tile.rgba[..4], &[1, 2, 3, 255]);
        assert!(decode_tile(b"not an image").is_err());
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("GM0344.png");
        save_png(PixelSurface::new(4, 4).expect("surface"), &path).expect("save");
        let back = image::open(&path).expect("open").to_rgba8();
        assert_eq!(back.dimensions(), (4, 4));
    }
}
