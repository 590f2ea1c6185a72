//! 2D paint surfaces.
//!
//! Layers draw through [`PaintSurface`] so the same render code runs against a browser canvas
//! and against the in-memory [`PixelSurface`] used for headless rendering and tests.

use std::collections::HashMap;

use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Transform,
};

/// Per-pixel compositing mode for subsequent draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CompositeOp {
    /// Draw new pixels over existing ones.
    #[default]
    SourceOver,
    /// Keep existing pixels only where new pixels are drawn, scaled by their alpha.
    DestinationIn,
}

impl CompositeOp {
    /// Canvas `globalCompositeOperation` keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::DestinationIn => "destination-in",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    pub fn from_corners(top_left: [f64; 2], bottom_right: [f64; 2]) -> Self {
        Self {
            x: top_left[0],
            y: top_left[1],
            w: bottom_right[0] - top_left[0],
            h: bottom_right[1] - top_left[1],
        }
    }
}

pub trait PaintSurface {
    fn size_px(&self) -> [u32; 2];

    fn composite(&self) -> CompositeOp;

    fn set_composite(&mut self, op: CompositeOp);

    /// Starts an empty offscreen layer; later draws and composites only affect that layer.
    /// Returns `false` if no layer could be allocated, in which case nothing was pushed.
    fn push_layer(&mut self) -> bool;

    /// Composites the current offscreen layer source-over onto the one below it.
    fn pop_layer(&mut self);

    /// Draws the tile image behind `url` into `dest`. Returns `false` if the image is not
    /// available (yet); the request itself is still recorded by the surface.
    fn draw_tile(&mut self, url: &str, dest: PixelRect) -> bool;

    /// Fills the union of a flat triangle list (3 pixel-space vertices per triangle).
    fn fill_triangles(&mut self, triangles: &[[f64; 2]], color: [f32; 4]);
}

/// Decoded RGBA8 tile image (straight alpha).
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TileImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color.repeat((width as usize) * (height as usize));
        Self {
            width,
            height,
            rgba,
        }
    }

    fn to_pixmap(&self) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(self.width, self.height)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(self.rgba.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Some(pixmap)
    }
}

/// Software surface backed by a `tiny_skia::Pixmap`, with an in-memory tile store keyed by
/// URL.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    pixmap: Pixmap,
    composite: CompositeOp,
    tiles: HashMap<String, Pixmap>,
    requested: Vec<String>,
    // Layers underneath the current one, bottom first.
    below: Vec<(Pixmap, CompositeOp)>,
}

impl PixelSurface {
    /// `None` for a zero-sized or unallocatable surface.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            composite: CompositeOp::SourceOver,
            tiles: HashMap::new(),
            requested: Vec::new(),
            below: Vec::new(),
        })
    }

    /// Stores a tile under `url`. Images without pixels are ignored.
    pub fn insert_tile(&mut self, url: impl Into<String>, image: TileImage) {
        let url = url.into();
        match image.to_pixmap() {
            Some(pixmap) => {
                self.tiles.insert(url, pixmap);
            }
            None => tracing::warn!(%url, "ignoring empty tile image"),
        }
    }

    pub fn has_tile(&self, url: &str) -> bool {
        self.tiles.contains_key(url)
    }

    /// Every URL passed to `draw_tile` since the last `clear`.
    pub fn requested_tiles(&self) -> &[String] {
        &self.requested
    }

    /// Resets pixels to transparent and forgets tile requests and open layers; the tile store
    /// is kept.
    pub fn clear(&mut self) {
        self.below.clear();
        self.pixmap.fill(Color::TRANSPARENT);
        self.requested.clear();
        self.composite = CompositeOp::SourceOver;
    }

    /// Straight-alpha RGBA of one pixel; transparent outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixmap.pixel(x, y).map(straight).unwrap_or([0; 4])
    }

    /// Straight-alpha RGBA8 rows, top to bottom.
    pub fn into_rgba(self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| straight(*p))
            .collect()
    }
}

fn straight(p: PremultipliedColorU8) -> [u8; 4] {
    let c = p.demultiply();
    [c.red(), c.green(), c.blue(), c.alpha()]
}

/// Runs `draw` onto `target` with the given composite. Destination-in applies to the whole
/// target, so the draw goes to a scratch pixmap first and uncovered pixels are erased.
fn composite_onto(target: &mut Pixmap, op: CompositeOp, draw: impl FnOnce(&mut Pixmap)) {
    match op {
        CompositeOp::SourceOver => draw(target),
        CompositeOp::DestinationIn => {
            let Some(mut shape) = Pixmap::new(target.width(), target.height()) else {
                return;
            };
            draw(&mut shape);
            let paint = PixmapPaint {
                blend_mode: BlendMode::DestinationIn,
                ..PixmapPaint::default()
            };
            target.draw_pixmap(0, 0, shape.as_ref(), &paint, Transform::identity(), None);
        }
    }
}

impl PaintSurface for PixelSurface {
    fn size_px(&self) -> [u32; 2] {
        [self.pixmap.width(), self.pixmap.height()]
    }

    fn composite(&self) -> CompositeOp {
        self.composite
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.composite = op;
    }

    fn push_layer(&mut self) -> bool {
        let Some(fresh) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
            return false;
        };
        let under = std::mem::replace(&mut self.pixmap, fresh);
        self.below.push((under, self.composite));
        self.composite = CompositeOp::SourceOver;
        true
    }

    fn pop_layer(&mut self) {
        let Some((under, composite)) = self.below.pop() else {
            return;
        };
        let layer = std::mem::replace(&mut self.pixmap, under);
        self.composite = composite;
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn draw_tile(&mut self, url: &str, dest: PixelRect) -> bool {
        self.requested.push(url.to_string());
        let Some(tile) = self.tiles.get(url) else {
            return false;
        };
        if dest.w <= 0.0 || dest.h <= 0.0 {
            return true;
        }

        let transform = Transform::from_row(
            (dest.w / tile.width() as f64) as f32,
            0.0,
            0.0,
            (dest.h / tile.height() as f64) as f32,
            dest.x as f32,
            dest.y as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        composite_onto(&mut self.pixmap, self.composite, |target| {
            target.draw_pixmap(0, 0, tile.as_ref(), &paint, transform, None);
        });
        true
    }

    fn fill_triangles(&mut self, triangles: &[[f64; 2]], color: [f32; 4]) {
        let mut builder = PathBuilder::new();
        for tri in triangles.chunks_exact(3) {
            builder.move_to(tri[0][0] as f32, tri[0][1] as f32);
            builder.line_to(tri[1][0] as f32, tri[1][1] as f32);
            builder.line_to(tri[2][0] as f32, tri[2][1] as f32);
            builder.close();
        }
        let path = builder.finish();

        let mut paint = Paint {
            anti_alias: false,
            ..Paint::default()
        };
        paint.set_color(
            Color::from_rgba(
                color[0].clamp(0.0, 1.0),
                color[1].clamp(0.0, 1.0),
                color[2].clamp(0.0, 1.0),
                color[3].clamp(0.0, 1.0),
            )
            .unwrap_or(Color::BLACK),
        );
        composite_onto(&mut self.pixmap, self.composite, |target| {
            if let Some(path) = &path {
                target.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        });
    }
}
