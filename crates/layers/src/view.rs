use foundation::Aabb2;

/// Pixel padding kept clear around a fitted extent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub fn symmetric(horizontal: u32, vertical: u32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    /// `ratio` of each viewport dimension, truncated to whole pixels. Horizontal and vertical
    /// padding are computed independently.
    pub fn proportional(size_px: [u32; 2], ratio: f64) -> Self {
        let horizontal = (size_px[0] as f64 * ratio).trunc().max(0.0) as u32;
        let vertical = (size_px[1] as f64 * ratio).trunc().max(0.0) as u32;
        Self::symmetric(horizontal, vertical)
    }
}

/// 2D map view: a center in map units, a resolution in map units per pixel and a viewport size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub center: [f64; 2],
    pub resolution: f64,
    pub size_px: [u32; 2],
}

impl MapView {
    pub fn new(center: [f64; 2], resolution: f64, size_px: [u32; 2]) -> Self {
        Self {
            center,
            resolution,
            size_px,
        }
    }

    pub fn set_size(&mut self, size_px: [u32; 2]) {
        self.size_px = size_px;
    }

    /// Map-space rectangle covered by the viewport.
    pub fn extent(&self) -> Aabb2 {
        let half_w = 0.5 * self.size_px[0] as f64 * self.resolution;
        let half_h = 0.5 * self.size_px[1] as f64 * self.resolution;
        Aabb2::new(
            [self.center[0] - half_w, self.center[1] - half_h],
            [self.center[0] + half_w, self.center[1] + half_h],
        )
    }

    /// Map coordinate to viewport pixel (origin top-left, y down).
    pub fn to_pixel(&self, p: [f64; 2]) -> [f64; 2] {
        [
            0.5 * self.size_px[0] as f64 + (p[0] - self.center[0]) / self.resolution,
            0.5 * self.size_px[1] as f64 - (p[1] - self.center[1]) / self.resolution,
        ]
    }

    pub fn to_map(&self, px: [f64; 2]) -> [f64; 2] {
        [
            self.center[0] + (px[0] - 0.5 * self.size_px[0] as f64) * self.resolution,
            self.center[1] - (px[1] - 0.5 * self.size_px[1] as f64) * self.resolution,
        ]
    }

    /// Centers and zooms so that `extent` fills the viewport minus `padding`.
    ///
    /// The resolution never drops below `min_resolution`, which also covers zero-size extents.
    pub fn fit(&mut self, extent: &Aabb2, padding: Padding, min_resolution: f64) {
        if extent.is_empty() {
            return;
        }
        let w = self.size_px[0] as f64;
        let h = self.size_px[1] as f64;
        let mut avail_w = w - (padding.left + padding.right) as f64;
        let mut avail_h = h - (padding.top + padding.bottom) as f64;
        if avail_w <= 0.0 {
            avail_w = w.max(1.0);
        }
        if avail_h <= 0.0 {
            avail_h = h.max(1.0);
        }

        let resolution = (extent.width() / avail_w)
            .max(extent.height() / avail_h)
            .max(min_resolution);
        let c = extent.center();
        let shift_x = 0.5 * (padding.right as f64 - padding.left as f64) * resolution;
        let shift_y = 0.5 * (padding.top as f64 - padding.bottom as f64) * resolution;

        self.resolution = resolution;
        self.center = [c[0] + shift_x, c[1] + shift_y];
    }
}
