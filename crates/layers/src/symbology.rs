#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    /// Straight (non-premultiplied) RGBA, 0..1.
    pub color: [f32; 4],
}

impl LayerStyle {
    pub const fn new(visible: bool, color: [f32; 4]) -> Self {
        Self { visible, color }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Fill used for the clip mask. Only its alpha matters under destination-in.
pub const MASK_FILL: LayerStyle = LayerStyle::new(true, [1.0, 0.0, 0.0, 1.0]);
