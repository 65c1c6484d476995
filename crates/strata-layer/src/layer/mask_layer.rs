//! Mask layers: per-layer configuration that emits masks at draw time.

use std::sync::Arc;

use strata_painting::{BlendMode, Mask, Paint, PaintMask};
use strata_types::{Color, Path, Rect};

/// Where a layer's mask is prepared relative to its background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPositioning {
    /// Prepared before the background, so the mask covers it too.
    #[default]
    BelowBackground,
    /// Prepared between background and content, leaving the background
    /// unmasked.
    AboveBackground,
}

/// Configures the mask a layer emits while drawing. Set on a layer to alter
/// how the layer and its children are drawn.
pub trait MaskLayer: Send + Sync {
    fn positioning(&self) -> MaskPositioning;

    /// Builds the mask for the layer's current bounds, or `None` when there
    /// is nothing to mask.
    fn create_mask(&self, bounds: Rect) -> Option<Arc<dyn Mask>>;
}

/// Emits a [`PaintMask`] over a configured rect or path region. With the
/// default `DstOut` blend mode the region is knocked out of the layer.
#[derive(Debug, Clone)]
pub struct PaintMaskLayer {
    rect: Rect,
    path: Path,
    color: Color,
    blend_mode: BlendMode,
    positioning: MaskPositioning,
}

impl Default for PaintMaskLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintMaskLayer {
    pub fn new() -> Self {
        Self {
            rect: Rect::EMPTY,
            path: Path::new(),
            color: Color::BLACK,
            blend_mode: BlendMode::DstOut,
            positioning: MaskPositioning::BelowBackground,
        }
    }

    /// Masks the given rect region, replacing any configured path.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
        if !self.path.is_empty() {
            self.path.reset();
        }
    }

    /// Masks the given path region, replacing any configured rect.
    pub fn set_path(&mut self, path: Path) {
        self.path = path;
        self.rect = Rect::EMPTY;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    pub fn set_positioning(&mut self, positioning: MaskPositioning) {
        self.positioning = positioning;
    }

    /// The region covered by the configured rect or path.
    pub fn bounds(&self) -> Rect {
        self.path.bounds().unwrap_or(self.rect)
    }
}

impl MaskLayer for PaintMaskLayer {
    fn positioning(&self) -> MaskPositioning {
        self.positioning
    }

    fn create_mask(&self, _bounds: Rect) -> Option<Arc<dyn Mask>> {
        let region = self.bounds();
        if region.is_empty() {
            return None;
        }

        let mut paint = Paint::new();
        paint.set_color(self.color);
        paint.set_blend_mode(self.blend_mode);

        Some(Arc::new(PaintMask::new(
            paint,
            self.path.clone(),
            self.rect,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region_creates_no_mask() {
        let layer = PaintMaskLayer::new();
        assert!(layer
            .create_mask(Rect::from_xywh(0.0, 0.0, 100.0, 100.0))
            .is_none());
    }

    #[test]
    fn test_rect_region_creates_mask() {
        let mut layer = PaintMaskLayer::new();
        layer.set_rect(Rect::from_xywh(10.0, 10.0, 20.0, 20.0));

        let mask = layer
            .create_mask(Rect::from_xywh(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(Rect::from_xywh(10.0, 10.0, 20.0, 20.0), mask.bounds());
    }

    #[test]
    fn test_path_replaces_rect() {
        let mut layer = PaintMaskLayer::new();
        layer.set_rect(Rect::from_xywh(0.0, 0.0, 5.0, 5.0));

        let mut path = Path::new();
        path.add_rect(Rect::from_xywh(30.0, 30.0, 10.0, 10.0), true);
        layer.set_path(path);

        assert_eq!(Rect::from_xywh(30.0, 30.0, 10.0, 10.0), layer.bounds());

        // And a rect clears the path again.
        layer.set_rect(Rect::from_xywh(1.0, 1.0, 2.0, 2.0));
        assert_eq!(Rect::from_xywh(1.0, 1.0, 2.0, 2.0), layer.bounds());
    }

    #[test]
    fn test_positioning() {
        let mut layer = PaintMaskLayer::new();
        assert_eq!(MaskPositioning::BelowBackground, layer.positioning());

        layer.set_positioning(MaskPositioning::AboveBackground);
        assert_eq!(MaskPositioning::AboveBackground, layer.positioning());
    }
}
