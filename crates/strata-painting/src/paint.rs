//! Draw parameters: paint, blend modes, stroke styling, filters.

use strata_types::{Color, Point, Scalar};

/// Porter-Duff and separable blend modes understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcATop,
    DstATop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurStyle {
    #[default]
    Normal,
    Solid,
    Outer,
    Inner,
}

/// A filter applied to a paint's coverage mask before blending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskFilter {
    Blur { style: BlurStyle, sigma: Scalar },
}

impl MaskFilter {
    pub fn blur(sigma: Scalar) -> Self {
        Self::Blur {
            style: BlurStyle::Normal,
            sigma,
        }
    }
}

/// A gradient or other procedural color source attached to a paint.
///
/// The backend interprets the stops; the core only resolves geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shader {
    LinearGradient {
        start: Point,
        end: Point,
        locations: Vec<Scalar>,
        colors: Vec<Color>,
    },
    RadialGradient {
        center: Point,
        radius: Scalar,
        locations: Vec<Scalar>,
        colors: Vec<Color>,
    },
}

/// The bag of parameters for a single draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    color: Color,
    blend_mode: BlendMode,
    anti_alias: bool,
    stroke: bool,
    stroke_width: Scalar,
    stroke_cap: StrokeCap,
    stroke_join: StrokeJoin,
    shader: Option<Shader>,
    mask_filter: Option<MaskFilter>,
    blend_color_filter: Option<Color>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            blend_mode: BlendMode::SrcOver,
            anti_alias: false,
            stroke: false,
            stroke_width: 0.0,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            shader: None,
            mask_filter: None,
            blend_color_filter: None,
        }
    }
}

impl Paint {
    pub fn new() -> Self {
        Self::default()
    }

    /// An anti-aliased fill paint.
    pub fn fill(color: Color) -> Self {
        let mut paint = Self::new();
        paint.set_color(color);
        paint.set_anti_alias(true);
        paint
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Replaces the color's alpha channel with `alpha` in `[0, 1]`.
    #[inline]
    pub fn set_alpha(&mut self, alpha: Scalar) {
        self.color = self.color.with_alpha_ratio(alpha);
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    #[inline]
    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    #[inline]
    pub fn is_anti_alias(&self) -> bool {
        self.anti_alias
    }

    #[inline]
    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        self.anti_alias = anti_alias;
    }

    #[inline]
    pub fn is_stroke(&self) -> bool {
        self.stroke
    }

    #[inline]
    pub fn set_stroke(&mut self, stroke: bool) {
        self.stroke = stroke;
    }

    #[inline]
    pub fn stroke_width(&self) -> Scalar {
        self.stroke_width
    }

    #[inline]
    pub fn set_stroke_width(&mut self, stroke_width: Scalar) {
        self.stroke_width = stroke_width;
    }

    #[inline]
    pub fn stroke_cap(&self) -> StrokeCap {
        self.stroke_cap
    }

    #[inline]
    pub fn set_stroke_cap(&mut self, stroke_cap: StrokeCap) {
        self.stroke_cap = stroke_cap;
    }

    #[inline]
    pub fn stroke_join(&self) -> StrokeJoin {
        self.stroke_join
    }

    #[inline]
    pub fn set_stroke_join(&mut self, stroke_join: StrokeJoin) {
        self.stroke_join = stroke_join;
    }

    #[inline]
    pub fn shader(&self) -> Option<&Shader> {
        self.shader.as_ref()
    }

    #[inline]
    pub fn set_shader(&mut self, shader: Option<Shader>) {
        self.shader = shader;
    }

    #[inline]
    pub fn mask_filter(&self) -> Option<&MaskFilter> {
        self.mask_filter.as_ref()
    }

    #[inline]
    pub fn set_mask_filter(&mut self, mask_filter: Option<MaskFilter>) {
        self.mask_filter = mask_filter;
    }

    #[inline]
    pub fn blend_color_filter(&self) -> Option<Color> {
        self.blend_color_filter
    }

    /// A transparent color clears the filter.
    #[inline]
    pub fn set_blend_color_filter(&mut self, color: Color) {
        self.blend_color_filter = if color == Color::TRANSPARENT {
            None
        } else {
            Some(color)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_defaults() {
        let paint = Paint::new();
        assert_eq!(Color::BLACK, paint.color());
        assert_eq!(BlendMode::SrcOver, paint.blend_mode());
        assert!(!paint.is_stroke());
        assert!(!paint.is_anti_alias());
        assert!(paint.shader().is_none());
    }

    #[test]
    fn test_set_alpha_replaces_channel() {
        let mut paint = Paint::fill(Color::RED);
        paint.set_alpha(0.5);
        assert_eq!(127, paint.color().alpha());
        assert_eq!(0xFF, paint.color().red());
    }

    #[test]
    fn test_blend_color_filter_transparent_clears() {
        let mut paint = Paint::new();
        paint.set_blend_color_filter(Color::RED);
        assert_eq!(Some(Color::RED), paint.blend_color_filter());

        paint.set_blend_color_filter(Color::TRANSPARENT);
        assert!(paint.blend_color_filter().is_none());
    }
}
