//! Box shadows drawn behind layer backgrounds.

use strata_types::{BorderRadius, Color, Scalar, Size};

use crate::context::DrawingContext;
use crate::lazy_path::LazyPath;
use crate::paint::{MaskFilter, Paint};

/// A blurred, offset copy of the layer's rounded bounds.
#[derive(Debug, Clone)]
pub struct BoxShadow {
    offset: Size,
    color: Color,
    blur_amount: Scalar,
    paint: Paint,
    lazy_path: LazyPath,
}

impl Default for BoxShadow {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxShadow {
    pub fn new() -> Self {
        Self {
            offset: Size::ZERO,
            color: Color::TRANSPARENT,
            blur_amount: 0.0,
            paint: Paint::new(),
            lazy_path: LazyPath::new(),
        }
    }

    #[inline]
    pub fn offset(&self) -> Size {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Size) {
        self.offset = offset;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.paint.set_color(color);
    }

    #[inline]
    pub fn blur_amount(&self) -> Scalar {
        self.blur_amount
    }

    pub fn set_blur_amount(&mut self, blur_amount: Scalar) {
        if self.blur_amount != blur_amount {
            self.blur_amount = blur_amount;
            self.paint.set_mask_filter(if blur_amount == 0.0 {
                None
            } else {
                Some(MaskFilter::blur(blur_amount * 2.0))
            });
        }
    }

    pub fn draw(&mut self, context: &mut DrawingContext, border_radius: &BorderRadius) {
        let draw_bounds = context
            .draw_bounds()
            .with_offset(self.offset.width, self.offset.height);

        context.draw_paint_with_radius_in_rect(
            &self.paint,
            border_radius,
            draw_bounds,
            &mut self.lazy_path,
        );
    }
}
