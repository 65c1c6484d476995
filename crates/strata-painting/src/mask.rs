//! Masking operations emitted at draw time.

use std::sync::Arc;

use strata_types::{Path, Rect};

use crate::canvas::Canvas;
use crate::paint::{BlendMode, Paint};

/// A single masking operation. Content drawn between `prepare` and `apply`
/// ends up masked once `apply` runs.
///
/// Masks are compared by identity (`Arc::ptr_eq`) when matching a prepare to
/// its apply.
pub trait Mask: Send + Sync {
    /// The area the mask might alter.
    fn bounds(&self) -> Rect;

    fn prepare(&self, canvas: &mut dyn Canvas);

    fn apply(&self, canvas: &mut dyn Canvas);

    fn description(&self) -> String;
}

/// Draws a region from a rect or path with a configurable paint. With the
/// default `DstOut` blend mode the region is punched out of the content
/// drawn since `prepare`.
pub struct PaintMask {
    paint: Paint,
    path: Path,
    rect: Rect,
}

impl PaintMask {
    pub fn new(paint: Paint, path: Path, rect: Rect) -> Self {
        Self { paint, path, rect }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut paint = Paint::new();
        paint.set_blend_mode(BlendMode::DstOut);
        Self::new(paint, Path::new(), rect)
    }
}

impl Mask for PaintMask {
    fn bounds(&self) -> Rect {
        self.path.bounds().unwrap_or(self.rect)
    }

    fn prepare(&self, canvas: &mut dyn Canvas) {
        canvas.save_layer(None);
    }

    fn apply(&self, canvas: &mut dyn Canvas) {
        if self.path.is_empty() {
            canvas.draw_rect(self.rect, &self.paint);
        } else {
            canvas.draw_path(&self.path, &self.paint);
        }
        canvas.restore();
    }

    fn description(&self) -> String {
        format!("PaintMask({})", self.bounds())
    }
}

/// Runs several masks as one operation. Preparation happens in order and
/// application in reverse, so the masks nest.
pub struct CompositeMask {
    masks: Vec<Arc<dyn Mask>>,
    bounds: Rect,
}

impl CompositeMask {
    pub fn new(masks: Vec<Arc<dyn Mask>>) -> Self {
        let mut bounds = Rect::EMPTY;
        for mask in &masks {
            bounds.join(mask.bounds());
        }
        Self { masks, bounds }
    }
}

impl Mask for CompositeMask {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn prepare(&self, canvas: &mut dyn Canvas) {
        for mask in &self.masks {
            mask.prepare(canvas);
        }
    }

    fn apply(&self, canvas: &mut dyn Canvas) {
        for mask in self.masks.iter().rev() {
            mask.apply(canvas);
        }
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self.masks.iter().map(|mask| mask.description()).collect();
        format!("CompositeMask[{}]", parts.join(", "))
    }
}
