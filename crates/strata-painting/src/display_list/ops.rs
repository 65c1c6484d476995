//! Display-list operation records and the visitor that dispatches them.

use std::sync::Arc;

use strata_types::{BorderRadius, Matrix, Scalar};

use crate::canvas::Picture;
use crate::mask::Mask;
use crate::surface::ExternalSurfaceSnapshot;

/// Opens a drawing context: a transform and opacity scope identified by a
/// stable layer id for damage tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct PushContextOp {
    pub matrix: Matrix,
    pub opacity: Scalar,
    pub layer_id: u64,
    pub has_updates: bool,
}

/// Replays a recorded picture at the given opacity. Holds a strong picture
/// reference for the lifetime of its plane.
#[derive(Clone)]
pub struct DrawPictureOp {
    pub picture: Arc<Picture>,
    pub opacity: Scalar,
}

impl PartialEq for DrawPictureOp {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.picture, &other.picture) && self.opacity == other.opacity
    }
}

impl std::fmt::Debug for DrawPictureOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawPictureOp")
            .field("cull_rect", &self.picture.cull_rect())
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Clips the current context to `[0, 0, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRectOp {
    pub width: Scalar,
    pub height: Scalar,
}

/// Clips the current context to a rounded rect.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRoundOp {
    pub width: Scalar,
    pub height: Scalar,
    pub border_radius: BorderRadius,
}

/// Marks where an external surface sits in the op stream. Drawable playback
/// skips it; the compositor turns it into an external plane.
#[derive(Clone)]
pub struct DrawExternalSurfaceOp {
    pub snapshot: Arc<ExternalSurfaceSnapshot>,
    pub opacity: Scalar,
}

impl PartialEq for DrawExternalSurfaceOp {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.snapshot, &other.snapshot) && self.opacity == other.opacity
    }
}

impl std::fmt::Debug for DrawExternalSurfaceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawExternalSurfaceOp")
            .field("snapshot", &self.snapshot)
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Begins a masking scope. Must be matched by an [`ApplyMaskOp`] with the
/// same mask identity.
#[derive(Clone)]
pub struct PrepareMaskOp {
    pub mask: Arc<dyn Mask>,
}

impl PartialEq for PrepareMaskOp {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mask, &other.mask)
    }
}

impl std::fmt::Debug for PrepareMaskOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrepareMaskOp")
            .field("mask", &self.mask.description())
            .finish()
    }
}

/// Ends a masking scope opened by [`PrepareMaskOp`].
#[derive(Clone)]
pub struct ApplyMaskOp {
    pub mask: Arc<dyn Mask>,
}

impl PartialEq for ApplyMaskOp {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mask, &other.mask)
    }
}

impl std::fmt::Debug for ApplyMaskOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyMaskOp")
            .field("mask", &self.mask.description())
            .finish()
    }
}

/// One display-list operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    PushContext(PushContextOp),
    PopContext,
    DrawPicture(DrawPictureOp),
    ClipRect(ClipRectOp),
    ClipRound(ClipRoundOp),
    DrawExternalSurface(DrawExternalSurfaceOp),
    PrepareMask(PrepareMaskOp),
    ApplyMask(ApplyMaskOp),
}

impl Op {
    /// Dispatches this op to the matching visitor method.
    pub fn visit<V: DisplayListVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Op::PushContext(op) => visitor.push_context(op),
            Op::PopContext => visitor.pop_context(),
            Op::DrawPicture(op) => visitor.draw_picture(op),
            Op::ClipRect(op) => visitor.clip_rect(op),
            Op::ClipRound(op) => visitor.clip_round(op),
            Op::DrawExternalSurface(op) => visitor.draw_external_surface(op),
            Op::PrepareMask(op) => visitor.prepare_mask(op),
            Op::ApplyMask(op) => visitor.apply_mask(op),
        }
    }
}

/// Receiver for display-list traversal. Every method defaults to a no-op so
/// visitors only implement the ops they care about.
pub trait DisplayListVisitor {
    fn push_context(&mut self, _op: &PushContextOp) {}
    fn pop_context(&mut self) {}
    fn draw_picture(&mut self, _op: &DrawPictureOp) {}
    fn clip_rect(&mut self, _op: &ClipRectOp) {}
    fn clip_round(&mut self, _op: &ClipRoundOp) {}
    fn draw_external_surface(&mut self, _op: &DrawExternalSurfaceOp) {}
    fn prepare_mask(&mut self, _op: &PrepareMaskOp) {}
    fn apply_mask(&mut self, _op: &ApplyMaskOp) {}
}
