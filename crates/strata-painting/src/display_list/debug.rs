//! Debug JSON dump of a display list.
//!
//! The JSON shape is `{ frameTime, width, height, surfaces: [[op, ...], ...] }`
//! with one op object per recorded operation. It doubles as the canonical
//! cross-format equality check in tests.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::display_list::ops::{
    ApplyMaskOp, ClipRectOp, ClipRoundOp, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    PrepareMaskOp, PushContextOp,
};
use crate::display_list::DisplayList;

struct DebugJsonVisitor {
    ops: Vec<Value>,
}

impl DebugJsonVisitor {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }
}

impl DisplayListVisitor for DebugJsonVisitor {
    fn push_context(&mut self, op: &PushContextOp) {
        self.ops.push(json!({
            "type": "push",
            "matrix": op.matrix.to_string(),
            "opacity": op.opacity,
        }));
    }

    fn pop_context(&mut self) {
        self.ops.push(json!({ "type": "pop" }));
    }

    fn draw_picture(&mut self, op: &DrawPictureOp) {
        self.ops.push(json!({
            "type": "draw",
            "opacity": op.opacity,
            "pictureId": Arc::as_ptr(&op.picture) as usize,
        }));
    }

    fn clip_rect(&mut self, op: &ClipRectOp) {
        self.ops.push(json!({
            "type": "clipRect",
            "width": op.width,
            "height": op.height,
        }));
    }

    fn clip_round(&mut self, op: &ClipRoundOp) {
        self.ops.push(json!({
            "type": "clipRound",
            "width": op.width,
            "height": op.height,
            "borderRadius": op.border_radius.to_string(),
        }));
    }

    fn draw_external_surface(&mut self, op: &DrawExternalSurfaceOp) {
        self.ops.push(json!({
            "type": "drawExternalSurface",
            "opacity": op.opacity,
            "externalSurfaceSnapshotId": Arc::as_ptr(&op.snapshot) as usize,
        }));
    }

    fn prepare_mask(&mut self, op: &PrepareMaskOp) {
        self.ops.push(json!({
            "type": "prepareMask",
            "description": op.mask.description(),
        }));
    }

    fn apply_mask(&mut self, op: &ApplyMaskOp) {
        self.ops.push(json!({
            "type": "applyMask",
            "description": op.mask.description(),
        }));
    }
}

impl DisplayList {
    /// Serializes the list, plane by plane, into debug JSON.
    pub fn to_debug_json(&self) -> Value {
        let mut surfaces = Vec::with_capacity(self.planes_count());

        for plane_index in 0..self.planes_count() {
            let mut visitor = DebugJsonVisitor::new();
            self.visit_plane(plane_index, &mut visitor);
            surfaces.push(Value::Array(visitor.ops));
        }

        json!({
            "frameTime": self.frame_time().seconds(),
            "width": self.size().width,
            "height": self.size().height,
            "surfaces": surfaces,
        })
    }
}
