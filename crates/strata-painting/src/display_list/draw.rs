//! Display-list playback onto a canvas.

use strata_types::{sanitize_scalar_for_scale, Rect, Scalar};

use crate::canvas::Canvas;
use crate::display_list::ops::{
    ApplyMaskOp, ClipRectOp, ClipRoundOp, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    PrepareMaskOp, PushContextOp,
};
use crate::paint::Paint;

/// Replays ops of a drawable plane onto a canvas.
pub(crate) struct DrawVisitor<'a> {
    canvas: &'a mut dyn Canvas,
    scale_x: Scalar,
    scale_y: Scalar,
}

impl<'a> DrawVisitor<'a> {
    pub(crate) fn new(canvas: &'a mut dyn Canvas, scale_x: Scalar, scale_y: Scalar) -> Self {
        Self {
            canvas,
            scale_x,
            scale_y,
        }
    }
}

impl DisplayListVisitor for DrawVisitor<'_> {
    fn push_context(&mut self, op: &PushContextOp) {
        if op.opacity == 1.0 {
            self.canvas.save();
        } else {
            let mut paint = Paint::new();
            paint.set_alpha(op.opacity);
            self.canvas.save_layer(Some(&paint));
        }

        // Snap the translation to the pixel grid so adjacent layers do not
        // leave sub-pixel seams. Other components stay untouched.
        let mut matrix = op.matrix;
        matrix.set_translate_x(sanitize_scalar_for_scale(matrix.translate_x(), self.scale_x));
        matrix.set_translate_y(sanitize_scalar_for_scale(matrix.translate_y(), self.scale_y));

        self.canvas.concat(&matrix);
    }

    fn pop_context(&mut self) {
        self.canvas.restore();
    }

    fn draw_picture(&mut self, op: &DrawPictureOp) {
        if op.opacity == 1.0 {
            self.canvas.draw_picture(&op.picture, None, None);
        } else {
            let mut paint = Paint::new();
            paint.set_alpha(op.opacity);
            self.canvas.draw_picture(&op.picture, None, Some(&paint));
        }
    }

    fn clip_rect(&mut self, op: &ClipRectOp) {
        self.canvas
            .clip_rect(Rect::from_xywh(0.0, 0.0, op.width, op.height), false);
    }

    fn clip_round(&mut self, op: &ClipRoundOp) {
        let bounds = Rect::from_xywh(0.0, 0.0, op.width, op.height);
        let path = op.border_radius.get_path(bounds);
        if !path.is_empty() {
            self.canvas.clip_path(&path, false);
        }
    }

    fn draw_external_surface(&mut self, _op: &DrawExternalSurfaceOp) {
        // External surfaces are composited onto their own planes; drawable
        // playback has nothing to do here.
    }

    fn prepare_mask(&mut self, op: &PrepareMaskOp) {
        op.mask.prepare(self.canvas);
    }

    fn apply_mask(&mut self, op: &ApplyMaskOp) {
        op.mask.apply(self.canvas);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::canvas::{Picture, PictureOp, PictureRecorder};
    use crate::display_list::DisplayList;
    use strata_types::{Color, Matrix, Size, TimePoint};

    fn record_picture() -> Arc<Picture> {
        let mut recorder = PictureRecorder::new();
        let canvas = recorder.begin_recording(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        canvas.draw_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), &Paint::fill(Color::RED));
        recorder.finish_recording_as_picture().unwrap()
    }

    fn replay(list: &DisplayList, scale: Scalar, clear: bool) -> Vec<PictureOp> {
        let mut recorder = PictureRecorder::new();
        let canvas = recorder.begin_recording(Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
        list.draw(canvas, 0, scale, scale, clear);
        let picture = recorder.finish_recording_as_picture().unwrap();
        picture.ops().to_vec()
    }

    #[test]
    fn test_translation_is_snapped_to_pixel_grid() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO);
        list.push_context(&Matrix::from_translate(10.3, 10.7), 1.0, 0, true);
        list.pop_context();

        let ops = replay(&list, 1.0, false);
        let concat = ops.iter().find_map(|op| match op {
            PictureOp::Concat(matrix) => Some(*matrix),
            _ => None,
        });

        let matrix = concat.expect("push context should concat");
        assert_eq!(10.0, matrix.translate_x());
        assert_eq!(11.0, matrix.translate_y());
    }

    #[test]
    fn test_opaque_context_saves_without_layer() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO);
        list.push_context(&Matrix::IDENTITY, 1.0, 0, true);
        list.pop_context();

        let ops = replay(&list, 1.0, false);
        assert!(ops.iter().any(|op| matches!(op, PictureOp::Save)));
        assert!(!ops.iter().any(|op| matches!(op, PictureOp::SaveLayer(_))));
    }

    #[test]
    fn test_translucent_context_uses_save_layer() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO);
        list.push_context(&Matrix::IDENTITY, 0.5, 0, true);
        list.pop_context();

        let ops = replay(&list, 1.0, false);
        let alpha = ops.iter().find_map(|op| match op {
            PictureOp::SaveLayer(Some(paint)) => Some(paint.color().alpha()),
            _ => None,
        });
        assert_eq!(Some(127), alpha);
    }

    #[test]
    fn test_clear_emits_src_paint() {
        let list = DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO);
        let ops = replay(&list, 1.0, true);

        assert!(ops.iter().any(|op| matches!(
            op,
            PictureOp::DrawPaint { paint }
                if paint.blend_mode() == crate::paint::BlendMode::Src
                    && paint.color() == Color::TRANSPARENT
        )));
    }

    #[test]
    fn test_translucent_picture_draw_carries_paint() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO);
        list.append_picture(record_picture(), 0.25);

        let ops = replay(&list, 1.0, false);
        let has_painted_picture = ops.iter().any(|op| {
            matches!(op, PictureOp::DrawPicture { paint: Some(paint), .. } if paint.color().alpha() == 63)
        });
        assert!(has_painted_picture);
    }

    #[test]
    fn test_scale_applied_before_ops() {
        let list = DisplayList::new(Size::new(50.0, 50.0), TimePoint::ZERO);

        let mut recorder = PictureRecorder::new();
        let canvas = recorder.begin_recording(Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
        list.draw_to_size(canvas, 0, 100.0, 100.0, false);
        let picture = recorder.finish_recording_as_picture().unwrap();

        assert!(picture
            .ops()
            .iter()
            .any(|op| matches!(op, PictureOp::Scale(sx, sy) if *sx == 2.0 && *sy == 2.0)));
    }
}
