//! The display list: a typed, append-only op stream grouped into planes.

pub mod ops;
mod pool;

mod debug;
mod draw;

use std::sync::Arc;

use smallvec::SmallVec;
use strata_types::{BorderRadius, Matrix, Scalar, Size, TimePoint};

use crate::canvas::{Canvas, Picture};
use crate::context::LayerContent;
use crate::mask::Mask;
use crate::paint::{BlendMode, Paint};

use self::draw::DrawVisitor;
use self::ops::{
    ApplyMaskOp, ClipRectOp, ClipRoundOp, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    Op, PrepareMaskOp, PushContextOp,
};
use self::pool::PooledOpBuffer;

/// One ordered sub-stream of operations. Planes above external planes draw
/// atop them after composition.
#[derive(Debug)]
struct Plane {
    ops: PooledOpBuffer,
}

impl Plane {
    fn new() -> Self {
        Self {
            ops: PooledOpBuffer::acquire(),
        }
    }
}

/// An append-only log of drawing operations for one frame.
///
/// A list starts with a single plane; the compositor may grow it to
/// interleave external surfaces. Appends go to the current plane. Retained
/// heap objects (pictures, surface snapshots, masks) are kept alive by their
/// op and released when the plane is removed or the list dropped.
#[derive(Debug)]
pub struct DisplayList {
    planes: SmallVec<[Plane; 1]>,
    current_plane: Option<usize>,
    size: Size,
    frame_time: TimePoint,
    has_external_surfaces: bool,
    has_mask: bool,
}

impl DisplayList {
    pub fn new(size: Size, frame_time: TimePoint) -> Self {
        let mut list = Self {
            planes: SmallVec::new(),
            current_plane: None,
            size,
            frame_time,
            has_external_surfaces: false,
            has_mask: false,
        };
        list.append_plane();
        list
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn frame_time(&self) -> TimePoint {
        self.frame_time
    }

    #[inline]
    pub fn has_external_surfaces(&self) -> bool {
        self.has_external_surfaces
    }

    #[inline]
    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    fn current_plane_mut(&mut self) -> &mut Plane {
        let index = self
            .current_plane
            .expect("display list has no current plane");
        &mut self.planes[index]
    }

    fn append_op(&mut self, op: Op) {
        self.current_plane_mut().ops.push(op);
    }

    // ------------------------------------------------------------------
    // Appending
    // ------------------------------------------------------------------

    pub fn push_context(&mut self, matrix: &Matrix, opacity: Scalar, layer_id: u64, has_updates: bool) {
        self.append_op(Op::PushContext(PushContextOp {
            matrix: *matrix,
            opacity,
            layer_id,
            has_updates,
        }));
    }

    pub fn pop_context(&mut self) {
        self.append_op(Op::PopContext);
    }

    /// Appends the picture and/or external surface the content carries.
    pub fn append_layer_content(&mut self, content: &LayerContent, opacity: Scalar) {
        if let Some(picture) = &content.picture {
            self.append_picture(Arc::clone(picture), opacity);
        }

        if let Some(snapshot) = &content.external_surface {
            self.append_op(Op::DrawExternalSurface(DrawExternalSurfaceOp {
                snapshot: Arc::clone(snapshot),
                opacity,
            }));
            self.has_external_surfaces = true;
        }
    }

    pub fn append_picture(&mut self, picture: Arc<Picture>, opacity: Scalar) {
        self.append_op(Op::DrawPicture(DrawPictureOp { picture, opacity }));
    }

    /// An empty border radius degenerates to a plain rect clip.
    pub fn append_clip_round(&mut self, border_radius: &BorderRadius, width: Scalar, height: Scalar) {
        if border_radius.is_empty() {
            self.append_clip_rect(width, height);
        } else {
            self.append_op(Op::ClipRound(ClipRoundOp {
                width,
                height,
                border_radius: *border_radius,
            }));
        }
    }

    pub fn append_clip_rect(&mut self, width: Scalar, height: Scalar) {
        self.append_op(Op::ClipRect(ClipRectOp { width, height }));
    }

    pub fn append_prepare_mask(&mut self, mask: Arc<dyn Mask>) {
        self.append_op(Op::PrepareMask(PrepareMaskOp { mask }));
        self.has_mask = true;
    }

    pub fn append_apply_mask(&mut self, mask: Arc<dyn Mask>) {
        self.append_op(Op::ApplyMask(ApplyMaskOp { mask }));
    }

    // ------------------------------------------------------------------
    // Plane management
    // ------------------------------------------------------------------

    #[inline]
    pub fn planes_count(&self) -> usize {
        self.planes.len()
    }

    /// Number of ops recorded into the given plane.
    pub fn ops_count(&self, plane_index: usize) -> usize {
        self.planes[plane_index].ops.len()
    }

    /// Appends a new plane and makes it current.
    pub fn append_plane(&mut self) {
        self.planes.push(Plane::new());
        self.current_plane = Some(self.planes.len() - 1);
    }

    pub fn set_current_plane(&mut self, plane_index: usize) {
        assert!(plane_index < self.planes.len());
        self.current_plane = Some(plane_index);
    }

    /// Removes a plane, releasing every retained reference its ops held.
    pub fn remove_plane(&mut self, plane_index: usize) {
        match self.current_plane {
            Some(current) if current == plane_index => self.current_plane = None,
            Some(current) if current > plane_index => self.current_plane = Some(current - 1),
            _ => {}
        }

        // Dropping the plane returns its buffer to the pool, clearing the
        // ops (and their Arcs) on the way.
        self.planes.remove(plane_index);
    }

    pub fn remove_empty_planes(&mut self) {
        let mut index = self.planes_count();
        while index > 0 {
            index -= 1;
            if self.ops_count(index) == 0 {
                self.remove_plane(index);
            }
        }
    }

    pub fn remove_all_planes(&mut self) {
        let mut count = self.planes_count();
        while count > 0 {
            count -= 1;
            self.remove_plane(count);
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Visits every op of one plane in order.
    pub fn visit_plane<V: DisplayListVisitor + ?Sized>(&self, plane_index: usize, visitor: &mut V) {
        for op in self.planes[plane_index].ops.iter() {
            op.visit(visitor);
        }
    }

    /// Visits every plane in index order.
    pub fn visit_all_planes<V: DisplayListVisitor + ?Sized>(&self, visitor: &mut V) {
        for plane_index in 0..self.planes_count() {
            self.visit_plane(plane_index, visitor);
        }
    }

    /// Raw op access for tests and tooling.
    pub fn plane_ops(&self, plane_index: usize) -> &[Op] {
        &self.planes[plane_index].ops
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Replays one plane onto `canvas` at an explicit raster scale.
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        plane_index: usize,
        scale_x: Scalar,
        scale_y: Scalar,
        should_clear_canvas: bool,
    ) {
        let save_count = canvas.save();

        canvas.scale(scale_x, scale_y);
        if should_clear_canvas {
            canvas.draw_paint(&clear_paint());
        }

        if self.has_mask {
            // Masking needs a dedicated layer texture to operate on.
            canvas.save_layer(None);
        }

        let mut visitor = DrawVisitor::new(canvas, scale_x, scale_y);
        self.visit_plane(plane_index, &mut visitor);

        canvas.restore_to_count(save_count);
    }

    /// Replays one plane, deriving the raster scale from the target size.
    pub fn draw_to_size(
        &self,
        canvas: &mut dyn Canvas,
        plane_index: usize,
        target_width: Scalar,
        target_height: Scalar,
        should_clear_canvas: bool,
    ) {
        let scale_x = target_width / self.size.width;
        let scale_y = target_height / self.size.height;

        self.draw(canvas, plane_index, scale_x, scale_y, should_clear_canvas);
    }
}

impl Drop for DisplayList {
    fn drop(&mut self) {
        self.remove_all_planes();
    }
}

impl PartialEq for DisplayList {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size || self.planes_count() != other.planes_count() {
            return false;
        }

        self.planes
            .iter()
            .zip(other.planes.iter())
            .all(|(mine, theirs)| *mine.ops == *theirs.ops)
    }
}

pub(crate) fn clear_paint() -> Paint {
    let mut paint = Paint::new();
    paint.set_color(strata_types::Color::TRANSPARENT);
    paint.set_blend_mode(BlendMode::Src);
    paint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PictureRecorder;
    use crate::mask::PaintMask;
    use strata_types::{Color, Rect};

    fn record_rect_picture(size: Size) -> Arc<Picture> {
        let mut recorder = PictureRecorder::new();
        let canvas = recorder.begin_recording(Rect::from_size(size));
        canvas.draw_rect(Rect::from_size(size), &Paint::fill(Color::RED));
        recorder.finish_recording_as_picture().unwrap()
    }

    fn new_list() -> DisplayList {
        DisplayList::new(Size::new(100.0, 100.0), TimePoint::ZERO)
    }

    #[test]
    fn test_new_list_has_one_empty_plane() {
        let list = new_list();
        assert_eq!(1, list.planes_count());
        assert_eq!(0, list.ops_count(0));
        assert!(!list.has_external_surfaces());
        assert!(!list.has_mask());
    }

    #[test]
    fn test_record_and_visit_ops() {
        let mut list = new_list();
        let picture = record_rect_picture(Size::new(50.0, 50.0));

        list.push_context(&Matrix::from_translate(5.0, 5.0), 0.5, 7, true);
        list.append_picture(Arc::clone(&picture), 1.0);
        list.append_clip_rect(30.0, 40.0);
        list.pop_context();

        #[derive(Default)]
        struct Collector {
            ops: Vec<String>,
        }
        impl DisplayListVisitor for Collector {
            fn push_context(&mut self, op: &PushContextOp) {
                self.ops.push(format!("push({}, {})", op.opacity, op.layer_id));
            }
            fn pop_context(&mut self) {
                self.ops.push("pop".into());
            }
            fn draw_picture(&mut self, op: &DrawPictureOp) {
                self.ops.push(format!("draw({})", op.opacity));
            }
            fn clip_rect(&mut self, op: &ClipRectOp) {
                self.ops.push(format!("clipRect({}x{})", op.width, op.height));
            }
        }

        let mut collector = Collector::default();
        list.visit_all_planes(&mut collector);
        assert_eq!(
            vec!["push(0.5, 7)", "draw(1)", "clipRect(30x40)", "pop"],
            collector.ops
        );
    }

    #[test]
    fn test_clip_round_degenerates_to_rect() {
        let mut list = new_list();
        list.append_clip_round(&BorderRadius::default(), 10.0, 10.0);

        assert!(matches!(list.plane_ops(0)[0], Op::ClipRect(_)));

        list.append_clip_round(&BorderRadius::all(4.0, false), 10.0, 10.0);
        assert!(matches!(list.plane_ops(0)[1], Op::ClipRound(_)));
    }

    #[test]
    fn test_retain_release_balance() {
        let picture = record_rect_picture(Size::new(10.0, 10.0));
        assert_eq!(1, Arc::strong_count(&picture));

        {
            let mut list = new_list();
            list.append_picture(Arc::clone(&picture), 1.0);
            list.append_picture(Arc::clone(&picture), 0.5);
            assert_eq!(3, Arc::strong_count(&picture));
        }

        // Dropping the list releases exactly the references it took.
        assert_eq!(1, Arc::strong_count(&picture));
    }

    #[test]
    fn test_remove_plane_releases_refs() {
        let picture = record_rect_picture(Size::new(10.0, 10.0));

        let mut list = new_list();
        list.append_plane();
        list.append_picture(Arc::clone(&picture), 1.0);
        assert_eq!(2, Arc::strong_count(&picture));

        list.remove_plane(1);
        assert_eq!(1, Arc::strong_count(&picture));
        assert_eq!(1, list.planes_count());
    }

    #[test]
    fn test_multiple_planes_and_cursor() {
        let mut list = new_list();
        list.append_clip_rect(1.0, 1.0);

        list.append_plane();
        list.append_clip_rect(2.0, 2.0);
        list.append_clip_rect(3.0, 3.0);

        list.set_current_plane(0);
        list.append_clip_rect(4.0, 4.0);

        assert_eq!(2, list.planes_count());
        assert_eq!(2, list.ops_count(0));
        assert_eq!(2, list.ops_count(1));
    }

    #[test]
    fn test_remove_empty_planes() {
        let mut list = new_list();
        list.append_clip_rect(1.0, 1.0);
        list.append_plane();
        list.append_plane();
        list.set_current_plane(2);
        list.append_clip_rect(2.0, 2.0);

        assert_eq!(3, list.planes_count());
        list.remove_empty_planes();
        assert_eq!(2, list.planes_count());
        assert_eq!(1, list.ops_count(0));
        assert_eq!(1, list.ops_count(1));
    }

    #[test]
    fn test_mask_marks_list() {
        let mut list = new_list();
        let mask: Arc<dyn Mask> = Arc::new(PaintMask::from_rect(Rect::from_xywh(0.0, 0.0, 5.0, 5.0)));

        list.append_prepare_mask(Arc::clone(&mask));
        list.append_apply_mask(Arc::clone(&mask));
        assert!(list.has_mask());
        assert_eq!(3, Arc::strong_count(&mask));

        drop(list);
        assert_eq!(1, Arc::strong_count(&mask));
    }

    #[test]
    fn test_equality_by_ops() {
        let picture = record_rect_picture(Size::new(10.0, 10.0));

        let mut a = new_list();
        a.push_context(&Matrix::IDENTITY, 1.0, 0, true);
        a.append_picture(Arc::clone(&picture), 1.0);
        a.pop_context();

        let mut b = new_list();
        b.push_context(&Matrix::IDENTITY, 1.0, 0, true);
        b.append_picture(Arc::clone(&picture), 1.0);
        b.pop_context();

        assert_eq!(a, b);

        b.append_clip_rect(1.0, 1.0);
        assert_ne!(a, b);

        // Same shape but a different picture identity is not equal.
        let mut c = new_list();
        c.push_context(&Matrix::IDENTITY, 1.0, 0, true);
        c.append_picture(record_rect_picture(Size::new(10.0, 10.0)), 1.0);
        c.pop_context();
        assert_ne!(a, c);
    }
}
