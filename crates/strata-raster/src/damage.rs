//! Damage resolution for delta rasterization.

use ahash::AHashMap;
use smallvec::SmallVec;
use strata_layer::CompositionState;
use strata_painting::{
    ClipRectOp, ClipRoundOp, DisplayList, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    PrepareMaskOp, PushContextOp,
};
use strata_types::{Matrix, Path, Rect, Scalar};

/// The per-frame record kept for one context (layer id): everything that,
/// when changed, means the layer's pixels moved or changed.
#[derive(Debug, Clone)]
struct LayerRecord {
    absolute_rect: Rect,
    absolute_matrix: Matrix,
    absolute_opacity: Scalar,
    clip_path: Path,
    has_updates: bool,
}

/// Computes the minimum rectangle set covering what changed between
/// consecutive frames of display lists.
///
/// Usage per frame: `begin_updates`, then `add_damage_from_display_list`
/// for the frame's list, then `end_updates` to diff against the previous
/// frame and collect the damage rects.
#[derive(Debug, Default)]
pub struct DamageResolver {
    width: Scalar,
    height: Scalar,
    damage_rects: Vec<Rect>,
    previous_layer_contents: AHashMap<u64, LayerRecord>,
    layer_contents: AHashMap<u64, LayerRecord>,
}

impl DamageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a frame at the given surface size. A size change damages the
    /// whole surface.
    pub fn begin_updates(&mut self, surface_width: Scalar, surface_height: Scalar) {
        let changed = self.width != surface_width || self.height != surface_height;
        self.width = surface_width;
        self.height = surface_height;

        if changed {
            self.add_damage_in_rect(Rect::from_xywh(0.0, 0.0, surface_width, surface_height));
        }
    }

    /// Records the frame's layer placements from `display_list`, scaled to
    /// the surface size set in [`DamageResolver::begin_updates`].
    pub fn add_damage_from_display_list(&mut self, display_list: &DisplayList) {
        let scale_x = self.width / display_list.size().width;
        let scale_y = self.height / display_list.size().height;

        let mut visitor = ComputeDamageVisitor::new(self, scale_x, scale_y);
        display_list.visit_all_planes(&mut visitor);
    }

    /// Adds a damage rect, union-collapsing it with every intersecting rect
    /// already accumulated. The scan restarts after each absorption since
    /// the grown union may newly overlap earlier entries. Quadratic, which
    /// is fine for the small damage counts a frame produces.
    pub fn add_damage_in_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }

        let mut damage = rect;
        let mut index = 0;
        while index < self.damage_rects.len() {
            if self.damage_rects[index].intersects(damage) {
                damage.join(self.damage_rects.remove(index));
                index = 0;
            } else {
                index += 1;
            }
        }

        self.damage_rects.push(damage);
    }

    /// Diffs this frame against the previous one and returns the damage
    /// rects in insertion order. The frame becomes the new baseline.
    pub fn end_updates(&mut self) -> Vec<Rect> {
        self.resolve_damage();

        std::mem::swap(&mut self.previous_layer_contents, &mut self.layer_contents);
        self.layer_contents.clear();

        std::mem::take(&mut self.damage_rects)
    }

    fn resolve_damage(&mut self) {
        // Layers present last frame: damage removals and any change in
        // placement, clip, opacity or content.
        let mut to_add: SmallVec<[Rect; 8]> = SmallVec::new();

        for (layer_id, previous) in &self.previous_layer_contents {
            let Some(current) = self.layer_contents.get_mut(layer_id) else {
                to_add.push(previous.absolute_rect);
                continue;
            };

            if current.has_updates
                || current.absolute_matrix != previous.absolute_matrix
                || current.clip_path != previous.clip_path
                || current.absolute_rect != previous.absolute_rect
                || current.absolute_opacity != previous.absolute_opacity
            {
                current.has_updates = false;

                to_add.push(previous.absolute_rect);
                to_add.push(current.absolute_rect);
            }
        }

        // Whatever still claims updates is new this frame.
        for record in self.layer_contents.values_mut() {
            if record.has_updates {
                record.has_updates = false;
                to_add.push(record.absolute_rect);
            }
        }

        for rect in to_add {
            self.add_damage_in_rect(rect);
        }
    }

    fn record_layer_in_rect(
        &mut self,
        layer_id: u64,
        absolute_rect: Rect,
        absolute_matrix: Matrix,
        clip_path: Path,
        absolute_opacity: Scalar,
        has_updates: bool,
    ) {
        self.layer_contents.insert(
            layer_id,
            LayerRecord {
                absolute_rect,
                absolute_matrix,
                absolute_opacity,
                clip_path,
                has_updates,
            },
        );
    }
}

/// Walks a display list maintaining a context stack (like the compositor's,
/// minus planes) and records every drawing op's placement under its
/// context's layer id.
struct ComputeDamageVisitor<'a> {
    resolver: &'a mut DamageResolver,
    stack: SmallVec<[DamageContext; 8]>,
}

struct DamageContext {
    state: CompositionState,
    layer_id: u64,
    has_updates: bool,
}

impl<'a> ComputeDamageVisitor<'a> {
    fn new(resolver: &'a mut DamageResolver, scale_x: Scalar, scale_y: Scalar) -> Self {
        let mut stack: SmallVec<[DamageContext; 8]> = SmallVec::new();
        stack.push(DamageContext {
            state: CompositionState::new(Path::new(), Matrix::from_scale(scale_x, scale_y), 1.0),
            layer_id: 0,
            has_updates: false,
        });

        Self { resolver, stack }
    }

    fn current(&self) -> &DamageContext {
        self.stack.last().expect("damage context stack has a root")
    }

    fn add_damage_if_needed(&mut self, bounds: Rect) {
        let context = self.current();
        let absolute_rect = context.state.absolute_clipped_rect(bounds);

        self.resolver.record_layer_in_rect(
            context.layer_id,
            absolute_rect,
            *context.state.absolute_matrix(),
            context.state.absolute_clip_path().clone(),
            context.state.absolute_opacity(),
            context.has_updates,
        );
    }
}

impl DisplayListVisitor for ComputeDamageVisitor<'_> {
    fn push_context(&mut self, op: &PushContextOp) {
        let state = self.current().state.push_context(op.opacity, &op.matrix);
        self.stack.push(DamageContext {
            state,
            layer_id: op.layer_id,
            has_updates: op.has_updates,
        });
    }

    fn pop_context(&mut self) {
        self.stack.pop();
    }

    fn clip_rect(&mut self, op: &ClipRectOp) {
        let context = self.stack.last_mut().expect("damage context stack has a root");
        context.state.clip_rect(op.width, op.height);
    }

    fn clip_round(&mut self, op: &ClipRoundOp) {
        let context = self.stack.last_mut().expect("damage context stack has a root");
        context.state.clip_round(&op.border_radius, op.width, op.height);
    }

    fn draw_picture(&mut self, op: &DrawPictureOp) {
        self.add_damage_if_needed(op.picture.cull_rect());
    }

    fn draw_external_surface(&mut self, op: &DrawExternalSurfaceOp) {
        let size = op.snapshot.surface().relative_size();
        self.add_damage_if_needed(Rect::from_xywh(0.0, 0.0, size.width, size.height));
    }

    fn prepare_mask(&mut self, op: &PrepareMaskOp) {
        self.add_damage_if_needed(op.mask.bounds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_updates_damages_on_resize() {
        let mut resolver = DamageResolver::new();

        resolver.begin_updates(100.0, 100.0);
        let damage = resolver.end_updates();
        assert_eq!(vec![Rect::from_xywh(0.0, 0.0, 100.0, 100.0)], damage);

        // Same size again: no damage.
        resolver.begin_updates(100.0, 100.0);
        assert!(resolver.end_updates().is_empty());

        resolver.begin_updates(100.0, 50.0);
        assert_eq!(
            vec![Rect::from_xywh(0.0, 0.0, 100.0, 50.0)],
            resolver.end_updates()
        );
    }

    #[test]
    fn test_damage_union() {
        let mut resolver = DamageResolver::new();

        resolver.add_damage_in_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        resolver.add_damage_in_rect(Rect::from_xywh(50.0, 50.0, 10.0, 10.0));
        resolver.add_damage_in_rect(Rect::from_xywh(5.0, 5.0, 10.0, 10.0));

        let damage = resolver.end_updates();
        assert_eq!(2, damage.len());
        assert_eq!(Rect::from_xywh(50.0, 50.0, 10.0, 10.0), damage[0]);
        assert_eq!(Rect::from_ltrb(0.0, 0.0, 15.0, 15.0), damage[1]);
    }

    #[test]
    fn test_damage_union_restarts_after_absorption() {
        let mut resolver = DamageResolver::new();

        // Two disjoint rects, then a bridge overlapping both: everything
        // must collapse into a single union.
        resolver.add_damage_in_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        resolver.add_damage_in_rect(Rect::from_xywh(20.0, 0.0, 10.0, 10.0));
        resolver.add_damage_in_rect(Rect::from_xywh(5.0, 0.0, 20.0, 10.0));

        let damage = resolver.end_updates();
        assert_eq!(vec![Rect::from_ltrb(0.0, 0.0, 30.0, 10.0)], damage);
    }

    #[test]
    fn test_empty_rects_are_ignored() {
        let mut resolver = DamageResolver::new();
        resolver.add_damage_in_rect(Rect::EMPTY);
        assert!(resolver.end_updates().is_empty());
    }

    #[test]
    fn test_end_updates_clears_accumulated_damage() {
        let mut resolver = DamageResolver::new();
        resolver.add_damage_in_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));

        assert_eq!(1, resolver.end_updates().len());
        assert!(resolver.end_updates().is_empty());
    }
}
