//! Splits a display list across planes so external surfaces can be
//! interleaved with engine-drawn content at the correct z-order.

mod plane;
mod state;

pub use plane::{CompositorPlane, PlaneList};
pub use state::CompositionState;

use std::sync::Arc;

use smallvec::SmallVec;
use strata_painting::{
    ClipRectOp, ClipRoundOp, DisplayList, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    Mask, PrepareMaskOp, PushContextOp,
};
use strata_types::Rect;

use self::plane::{ResolvedExternalPlane, ResolvedPlane};

// The per-context plane presence field is a u64 bitmask, which caps how many
// planes a composition can use. Beyond that, content merges into the topmost
// regular plane rather than failing.
const MAX_PLANES: usize = u64::BITS as usize;

/// Rebuilds display lists around their external surfaces.
///
/// When the source list has no external surfaces the input is returned
/// unchanged with a single drawable plane.
#[derive(Debug, Default)]
pub struct Compositor;

impl Compositor {
    pub fn new() -> Self {
        Self
    }

    /// Produces the composited display list plus the plane list describing
    /// how to assemble the frame.
    pub fn perform_composition(
        &self,
        source: &Arc<DisplayList>,
        plane_list: &mut PlaneList,
    ) -> Arc<DisplayList> {
        if !source.has_external_surfaces() {
            plane_list.append_drawable();
            return Arc::clone(source);
        }

        tracing::trace!(
            planes = source.planes_count(),
            "compositing display list with external surfaces"
        );

        let mut output = DisplayList::new(source.size(), source.frame_time());

        let resolved = {
            let mut visitor = PopulatePlanesVisitor::new(&mut output);
            source.visit_all_planes(&mut visitor);
            visitor.into_resolved_planes()
        };

        for plane in &resolved {
            match plane {
                ResolvedPlane::External(external) => {
                    plane_list.append_plane(CompositorPlane::External {
                        snapshot: Arc::clone(&external.snapshot),
                        presenter_state: external.resolve_presenter_state(),
                    });
                }
                ResolvedPlane::Regular(_) => plane_list.append_drawable(),
            }
        }

        Arc::new(output)
    }
}

// ----------------------------------------------------------------------------
// Plane population
// ----------------------------------------------------------------------------

#[derive(Clone)]
enum ClipOp {
    Rect(ClipRectOp),
    Round(ClipRoundOp),
}

/// A push-context operation from the source list with its resolved absolute
/// state and the planes it has been replayed into.
struct VisitedContext {
    // Bit N set: this context's push has been recorded into output plane N.
    plane_presence: u64,
    state: CompositionState,
    // None only for the root placeholder entry.
    push: Option<PushContextOp>,
    // The latest clip set inside this context.
    clip: Option<ClipOp>,
}

impl VisitedContext {
    fn new(state: CompositionState, push: Option<PushContextOp>) -> Self {
        Self {
            plane_presence: 0,
            state,
            push,
            clip: None,
        }
    }
}

fn for_each_plane_index(mut presence: u64, mut f: impl FnMut(u64)) {
    while presence != 0 {
        let plane_index = u64::from(presence.trailing_zeros());
        presence &= presence - 1;
        f(plane_index);
    }
}

struct SubmittedPrepareMask {
    mask: Arc<dyn Mask>,
    plane_index: u64,
}

/// Visits the source list in order, lazily replaying contexts into whichever
/// output planes receive their drawing ops.
struct PopulatePlanesVisitor<'a> {
    output: &'a mut DisplayList,
    visited: SmallVec<[VisitedContext; 8]>,
    resolved: SmallVec<[ResolvedPlane; 2]>,
    prepared_masks: SmallVec<[SubmittedPrepareMask; 2]>,
    plane_index_sequence: u64,
    current_output_plane: u64,
}

impl<'a> PopulatePlanesVisitor<'a> {
    fn new(output: &'a mut DisplayList) -> Self {
        let mut visited = SmallVec::new();
        // Root placeholder with identity state, so child contexts can be
        // derived uniformly.
        visited.push(VisitedContext::new(CompositionState::default(), None));

        Self {
            output,
            visited,
            resolved: SmallVec::new(),
            prepared_masks: SmallVec::new(),
            plane_index_sequence: 0,
            current_output_plane: 0,
        }
    }

    fn into_resolved_planes(self) -> SmallVec<[ResolvedPlane; 2]> {
        self.resolved
    }

    fn current_context(&self) -> &VisitedContext {
        self.visited.last().expect("context stack has a root entry")
    }

    fn set_current_plane(&mut self, plane_index: u64) {
        if self.current_output_plane != plane_index {
            self.output.set_current_plane(plane_index as usize);
            self.current_output_plane = plane_index;
        }
    }

    fn append_clip(&mut self, clip: &ClipOp) {
        match clip {
            ClipOp::Rect(op) => self.output.append_clip_rect(op.width, op.height),
            ClipOp::Round(op) => {
                self.output
                    .append_clip_round(&op.border_radius, op.width, op.height);
            }
        }
    }

    fn on_clip_updated(&mut self, clip: ClipOp) {
        let context = self.visited.last_mut().expect("context stack has a root entry");
        context.clip = Some(clip.clone());

        // Planes that already carry this context need the new clip too.
        let presence = context.plane_presence;
        if presence != 0 {
            for_each_plane_index(presence, |plane_index| {
                self.set_current_plane(plane_index);
                self.append_clip(&clip);
            });
        }
    }

    /// Makes `plane_index` current and replays any contexts (and their
    /// latest clips) not yet recorded into it, outermost first.
    fn sync_with_plane(&mut self, plane_index: u64) {
        self.set_current_plane(plane_index);

        let plane_bit = 1u64 << plane_index;
        let context_count = self.visited.len();
        let mut replay_from = context_count;

        // Entry 0 is the root placeholder and never replayed.
        let mut index = context_count;
        while index > 1 {
            index -= 1;

            let context = &mut self.visited[index];
            if context.plane_presence & plane_bit == 0 {
                context.plane_presence |= plane_bit;
                replay_from = index;
            } else {
                break;
            }
        }

        for index in replay_from..context_count {
            let (push, clip) = {
                let context = &self.visited[index];
                (context.push.clone(), context.clip.clone())
            };

            if let Some(push) = push {
                self.output
                    .push_context(&push.matrix, push.opacity, push.layer_id, push.has_updates);
            }
            if let Some(clip) = clip {
                self.append_clip(&clip);
            }
        }
    }

    fn append_regular_plane(&mut self) -> usize {
        let plane_index = self.plane_index_sequence;
        self.plane_index_sequence += 1;

        while plane_index as usize >= self.output.planes_count() {
            self.output.append_plane();
            self.current_output_plane = plane_index;
        }

        self.resolved.push(ResolvedPlane::regular(plane_index));
        self.resolved.len() - 1
    }

    fn top_regular_plane(&self) -> Option<usize> {
        (0..self.resolved.len())
            .rev()
            .find(|&index| self.resolved[index].as_regular().is_some())
    }

    /// Finds the lowest regular plane that can host `absolute_frame`: the
    /// search walks top-down and stops at an external plane overlapping the
    /// frame (content must stay above it) or below a candidate plane that
    /// already has overlapping content.
    fn resolve_regular_plane(&mut self, absolute_frame: Rect) -> usize {
        let mut best: Option<usize> = None;

        let mut index = self.resolved.len();
        while index > 0 {
            index -= 1;

            match &self.resolved[index] {
                ResolvedPlane::External(external) => {
                    if external.absolute_frame.intersects(absolute_frame) {
                        // Cannot place the op below this external surface.
                        break;
                    }
                }
                ResolvedPlane::Regular(_) => {
                    if let Some(best_index) = best {
                        let best_plane = self.resolved[best_index]
                            .as_regular()
                            .expect("best candidate is regular");
                        if best_plane.bbox.intersects_any(absolute_frame) {
                            // The candidate already draws under this frame;
                            // going lower would break stacking order.
                            break;
                        }
                    }
                    best = Some(index);
                }
            }
        }

        if let Some(best_index) = best {
            return best_index;
        }

        if (self.plane_index_sequence as usize) < MAX_PLANES {
            return self.append_regular_plane();
        }

        // Out of planes: merge into the topmost regular plane.
        self.top_regular_plane()
            .expect("plane limit reached implies regular planes exist")
    }

    /// Finds where a new external plane belongs: as low as possible while
    /// staying above every regular plane with content overlapping its frame
    /// and above any existing external plane.
    fn resolve_external_plane_insertion_index(&self, absolute_frame: Rect) -> usize {
        let plane_count = self.resolved.len();
        let mut best_insertion_index = plane_count;

        let mut index = plane_count;
        while index > 0 {
            index -= 1;

            match &self.resolved[index] {
                ResolvedPlane::Regular(regular) => {
                    if regular.bbox.intersects_any(absolute_frame) {
                        break;
                    }
                    best_insertion_index = index;
                }
                ResolvedPlane::External(_) => break,
            }
        }

        best_insertion_index
    }
}

impl DisplayListVisitor for PopulatePlanesVisitor<'_> {
    fn push_context(&mut self, op: &PushContextOp) {
        let state = self
            .current_context()
            .state
            .push_context(op.opacity, &op.matrix);

        self.visited.push(VisitedContext::new(state, Some(op.clone())));
    }

    fn pop_context(&mut self) {
        let presence = self.current_context().plane_presence;
        for_each_plane_index(presence, |plane_index| {
            self.set_current_plane(plane_index);
            self.output.pop_context();
        });

        self.visited.pop();
    }

    fn clip_rect(&mut self, op: &ClipRectOp) {
        let context = self.visited.last_mut().expect("context stack has a root entry");
        context.state.clip_rect(op.width, op.height);

        self.on_clip_updated(ClipOp::Rect(*op));
    }

    fn clip_round(&mut self, op: &ClipRoundOp) {
        let context = self.visited.last_mut().expect("context stack has a root entry");
        context
            .state
            .clip_round(&op.border_radius, op.width, op.height);

        self.on_clip_updated(ClipOp::Round(op.clone()));
    }

    fn draw_picture(&mut self, op: &DrawPictureOp) {
        let absolute_rect = self
            .current_context()
            .state
            .absolute_clipped_rect(op.picture.cull_rect());

        let resolved_index = self.resolve_regular_plane(absolute_rect);
        let plane = self.resolved[resolved_index]
            .as_regular_mut()
            .expect("resolved plane is regular");
        plane.bbox.insert(absolute_rect);
        let plane_index = plane.plane_index;

        self.sync_with_plane(plane_index);
        self.output.append_picture(Arc::clone(&op.picture), op.opacity);
    }

    fn draw_external_surface(&mut self, op: &DrawExternalSurfaceOp) {
        let context = self.current_context();

        let relative_size = op.snapshot.surface().relative_size();
        let surface_rect = Rect::from_xywh(0.0, 0.0, relative_size.width, relative_size.height);

        let absolute_opacity = op.opacity * context.state.absolute_opacity();
        let absolute_frame = context.state.absolute_rect(surface_rect);
        let transform = *context.state.absolute_matrix();
        let clip_path = context.state.absolute_clip_path().clone();

        let insertion_index = self.resolve_external_plane_insertion_index(absolute_frame);
        self.resolved.insert(
            insertion_index,
            ResolvedPlane::External(ResolvedExternalPlane {
                snapshot: Arc::clone(&op.snapshot),
                transform,
                clip_path,
                opacity: absolute_opacity,
                absolute_frame,
            }),
        );
    }

    fn prepare_mask(&mut self, op: &PrepareMaskOp) {
        let absolute_rect = self
            .current_context()
            .state
            .absolute_clipped_rect(op.mask.bounds());

        let resolved_index = self.resolve_regular_plane(absolute_rect);
        let plane = self.resolved[resolved_index]
            .as_regular_mut()
            .expect("resolved plane is regular");
        plane.bbox.insert(absolute_rect);
        let plane_index = plane.plane_index;

        self.sync_with_plane(plane_index);
        self.output.append_prepare_mask(Arc::clone(&op.mask));

        self.prepared_masks.push(SubmittedPrepareMask {
            mask: Arc::clone(&op.mask),
            plane_index,
        });
    }

    fn apply_mask(&mut self, op: &strata_painting::ApplyMaskOp) {
        // Match the most recent prepare with the same mask identity; the
        // apply lands on whichever plane the prepare went to.
        let mut index = self.prepared_masks.len();
        while index > 0 {
            index -= 1;

            if Arc::ptr_eq(&self.prepared_masks[index].mask, &op.mask) {
                let plane_index = self.prepared_masks[index].plane_index;
                self.set_current_plane(plane_index);
                self.output.append_apply_mask(Arc::clone(&op.mask));
                self.prepared_masks.remove(index);
                return;
            }
        }
    }
}
