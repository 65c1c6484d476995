//! The retained layer tree.
//!
//! Layers live in a slab arena and are addressed by [`NodeId`] handles;
//! children hold their parent's id and parents an ordered child list. All
//! mutations that participate in dirty propagation go through the tree so
//! the ancestor chain stays consistent.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use slab::Slab;
use smallvec::SmallVec;
use strata_painting::{
    BoxShadow, DisplayList, DrawingContext, ExternalSurface, LinearGradientOrientation, MaskFilter,
    Paint, StrokeCap, StrokeJoin,
};
use strata_types::{BorderRadius, Color, Path, Point, Rect, Scalar, Size};

use crate::animation::Animation;
use crate::gesture::GestureRecognizer;
use crate::layer::external::ExternalLayer;
use crate::layer::mask_layer::{MaskLayer, MaskPositioning};
use crate::layer::shape::ShapeLayer;
use crate::layer::{Layer, LayerFlags, LayerKind};
use crate::root::{DrawMetrics, LayerRoot};

/// Handle to a layer stored in a [`LayerTree`].
///
/// Handles stay valid until the layer is removed from the tree; the slot may
/// then be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A retained tree of [`Layer`] nodes plus the root services they rely on:
/// stable layer-id allocation, frame-event scheduling for animations and the
/// external-surface rasterization policy.
pub struct LayerTree {
    nodes: Slab<Layer>,
    root_layer: Option<NodeId>,
    delegate: Option<Arc<dyn LayerRoot>>,
    display_scale: Scalar,
    next_layer_id: u64,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerTree {
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root_layer: None,
            delegate: None,
            display_scale: 1.0,
            next_layer_id: 0,
        }
    }

    pub fn with_delegate(delegate: Arc<dyn LayerRoot>) -> Self {
        let mut tree = Self::new();
        tree.delegate = Some(delegate);
        tree
    }

    #[inline]
    pub fn display_scale(&self) -> Scalar {
        self.display_scale
    }

    pub fn set_display_scale(&mut self, display_scale: Scalar) {
        self.display_scale = display_scale;
    }

    // ------------------------------------------------------------------
    // Node lifecycle
    // ------------------------------------------------------------------

    pub fn create_layer(&mut self) -> NodeId {
        NodeId(self.nodes.insert(Layer::new(LayerKind::Plain)))
    }

    pub fn create_shape_layer(&mut self) -> NodeId {
        NodeId(self.nodes.insert(Layer::new(LayerKind::Shape(ShapeLayer::new()))))
    }

    pub fn create_external_layer(&mut self) -> NodeId {
        NodeId(
            self.nodes
                .insert(Layer::new(LayerKind::External(ExternalLayer::new()))),
        )
    }

    /// Detaches `id` and removes it and its whole subtree from the arena.
    pub fn remove_layer(&mut self, id: NodeId) {
        self.remove_from_parent(id);

        let mut stack: SmallVec<[NodeId; 8]> = SmallVec::new();
        stack.push(id);
        while let Some(current) = stack.pop() {
            let node = self.nodes.remove(current.0);
            stack.extend(node.children.iter().copied());
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Read access to a layer's state.
    pub fn layer(&self, id: NodeId) -> &Layer {
        &self.nodes[id.0]
    }

    pub fn get_layer(&self, id: NodeId) -> Option<&Layer> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    // ------------------------------------------------------------------
    // Root attachment
    // ------------------------------------------------------------------

    #[inline]
    pub fn root_layer(&self) -> Option<NodeId> {
        self.root_layer
    }

    /// Makes `id` the root layer. The previous root subtree (if any) is
    /// detached; detaching resets stable layer ids and cancels animations,
    /// so damage tracking sees the change as remove + add.
    pub fn set_root_layer(&mut self, id: Option<NodeId>) {
        if self.root_layer == id {
            return;
        }

        if let Some(previous) = self.root_layer.take() {
            self.update_attachment(previous, false);
        }

        self.root_layer = id;
        if let Some(new_root) = id {
            assert!(
                self.nodes[new_root.0].parent.is_none(),
                "the root layer cannot have a parent"
            );
            self.update_attachment(new_root, true);
        }
    }

    fn update_attachment(&mut self, id: NodeId, attached: bool) {
        if self.nodes[id.0].attached == attached {
            return;
        }

        if !attached {
            self.cancel_process_animations(id);
        }

        {
            let node = &mut self.nodes[id.0];
            node.attached = attached;
            // The (new) root allocates a fresh id the next time the layer
            // draws.
            node.layer_id = 0;
        }

        let children: SmallVec<[NodeId; 4]> = self.nodes[id.0].children.clone();
        for child in children {
            self.update_attachment(child, attached);
        }

        if attached {
            self.schedule_process_animations_if_needed(id);
        } else {
            self.remove_all_animations(id);
            self.set_needs_display(id);
        }
    }

    fn allocate_layer_id(&mut self) -> u64 {
        self.next_layer_id += 1;
        self.next_layer_id
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, child, index);
    }

    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        assert!(parent != child, "a layer cannot be its own child");

        if self.nodes[child.0].parent.is_some() {
            self.remove_from_parent(child);
        }

        {
            let parent_node = &mut self.nodes[parent.0];
            assert!(index <= parent_node.children.len());
            parent_node.children.insert(index, child);
        }
        self.nodes[child.0].parent = Some(parent);

        let parent_attached = self.nodes[parent.0].attached;
        self.update_attachment(child, parent_attached);

        self.set_child_needs_display(parent);

        if self.nodes[child.0].needs_layout() {
            self.set_needs_layout(parent);
        }
        self.set_needs_display(child);
    }

    pub fn remove_from_parent(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.0].parent.take() else {
            return;
        };

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.retain(|id| *id != child);

        self.set_child_needs_display(parent);
        self.update_attachment(child, false);
    }

    // ------------------------------------------------------------------
    // Dirty propagation
    // ------------------------------------------------------------------

    pub fn needs_display(&self, id: NodeId) -> bool {
        self.nodes[id.0].needs_display()
    }

    pub fn child_needs_display(&self, id: NodeId) -> bool {
        self.nodes[id.0].child_needs_display()
    }

    /// Marks the layer's own pictures stale and walks `child_needs_display`
    /// up the ancestor chain. A no-op while the layer is mid-draw.
    pub fn set_needs_display(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if node.flags.contains(LayerFlags::DRAWING) {
            return;
        }

        if !node.flags.contains(LayerFlags::NEEDS_DISPLAY) {
            node.flags.insert(LayerFlags::NEEDS_DISPLAY);

            // The background picture survives; its inputs are explicit
            // attributes that clear it themselves when they change.
            node.cached_foreground.clear();
            node.cached_content.clear();

            self.set_child_needs_display(id);
        }
    }

    fn set_child_needs_display(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if !node.flags.contains(LayerFlags::CHILD_NEEDS_DISPLAY) {
            node.flags.insert(LayerFlags::CHILD_NEEDS_DISPLAY);
            self.notify_parent_set_child_needs_display(id);
        }
    }

    fn notify_parent_set_child_needs_display(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.set_child_needs_display(parent);
        }
    }

    pub fn needs_layout(&self, id: NodeId) -> bool {
        self.nodes[id.0].needs_layout()
    }

    /// Marks the layer for layout, propagating up to the root.
    pub fn set_needs_layout(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if node.flags.contains(LayerFlags::NEEDS_LAYOUT) {
            return;
        }
        node.flags.insert(LayerFlags::NEEDS_LAYOUT);

        if let Some(parent) = node.parent {
            self.set_needs_layout(parent);
        }
    }

    /// Attaches a layout hook invoked by [`LayerTree::layout_if_needed`].
    pub fn set_layout_callback(
        &mut self,
        id: NodeId,
        callback: Option<Box<dyn FnMut(&mut LayerTree, NodeId) + Send>>,
    ) {
        self.nodes[id.0].layout_callback = callback;
    }

    /// Runs pending layout for the subtree rooted at `id`.
    pub fn layout_if_needed(&mut self, id: NodeId) {
        if !self.nodes[id.0].needs_layout() {
            return;
        }

        if let Some(mut callback) = self.nodes[id.0].layout_callback.take() {
            callback(self, id);
            // Keep the hook unless the callback replaced it.
            let node = &mut self.nodes[id.0];
            if node.layout_callback.is_none() {
                node.layout_callback = Some(callback);
            }
        }

        let children: SmallVec<[NodeId; 4]> = self.nodes[id.0].children.clone();
        for child in children {
            self.layout_if_needed(child);
        }

        self.nodes[id.0].flags.remove(LayerFlags::NEEDS_LAYOUT);
    }

    fn set_visual_frame_dirty(&mut self, id: NodeId) {
        self.nodes[id.0]
            .flags
            .insert(LayerFlags::VISUAL_FRAME_DIRTY | LayerFlags::MATRIX_DIRTY);
    }

    // ------------------------------------------------------------------
    // Attribute setters
    // ------------------------------------------------------------------

    pub fn set_frame(&mut self, id: NodeId, frame: Rect) {
        let node = &mut self.nodes[id.0];
        if node.frame == frame {
            return;
        }

        let bounds_changed =
            node.frame.width() != frame.width() || node.frame.height() != frame.height();
        node.frame = frame;

        self.set_visual_frame_dirty(id);

        if bounds_changed {
            self.set_needs_display(id);
        } else {
            self.set_child_needs_display(id);
        }
    }

    pub fn set_background_color(&mut self, id: NodeId, color: Color) {
        let node = &mut self.nodes[id.0];
        if node.background_color != color {
            node.background_color = color;
            self.set_needs_display(id);
        }
    }

    pub fn set_background_linear_gradient(
        &mut self,
        id: NodeId,
        locations: Vec<Scalar>,
        colors: Vec<Color>,
        orientation: LinearGradientOrientation,
    ) {
        use strata_painting::GradientKind;

        if self.nodes[id.0].gradient.clear_if_needed(GradientKind::Radial) {
            self.set_needs_display(id);
        }

        if colors.is_empty() {
            if self.nodes[id.0].gradient.clear_if_needed(GradientKind::Linear) {
                self.set_needs_display(id);
            }
            return;
        }

        let node = &mut self.nodes[id.0];
        node.gradient.set_as_linear(locations, colors, orientation);
        if node.gradient.is_dirty() {
            self.set_needs_display(id);
        }
    }

    pub fn set_background_radial_gradient(
        &mut self,
        id: NodeId,
        locations: Vec<Scalar>,
        colors: Vec<Color>,
    ) {
        use strata_painting::GradientKind;

        if self.nodes[id.0].gradient.clear_if_needed(GradientKind::Linear) {
            self.set_needs_display(id);
        }

        if colors.is_empty() {
            if self.nodes[id.0].gradient.clear_if_needed(GradientKind::Radial) {
                self.set_needs_display(id);
            }
            return;
        }

        let node = &mut self.nodes[id.0];
        node.gradient.set_as_radial(locations, colors);
        if node.gradient.is_dirty() {
            self.set_needs_display(id);
        }
    }

    pub fn set_border_radius(&mut self, id: NodeId, border_radius: BorderRadius) {
        let node = &mut self.nodes[id.0];
        node.border_radius = border_radius;
        // The rounded path is keyed on the radius, not just the size.
        node.lazy_path.set_needs_update();
        self.set_needs_display(id);
    }

    pub fn set_border_width(&mut self, id: NodeId, border_width: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.border_width != border_width {
            node.border_width = border_width;
            self.set_needs_display(id);
        }
    }

    pub fn set_border_color(&mut self, id: NodeId, border_color: Color) {
        let node = &mut self.nodes[id.0];
        if node.border_color != border_color {
            node.border_color = border_color;
            self.set_needs_display(id);
        }
    }

    /// Changing visibility (opacity 0 boundary) forces a redraw and an
    /// unconditional parent notification: invisible subtrees are skipped
    /// during draw, so their dirty bits may be stale on the ancestor chain.
    pub fn set_opacity(&mut self, id: NodeId, opacity: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.opacity == opacity {
            return;
        }

        let was_visible = node.is_visible();
        node.opacity = opacity;
        let is_visible = node.is_visible();

        if is_visible != was_visible {
            self.set_needs_display(id);
            self.notify_parent_set_child_needs_display(id);
        } else {
            self.set_child_needs_display(id);
        }
    }

    pub fn set_clips_to_bounds(&mut self, id: NodeId, clips_to_bounds: bool) {
        let node = &mut self.nodes[id.0];
        if node.clips_to_bounds != clips_to_bounds {
            node.clips_to_bounds = clips_to_bounds;
            self.set_needs_display(id);
        }
    }

    /// A transparent color clears the shadow.
    pub fn set_box_shadow(
        &mut self,
        id: NodeId,
        width_offset: Scalar,
        height_offset: Scalar,
        blur_amount: Scalar,
        color: Color,
    ) {
        let node = &mut self.nodes[id.0];
        if color == Color::TRANSPARENT {
            if node.box_shadow.take().is_some() {
                self.set_needs_display(id);
            }
        } else {
            let shadow = node.box_shadow.get_or_insert_with(BoxShadow::new);
            shadow.set_offset(Size::new(width_offset, height_offset));
            shadow.set_blur_amount(blur_amount);
            shadow.set_color(color);
        }
    }

    pub fn set_mask_layer(&mut self, id: NodeId, mask_layer: Option<Arc<dyn MaskLayer>>) {
        let node = &mut self.nodes[id.0];
        let changed = match (&node.mask_layer, &mask_layer) {
            (Some(current), Some(new)) => !Arc::ptr_eq(current, new),
            (None, None) => false,
            _ => true,
        };
        if changed {
            node.mask_layer = mask_layer;
            self.set_needs_display(id);
        }
    }

    pub fn set_translation_x(&mut self, id: NodeId, translation_x: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.translation.width != translation_x {
            node.translation.width = translation_x;
            self.set_child_needs_display(id);
            self.set_visual_frame_dirty(id);
        }
    }

    pub fn set_translation_y(&mut self, id: NodeId, translation_y: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.translation.height != translation_y {
            node.translation.height = translation_y;
            self.set_child_needs_display(id);
            self.set_visual_frame_dirty(id);
        }
    }

    pub fn set_scale_x(&mut self, id: NodeId, scale_x: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.scale_x != scale_x {
            node.scale_x = scale_x;
            node.has_scale = node.scale_x != 1.0 || node.scale_y != 1.0;
            self.set_child_needs_display(id);
            self.set_visual_frame_dirty(id);
        }
    }

    pub fn set_scale_y(&mut self, id: NodeId, scale_y: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.scale_y != scale_y {
            node.scale_y = scale_y;
            node.has_scale = node.scale_x != 1.0 || node.scale_y != 1.0;
            self.set_child_needs_display(id);
            self.set_visual_frame_dirty(id);
        }
    }

    /// Rotation in degrees, applied about the scaled center.
    pub fn set_rotation(&mut self, id: NodeId, rotation_degrees: Scalar) {
        let node = &mut self.nodes[id.0];
        if node.rotation_degrees != rotation_degrees {
            node.rotation_degrees = rotation_degrees;
            self.set_child_needs_display(id);
            self.set_visual_frame_dirty(id);
        }
    }

    pub fn set_touch_enabled(&mut self, id: NodeId, touch_enabled: bool) {
        self.nodes[id.0].touch_enabled = touch_enabled;
    }

    pub fn set_touch_area_extension(
        &mut self,
        id: NodeId,
        left: Scalar,
        right: Scalar,
        top: Scalar,
        bottom: Scalar,
    ) {
        self.nodes[id.0].touch_extension = [left, right, top, bottom];
    }

    pub fn set_right_to_left(&mut self, id: NodeId, right_to_left: bool) {
        self.nodes[id.0].right_to_left = right_to_left;
    }

    pub fn set_accessibility_id(&mut self, id: NodeId, accessibility_id: impl Into<String>) {
        self.nodes[id.0].accessibility_id = accessibility_id.into();
    }

    pub fn set_attached_data(&mut self, id: NodeId, data: Option<Arc<dyn Any + Send + Sync>>) {
        self.nodes[id.0].attached_data = data;
    }

    // ------------------------------------------------------------------
    // Shape layer attributes
    // ------------------------------------------------------------------

    fn with_shape(&mut self, id: NodeId, f: impl FnOnce(&mut ShapeLayer) -> bool) {
        let node = &mut self.nodes[id.0];
        let changed = match &mut node.kind {
            LayerKind::Shape(shape) => f(shape),
            _ => panic!("layer {id:?} is not a shape layer"),
        };
        if changed {
            self.set_needs_display(id);
        }
    }

    pub fn set_shape_path(&mut self, id: NodeId, path: Path) {
        self.with_shape(id, |shape| shape.set_path(path));
    }

    pub fn set_shape_stroke_width(&mut self, id: NodeId, stroke_width: Scalar) {
        self.with_shape(id, |shape| shape.set_stroke_width(stroke_width));
    }

    pub fn set_shape_stroke_color(&mut self, id: NodeId, color: Color) {
        self.with_shape(id, |shape| shape.set_stroke_color(color));
    }

    pub fn set_shape_fill_color(&mut self, id: NodeId, color: Color) {
        self.with_shape(id, |shape| shape.set_fill_color(color));
    }

    pub fn set_shape_stroke_cap(&mut self, id: NodeId, cap: StrokeCap) {
        self.with_shape(id, |shape| shape.set_stroke_cap(cap));
    }

    pub fn set_shape_stroke_join(&mut self, id: NodeId, join: StrokeJoin) {
        self.with_shape(id, |shape| shape.set_stroke_join(join));
    }

    pub fn set_shape_stroke_start(&mut self, id: NodeId, stroke_start: Scalar) {
        self.with_shape(id, |shape| shape.set_stroke_start(stroke_start));
    }

    pub fn set_shape_stroke_end(&mut self, id: NodeId, stroke_end: Scalar) {
        self.with_shape(id, |shape| shape.set_stroke_end(stroke_end));
    }

    pub fn set_shape_mask_filter(&mut self, id: NodeId, mask_filter: Option<MaskFilter>) {
        self.with_shape(id, |shape| shape.set_mask_filter(mask_filter));
    }

    // ------------------------------------------------------------------
    // External layer attributes
    // ------------------------------------------------------------------

    pub fn set_external_surface(
        &mut self,
        id: NodeId,
        surface: Option<Arc<dyn ExternalSurface>>,
    ) {
        let node = &mut self.nodes[id.0];
        let changed = match &mut node.kind {
            LayerKind::External(external) => external.set_surface(surface),
            _ => panic!("layer {id:?} is not an external layer"),
        };
        if changed {
            self.set_needs_display(id);
        }
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Walks the tree from the root, emitting the frame's display list and
    /// clearing display dirt on the visited layers.
    pub fn draw(&mut self, display_list: &mut DisplayList, metrics: &mut DrawMetrics) {
        if let Some(root) = self.root_layer {
            self.draw_layer(root, display_list, metrics);
        }
    }

    fn draw_layer(&mut self, id: NodeId, display_list: &mut DisplayList, metrics: &mut DrawMetrics) {
        let (width, height, needs_display, context_opacity, picture_opacity);
        {
            let node = &mut self.nodes[id.0];
            if !node.is_visible() {
                return;
            }

            metrics.visited_layers += 1;

            width = node.frame.width();
            height = node.frame.height();

            if node.flags.contains(LayerFlags::MATRIX_DIRTY) {
                node.flags.remove(LayerFlags::MATRIX_DIRTY);
                node.update_matrix(width, height);
                metrics.matrix_cache_miss += 1;
            }

            node.flags.insert(LayerFlags::DRAWING);

            // With a single picture the subtree opacity folds into the
            // picture draw, avoiding an offscreen layer.
            if node.opacity == 1.0 || !node.has_overlapping_rendering() {
                context_opacity = 1.0;
                picture_opacity = node.opacity;
            } else {
                context_opacity = node.opacity;
                picture_opacity = 1.0;
            }

            needs_display = node.flags.contains(LayerFlags::NEEDS_DISPLAY);
        }

        if self.nodes[id.0].layer_id == 0 && self.nodes[id.0].attached {
            let layer_id = self.allocate_layer_id();
            self.nodes[id.0].layer_id = layer_id;
        }

        {
            let node = &self.nodes[id.0];
            display_list.push_context(&node.matrix, context_opacity, node.layer_id, needs_display);
        }

        if needs_display {
            self.draw_background(id, width, height);
            self.draw_content(id, width, height);
            self.draw_foreground(id, width, height);
        }

        let mut mask = None;
        let mut mask_positioning = MaskPositioning::BelowBackground;
        if let Some(mask_layer) = &self.nodes[id.0].mask_layer {
            mask_positioning = mask_layer.positioning();
            mask = mask_layer.create_mask(Rect::from_xywh(0.0, 0.0, width, height));
        }

        if let Some(mask) = &mask {
            if mask_positioning == MaskPositioning::BelowBackground {
                display_list.append_prepare_mask(Arc::clone(mask));
            }
        }

        {
            let node = &self.nodes[id.0];
            if !node.cached_background.is_empty() {
                display_list.append_layer_content(&node.cached_background, picture_opacity);
            }
        }

        if let Some(mask) = &mask {
            if mask_positioning == MaskPositioning::AboveBackground {
                display_list.append_prepare_mask(Arc::clone(mask));
            }
        }

        {
            let node = &self.nodes[id.0];
            if !node.cached_content.is_empty() {
                display_list.append_layer_content(&node.cached_content, picture_opacity);
            }

            if node.clips_to_bounds {
                display_list.append_clip_round(&node.border_radius, width, height);
            }
        }

        let children: SmallVec<[NodeId; 4]> = self.nodes[id.0].children.clone();
        for child in children {
            self.draw_layer(child, display_list, metrics);
        }

        if let Some(mask) = &mask {
            display_list.append_apply_mask(Arc::clone(mask));
        }

        {
            let node = &mut self.nodes[id.0];
            if !node.cached_foreground.is_empty() {
                display_list.append_layer_content(&node.cached_foreground, picture_opacity);
            }

            if node.flags.contains(LayerFlags::NEEDS_DISPLAY) {
                node.flags.remove(LayerFlags::NEEDS_DISPLAY);
                metrics.draw_cache_miss += 1;
            }

            node.flags.remove(LayerFlags::CHILD_NEEDS_DISPLAY);
            node.flags.remove(LayerFlags::DRAWING);
        }

        display_list.pop_context();
    }

    fn draw_background(&mut self, id: NodeId, width: Scalar, height: Scalar) {
        let node = &mut self.nodes[id.0];
        let mut context = DrawingContext::new(width, height);

        if let Some(shadow) = node.box_shadow.as_mut() {
            shadow.draw(&mut context, &node.border_radius);
        }

        if node.gradient.has_gradient() {
            node.gradient.draw(&mut context, &node.border_radius);
        } else if node.background_color != Color::TRANSPARENT {
            let mut paint = Paint::new();
            paint.set_color(node.background_color);
            paint.set_anti_alias(true);

            context.draw_paint_with_radius(&paint, &node.border_radius, &mut node.lazy_path);
        }

        node.cached_background = context.finish();
    }

    fn draw_content(&mut self, id: NodeId, width: Scalar, height: Scalar) {
        let rasterize = self
            .delegate
            .as_ref()
            .map_or(true, |delegate| delegate.should_rasterize_external_surfaces());
        let display_scale = self.display_scale;

        let node = &mut self.nodes[id.0];
        let mut context = DrawingContext::new(width, height);

        match &mut node.kind {
            LayerKind::Plain => {}
            LayerKind::Shape(shape) => shape.on_draw(&mut context),
            LayerKind::External(external) => {
                let frame_size = Size::new(width, height);
                external.on_draw(&mut context, frame_size, rasterize, display_scale);
            }
        }

        node.cached_content = context.finish();
    }

    fn draw_foreground(&mut self, id: NodeId, width: Scalar, height: Scalar) {
        let node = &mut self.nodes[id.0];
        let mut context = DrawingContext::new(width, height);

        if node.border_width != 0.0 {
            let mut paint = Paint::new();
            paint.set_stroke(true);
            paint.set_color(node.border_color);
            paint.set_stroke_width(node.border_width);
            paint.set_anti_alias(true);

            context.draw_paint_with_radius(&paint, &node.border_radius, &mut node.lazy_path);
        }

        node.cached_foreground = context.finish();
    }

    // ------------------------------------------------------------------
    // Hit testing & coordinate conversion
    // ------------------------------------------------------------------

    /// The topmost layer containing `point` (in root coordinates), walking
    /// children last-to-first.
    pub fn layer_at_point(&self, point: Point) -> Option<NodeId> {
        let root = self.root_layer?;
        self.layer_at_point_in(root, point)
    }

    /// Hit test within the subtree rooted at `id`, with `point` in that
    /// layer's coordinate space.
    pub fn layer_at_point_in(&self, id: NodeId, point: Point) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if !node.hit_test(point) {
            return None;
        }

        for &child in node.children.iter().rev() {
            let child_point = self.nodes[child.0].convert_point_from_parent(point);
            if let Some(hit) = self.layer_at_point_in(child, child_point) {
                return Some(hit);
            }
        }

        Some(id)
    }

    /// Converts `point` from `ancestor`'s coordinates into `descendant`'s,
    /// or `None` when `descendant` is not in `ancestor`'s subtree.
    pub fn convert_point_to_layer(
        &self,
        ancestor: NodeId,
        point: Point,
        descendant: NodeId,
    ) -> Option<Point> {
        let mut chain: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut current = Some(descendant);

        loop {
            match current {
                Some(id) if id == ancestor => break,
                Some(id) => {
                    chain.push(id);
                    current = self.nodes[id.0].parent;
                }
                None => return None,
            }
        }

        let mut converted = point;
        for id in chain.iter().rev() {
            converted = self.nodes[id.0].convert_point_from_parent(converted);
        }

        Some(converted)
    }

    /// The layer's frame as actually presented in its parent, accounting
    /// for translation and scale. Cached until the transform changes.
    pub fn visual_frame(&mut self, id: NodeId) -> Rect {
        let node = &mut self.nodes[id.0];
        if node.flags.contains(LayerFlags::VISUAL_FRAME_DIRTY) {
            node.flags.remove(LayerFlags::VISUAL_FRAME_DIRTY);
            let local = Rect::from_xywh(0.0, 0.0, node.frame.width(), node.frame.height());
            node.visual_frame = node.convert_rect_to_parent(local);
        }

        self.nodes[id.0].visual_frame
    }

    /// The layer's presented frame mapped all the way to root coordinates.
    pub fn absolute_visual_frame(&self, id: NodeId) -> Rect {
        let node = &self.nodes[id.0];
        let mut frame = Rect::from_xywh(0.0, 0.0, node.frame.width(), node.frame.height());

        let mut current = Some(id);
        while let Some(current_id) = current {
            let node = &self.nodes[current_id.0];
            frame = node.convert_rect_to_parent(frame);
            current = node.parent;
        }

        frame
    }

    // ------------------------------------------------------------------
    // Animations
    // ------------------------------------------------------------------

    /// Attaches `animation` under `key`, replacing (and cancelling) any
    /// previous animation with that key, and schedules a frame event.
    pub fn add_animation(&mut self, id: NodeId, key: &str, animation: Box<dyn Animation>) {
        self.remove_animation(id, key);
        self.nodes[id.0].animations.insert(key.to_owned(), animation);
        self.schedule_process_animations_if_needed(id);
    }

    pub fn remove_animation(&mut self, id: NodeId, key: &str) {
        if let Some(mut animation) = self.nodes[id.0].animations.remove(key) {
            animation.cancel(self, id);
        }
    }

    pub fn remove_all_animations(&mut self, id: NodeId) {
        loop {
            let Some(key) = self.nodes[id.0].animations.keys().next().cloned() else {
                break;
            };
            self.remove_animation(id, &key);
        }
    }

    pub fn has_animation(&self, id: NodeId, key: &str) -> bool {
        self.nodes[id.0].animations.contains_key(key)
    }

    pub fn animation_keys(&self, id: NodeId) -> Vec<String> {
        self.nodes[id.0].animations.keys().cloned().collect()
    }

    /// True when a frame event is pending for this layer's animations.
    pub fn needs_process_animations(&self, id: NodeId) -> bool {
        self.nodes[id.0].enqueued_frame.is_some()
    }

    fn schedule_process_animations_if_needed(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        if node.enqueued_frame.is_some() || node.animations.is_empty() || !node.attached {
            return;
        }

        let Some(delegate) = &self.delegate else {
            return;
        };

        let event_id = delegate.enqueue_frame_event(Duration::ZERO);
        self.nodes[id.0].enqueued_frame = Some(event_id);
    }

    fn cancel_process_animations(&mut self, id: NodeId) -> bool {
        let Some(event_id) = self.nodes[id.0].enqueued_frame.take() else {
            return false;
        };

        match &self.delegate {
            Some(delegate) => delegate.cancel_event(event_id),
            None => false,
        }
    }

    /// Runs every pending animation with the elapsed `delta`. Completed
    /// animations are removed and notified; layers with surviving
    /// animations get the next frame scheduled.
    ///
    /// The embedder calls this when a frame event enqueued through the
    /// [`LayerRoot`](crate::root::LayerRoot) fires.
    pub fn process_animations(&mut self, delta: Duration) {
        let pending: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.enqueued_frame.is_some())
            .map(|(key, _)| NodeId(key))
            .collect();

        for id in pending {
            if !self.nodes.contains(id.0) {
                continue;
            }
            self.nodes[id.0].enqueued_frame = None;

            if self.nodes[id.0].animations.is_empty() {
                continue;
            }

            let animations = std::mem::take(&mut self.nodes[id.0].animations);
            for (key, mut animation) in animations {
                if !self.nodes.contains(id.0) {
                    break;
                }

                let completed = animation.run(self, id, delta);
                if !self.nodes.contains(id.0) {
                    break;
                }

                if completed {
                    animation.complete(self, id);
                } else if !self.nodes[id.0].animations.contains_key(&key) {
                    // Keep it unless the run callback installed a
                    // replacement under the same key.
                    self.nodes[id.0].animations.insert(key, animation);
                }
            }

            if self.nodes.contains(id.0) {
                self.schedule_process_animations_if_needed(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Gesture recognizers
    // ------------------------------------------------------------------

    pub fn add_gesture_recognizer(&mut self, id: NodeId, recognizer: Arc<dyn GestureRecognizer>) {
        self.nodes[id.0].gesture_recognizers.push(recognizer);
    }

    pub fn remove_gesture_recognizer(
        &mut self,
        id: NodeId,
        recognizer: &Arc<dyn GestureRecognizer>,
    ) {
        self.nodes[id.0]
            .gesture_recognizers
            .retain(|candidate| !Arc::ptr_eq(candidate, recognizer));
    }

    pub fn gesture_recognizers_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].gesture_recognizers.len()
    }

    pub fn gesture_recognizer_at(
        &self,
        id: NodeId,
        index: usize,
    ) -> Option<&Arc<dyn GestureRecognizer>> {
        self.nodes[id.0].gesture_recognizers.get(index)
    }

    pub fn index_of_gesture_recognizer_of_type<T: 'static>(&self, id: NodeId) -> Option<usize> {
        self.nodes[id.0]
            .gesture_recognizers
            .iter()
            .position(|recognizer| recognizer.as_any().is::<T>())
    }

    pub fn remove_gesture_recognizer_of_type<T: 'static>(&mut self, id: NodeId) {
        if let Some(index) = self.index_of_gesture_recognizer_of_type::<T>(id) {
            self.nodes[id.0].gesture_recognizers.remove(index);
        }
    }

    // ------------------------------------------------------------------
    // Debugging
    // ------------------------------------------------------------------

    /// An indented, optionally recursive description of the subtree.
    pub fn debug_description(&self, id: NodeId, recursive: bool) -> String {
        let mut out = String::new();
        self.output_debug_description(id, 0, recursive, &mut out);
        out
    }

    fn output_debug_description(&self, id: NodeId, indent: usize, recursive: bool, out: &mut String) {
        use std::fmt::Write as _;

        let node = &self.nodes[id.0];
        for _ in 0..indent {
            out.push_str("  ");
        }

        let _ = write!(
            out,
            "{} (ID: {}) x:{}, y:{}, w:{}, h:{}",
            node.kind.name(),
            node.accessibility_id,
            node.frame.x(),
            node.frame.y(),
            node.frame.width(),
            node.frame.height()
        );

        if recursive {
            for &child in &node.children {
                out.push('\n');
                self.output_debug_description(child, indent + 1, recursive, out);
            }
        }
    }
}

impl std::fmt::Debug for LayerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerTree")
            .field("len", &self.len())
            .field("root_layer", &self.root_layer)
            .field("display_scale", &self.display_scale)
            .finish()
    }
}
