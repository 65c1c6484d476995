//! Layer node state and pure geometry helpers.

pub mod external;
pub mod mask_layer;
pub mod shape;

use std::any::Any;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;
use strata_painting::{BoxShadow, GradientBacking, LayerContent, LazyPath};
use strata_types::{BorderRadius, Color, Matrix, Point, Rect, Scalar, Size};

use crate::animation::Animation;
use crate::gesture::GestureRecognizer;
use crate::layer::external::ExternalLayer;
use crate::layer::mask_layer::MaskLayer;
use crate::layer::shape::ShapeLayer;
use crate::root::EventId;
use crate::tree::NodeId;

bitflags! {
    /// Dirty and traversal state bits of a layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LayerFlags: u8 {
        /// The layer's own pictures must be re-recorded.
        const NEEDS_DISPLAY = 1 << 0;
        /// Some descendant needs display.
        const CHILD_NEEDS_DISPLAY = 1 << 1;
        /// The layer (or a descendant) needs layout.
        const NEEDS_LAYOUT = 1 << 2;
        /// The cached transform must be rebuilt before drawing.
        const MATRIX_DIRTY = 1 << 3;
        /// The cached visual frame must be recomputed.
        const VISUAL_FRAME_DIRTY = 1 << 4;
        /// The layer is currently inside a draw traversal.
        const DRAWING = 1 << 5;
    }
}

/// What kind of content a layer draws, beyond the shared background, border
/// and children handling.
pub enum LayerKind {
    /// No intrinsic content.
    Plain,
    /// Fills and strokes a path, optionally trimmed by arc length.
    Shape(ShapeLayer),
    /// Draws a host-owned external surface.
    External(ExternalLayer),
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Plain => "Layer",
            LayerKind::Shape(_) => "ShapeLayer",
            LayerKind::External(_) => "ExternalLayer",
        }
    }
}

/// One retained node of the layer tree.
///
/// Reads go through accessors here; mutations that affect dirty propagation
/// go through [`LayerTree`](crate::tree::LayerTree) so the ancestor chain
/// stays in sync.
pub struct Layer {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) attached: bool,
    // Stable id used for damage tracking; 0 until first drawn while attached.
    pub(crate) layer_id: u64,
    pub(crate) kind: LayerKind,

    pub(crate) frame: Rect,
    pub(crate) visual_frame: Rect,
    pub(crate) translation: Size,
    pub(crate) scale_x: Scalar,
    pub(crate) scale_y: Scalar,
    pub(crate) rotation_degrees: Scalar,
    pub(crate) opacity: Scalar,
    pub(crate) has_scale: bool,

    pub(crate) background_color: Color,
    pub(crate) gradient: GradientBacking,
    pub(crate) border_color: Color,
    pub(crate) border_width: Scalar,
    pub(crate) border_radius: BorderRadius,
    pub(crate) box_shadow: Option<BoxShadow>,
    pub(crate) mask_layer: Option<Arc<dyn MaskLayer>>,

    pub(crate) cached_background: LayerContent,
    pub(crate) cached_content: LayerContent,
    pub(crate) cached_foreground: LayerContent,
    pub(crate) lazy_path: LazyPath,
    pub(crate) matrix: Matrix,
    pub(crate) flags: LayerFlags,

    pub(crate) touch_enabled: bool,
    pub(crate) clips_to_bounds: bool,
    pub(crate) right_to_left: bool,
    // left, right, top, bottom
    pub(crate) touch_extension: [Scalar; 4],
    pub(crate) accessibility_id: String,

    pub(crate) animations: ahash::AHashMap<String, Box<dyn Animation>>,
    pub(crate) enqueued_frame: Option<EventId>,
    pub(crate) gesture_recognizers: Vec<Arc<dyn GestureRecognizer>>,
    pub(crate) attached_data: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) layout_callback: Option<Box<dyn FnMut(&mut crate::tree::LayerTree, NodeId) + Send>>,
}

impl Layer {
    pub(crate) fn new(kind: LayerKind) -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            attached: false,
            layer_id: 0,
            kind,
            frame: Rect::EMPTY,
            visual_frame: Rect::EMPTY,
            translation: Size::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_degrees: 0.0,
            opacity: 1.0,
            has_scale: false,
            background_color: Color::TRANSPARENT,
            gradient: GradientBacking::new(),
            border_color: Color::TRANSPARENT,
            border_width: 0.0,
            border_radius: BorderRadius::default(),
            box_shadow: None,
            mask_layer: None,
            cached_background: LayerContent::default(),
            cached_content: LayerContent::default(),
            cached_foreground: LayerContent::default(),
            lazy_path: LazyPath::new(),
            matrix: Matrix::IDENTITY,
            flags: LayerFlags::NEEDS_DISPLAY
                | LayerFlags::CHILD_NEEDS_DISPLAY
                | LayerFlags::MATRIX_DIRTY
                | LayerFlags::VISUAL_FRAME_DIRTY,
            touch_enabled: true,
            clips_to_bounds: false,
            right_to_left: false,
            touch_extension: [0.0; 4],
            accessibility_id: String::new(),
            animations: ahash::AHashMap::new(),
            enqueued_frame: None,
            gesture_recognizers: Vec::new(),
            attached_data: None,
            layout_callback: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    #[inline]
    pub fn opacity(&self) -> Scalar {
        self.opacity
    }

    /// A layer with zero opacity is skipped entirely during draw.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    #[inline]
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    #[inline]
    pub fn border_color(&self) -> Color {
        self.border_color
    }

    #[inline]
    pub fn border_width(&self) -> Scalar {
        self.border_width
    }

    #[inline]
    pub fn border_radius(&self) -> BorderRadius {
        self.border_radius
    }

    #[inline]
    pub fn translation_x(&self) -> Scalar {
        self.translation.width
    }

    #[inline]
    pub fn translation_y(&self) -> Scalar {
        self.translation.height
    }

    #[inline]
    pub fn scale_x(&self) -> Scalar {
        self.scale_x
    }

    #[inline]
    pub fn scale_y(&self) -> Scalar {
        self.scale_y
    }

    #[inline]
    pub fn rotation(&self) -> Scalar {
        self.rotation_degrees
    }

    #[inline]
    pub fn clips_to_bounds(&self) -> bool {
        self.clips_to_bounds
    }

    #[inline]
    pub fn is_touch_enabled(&self) -> bool {
        self.touch_enabled
    }

    #[inline]
    pub fn is_right_to_left(&self) -> bool {
        self.right_to_left
    }

    #[inline]
    pub fn accessibility_id(&self) -> &str {
        &self.accessibility_id
    }

    #[inline]
    pub fn needs_display(&self) -> bool {
        self.flags.contains(LayerFlags::NEEDS_DISPLAY)
    }

    #[inline]
    pub fn child_needs_display(&self) -> bool {
        self.flags.contains(LayerFlags::CHILD_NEEDS_DISPLAY)
    }

    #[inline]
    pub fn needs_layout(&self) -> bool {
        self.flags.contains(LayerFlags::NEEDS_LAYOUT)
    }

    #[inline]
    pub fn layer_id(&self) -> u64 {
        self.layer_id
    }

    #[inline]
    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    #[inline]
    pub fn mask_layer(&self) -> Option<&Arc<dyn MaskLayer>> {
        self.mask_layer.as_ref()
    }

    #[inline]
    pub fn attached_data(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.attached_data.as_ref()
    }

    /// Whether drawing this layer's subtree at reduced opacity needs an
    /// offscreen context: with a single picture the opacity can be folded
    /// into the picture draw instead.
    pub(crate) fn has_overlapping_rendering(&self) -> bool {
        !self.children.is_empty()
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Rebuilds the cached matrix from frame, translation, scale and
    /// rotation. Scaling is compensated to stay centered on the unscaled
    /// bounds; rotation post-composes about the scaled center.
    pub(crate) fn update_matrix(&mut self, width: Scalar, height: Scalar) {
        self.matrix.set_identity();

        let mut scaled_width = width;
        let mut scaled_height = height;
        let mut translation_x = self.translation.width;
        let mut translation_y = self.translation.height;

        if self.scale_x != 1.0 {
            scaled_width *= self.scale_x;
            translation_x += (width - scaled_width) / 2.0;
            self.matrix.set_scale_x(self.scale_x);
        }

        if self.scale_y != 1.0 {
            scaled_height *= self.scale_y;
            translation_y += (height - scaled_height) / 2.0;
            self.matrix.set_scale_y(self.scale_y);
        }

        self.matrix.set_translate_x(self.frame.left + translation_x);
        self.matrix.set_translate_y(self.frame.top + translation_y);

        if self.rotation_degrees != 0.0 {
            let center_x = self.matrix.translate_x() + scaled_width / 2.0;
            let center_y = self.matrix.translate_y() + scaled_height / 2.0;
            self.matrix
                .post_rotate_degrees(self.rotation_degrees, center_x, center_y);
        }
    }

    /// True when `point` (in this layer's coordinates) falls inside the
    /// touch-extended bounds of a visible, touch-enabled layer.
    pub fn hit_test(&self, point: Point) -> bool {
        if !self.touch_enabled || !self.is_visible() {
            return false;
        }

        let [left, right, top, bottom] = self.touch_extension;

        !(point.x < -left
            || point.y < -top
            || point.x > self.frame.width() + right
            || point.y > self.frame.height() + bottom)
    }

    pub(crate) fn offset_in_parent(&self) -> Point {
        let frame_width = self.frame.width();
        let frame_height = self.frame.height();

        let scaled_width = frame_width * self.scale_x;
        let scaled_height = frame_height * self.scale_y;

        Point::new(
            (self.frame.left + frame_width / 2.0) + self.translation.width - scaled_width / 2.0,
            (self.frame.top + frame_height / 2.0) + self.translation.height - scaled_height / 2.0,
        )
    }

    // TODO: fold rotation into the point/rect conversions below.

    /// Converts a point from the parent's coordinates into this layer's.
    pub fn convert_point_from_parent(&self, point: Point) -> Point {
        if self.has_scale {
            let offset = self.offset_in_parent();
            let mut converted = point.offset(-offset.x, -offset.y);

            converted.x = if self.scale_x != 0.0 {
                converted.x / self.scale_x
            } else {
                0.0
            };
            converted.y = if self.scale_y != 0.0 {
                converted.y / self.scale_y
            } else {
                0.0
            };

            converted
        } else {
            point.offset(
                -(self.frame.left + self.translation.width),
                -(self.frame.top + self.translation.height),
            )
        }
    }

    /// Converts a point from this layer's coordinates into the parent's.
    pub fn convert_point_to_parent(&self, point: Point) -> Point {
        if self.has_scale {
            let offset = self.offset_in_parent();
            Point::new(point.x * self.scale_x, point.y * self.scale_y).offset(offset.x, offset.y)
        } else {
            point.offset(
                self.frame.left + self.translation.width,
                self.frame.top + self.translation.height,
            )
        }
    }

    /// Converts a rect from this layer's coordinates into the parent's.
    pub fn convert_rect_to_parent(&self, rect: Rect) -> Rect {
        if self.has_scale {
            let converted = Rect::from_xywh(
                rect.left * self.scale_x,
                rect.top * self.scale_y,
                rect.width() * self.scale_x,
                rect.height() * self.scale_y,
            );
            let offset = self.offset_in_parent();
            converted.with_offset(offset.x, offset.y)
        } else {
            rect.with_offset(
                self.frame.left + self.translation.width,
                self.frame.top + self.translation.height,
            )
        }
    }
}

// Layer holds several `dyn` members without Debug bounds; summarize instead
// of deriving.
impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.kind.name())
            .field("frame", &self.frame)
            .field("opacity", &self.opacity)
            .field("layer_id", &self.layer_id)
            .field("children", &self.children.len())
            .field("flags", &self.flags)
            .finish()
    }
}
