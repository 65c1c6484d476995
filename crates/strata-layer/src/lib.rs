//! # Strata Layer
//!
//! The retained scene graph of the Strata rendering core and the compositor
//! that prepares its output for presentation:
//!
//! - [`LayerTree`]: slab-backed tree of [`Layer`] nodes with dirty-bit
//!   propagation, hit testing, animations and the draw traversal that emits
//!   a [`DisplayList`](strata_painting::DisplayList) per frame
//! - Layer kinds: plain, [`ShapeLayer`] (path fill/stroke with arc-length
//!   trimming) and [`ExternalLayer`] (host-owned surfaces)
//! - [`MaskLayer`] configuration emitting prepare/apply mask ops
//! - [`Compositor`]: splits a display list across planes so external
//!   surfaces interleave with engine content at the correct z-order
//!
//! ```text
//! LayerTree ──draw──▶ DisplayList ──Compositor──▶ (DisplayList, PlaneList)
//! ```

pub mod animation;
pub mod compositor;
pub mod gesture;
pub mod layer;
pub mod root;
pub mod tree;

pub use animation::Animation;
pub use compositor::{CompositionState, Compositor, CompositorPlane, PlaneList};
pub use gesture::GestureRecognizer;
pub use layer::external::ExternalLayer;
pub use layer::mask_layer::{MaskLayer, MaskPositioning, PaintMaskLayer};
pub use layer::shape::ShapeLayer;
pub use layer::{Layer, LayerFlags, LayerKind};
pub use root::{DrawMetrics, EventId, LayerRoot};
pub use tree::{LayerTree, NodeId};
