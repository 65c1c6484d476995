//! Layer animations driven by the embedder's frame events.

use std::time::Duration;

use crate::tree::{LayerTree, NodeId};

/// A keyed animation attached to a layer.
///
/// Animations run on the embedder thread that owns the tree, once per frame
/// event, and mutate their layer through the tree handle they are given.
pub trait Animation: Send {
    /// Advances the animation by `delta`. Returns true once the animation
    /// has completed; it is then removed and [`Animation::complete`] runs.
    fn run(&mut self, tree: &mut LayerTree, layer: NodeId, delta: Duration) -> bool;

    /// Called when the animation is replaced or removed before completing.
    fn cancel(&mut self, _tree: &mut LayerTree, _layer: NodeId) {}

    /// Called after the animation reported completion.
    fn complete(&mut self, _tree: &mut LayerTree, _layer: NodeId) {}
}
