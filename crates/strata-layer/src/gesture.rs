//! Gesture recognizer hooks carried by layers.

use std::any::Any;

/// A gesture recognizer attached to a layer.
///
/// Recognition itself lives above the layer tree; the tree only stores the
/// recognizers so hit testing can route events to them.
pub trait GestureRecognizer: Send + Sync {
    /// Downcasting support for type-based lookup and removal.
    fn as_any(&self) -> &dyn Any;
}
