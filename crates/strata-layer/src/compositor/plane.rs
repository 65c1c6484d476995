//! Compositor plane descriptions, public and internal.

use std::sync::Arc;

use smallvec::SmallVec;
use strata_painting::{ExternalSurfaceSnapshot, PresenterState};
use strata_types::{BoundingBoxIndex, Matrix, Path, Rect, Scalar};

/// One plane in the compositor's output, in back-to-front order.
#[derive(Debug)]
pub enum CompositorPlane {
    /// Engine-drawn content; maps to one plane of the output display list.
    Drawable,
    /// A host-presented external surface and its resolved placement.
    External {
        snapshot: Arc<ExternalSurfaceSnapshot>,
        presenter_state: PresenterState,
    },
}

impl CompositorPlane {
    #[inline]
    pub fn is_drawable(&self) -> bool {
        matches!(self, CompositorPlane::Drawable)
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self, CompositorPlane::External { .. })
    }

    pub fn snapshot(&self) -> Option<&Arc<ExternalSurfaceSnapshot>> {
        match self {
            CompositorPlane::External { snapshot, .. } => Some(snapshot),
            CompositorPlane::Drawable => None,
        }
    }

    pub fn presenter_state(&self) -> Option<&PresenterState> {
        match self {
            CompositorPlane::External { presenter_state, .. } => Some(presenter_state),
            CompositorPlane::Drawable => None,
        }
    }
}

/// The ordered list of planes describing how a frame is assembled.
#[derive(Debug, Default)]
pub struct PlaneList {
    planes: SmallVec<[CompositorPlane; 2]>,
}

impl PlaneList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn plane_at(&self, index: usize) -> &CompositorPlane {
        &self.planes[index]
    }

    pub fn append_plane(&mut self, plane: CompositorPlane) {
        self.planes.push(plane);
    }

    pub fn append_drawable(&mut self) {
        self.planes.push(CompositorPlane::Drawable);
    }

    pub fn insert_plane(&mut self, plane: CompositorPlane, index: usize) {
        self.planes.insert(index, plane);
    }

    pub fn remove_plane_at(&mut self, index: usize) {
        self.planes.remove(index);
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompositorPlane> {
        self.planes.iter()
    }
}

impl<'a> IntoIterator for &'a PlaneList {
    type Item = &'a CompositorPlane;
    type IntoIter = std::slice::Iter<'a, CompositorPlane>;

    fn into_iter(self) -> Self::IntoIter {
        self.planes.iter()
    }
}

// ----------------------------------------------------------------------------
// Internal resolved planes
// ----------------------------------------------------------------------------

/// A regular plane under construction: its output display-list index plus a
/// bounding-box index over the draw bounds already placed on it.
pub(crate) struct ResolvedRegularPlane {
    pub(crate) plane_index: u64,
    pub(crate) bbox: BoundingBoxIndex,
}

/// An external plane under construction, carrying the absolute placement of
/// its surface.
pub(crate) struct ResolvedExternalPlane {
    pub(crate) snapshot: Arc<ExternalSurfaceSnapshot>,
    pub(crate) transform: Matrix,
    pub(crate) clip_path: Path,
    pub(crate) opacity: Scalar,
    pub(crate) absolute_frame: Rect,
}

impl ResolvedExternalPlane {
    /// Derives the presenter state the host consumes. A pure translation
    /// folds into the frame origin so hosts that position views by frame
    /// get a proper frame and an identity transform; anything more complex
    /// keeps the transform with a zero-origin frame.
    pub(crate) fn resolve_presenter_state(&self) -> PresenterState {
        let relative_size = self.snapshot.surface().relative_size();

        if self.transform.is_identity_or_translate() {
            PresenterState::new(
                Rect::from_xywh(
                    self.transform.translate_x(),
                    self.transform.translate_y(),
                    relative_size.width,
                    relative_size.height,
                ),
                Matrix::IDENTITY,
                self.clip_path.clone(),
                self.opacity,
            )
        } else {
            PresenterState::new(
                Rect::from_xywh(0.0, 0.0, relative_size.width, relative_size.height),
                self.transform,
                self.clip_path.clone(),
                self.opacity,
            )
        }
    }
}

/// Either kind of plane while the compositor is resolving assignments.
pub(crate) enum ResolvedPlane {
    Regular(ResolvedRegularPlane),
    External(ResolvedExternalPlane),
}

impl ResolvedPlane {
    pub(crate) fn regular(plane_index: u64) -> Self {
        Self::Regular(ResolvedRegularPlane {
            plane_index,
            bbox: BoundingBoxIndex::new(),
        })
    }

    pub(crate) fn as_regular(&self) -> Option<&ResolvedRegularPlane> {
        match self {
            Self::Regular(plane) => Some(plane),
            Self::External(_) => None,
        }
    }

    pub(crate) fn as_regular_mut(&mut self) -> Option<&mut ResolvedRegularPlane> {
        match self {
            Self::Regular(plane) => Some(plane),
            Self::External(_) => None,
        }
    }

    pub(crate) fn as_external(&self) -> Option<&ResolvedExternalPlane> {
        match self {
            Self::External(plane) => Some(plane),
            Self::Regular(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use strata_painting::{Bitmap, ExternalSurface, RasterError};
    use strata_types::Size;

    struct StubSurface {
        size: Mutex<Size>,
    }

    impl ExternalSurface for StubSurface {
        fn relative_size(&self) -> Size {
            *self.size.lock()
        }

        fn set_relative_size(&self, size: Size) {
            *self.size.lock() = size;
        }

        fn raster_into(
            &self,
            _bitmap: &Arc<dyn Bitmap>,
            _frame: Rect,
            _transform: &Matrix,
            _raster_scale_x: Scalar,
            _raster_scale_y: Scalar,
        ) -> Result<(), RasterError> {
            Ok(())
        }
    }

    fn snapshot(width: Scalar, height: Scalar) -> Arc<ExternalSurfaceSnapshot> {
        Arc::new(ExternalSurfaceSnapshot::new(Arc::new(StubSurface {
            size: Mutex::new(Size::new(width, height)),
        })))
    }

    #[test]
    fn test_translate_collapses_into_frame() {
        let plane = ResolvedExternalPlane {
            snapshot: snapshot(50.0, 50.0),
            transform: Matrix::from_translate(40.0, 60.0),
            clip_path: Path::new(),
            opacity: 0.5,
            absolute_frame: Rect::from_xywh(40.0, 60.0, 50.0, 50.0),
        };

        let state = plane.resolve_presenter_state();
        assert_eq!(Rect::from_xywh(40.0, 60.0, 50.0, 50.0), state.frame);
        assert!(state.transform.is_identity());
        assert_eq!(0.5, state.opacity);
    }

    #[test]
    fn test_complex_transform_keeps_matrix() {
        let transform = Matrix::from_scale_translate(2.0, 4.0, 10.0, 20.0);
        let plane = ResolvedExternalPlane {
            snapshot: snapshot(50.0, 50.0),
            transform,
            clip_path: Path::new(),
            opacity: 1.0,
            absolute_frame: Rect::from_xywh(10.0, 20.0, 100.0, 200.0),
        };

        let state = plane.resolve_presenter_state();
        assert_eq!(Rect::from_xywh(0.0, 0.0, 50.0, 50.0), state.frame);
        assert_eq!(transform, state.transform);
        // Mapping the frame through the transform lands on the absolute
        // placement.
        assert_eq!(
            Rect::from_xywh(10.0, 20.0, 100.0, 200.0),
            state.transform.map_rect(state.frame)
        );
    }

    #[test]
    fn test_plane_list_ordering() {
        let mut list = PlaneList::new();
        list.append_drawable();
        list.append_plane(CompositorPlane::External {
            snapshot: snapshot(10.0, 10.0),
            presenter_state: PresenterState::default(),
        });

        assert_eq!(2, list.len());
        assert!(list.plane_at(0).is_drawable());
        assert!(list.plane_at(1).is_external());
        assert!(list.plane_at(1).snapshot().is_some());
        assert!(list.plane_at(0).presenter_state().is_none());
    }
}
