//! Size-keyed path caching.

use strata_types::{Path, Scalar, Size};

/// Caches a built path, rebuilding only when the target size changes.
///
/// Owners that change path inputs other than the size (the border radius)
/// must call [`LazyPath::set_needs_update`].
#[derive(Debug, Clone, Default)]
pub struct LazyPath {
    path: Path,
    size: Size,
}

impl LazyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the next [`LazyPath::update`] to report a rebuild.
    pub fn set_needs_update(&mut self) {
        self.size = Size::ZERO;
    }

    /// Returns true when the cached path must be rebuilt for `size`. The
    /// cached path is reset in that case.
    pub fn update(&mut self, size: Size) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.path = Path::new();
        true
    }

    pub fn update_wh(&mut self, width: Scalar, height: Scalar) -> bool {
        self.update(Size::new(width, height))
    }

    #[inline]
    pub fn path(&mut self) -> &mut Path {
        &mut self.path
    }

    #[inline]
    pub fn path_ref(&self) -> &Path {
        &self.path
    }
}
