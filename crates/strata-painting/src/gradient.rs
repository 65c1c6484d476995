//! Linear and radial background gradients.

use strata_types::{BorderRadius, Color, Point, Rect, Scalar};

use crate::context::DrawingContext;
use crate::lazy_path::LazyPath;
use crate::paint::{Paint, Shader};

/// The direction a linear gradient runs across its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearGradientOrientation {
    /// Top edge to bottom edge.
    #[default]
    TopBottom,
    /// Top-right corner to bottom-left corner.
    TopRightBottomLeft,
    /// Right edge to left edge.
    RightLeft,
    /// Bottom-right corner to top-left corner.
    BottomRightTopLeft,
    /// Bottom edge to top edge.
    BottomTop,
    /// Bottom-left corner to top-right corner.
    BottomLeftTopRight,
    /// Left edge to right edge.
    LeftRight,
    /// Top-left corner to bottom-right corner.
    TopLeftBottomRight,
}

impl LinearGradientOrientation {
    fn resolve_points(self, bounds: Rect) -> (Point, Point) {
        let (l, t, r, b) = (bounds.left, bounds.top, bounds.right, bounds.bottom);
        let center = bounds.center();

        match self {
            Self::TopBottom => (Point::new(center.x, t), Point::new(center.x, b)),
            Self::BottomTop => (Point::new(center.x, b), Point::new(center.x, t)),
            Self::LeftRight => (Point::new(l, center.y), Point::new(r, center.y)),
            Self::RightLeft => (Point::new(r, center.y), Point::new(l, center.y)),
            Self::TopLeftBottomRight => (Point::new(l, t), Point::new(r, b)),
            Self::TopRightBottomLeft => (Point::new(r, t), Point::new(l, b)),
            Self::BottomLeftTopRight => (Point::new(l, b), Point::new(r, t)),
            Self::BottomRightTopLeft => (Point::new(r, b), Point::new(l, t)),
        }
    }
}

/// A linear gradient fill, with the shader geometry cached per draw bounds.
#[derive(Debug, Clone, Default)]
pub struct LinearGradient {
    locations: Vec<Scalar>,
    colors: Vec<Color>,
    orientation: LinearGradientOrientation,
    shader: Option<Shader>,
    last_draw_bounds: Rect,
    lazy_path: LazyPath,
    dirty: bool,
}

impl LinearGradient {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn set_locations(&mut self, locations: Vec<Scalar>) {
        if self.locations != locations {
            self.locations = locations;
            self.dirty = true;
        }
    }

    pub fn set_colors(&mut self, colors: Vec<Color>) {
        if self.colors != colors {
            self.colors = colors;
            self.dirty = true;
        }
    }

    pub fn set_orientation(&mut self, orientation: LinearGradientOrientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.dirty = true;
        }
    }

    /// Rebuilds the cached shader when the inputs or bounds changed.
    pub fn update(&mut self, bounds: Rect) {
        if !self.dirty && bounds == self.last_draw_bounds {
            return;
        }

        let (start, end) = self.orientation.resolve_points(bounds);
        self.shader = Some(Shader::LinearGradient {
            start,
            end,
            locations: self.locations.clone(),
            colors: self.colors.clone(),
        });
        self.last_draw_bounds = bounds;
        self.dirty = false;
    }

    pub fn apply_to_paint(&self, paint: &mut Paint) {
        paint.set_shader(self.shader.clone());
    }

    pub fn draw(&mut self, context: &mut DrawingContext, border_radius: &BorderRadius) {
        let bounds = context.draw_bounds();
        self.update(bounds);

        let mut paint = Paint::new();
        paint.set_anti_alias(true);
        self.apply_to_paint(&mut paint);

        let mut lazy_path = std::mem::take(&mut self.lazy_path);
        context.draw_paint_with_radius(&paint, border_radius, &mut lazy_path);
        self.lazy_path = lazy_path;
    }
}

/// A radial gradient fill centered on the draw bounds.
#[derive(Debug, Clone, Default)]
pub struct RadialGradient {
    locations: Vec<Scalar>,
    colors: Vec<Color>,
    shader: Option<Shader>,
    last_draw_bounds: Rect,
    lazy_path: LazyPath,
    dirty: bool,
}

impl RadialGradient {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn set_locations(&mut self, locations: Vec<Scalar>) {
        if self.locations != locations {
            self.locations = locations;
            self.dirty = true;
        }
    }

    pub fn set_colors(&mut self, colors: Vec<Color>) {
        if self.colors != colors {
            self.colors = colors;
            self.dirty = true;
        }
    }

    pub fn update(&mut self, bounds: Rect) {
        if !self.dirty && bounds == self.last_draw_bounds {
            return;
        }

        // The gradient reaches the farther edge pair.
        let radius = bounds.width().max(bounds.height()) / 2.0;
        self.shader = Some(Shader::RadialGradient {
            center: bounds.center(),
            radius,
            locations: self.locations.clone(),
            colors: self.colors.clone(),
        });
        self.last_draw_bounds = bounds;
        self.dirty = false;
    }

    pub fn apply_to_paint(&self, paint: &mut Paint) {
        paint.set_shader(self.shader.clone());
    }

    pub fn draw(&mut self, context: &mut DrawingContext, border_radius: &BorderRadius) {
        let bounds = context.draw_bounds();
        self.update(bounds);

        let mut paint = Paint::new();
        paint.set_anti_alias(true);
        self.apply_to_paint(&mut paint);

        let mut lazy_path = std::mem::take(&mut self.lazy_path);
        context.draw_paint_with_radius(&paint, border_radius, &mut lazy_path);
        self.lazy_path = lazy_path;
    }
}

/// Kind discriminator for [`GradientBacking::clear_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

/// Holds at most one gradient (linear or radial) for a layer background.
#[derive(Debug, Clone, Default)]
pub struct GradientBacking {
    linear: Option<LinearGradient>,
    radial: Option<RadialGradient>,
}

impl GradientBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_gradient(&self) -> bool {
        self.linear.is_some() || self.radial.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        if let Some(linear) = &self.linear {
            linear.is_dirty()
        } else if let Some(radial) = &self.radial {
            radial.is_dirty()
        } else {
            false
        }
    }

    pub fn set_as_linear(
        &mut self,
        locations: Vec<Scalar>,
        colors: Vec<Color>,
        orientation: LinearGradientOrientation,
    ) {
        self.radial = None;

        let linear = self.linear.get_or_insert_with(LinearGradient::new);
        linear.set_locations(locations);
        linear.set_colors(colors);
        linear.set_orientation(orientation);
    }

    pub fn set_as_radial(&mut self, locations: Vec<Scalar>, colors: Vec<Color>) {
        self.linear = None;

        let radial = self.radial.get_or_insert_with(RadialGradient::new);
        radial.set_locations(locations);
        radial.set_colors(colors);
    }

    pub fn clear(&mut self) {
        self.linear = None;
        self.radial = None;
    }

    /// Clears an existing gradient of `kind`, reporting whether one existed.
    pub fn clear_if_needed(&mut self, kind: GradientKind) -> bool {
        match kind {
            GradientKind::Linear => self.linear.take().is_some(),
            GradientKind::Radial => self.radial.take().is_some(),
        }
    }

    pub fn draw(&mut self, context: &mut DrawingContext, border_radius: &BorderRadius) {
        if let Some(linear) = &mut self.linear {
            linear.draw(context, border_radius);
        } else if let Some(radial) = &mut self.radial {
            radial.draw(context, border_radius);
        }
    }
}
