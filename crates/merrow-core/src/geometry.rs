//! Geometric primitives used by the layout code.
//!
//! Coordinates follow SVG conventions: origin at the top-left corner, X grows
//! to the right and Y grows downward.

/// A 2D point in diagram space.
///
/// # Examples
///
/// ```
/// # use merrow_core::geometry::Point;
/// let mid = Point::new(0.0, 0.0).midpoint(Point::new(10.0, 20.0));
/// assert_eq!(mid.x(), 5.0);
/// assert_eq!(mid.y(), 10.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the component-wise maximum of two sizes.
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates bounds of `size` centered on `center`.
    pub fn centered(center: Point, size: Size) -> Self {
        let half_w = size.width() / 2.0;
        let half_h = size.height() / 2.0;
        Self::new(
            center.x() - half_w,
            center.y() - half_h,
            center.x() + half_w,
            center.y() + half_h,
        )
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the smallest bounds containing both `self` and `other`.
    pub fn merge(self, other: Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Grows the bounds by `margin` on every side.
    pub fn inflate(self, margin: f32) -> Bounds {
        Bounds::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Returns the point where the segment from the center towards `target`
    /// leaves the box.
    pub fn boundary_towards(self, target: Point) -> Point {
        let center = self.center();
        let dx = target.x() - center.x();
        let dy = target.y() - center.y();
        if dx == 0.0 && dy == 0.0 {
            return center;
        }

        let half_w = self.width() / 2.0;
        let half_h = self.height() / 2.0;
        let scale_x = if dx == 0.0 { f32::INFINITY } else { half_w / dx.abs() };
        let scale_y = if dy == 0.0 { f32::INFINITY } else { half_h / dy.abs() };
        let scale = scale_x.min(scale_y).min(1.0);

        Point::new(center.x() + dx * scale, center.y() + dy * scale)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_bounds_merge() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(-5.0, 5.0, 5.0, 20.0);
        let merged = a.merge(b);

        assert_approx_eq!(f32, merged.min_x(), -5.0);
        assert_approx_eq!(f32, merged.max_y(), 20.0);
        assert_approx_eq!(f32, merged.width(), 15.0);
    }

    #[test]
    fn test_centered_bounds() {
        let bounds = Bounds::centered(Point::new(50.0, 50.0), Size::new(20.0, 10.0));

        assert_approx_eq!(f32, bounds.min_x(), 40.0);
        assert_approx_eq!(f32, bounds.min_y(), 45.0);
        assert_approx_eq!(f32, bounds.center().x(), 50.0);
    }

    #[test]
    fn test_boundary_towards_point_below() {
        let bounds = Bounds::centered(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let exit = bounds.boundary_towards(Point::new(0.0, 100.0));

        assert_approx_eq!(f32, exit.x(), 0.0);
        assert_approx_eq!(f32, exit.y(), 10.0);
    }

    #[test]
    fn test_boundary_towards_point_right() {
        let bounds = Bounds::centered(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let exit = bounds.boundary_towards(Point::new(100.0, 0.0));

        assert_approx_eq!(f32, exit.x(), 20.0);
        assert_approx_eq!(f32, exit.y(), 0.0);
    }

    proptest! {
        #[test]
        fn test_boundary_point_stays_on_box(
            width in 1.0f32..200.0,
            height in 1.0f32..200.0,
            tx in -500.0f32..500.0,
            ty in -500.0f32..500.0,
        ) {
            let bounds = Bounds::centered(Point::new(0.0, 0.0), Size::new(width, height));
            let exit = bounds.boundary_towards(Point::new(tx, ty));

            prop_assert!(exit.x().abs() <= width / 2.0 + 1e-3);
            prop_assert!(exit.y().abs() <= height / 2.0 + 1e-3);
        }

        #[test]
        fn test_merge_contains_both(
            a in (-100.0f32..100.0, -100.0f32..100.0, 0.0f32..50.0, 0.0f32..50.0),
            b in (-100.0f32..100.0, -100.0f32..100.0, 0.0f32..50.0, 0.0f32..50.0),
        ) {
            let first = Bounds::new(a.0, a.1, a.0 + a.2, a.1 + a.3);
            let second = Bounds::new(b.0, b.1, b.0 + b.2, b.1 + b.3);
            let merged = first.merge(second);

            for bounds in [first, second] {
                prop_assert!(merged.min_x() <= bounds.min_x());
                prop_assert!(merged.min_y() <= bounds.min_y());
                prop_assert!(merged.max_x() >= bounds.max_x());
                prop_assert!(merged.max_y() >= bounds.max_y());
            }
        }
    }
}
