//! Geometric primitives for diagram editing.
//!
//! This module provides the value types used throughout Quiver for node
//! positions, boundary polygons and connector lines.
//!
//! # Overview
//!
//! - [`Point`]: scene or node-local coordinate, also used as an offset
//! - [`Size`]: width and height
//! - [`Bounds`]: axis-aligned box
//! - [`Segment`]: bounded line between two points
//! - [`Polygon`]: closed node boundary in node-local coordinates
//!
//! # Coordinate System
//!
//! Scene coordinates grow to the right along x and downward along y, matching
//! SVG.
//!
//! A node's boundary polygon is stored relative to the node position, so the
//! node position is also the local origin of its polygon.

use serde::{Deserialize, Serialize};

/// Slack applied to the segment parameters of [`Segment::bounded_intersection`]
/// so that a line passing exactly through a polygon vertex still hits one of
/// the two adjacent edges.
const PARAM_EPSILON: f32 = 1e-5;

/// A position in scene or node-local space. Also used for offsets.
///
/// # Examples
///
/// ```
/// # use quiver_core::geometry::Point;
/// let node = Point::new(300.0, 0.0);
/// let pointer = Point::new(320.0, 15.0);
///
/// let grab = pointer.sub_point(node);
/// assert_eq!(grab, Point::new(20.0, 15.0));
/// assert_eq!(node.add_point(grab), pointer);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
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

    /// Same point with the x coordinate replaced. Used to pin a latched axis.
    pub fn with_x(self, x: f32) -> Self {
        Self { x, ..self }
    }

    /// Same point with the y coordinate replaced.
    pub fn with_y(self, y: f32) -> Self {
        Self { y, ..self }
    }

    pub fn is_zero(self) -> bool {
        self == Self::default()
    }

    /// False if either coordinate is NaN or infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn add_point(self, offset: Point) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }

    /// The offset that moves `origin` onto `self`.
    pub fn sub_point(self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }

    /// Length of this point read as a vector.
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Sum of the axis distances, the metric used for resize handle hits.
    pub fn manhattan_distance(self, other: Point) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Scales both coordinates by `factor`.
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Width and height of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
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
}

/// Axis-aligned box stored as its extreme coordinates.
///
/// Used for hit testing, z-order overlap, resize handles and the exported
/// view box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// A box of `size` centered on `center`.
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let (dx, dy) = (size.width / 2.0, size.height / 2.0);
        Self {
            min_x: center.x - dx,
            min_y: center.y - dy,
            max_x: center.x + dx,
            max_y: center.y + dy,
        }
    }

    /// The smallest box enclosing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let seed = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.fold(seed, |acc, p| Self {
            min_x: acc.min_x.min(p.x),
            min_y: acc.min_y.min(p.y),
            max_x: acc.max_x.max(p.x),
            max_y: acc.max_y.max(p.y),
        }))
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
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// Top-left corner.
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Bottom-right corner.
    pub fn max_point(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// The smallest box containing both `self` and `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiver_core::geometry::{Bounds, Point, Size};
    /// let node = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(200.0, 200.0));
    /// let label = Bounds::new_from_center(Point::new(0.0, 150.0), Size::new(0.0, 0.0));
    ///
    /// let content = node.merge(&label);
    /// assert_eq!(content.min_point(), Point::new(-100.0, -100.0));
    /// assert_eq!(content.height(), 250.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// The same box shifted by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        let min = self.min_point().add_point(offset);
        let max = self.max_point().add_point(offset);
        Self {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }

    /// True if `point` is inside or on the border.
    pub fn contains(&self, point: Point) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }

    /// True if the boxes overlap. Touching borders count as overlap.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// A bounded line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Returns the start point of the segment
    pub fn start(self) -> Point {
        self.start
    }

    /// Returns the end point of the segment
    pub fn end(self) -> Point {
        self.end
    }

    /// Returns the vector from start to end
    pub fn delta(self) -> Point {
        self.end.sub_point(self.start)
    }

    /// Returns the Euclidean length of the segment
    pub fn length(self) -> f32 {
        self.delta().hypot()
    }

    /// A zero-length segment has no direction and cannot be intersected.
    pub fn is_degenerate(self) -> bool {
        self.delta().is_zero()
    }

    /// Returns the same segment translated by `offset`.
    pub fn translate(self, offset: Point) -> Self {
        Self {
            start: self.start.add_point(offset),
            end: self.end.add_point(offset),
        }
    }

    /// Finds the intersection of two segments, requiring the intersection to
    /// lie within both segments rather than on their infinite extensions.
    ///
    /// Parallel, collinear and zero-length segments never intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiver_core::geometry::{Point, Segment};
    /// let edge = Segment::new(Point::new(100.0, -100.0), Point::new(100.0, 100.0));
    /// let line = Segment::new(Point::new(0.0, 0.0), Point::new(300.0, 0.0));
    /// assert_eq!(edge.bounded_intersection(line), Some(Point::new(100.0, 0.0)));
    ///
    /// let short = Segment::new(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
    /// assert_eq!(edge.bounded_intersection(short), None);
    /// ```
    pub fn bounded_intersection(self, other: Segment) -> Option<Point> {
        let a = self.delta();
        let b = other.start.sub_point(other.end);
        let denominator = a.y * b.x - a.x * b.y;
        if denominator == 0.0 || !denominator.is_finite() {
            return None;
        }

        let c = self.start.sub_point(other.start);
        let reciprocal = 1.0 / denominator;
        let t = (b.y * c.x - b.x * c.y) * reciprocal;
        let u = (a.x * c.y - a.y * c.x) * reciprocal;

        let in_range = |param: f32| (-PARAM_EPSILON..=1.0 + PARAM_EPSILON).contains(&param);
        if in_range(t) && in_range(u) {
            Some(self.start.add_point(a.scale(t)))
        } else {
            None
        }
    }

    /// Shortest distance from `point` to any point of the segment.
    pub fn distance_to(self, point: Point) -> f32 {
        let delta = self.delta();
        let length_squared = delta.x * delta.x + delta.y * delta.y;
        if length_squared == 0.0 {
            return self.start.distance(point);
        }
        let offset = point.sub_point(self.start);
        let t = ((offset.x * delta.x + offset.y * delta.y) / length_squared).clamp(0.0, 1.0);
        self.start.add_point(delta.scale(t)).distance(point)
    }
}

/// A closed polygon: the first point is repeated as the last point.
///
/// Boundary polygons are stored in node-local coordinates; use
/// [`Polygon::translate`] to move them into scene space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Creates a closed polygon, appending the first point if the input is open.
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points: Vec<Point> = points.into_iter().collect();
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                points.push(first);
            }
        }
        Self { points }
    }

    /// Returns the points in order, including the closing point.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of edges of the closed polygon.
    pub fn edge_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Iterates over the edges `(p_i, p_{i+1})` in point order.
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
    }

    /// A polygon with fewer than two edges cannot bound a shape.
    pub fn is_degenerate(&self) -> bool {
        self.edge_count() < 2
    }

    /// Bounding box of all points, or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points.iter().copied())
    }

    /// Returns the polygon translated by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            points: self.points.iter().map(|p| p.add_point(offset)).collect(),
        }
    }

    /// Returns the polygon scaled about the local origin.
    pub fn scale(&self, scale_x: f32, scale_y: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x * scale_x, p.y * scale_y))
                .collect(),
        }
    }

    /// Point-in-polygon test using the even-odd rule; points on an edge count as inside.
    pub fn contains(&self, point: Point) -> bool {
        if self.is_degenerate() {
            return false;
        }
        if self.edges().any(|edge| edge.distance_to(point) <= f32::EPSILON) {
            return true;
        }

        let mut inside = false;
        for edge in self.edges() {
            let (a, b) = (edge.start(), edge.end());
            if (a.y > point.y) != (b.y > point.y) {
                let crossing_x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < crossing_x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}
