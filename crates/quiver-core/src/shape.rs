//! Shape kinds, boundary templates and resize handles.
//!
//! A node's outline is fully determined by its [`ShapeKind`] when it is
//! created: [`boundary_template`] returns the closed polygon in node-local
//! coordinates, centered on the local origin. Resizing later rescales that
//! polygon through one of the eight [`ResizeHandle`]s.

use std::{f64::consts::PI, fmt, str::FromStr};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, Polygon};

/// Width of a resize handle square, in scene units.
pub const RESIZE_HANDLE_WIDTH: f32 = 5.0;

/// Manhattan distance under which a pointer is considered to be on a handle.
pub const HANDLE_HIT_DISTANCE: f32 = 5.0;

/// Smallest width or height a resize may produce.
const MIN_EXTENT: f32 = 1.0;

const CIRCLE_SEGMENTS: usize = 32;
const TERMINAL_ARC_SEGMENTS: usize = 6;

/// The closed set of node shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// A 200 × 200 square (a process step).
    Rectangle,
    /// A circle of radius 100, approximated by a regular polygon.
    Circle,
    /// An isosceles triangle pointing up.
    Triangle,
    /// A diamond with 100-unit half diagonals (a decision).
    Diamond,
    /// A regular hexagon of radius 100.
    Polygon,
    /// A trapezoid narrowing downwards (a manual output).
    Output,
    /// A parallelogram leaning right (input / output).
    Io,
    /// A rounded rectangle (start / end terminal).
    Terminal,
}

impl ShapeKind {
    /// Every shape kind, in palette order.
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Diamond,
        ShapeKind::Polygon,
        ShapeKind::Output,
        ShapeKind::Io,
        ShapeKind::Terminal,
    ];

    /// Returns the lowercase name used in documents and configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Diamond => "diamond",
            Self::Polygon => "polygon",
            Self::Output => "output",
            Self::Io => "io",
            Self::Terminal => "terminal",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown shape kind `{s}`"))
    }
}

/// Returns the boundary polygon of a freshly created node of the given kind.
///
/// The polygon is closed and expressed in node-local coordinates with the
/// node position at the local origin.
///
/// # Examples
///
/// ```
/// use quiver_core::shape::{ShapeKind, boundary_template};
///
/// let square = boundary_template(ShapeKind::Rectangle);
/// assert_eq!(square.edge_count(), 4);
/// assert_eq!(square.bounds().unwrap().width(), 200.0);
/// ```
pub fn boundary_template(kind: ShapeKind) -> Polygon {
    match kind {
        ShapeKind::Rectangle => Polygon::new([
            Point::new(-100.0, -100.0),
            Point::new(100.0, -100.0),
            Point::new(100.0, 100.0),
            Point::new(-100.0, 100.0),
        ]),
        ShapeKind::Circle => regular_polygon(CIRCLE_SEGMENTS, 100.0),
        ShapeKind::Triangle => Polygon::new([
            Point::new(0.0, -100.0),
            Point::new(100.0, 100.0),
            Point::new(-100.0, 100.0),
        ]),
        ShapeKind::Diamond => Polygon::new([
            Point::new(-100.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, -100.0),
        ]),
        ShapeKind::Polygon => regular_polygon(6, 100.0),
        ShapeKind::Output => Polygon::new([
            Point::new(-120.0, -80.0),
            Point::new(120.0, -80.0),
            Point::new(70.0, 80.0),
            Point::new(-70.0, 80.0),
        ]),
        ShapeKind::Io => Polygon::new([
            Point::new(-120.0, -80.0),
            Point::new(-70.0, 80.0),
            Point::new(120.0, 80.0),
            Point::new(70.0, -80.0),
        ]),
        ShapeKind::Terminal => rounded_rectangle(150.0, 100.0, 25.0),
    }
}

/// Vertices on a circle, starting at angle 0 and turning clockwise on screen.
///
/// Computed in f64 so that axis-aligned vertices land exactly on the axes.
fn regular_polygon(segments: usize, radius: f64) -> Polygon {
    Polygon::new((0..segments).map(|i| {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        Point::new(
            (radius * angle.cos()) as f32,
            (radius * angle.sin()) as f32,
        )
    }))
}

fn rounded_rectangle(width: f64, height: f64, radius: f64) -> Polygon {
    let half_w = width / 2.0 - radius;
    let half_h = height / 2.0 - radius;
    // Corner centers in clockwise order with the angle each quarter arc starts at.
    let corners = [
        (half_w, half_h, 0.0),
        (-half_w, half_h, PI / 2.0),
        (-half_w, -half_h, PI),
        (half_w, -half_h, 3.0 * PI / 2.0),
    ];

    Polygon::new(corners.into_iter().flat_map(|(cx, cy, start)| {
        (0..=TERMINAL_ARC_SEGMENTS).map(move |i| {
            let angle = start + (PI / 2.0) * i as f64 / TERMINAL_ARC_SEGMENTS as f64;
            Point::new(
                (cx + radius * angle.cos()) as f32,
                (cy + radius * angle.sin()) as f32,
            )
        })
    }))
}

/// One of the eight grips around a node's bounding box.
///
/// Declaration order matches the order of [`resize_handle_points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ResizeHandle {
    /// All handles in hit-test order.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Left,
        ResizeHandle::Right,
        ResizeHandle::BottomLeft,
        ResizeHandle::Bottom,
        ResizeHandle::BottomRight,
    ];

    /// Finds the handle under a node-local pointer position, if any.
    ///
    /// The first handle in [`ResizeHandle::ALL`] order within
    /// [`HANDLE_HIT_DISTANCE`] (Manhattan) wins.
    pub fn hit_test(bounds: Bounds, local_pointer: Point) -> Option<ResizeHandle> {
        Self::ALL
            .into_iter()
            .zip(resize_handle_points(bounds))
            .find(|(_, point)| point.manhattan_distance(local_pointer) < HANDLE_HIT_DISTANCE)
            .map(|(handle, _)| handle)
    }
}

/// Returns the centers of the eight resize handles for the given bounds.
///
/// Handles sit half a handle width inside the bounds so they stay within the
/// node outline.
pub fn resize_handle_points(bounds: Bounds) -> [Point; 8] {
    let inset = RESIZE_HANDLE_WIDTH / 2.0;
    let left = bounds.min_x() + inset;
    let top = bounds.min_y() + inset;
    let right = bounds.max_x() - inset;
    let bottom = bounds.max_y() - inset;
    let center_x = (left + right) / 2.0;
    let center_y = (top + bottom) / 2.0;

    [
        Point::new(left, top),
        Point::new(center_x, top),
        Point::new(right, top),
        Point::new(left, center_y),
        Point::new(right, center_y),
        Point::new(left, bottom),
        Point::new(center_x, bottom),
        Point::new(right, bottom),
    ]
}

/// Rescales a boundary so that the dragged handle follows `local_pointer`.
///
/// The side opposite the handle is the fixed reference: the scale factor on
/// each axis is the pointer's distance from the fixed side divided by the old
/// extent. Edge handles leave the other axis untouched. Scaling happens about
/// the local origin, so the node position stays put.
///
/// Returns `None` if the result would be degenerate (empty polygon, zero or
/// non-finite scale, or an extent below one unit).
pub fn resize_boundary(
    boundary: &Polygon,
    handle: ResizeHandle,
    local_pointer: Point,
) -> Option<Polygon> {
    let bounds = boundary.bounds()?;
    let (old_width, old_height) = (bounds.width(), bounds.height());
    if old_width <= 0.0 || old_height <= 0.0 {
        return None;
    }

    let (px, py) = (local_pointer.x(), local_pointer.y());
    let (scale_x, scale_y) = match handle {
        ResizeHandle::TopLeft => (
            (bounds.max_x() - px) / old_width,
            (bounds.max_y() - py) / old_height,
        ),
        ResizeHandle::Top => (1.0, (bounds.max_y() - py) / old_height),
        ResizeHandle::TopRight => (
            (px - bounds.min_x()) / old_width,
            (bounds.max_y() - py) / old_height,
        ),
        ResizeHandle::Right => ((px - bounds.min_x()) / old_width, 1.0),
        ResizeHandle::BottomRight => (
            (px - bounds.min_x()) / old_width,
            (py - bounds.min_y()) / old_height,
        ),
        ResizeHandle::Bottom => (1.0, (py - bounds.min_y()) / old_height),
        ResizeHandle::BottomLeft => (
            (bounds.max_x() - px) / old_width,
            (py - bounds.min_y()) / old_height,
        ),
        ResizeHandle::Left => ((bounds.max_x() - px) / old_width, 1.0),
    };

    if !scale_x.is_finite()
        || !scale_y.is_finite()
        || (old_width * scale_x).abs() < MIN_EXTENT
        || (old_height * scale_y).abs() < MIN_EXTENT
    {
        trace!(handle:?, scale_x, scale_y; "Rejected degenerate resize");
        return None;
    }

    trace!(handle:?, scale_x, scale_y; "Resizing boundary");
    Some(boundary.scale(scale_x, scale_y))
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_every_template_is_closed_and_usable() {
        for kind in ShapeKind::ALL {
            let polygon = boundary_template(kind);
            assert!(!polygon.is_degenerate(), "{kind} template is degenerate");
            assert_eq!(polygon.points().first(), polygon.points().last());
            assert!(
                polygon.contains(Point::new(0.0, 0.0)),
                "{kind} template does not contain its origin"
            );
        }
    }

    #[test]
    fn test_rectangle_template() {
        let bounds = boundary_template(ShapeKind::Rectangle).bounds().unwrap();
        assert_eq!(bounds.min_point(), Point::new(-100.0, -100.0));
        assert_eq!(bounds.max_point(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_circle_vertices_lie_on_radius() {
        let circle = boundary_template(ShapeKind::Circle);
        assert_eq!(circle.edge_count(), CIRCLE_SEGMENTS);
        for point in circle.points() {
            assert_approx_eq!(f32, point.hypot(), 100.0, epsilon = 0.001);
        }
        // The leftmost vertex sits exactly on the x axis.
        assert!(
            circle
                .points()
                .iter()
                .any(|p| p.x() == -100.0 && p.y().abs() < 1e-4)
        );
    }

    #[test]
    fn test_terminal_template_extent() {
        let bounds = boundary_template(ShapeKind::Terminal).bounds().unwrap();
        assert_approx_eq!(f32, bounds.width(), 150.0, epsilon = 0.001);
        assert_approx_eq!(f32, bounds.height(), 100.0, epsilon = 0.001);
    }

    #[test]
    fn test_shape_kind_names_roundtrip() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.name().parse::<ShapeKind>(), Ok(kind));
        }
        assert_eq!("DIAMOND".parse::<ShapeKind>(), Ok(ShapeKind::Diamond));
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_handle_points_order() {
        let bounds = Bounds::new_from_center(
            Point::new(0.0, 0.0),
            crate::geometry::Size::new(200.0, 100.0),
        );
        let points = resize_handle_points(bounds);
        assert_eq!(points[0], Point::new(-97.5, -47.5));
        assert_eq!(points[1], Point::new(0.0, -47.5));
        assert_eq!(points[4], Point::new(97.5, 0.0));
        assert_eq!(points[7], Point::new(97.5, 47.5));
    }

    #[test]
    fn test_handle_hit_test() {
        let bounds = boundary_template(ShapeKind::Rectangle).bounds().unwrap();
        assert_eq!(
            ResizeHandle::hit_test(bounds, Point::new(97.0, 96.0)),
            Some(ResizeHandle::BottomRight)
        );
        assert_eq!(
            ResizeHandle::hit_test(bounds, Point::new(-97.5, 1.0)),
            Some(ResizeHandle::Left)
        );
        assert_eq!(ResizeHandle::hit_test(bounds, Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_resize_right_handle_scales_width_only() {
        let square = boundary_template(ShapeKind::Rectangle);
        let resized = resize_boundary(&square, ResizeHandle::Right, Point::new(300.0, 0.0)).unwrap();
        let bounds = resized.bounds().unwrap();

        // Fixed side is x = -100; pointer at 300 gives 400 / 200 = 2x.
        assert_approx_eq!(f32, bounds.width(), 400.0);
        assert_approx_eq!(f32, bounds.height(), 200.0);
    }

    #[test]
    fn test_resize_top_left_scales_both_axes() {
        let square = boundary_template(ShapeKind::Rectangle);
        let resized =
            resize_boundary(&square, ResizeHandle::TopLeft, Point::new(0.0, 50.0)).unwrap();
        let bounds = resized.bounds().unwrap();

        assert_approx_eq!(f32, bounds.width(), 100.0);
        assert_approx_eq!(f32, bounds.height(), 50.0);
    }

    #[test]
    fn test_resize_rejects_collapse() {
        let square = boundary_template(ShapeKind::Rectangle);
        // Dragging the right handle onto the fixed left side collapses the width.
        assert!(resize_boundary(&square, ResizeHandle::Right, Point::new(-100.0, 0.0)).is_none());
        assert!(resize_boundary(&Polygon::default(), ResizeHandle::Right, Point::default()).is_none());
    }
}
