// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounding boxes.

use crate::Point;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

/// An axis-aligned rectangle.
///
/// Used as the bounding box of a set of control points. Since a Bézier
/// curve lies inside the convex hull of its control points, it also lies
/// inside their bounding box.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// The minimum x coordinate.
    pub x0: f64,
    /// The minimum y coordinate.
    pub y0: f64,
    /// The maximum x coordinate.
    pub x1: f64,
    /// The maximum y coordinate.
    pub y1: f64,
}

/// How two bounding boxes relate to each other.
///
/// The discriminants are stable, so the value can be passed on as an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BoxIntersection {
    /// The boxes share interior area.
    Intersection = 0,
    /// The boxes touch along an edge or at a corner, but share no area.
    Tangent = 1,
    /// The boxes are separated.
    Disjoint = 2,
}

impl Rect {
    /// A new rectangle from minimum and maximum coordinates.
    #[inline]
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect { x0, y0, x1, y1 }
    }

    /// A new rectangle from two points.
    ///
    /// The result will have non-negative width and height.
    #[inline]
    pub fn from_points(p0: impl Into<Point>, p1: impl Into<Point>) -> Rect {
        let p0 = p0.into();
        let p1 = p1.into();
        Rect {
            x0: p0.x.min(p1.x),
            y0: p0.y.min(p1.y),
            x1: p0.x.max(p1.x),
            y1: p0.y.max(p1.y),
        }
    }

    /// The smallest rectangle enclosing all the given points.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let start = Rect::from_points(*first, *first);
        Some(rest.iter().fold(start, |rect, &pt| rect.union_pt(pt)))
    }

    /// The width of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// The height of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// The length of the diagonal.
    ///
    /// This is the scale used to make tolerances relative to a curve's size.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Compute the union with one point.
    #[inline]
    pub fn union_pt(&self, pt: Point) -> Rect {
        Rect::new(
            self.x0.min(pt.x),
            self.y0.min(pt.y),
            self.x1.max(pt.x),
            self.y1.max(pt.y),
        )
    }

    /// Whether the point lies inside the rectangle or on its boundary.
    #[inline]
    pub fn contains_inclusive(&self, pt: Point) -> bool {
        pt.x >= self.x0 && pt.x <= self.x1 && pt.y >= self.y0 && pt.y <= self.y1
    }

    /// Expand a rectangle by a constant amount in both directions.
    #[inline]
    pub fn inflate(&self, width: f64, height: f64) -> Rect {
        Rect {
            x0: self.x0 - width,
            y0: self.y0 - height,
            x1: self.x1 + width,
            y1: self.y1 + height,
        }
    }

    /// Classify how this rectangle meets another one.
    ///
    /// Unlike an area intersection test, touching edges and corners count:
    /// they are reported as [`BoxIntersection::Tangent`] rather than
    /// [`BoxIntersection::Disjoint`].
    pub fn classify(&self, other: &Rect) -> BoxIntersection {
        if self.x1 < other.x0 || other.x1 < self.x0 || self.y1 < other.y0 || other.y1 < self.y0 {
            return BoxIntersection::Disjoint;
        }
        if self.x1 == other.x0 || other.x1 == self.x0 || self.y1 == other.y0 || other.y1 == self.y0
        {
            return BoxIntersection::Tangent;
        }
        BoxIntersection::Intersection
    }
}

/// Classify the bounding boxes of two sets of control points.
///
/// Empty node sets have no extent and are always disjoint from anything.
pub fn bbox_intersect(nodes1: &[Point], nodes2: &[Point]) -> BoxIntersection {
    match (Rect::bounding(nodes1), Rect::bounding(nodes2)) {
        (Some(r1), Some(r2)) => r1.classify(&r2),
        _ => BoxIntersection::Disjoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_at(x: f64, y: f64) -> [Point; 4] {
        [
            Point::new(x, y),
            Point::new(x + 1.0, y),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x, y + 1.0),
        ]
    }

    #[test]
    fn bounding() {
        let pts = [
            Point::new(1.0, 5.0),
            Point::new(-2.0, 3.0),
            Point::new(4.0, -1.0),
        ];
        assert_eq!(Rect::bounding(&pts), Some(Rect::new(-2.0, -1.0, 4.0, 5.0)));
        assert_eq!(Rect::bounding(&[]), None);
    }

    #[test]
    fn bbox_overlapping() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(0.5, 0.5);
        assert_eq!(bbox_intersect(&a, &b), BoxIntersection::Intersection);
        // Containment is an intersection too.
        let inner = [Point::new(0.25, 0.25), Point::new(0.75, 0.5)];
        assert_eq!(bbox_intersect(&a, &inner), BoxIntersection::Intersection);
    }

    #[test]
    fn bbox_touching() {
        let a = unit_square_at(0.0, 0.0);
        // Shared edge.
        assert_eq!(
            bbox_intersect(&a, &unit_square_at(1.0, 0.0)),
            BoxIntersection::Tangent
        );
        // Shared corner.
        assert_eq!(
            bbox_intersect(&a, &unit_square_at(1.0, 1.0)),
            BoxIntersection::Tangent
        );
        // Degenerate (zero-height) box lying on an edge.
        let flat = [Point::new(0.2, 1.0), Point::new(0.8, 1.0)];
        assert_eq!(bbox_intersect(&a, &flat), BoxIntersection::Tangent);
    }

    #[test]
    fn bbox_separated() {
        let a = unit_square_at(0.0, 0.0);
        assert_eq!(
            bbox_intersect(&a, &unit_square_at(2.0, 0.0)),
            BoxIntersection::Disjoint
        );
        assert_eq!(
            bbox_intersect(&a, &unit_square_at(0.0, -1.5)),
            BoxIntersection::Disjoint
        );
        assert_eq!(bbox_intersect(&a, &[]), BoxIntersection::Disjoint);
    }

    #[test]
    fn discriminants() {
        assert_eq!(BoxIntersection::Intersection as u8, 0);
        assert_eq!(BoxIntersection::Tangent as u8, 1);
        assert_eq!(BoxIntersection::Disjoint as u8, 2);
    }
}
