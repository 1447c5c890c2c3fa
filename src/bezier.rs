// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bézier curves of arbitrary degree.

use alloc::vec::Vec;
use core::ops::Range;

use smallvec::{smallvec, SmallVec};

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::{Line, ParamCurve, ParamCurveDeriv, Point, Rect};

/// Number of bisection rounds used by [`BezierCurve::locate`].
const LOCATE_SUBDIVISIONS: usize = 20;

/// Gauss-Newton steps used to polish a located parameter.
const LOCATE_NEWTON_STEPS: usize = 10;

/// Distance tolerance for [`BezierCurve::locate`], relative to the size of
/// the curve's bounding box.
const LOCATE_TOLERANCE: f64 = 1.0 / (1u64 << 26) as f64;

/// A Bézier curve of any degree, given by its control points.
///
/// The degree is implicit: a curve with `n` nodes has degree `n - 1`.
/// Up to four nodes (cubics) are stored inline.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BezierCurve {
    nodes: SmallVec<[Point; 4]>,
}

impl BezierCurve {
    /// Create a new curve from its control points.
    pub fn new<P: Into<Point>>(nodes: impl IntoIterator<Item = P>) -> BezierCurve {
        BezierCurve {
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a new curve from interleaved `x, y` coordinates.
    ///
    /// Returns `None` if the number of coordinates is odd.
    pub fn from_coords(coords: &[f64]) -> Option<BezierCurve> {
        if coords.len() % 2 != 0 {
            return None;
        }
        Some(BezierCurve {
            nodes: coords
                .chunks_exact(2)
                .map(|xy| Point::new(xy[0], xy[1]))
                .collect(),
        })
    }

    /// The control points.
    #[inline]
    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    /// The number of control points.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The degree of the curve; zero for a single point (or an empty curve).
    #[inline]
    pub fn degree(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Whether the curve has no control points at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether every control point is finite.
    pub fn is_finite(&self) -> bool {
        self.nodes.iter().all(|p| p.is_finite())
    }

    /// Whether all control points coincide, so the curve is a single point.
    pub fn is_point(&self) -> bool {
        match self.nodes.split_first() {
            Some((first, rest)) => rest.iter().all(|p| p == first),
            None => false,
        }
    }

    /// The bounding box of the control points, which contains the curve.
    ///
    /// Returns `None` for an empty curve.
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::bounding(&self.nodes)
    }

    /// The line segment from the first to the last control point.
    ///
    /// Returns `None` for an empty curve.
    pub fn chord(&self) -> Option<Line> {
        let first = *self.nodes.first()?;
        let last = *self.nodes.last()?;
        Some(Line::new(first, last))
    }

    /// An upper bound on the distance between the curve and its chord.
    ///
    /// See [`linearization_error`] for details.
    pub fn linearization_error(&self) -> f64 {
        let n = self.nodes.len();
        if n < 3 {
            return 0.0;
        }
        let max_second_difference = self
            .nodes
            .windows(3)
            .map(|w| ((w[2] - w[1]) - (w[1] - w[0])).hypot())
            .fold(0.0, f64::max);
        let degree = (n - 1) as f64;
        0.125 * degree * (degree - 1.0) * max_second_difference
    }

    /// Evaluate the blossom (polar form) of the curve.
    ///
    /// `params` must hold exactly `degree` values. With all values equal to
    /// `t` this is the point at `t`; mixing two values `t0` and `t1` gives
    /// the control points of the curve restricted to `t0..t1`.
    pub fn blossom(&self, params: &[f64]) -> Point {
        debug_assert_eq!(params.len(), self.degree());
        let mut pts: SmallVec<[Point; 8]> = SmallVec::from_slice(&self.nodes);
        let n = pts.len();
        if n == 0 {
            return Point::new(f64::NAN, f64::NAN);
        }
        for (k, &u) in params.iter().enumerate().take(n - 1) {
            for i in 0..(n - 1 - k) {
                pts[i] = pts[i].lerp(pts[i + 1], u);
            }
        }
        pts[0]
    }

    /// Find the parameter of a point lying on the curve.
    ///
    /// The curve is bisected, keeping the pieces whose bounding boxes
    /// contain the point, and the surviving parameters are polished by
    /// Gauss-Newton iteration. When the point lies on the curve more than
    /// once (at a self-intersection) the closest fit is returned.
    ///
    /// Returns `None` if the point is not on the curve, to within a
    /// tolerance relative to the curve's size.
    pub fn locate(&self, pt: Point) -> Option<f64> {
        let bbox = self.bounding_box()?;
        if self.is_point() {
            return (self.nodes[0] == pt).then_some(0.0);
        }
        let tolerance = LOCATE_TOLERANCE * bbox.diagonal();

        let mut candidates: Vec<(BezierCurve, Range<f64>)> = Vec::new();
        candidates.push((self.clone(), 0.0..1.0));
        let mut next = Vec::new();
        for _ in 0..LOCATE_SUBDIVISIONS {
            for (curve, range) in candidates.drain(..) {
                let contains = curve
                    .bounding_box()
                    .map(|b| b.inflate(tolerance, tolerance).contains_inclusive(pt))
                    .unwrap_or(false);
                if !contains {
                    continue;
                }
                let mid = 0.5 * (range.start + range.end);
                let (left, right) = curve.subdivide();
                next.push((left, range.start..mid));
                next.push((right, mid..range.end));
            }
            core::mem::swap(&mut candidates, &mut next);
            if candidates.is_empty() {
                return None;
            }
        }

        let deriv = self.deriv();
        let mut best: Option<(f64, f64)> = None;
        for (_, range) in &candidates {
            let mut s = 0.5 * (range.start + range.end);
            for _ in 0..LOCATE_NEWTON_STEPS {
                let residual = self.eval(s) - pt;
                let tangent = deriv.eval(s).to_vec2();
                let denom = tangent.hypot2();
                if denom == 0.0 {
                    break;
                }
                let step = residual.dot(tangent) / denom;
                s -= step;
                if step.abs() <= f64::EPSILON {
                    break;
                }
            }
            let s = s.clamp(0.0, 1.0);
            let dist = self.eval(s).distance(pt);
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((s, dist));
            }
        }
        best.filter(|&(_, dist)| dist <= tolerance).map(|(s, _)| s)
    }
}

impl ParamCurve for BezierCurve {
    /// Evaluate by the de Casteljau algorithm.
    ///
    /// An empty curve evaluates to NaN.
    fn eval(&self, t: f64) -> Point {
        let mut pts: SmallVec<[Point; 8]> = SmallVec::from_slice(&self.nodes);
        let n = pts.len();
        if n == 0 {
            return Point::new(f64::NAN, f64::NAN);
        }
        for k in (1..n).rev() {
            for i in 0..k {
                pts[i] = pts[i].lerp(pts[i + 1], t);
            }
        }
        pts[0]
    }

    fn subsegment(&self, range: Range<f64>) -> BezierCurve {
        let degree = self.degree();
        if self.nodes.is_empty() {
            return self.clone();
        }
        let mut params: SmallVec<[f64; 8]> = smallvec![range.start; degree];
        let mut nodes = SmallVec::with_capacity(degree + 1);
        nodes.push(self.blossom(&params));
        for i in 0..degree {
            params[degree - 1 - i] = range.end;
            nodes.push(self.blossom(&params));
        }
        BezierCurve { nodes }
    }

    /// Subdivide into halves, using a single pass of de Casteljau.
    fn subdivide(&self) -> (BezierCurve, BezierCurve) {
        let n = self.nodes.len();
        if n == 0 {
            return (self.clone(), self.clone());
        }
        let mut pts = self.nodes.clone();
        let mut left: SmallVec<[Point; 4]> = SmallVec::with_capacity(n);
        let mut right: SmallVec<[Point; 4]> = smallvec![Point::ZERO; n];
        left.push(pts[0]);
        right[n - 1] = pts[n - 1];
        for k in 1..n {
            for i in 0..(n - k) {
                pts[i] = pts[i].midpoint(pts[i + 1]);
            }
            left.push(pts[0]);
            right[n - 1 - k] = pts[n - 1 - k];
        }
        (BezierCurve { nodes: left }, BezierCurve { nodes: right })
    }

    #[inline]
    fn start(&self) -> Point {
        self.nodes
            .first()
            .copied()
            .unwrap_or(Point::new(f64::NAN, f64::NAN))
    }

    #[inline]
    fn end(&self) -> Point {
        self.nodes
            .last()
            .copied()
            .unwrap_or(Point::new(f64::NAN, f64::NAN))
    }
}

impl ParamCurveDeriv for BezierCurve {
    type DerivResult = BezierCurve;

    /// The hodograph, a curve of one degree less.
    ///
    /// The derivative of a constant curve is the single node (0, 0).
    fn deriv(&self) -> BezierCurve {
        if self.nodes.len() < 2 {
            return BezierCurve {
                nodes: smallvec![Point::ZERO],
            };
        }
        let degree = self.degree() as f64;
        BezierCurve {
            nodes: self
                .nodes
                .windows(2)
                .map(|w| (degree * (w[1] - w[0])).to_point())
                .collect(),
        }
    }
}

/// An upper bound on how far a curve strays from its chord.
///
/// The nodes are given as a flat slice of `dimension`-dimensional points,
/// one point after another. The bound is
///
/// ```text
/// degree * (degree - 1) / 8 * max_j |p[j + 2] - 2 p[j + 1] + p[j]|
/// ```
///
/// which holds because the curve's second derivative is bounded by
/// `degree * (degree - 1)` times the largest second difference of the
/// control polygon, and a function vanishing at both ends of the unit
/// interval deviates by at most an eighth of its second derivative.
///
/// Curves of degree zero or one (and an empty slice) have no error.
///
/// The length of `nodes` should be a multiple of `dimension`. Debug builds
/// assert this; otherwise trailing coordinates that do not make up a whole
/// point are ignored.
pub fn linearization_error(nodes: &[f64], dimension: usize) -> f64 {
    if dimension == 0 {
        return 0.0;
    }
    debug_assert!(
        nodes.len() % dimension == 0,
        "{} coordinates are not a whole number of points of dimension {dimension}",
        nodes.len()
    );
    let num_nodes = nodes.len() / dimension;
    if num_nodes < 3 {
        return 0.0;
    }
    let point = |j: usize| &nodes[j * dimension..(j + 1) * dimension];
    let mut max_second_difference = 0.0_f64;
    for j in 0..num_nodes - 2 {
        let (p0, p1, p2) = (point(j), point(j + 1), point(j + 2));
        let norm_sq: f64 = (0..dimension)
            .map(|c| {
                let d = p2[c] - 2.0 * p1[c] + p0[c];
                d * d
            })
            .sum();
        max_second_difference = max_second_difference.max(norm_sq.sqrt());
    }
    let degree = (num_nodes - 1) as f64;
    0.125 * degree * (degree - 1.0) * max_second_difference
}

/// Whether two control polygons agree node by node, within `tolerance`.
pub(crate) fn nodes_close(a: &[Point], b: &[Point], tolerance: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(p, q)| (*p - *q).max_abs() <= tolerance)
}

/// The scale used to make tolerances relative to the size of a curve.
pub(crate) fn curve_scale(curve: &BezierCurve) -> f64 {
    curve.bounding_box().map(|b| b.diagonal()).unwrap_or(0.0)
}
