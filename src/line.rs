// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line segments, and the intersection of two of them.

use core::ops::Range;

use crate::common::SINGULAR_RATIO;
#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;
use crate::{ParamCurve, Point};

/// Tolerance for deciding that parallel segments lie on a common line,
/// relative to the size of the configuration.
const COLLINEAR_RATIO: f64 = 1.0 / (1u64 << 40) as f64;

/// A single line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// The line's start point.
    pub p0: Point,
    /// The line's end point.
    pub p1: Point,
}

impl Line {
    /// Create a new line.
    #[inline]
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Line {
        Line {
            p0: p0.into(),
            p1: p1.into(),
        }
    }

    /// Computes the point where two lines, if extended to infinity, would
    /// cross, as parameters along each line.
    ///
    /// See [`segment_intersection`].
    #[inline]
    pub fn crossing_params(&self, other: &Line) -> Option<(f64, f64)> {
        segment_intersection(self.p0, self.p1, other.p0, other.p1)
    }
}

impl ParamCurve for Line {
    #[inline]
    fn eval(&self, t: f64) -> Point {
        self.p0.lerp(self.p1, t)
    }

    #[inline]
    fn subsegment(&self, range: Range<f64>) -> Line {
        Line {
            p0: self.eval(range.start),
            p1: self.eval(range.end),
        }
    }

    #[inline]
    fn start(&self) -> Point {
        self.p0
    }

    #[inline]
    fn end(&self) -> Point {
        self.p1
    }
}

/// Intersect the lines through two segments.
///
/// Solves `start0 + s (end0 - start0) = start1 + t (end1 - start1)` and
/// returns `(s, t)`. The parameters are not restricted to `[0, 1]`; the
/// caller decides whether the crossing lies on the segments.
///
/// Returns `None` when the segments are parallel (or one of them has zero
/// length), that is when the cross product of the directions is negligible
/// compared to the product of their lengths.
pub fn segment_intersection(
    start0: Point,
    end0: Point,
    start1: Point,
    end1: Point,
) -> Option<(f64, f64)> {
    let d0 = end0 - start0;
    let d1 = end1 - start1;
    let denom = d0.cross(d1);
    let scale = d0.hypot() * d1.hypot();
    // Also rejects a zero scale and NaN.
    if !(denom.abs() > SINGULAR_RATIO * scale) {
        return None;
    }
    let w = start1 - start0;
    let s = w.cross(d1) / denom;
    let t = w.cross(d0) / denom;
    Some((s, t))
}

/// Whether two parallel segments are distinct, with no point in common.
///
/// This is meant to be asked after [`segment_intersection`] found no
/// crossing. Segments that are not parallel are never "parallel and
/// different", so this returns `false` for them. Parallel segments on
/// different lines return `true`; collinear segments return `true` only
/// when their parameter ranges do not overlap. Zero-length segments are
/// treated as points.
pub fn parallel_different(start0: Point, end0: Point, start1: Point, end1: Point) -> bool {
    let (mut start0, mut end0, mut start1, mut end1) = (start0, end0, start1, end1);
    let mut d0 = end0 - start0;
    let mut d1 = end1 - start1;
    let denom = d0.cross(d1);
    if denom.abs() > SINGULAR_RATIO * d0.hypot() * d1.hypot() {
        return false;
    }
    let zero0 = d0.hypot2() == 0.0;
    let zero1 = d1.hypot2() == 0.0;
    if zero0 && zero1 {
        return start0 != start1;
    }
    if zero0 {
        core::mem::swap(&mut start0, &mut start1);
        core::mem::swap(&mut end0, &mut end1);
        core::mem::swap(&mut d0, &mut d1);
    }

    let w = start1 - start0;
    let len0 = d0.hypot();
    let size = len0.max(d1.hypot()).max(w.hypot());
    // Distance of `start1` from the line through segment 0, times `len0`.
    if d0.cross(w).abs() > COLLINEAR_RATIO * len0 * size {
        return true;
    }

    // Collinear: project segment 1 onto segment 0.
    let len0_sq = d0.hypot2();
    let u0 = w.dot(d0) / len0_sq;
    let u1 = (end1 - start0).dot(d0) / len0_sq;
    let (lo, hi) = if u0 <= u1 { (u0, u1) } else { (u1, u0) };
    hi < 0.0 || lo > 1.0
}
