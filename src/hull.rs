// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex hulls of control polygons, and a separation test for them.

use alloc::vec::Vec;

use crate::{Point, Vec2};

/// Compute the convex hull of a set of points, counterclockwise.
///
/// This is Andrew's monotone chain. `sorted` is scratch space; the hull is
/// written to `hull`, with collinear points along edges dropped. Both
/// buffers are cleared first, so they can be reused across calls.
pub(crate) fn convex_hull(points: &[Point], sorted: &mut Vec<Point>, hull: &mut Vec<Point>) {
    sorted.clear();
    sorted.extend_from_slice(points);
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    hull.clear();
    if sorted.len() < 3 {
        hull.extend_from_slice(sorted);
        return;
    }

    let turn = |o: Point, a: Point, b: Point| (a - o).cross(b - o);
    // Lower hull.
    for &p in sorted.iter() {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    // Upper hull.
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    // The last point repeats the first.
    hull.pop();
}

/// Whether two convex polygons touch or overlap.
///
/// This is a separating axis test over the edge normals and directions of
/// both polygons. Polygons that merely touch count as colliding. The test
/// is conservative: it never reports separation for polygons that share a
/// point. Empty polygons never collide.
pub(crate) fn polygons_collide(a: &[Point], b: &[Point]) -> bool {
    let (Some(&a0), Some(&b0)) = (a.first(), b.first()) else {
        return false;
    };
    if separated_along(a, b, b0 - a0) {
        return false;
    }
    for poly in [a, b] {
        let n = poly.len();
        for i in 0..n {
            let edge = poly[(i + 1) % n] - poly[i];
            if edge == Vec2::ZERO {
                continue;
            }
            let normal = Vec2::new(-edge.y, edge.x);
            if separated_along(a, b, normal) || separated_along(a, b, edge) {
                return false;
            }
        }
    }
    true
}

fn separated_along(a: &[Point], b: &[Point], axis: Vec2) -> bool {
    if axis == Vec2::ZERO {
        return false;
    }
    let (a_min, a_max) = project(a, axis);
    let (b_min, b_max) = project(b, axis);
    a_max < b_min || b_max < a_min
}

fn project(poly: &[Point], axis: Vec2) -> (f64, f64) {
    poly.iter()
        .map(|p| p.to_vec2().dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}
