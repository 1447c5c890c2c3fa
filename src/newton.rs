// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Newton refinement of curve-curve intersections.
//!
//! Subdivision only finds intersections to within the flatness tolerance.
//! The approximate parameters are then polished by Newton's method on the
//! residual `curve1(s) - curve2(t)`. At a tangential intersection that
//! system is singular at the root and Newton converges only linearly, so
//! there we switch to Gauss-Newton on the system augmented with the cross
//! product of the tangents, which vanishes at a double root.

use crate::common::solve_2x2;
use crate::{BezierCurve, ParamCurve, ParamCurveDeriv};

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

/// An update this much smaller than the previous one counts as quadratic
/// progress; anything larger is a linear step.
const LINEAR_UPDATE_RATIO: f64 = 0.25;

/// Iterations before linear convergence is diagnosed.
const MIN_ITERATIONS_FOR_DIAGNOSIS: usize = 4;

/// Take a single Newton step towards an intersection of two curves.
///
/// Given parameters `s` on `curve1` and `t` on `curve2`, solves the
/// linearized system
///
/// ```text
/// [curve1'(s)  -curve2'(t)] [Δs Δt]ᵀ = curve2(t) - curve1(s)
/// ```
///
/// and returns `(s + Δs, t + Δt)`.
///
/// Returns `None` if the Jacobian is singular, which happens when the
/// tangents are parallel (as at a tangential intersection) or one of them
/// vanishes.
pub fn newton_refine_intersect(
    s: f64,
    curve1: &BezierCurve,
    t: f64,
    curve2: &BezierCurve,
) -> Option<(f64, f64)> {
    let deriv1 = curve1.deriv();
    let deriv2 = curve2.deriv();
    simple_step(curve1, &deriv1, s, curve2, &deriv2, t)
}

fn simple_step(
    curve1: &BezierCurve,
    deriv1: &BezierCurve,
    s: f64,
    curve2: &BezierCurve,
    deriv2: &BezierCurve,
    t: f64,
) -> Option<(f64, f64)> {
    let residual = curve1.eval(s) - curve2.eval(t);
    let tan1 = deriv1.eval(s).to_vec2();
    let tan2 = deriv2.eval(t).to_vec2();
    let (ds, dt) = solve_2x2(tan1.x, -tan2.x, tan1.y, -tan2.y, -residual.x, -residual.y)?;
    Some((s + ds, t + dt))
}

/// A pair of curves with their first and second derivatives.
pub(crate) struct CurvePair<'a> {
    curve1: &'a BezierCurve,
    deriv1: BezierCurve,
    second1: BezierCurve,
    curve2: &'a BezierCurve,
    deriv2: BezierCurve,
    second2: BezierCurve,
}

/// The result of iterating Newton's method.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct NewtonOutcome {
    pub s: f64,
    pub t: f64,
    /// Whether the updates became small enough.
    pub converged: bool,
    /// Whether the tangential fallback was used.
    pub double_root: bool,
}

enum Progress {
    Converged(f64, f64),
    /// Linear convergence, or a singular Jacobian: a likely double root.
    Stalled(f64, f64),
    Exhausted(f64, f64),
}

impl<'a> CurvePair<'a> {
    pub(crate) fn new(curve1: &'a BezierCurve, curve2: &'a BezierCurve) -> Self {
        let deriv1 = curve1.deriv();
        let second1 = deriv1.deriv();
        let deriv2 = curve2.deriv();
        let second2 = deriv2.deriv();
        CurvePair {
            curve1,
            deriv1,
            second1,
            curve2,
            deriv2,
            second2,
        }
    }

    /// Distance between the two curves at the given parameters.
    pub(crate) fn residual(&self, s: f64, t: f64) -> f64 {
        self.curve1.eval(s).distance(self.curve2.eval(t))
    }

    fn simple_step(&self, s: f64, t: f64) -> Option<(f64, f64)> {
        simple_step(self.curve1, &self.deriv1, s, self.curve2, &self.deriv2, t)
    }

    /// One Gauss-Newton step on `[curve1(s) - curve2(t), curve1'(s) × curve2'(t)]`.
    fn double_root_step(&self, s: f64, t: f64) -> Option<(f64, f64)> {
        let residual = self.curve1.eval(s) - self.curve2.eval(t);
        let tan1 = self.deriv1.eval(s).to_vec2();
        let tan2 = self.deriv2.eval(t).to_vec2();
        let acc1 = self.second1.eval(s).to_vec2();
        let acc2 = self.second2.eval(t).to_vec2();

        // Rows of the 3x2 Jacobian and the residual.
        let rows = [
            (tan1.x, -tan2.x, residual.x),
            (tan1.y, -tan2.y, residual.y),
            (acc1.cross(tan2), tan1.cross(acc2), tan1.cross(tan2)),
        ];
        let (mut aa, mut ab, mut bb, mut ag, mut bg) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (a, b, g) in rows {
            aa += a * a;
            ab += a * b;
            bb += b * b;
            ag += a * g;
            bg += b * g;
        }
        let (ds, dt) = solve_2x2(aa, ab, ab, bb, -ag, -bg)?;
        Some((s + ds, t + dt))
    }

    fn iterate(
        &self,
        mut s: f64,
        mut t: f64,
        max_iterations: usize,
        tolerance: f64,
        step: impl Fn(&Self, f64, f64) -> Option<(f64, f64)>,
    ) -> Progress {
        let mut linear_updates = 0;
        let mut prev_update = 0.0;
        for i in 0..max_iterations {
            let Some((new_s, new_t)) = step(self, s, t) else {
                return Progress::Stalled(s, t);
            };
            let update = (new_s - s).hypot(new_t - t);
            s = new_s;
            t = new_t;
            if i > 0 && update > LINEAR_UPDATE_RATIO * prev_update {
                linear_updates += 1;
            }
            if update <= tolerance * s.hypot(t).max(1.0) {
                return Progress::Converged(s, t);
            }
            if i >= MIN_ITERATIONS_FOR_DIAGNOSIS && 3 * linear_updates >= 2 * i {
                return Progress::Stalled(s, t);
            }
            prev_update = update;
        }
        Progress::Exhausted(s, t)
    }

    /// Iterate Newton's method from `(s, t)`, falling back to the double
    /// root iteration when convergence is linear or the Jacobian singular.
    pub(crate) fn full_newton(
        &self,
        s: f64,
        t: f64,
        max_iterations: usize,
        tolerance: f64,
    ) -> NewtonOutcome {
        match self.iterate(s, t, max_iterations, tolerance, Self::simple_step) {
            Progress::Converged(s, t) => NewtonOutcome {
                s,
                t,
                converged: true,
                double_root: false,
            },
            Progress::Exhausted(s, t) => NewtonOutcome {
                s,
                t,
                converged: false,
                double_root: false,
            },
            Progress::Stalled(s, t) => {
                match self.iterate(s, t, max_iterations, tolerance, Self::double_root_step) {
                    Progress::Converged(s, t) => NewtonOutcome {
                        s,
                        t,
                        converged: true,
                        double_root: true,
                    },
                    Progress::Stalled(s, t) | Progress::Exhausted(s, t) => NewtonOutcome {
                        s,
                        t,
                        converged: false,
                        double_root: true,
                    },
                }
            }
        }
    }
}
