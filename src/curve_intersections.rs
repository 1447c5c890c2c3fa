// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection of two Bézier curves by subdivision.
//!
//! Both curves are bisected round by round. A pair of sub-curves survives
//! a round only while the bounding boxes of their control points meet.
//! Once both sub-curves of a pair are flat to within the linearization
//! tolerance, their chords are intersected directly, and the resulting
//! approximate parameters are polished with Newton's method.

use alloc::vec::Vec;
use core::fmt;

use arrayvec::ArrayVec;
use log::{debug, trace};
use smallvec::SmallVec;

use crate::bezier::{curve_scale, nodes_close};
use crate::common::wiggle_interval;
#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;
use crate::hull::{convex_hull, polygons_collide};
use crate::newton::CurvePair;
use crate::{
    bbox_intersect, parallel_different, BezierCurve, BoxIntersection, Line, ParamCurve, Point,
};

/// How far outside `[0, 1]` a chord crossing may lie and still be kept.
///
/// Crossings near the end of a chord can land just outside it through
/// roundoff; the neighboring pair would otherwise be relied on to find them.
const CHORD_SLACK: f64 = 1.0 / (1u64 << 16) as f64;

/// How far outside `[0, 1]` a refined parameter may lie and be snapped back.
const PARAM_WIGGLE: f64 = 1.0 / (1u64 << 40) as f64;

/// Options for computing curve intersections.
///
/// All tolerances have sensible defaults; the builder methods adjust them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionOpts {
    /// A sub-curve is flat when its linearization error is below this
    /// fraction of the diagonal of its curve's bounding box.
    pub linearization_tolerance: f64,
    /// Maximum number of times a curve may be split.
    ///
    /// With zero the whole curves are still compared once, so disjoint
    /// curves and flat ones are handled without any split.
    pub max_depth: usize,
    /// Maximum number of candidate pairs alive in one round.
    pub max_candidates: usize,
    /// Above this many live pairs, pairs with separated convex hulls are
    /// dropped as well.
    pub hull_prune_threshold: usize,
    /// Iteration cap for Newton refinement (and again for its tangential
    /// fallback).
    pub newton_max_iterations: usize,
    /// Newton stops when an update is this small relative to the parameters.
    pub newton_tolerance: f64,
    /// Intersections closer than this in parameter space are merged.
    pub dedup_tolerance: f64,
    /// An intersection is only reported when the curves are this close at
    /// the refined parameters, relative to the larger bounding box diagonal.
    pub point_tolerance: f64,
}

impl Default for IntersectionOpts {
    fn default() -> Self {
        IntersectionOpts {
            linearization_tolerance: 1.0 / (1u64 << 26) as f64,
            max_depth: 40,
            max_candidates: 4096,
            hull_prune_threshold: 64,
            newton_max_iterations: 10,
            newton_tolerance: 1.0 / (1u64 << 36) as f64,
            dedup_tolerance: 1.0 / (1u64 << 20) as f64,
            point_tolerance: 1.0 / (1u64 << 26) as f64,
        }
    }
}

impl IntersectionOpts {
    /// Builder method for setting the linearization tolerance.
    pub fn with_linearization_tolerance(mut self, tolerance: f64) -> Self {
        self.linearization_tolerance = tolerance;
        self
    }

    /// Builder method for setting the maximum subdivision depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder method for setting the live candidate budget.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Builder method for setting when convex hull pruning kicks in.
    pub fn with_hull_prune_threshold(mut self, threshold: usize) -> Self {
        self.hull_prune_threshold = threshold;
        self
    }

    /// Builder method for setting the Newton iteration cap.
    pub fn with_newton_max_iterations(mut self, iterations: usize) -> Self {
        self.newton_max_iterations = iterations;
        self
    }

    /// Builder method for setting the Newton convergence tolerance.
    pub fn with_newton_tolerance(mut self, tolerance: f64) -> Self {
        self.newton_tolerance = tolerance;
        self
    }

    /// Builder method for setting the deduplication tolerance.
    pub fn with_dedup_tolerance(mut self, tolerance: f64) -> Self {
        self.dedup_tolerance = tolerance;
        self
    }

    /// Builder method for setting the point tolerance.
    pub fn with_point_tolerance(mut self, tolerance: f64) -> Self {
        self.point_tolerance = tolerance;
        self
    }
}

/// A single intersection of two curves.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Intersection {
    /// Parameter on the first curve.
    pub s: f64,
    /// Parameter on the second curve.
    pub t: f64,
    /// The intersection point, evaluated on the first curve.
    pub point: Point,
}

/// The intersections found between two curves, in the order discovered.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Intersections {
    points: SmallVec<[Intersection; 4]>,
}

impl Intersections {
    /// The number of intersections.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curves do not intersect.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The intersections as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Intersection] {
        &self.points
    }

    /// Iterate over the intersections.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Intersection> {
        self.points.iter()
    }

    /// [`Status::Success`], or [`Status::NoIntersections`] if empty.
    pub fn status(&self) -> Status {
        if self.is_empty() {
            Status::NoIntersections
        } else {
            Status::Success
        }
    }

    /// Write the parameters as interleaved `s, t` pairs into `out`.
    ///
    /// Returns the number of pairs written. If `out` has room for fewer
    /// pairs than there are intersections, nothing is written and the error
    /// reports the number of pairs required.
    pub fn copy_to_slice(&self, out: &mut [f64]) -> Result<usize, IntersectionError> {
        let required = self.points.len();
        let capacity = out.len() / 2;
        if capacity < required {
            return Err(IntersectionError::InsufficientSpace { required, capacity });
        }
        for (dst, p) in out.chunks_exact_mut(2).zip(&self.points) {
            dst[0] = p.s;
            dst[1] = p.t;
        }
        Ok(required)
    }

    /// Add an intersection, unless a nearby one is already present.
    ///
    /// Of two nearby intersections the one with the smaller residual wins.
    fn add(
        &mut self,
        residuals: &mut SmallVec<[f64; 4]>,
        new: Intersection,
        residual: f64,
        dedup: f64,
    ) {
        for (old, old_residual) in self.points.iter_mut().zip(residuals.iter_mut()) {
            if (old.s - new.s).abs().max((old.t - new.t).abs()) < dedup {
                if residual < *old_residual {
                    *old = new;
                    *old_residual = residual;
                }
                return;
            }
        }
        self.points.push(new);
        residuals.push(residual);
    }
}

impl IntoIterator for Intersections {
    type Item = Intersection;
    type IntoIter = smallvec::IntoIter<[Intersection; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Intersections {
    type Item = &'a Intersection;
    type IntoIter = core::slice::Iter<'a, Intersection>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// The outcome of an intersection query, as a status code.
///
/// Each status has a stable integer code, available through [`Status::code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// At least one intersection was found.
    Success = 0,
    /// The curves do not intersect.
    NoIntersections = 1,
    /// The subdivision depth or candidate budget was exceeded.
    TooManyCandidates = 2,
    /// Parallel segments, or curves that overlap along a segment.
    Parallel = 3,
    /// Newton refinement failed for every candidate.
    NoConvergence = 4,
    /// The output buffer is too small.
    InsufficientSpace = 5,
    /// A curve was empty or had non-finite coordinates.
    BadInput = 6,
}

impl Status {
    /// The integer code of this status.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "success",
            Status::NoIntersections => "no intersections",
            Status::TooManyCandidates => "too many candidates",
            Status::Parallel => "parallel",
            Status::NoConvergence => "no convergence",
            Status::InsufficientSpace => "insufficient space",
            Status::BadInput => "bad input",
        };
        f.write_str(name)
    }
}

/// Errors from [`IntersectionWorkspace::curve_intersections`] and
/// [`Intersections::copy_to_slice`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum IntersectionError {
    /// A curve has no control points.
    #[error("curve has no control points")]
    EmptyCurve,
    /// A control point has a NaN or infinite coordinate.
    #[error("curve has a non-finite control point")]
    NonFiniteInput,
    /// Subdivision went on for too many rounds.
    #[error("subdivision exceeded {depth} splits")]
    SubdivisionLimit {
        /// The depth limit that was hit.
        depth: usize,
    },
    /// Too many candidate pairs were alive at once.
    #[error("{count} live candidate pairs exceeded the budget")]
    TooManyCandidates {
        /// The number of live pairs.
        count: usize,
    },
    /// The curves share a common segment.
    ///
    /// `first` is the parameter range on the first curve, in increasing
    /// order; `second` holds the matching parameters on the second curve,
    /// which decrease if the curves run in opposite directions.
    #[error("curves coincide for s in {first:?} and t in {second:?}")]
    Coincident {
        /// Parameter range on the first curve.
        first: (f64, f64),
        /// Matching parameters on the second curve.
        second: (f64, f64),
    },
    /// Two flat sub-curves lie on a common line and overlap along it, or
    /// one of them has collapsed to a point on the other.
    #[error("flat sub-curves are parallel and overlapping")]
    ParallelSegments,
    /// Newton refinement failed for every candidate.
    #[error("Newton refinement failed for all {candidates} candidates")]
    NoConvergence {
        /// The number of candidates that failed.
        candidates: usize,
    },
    /// The output buffer is too small.
    #[error("room for {capacity} intersections, {required} required")]
    InsufficientSpace {
        /// The number of intersections.
        required: usize,
        /// The number of pairs the buffer can hold.
        capacity: usize,
    },
}

impl IntersectionError {
    /// The status code corresponding to this error.
    pub fn status(&self) -> Status {
        match self {
            IntersectionError::EmptyCurve | IntersectionError::NonFiniteInput => Status::BadInput,
            IntersectionError::SubdivisionLimit { .. }
            | IntersectionError::TooManyCandidates { .. } => Status::TooManyCandidates,
            IntersectionError::Coincident { .. } | IntersectionError::ParallelSegments => {
                Status::Parallel
            }
            IntersectionError::NoConvergence { .. } => Status::NoConvergence,
            IntersectionError::InsufficientSpace { .. } => Status::InsufficientSpace,
        }
    }
}

/// Counters describing the most recent query on a workspace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntersectionStats {
    /// Subdivision rounds run.
    pub rounds: usize,
    /// Largest number of candidate pairs alive in one round.
    pub peak_candidates: usize,
    /// Pairs discarded because their bounding boxes were disjoint.
    pub bbox_prunes: usize,
    /// Pairs whose bounding boxes only touched. These are kept.
    pub tangent_boxes: usize,
    /// Pairs discarded because their convex hulls were separated.
    pub hull_prunes: usize,
    /// Candidates passed to Newton refinement.
    pub newton_refinements: usize,
    /// Candidates for which refinement failed.
    pub newton_failures: usize,
}

/// A piece of a curve, with the parameter range it covers on the original.
#[derive(Clone, Debug)]
struct SubCurve {
    curve: BezierCurve,
    start: f64,
    end: f64,
}

impl SubCurve {
    fn whole(curve: &BezierCurve) -> Self {
        SubCurve {
            curve: curve.clone(),
            start: 0.0,
            end: 1.0,
        }
    }

    /// Map a parameter on this piece to the original curve.
    #[inline]
    fn param(&self, u: f64) -> f64 {
        self.start + u * (self.end - self.start)
    }

    /// The halves of this piece, or the piece itself if it is already flat.
    fn children(&self, flat: bool) -> ArrayVec<SubCurve, 2> {
        let mut children = ArrayVec::new();
        if flat {
            children.push(self.clone());
        } else {
            let mid = 0.5 * (self.start + self.end);
            let (left, right) = self.curve.subdivide();
            children.push(SubCurve {
                curve: left,
                start: self.start,
                end: mid,
            });
            children.push(SubCurve {
                curve: right,
                start: mid,
                end: self.end,
            });
        }
        children
    }
}

#[derive(Clone, Debug)]
struct CandidatePair {
    first: SubCurve,
    second: SubCurve,
}

/// Reusable scratch storage for intersection queries.
///
/// Buffers grow to fit the largest query seen and are kept between calls.
/// [`free`](IntersectionWorkspace::free) releases them.
#[derive(Debug, Default)]
pub struct IntersectionWorkspace {
    candidates: Vec<CandidatePair>,
    next_candidates: Vec<CandidatePair>,
    // Unrefined (s, t) parameters on the original curves.
    raw: Vec<(f64, f64)>,
    hull_sorted: Vec<Point>,
    hull1: Vec<Point>,
    hull2: Vec<Point>,
    stats: IntersectionStats,
}

impl IntersectionWorkspace {
    /// Create an empty workspace. Nothing is allocated until first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace with room for `capacity` candidate pairs.
    pub fn with_capacity(capacity: usize) -> Self {
        IntersectionWorkspace {
            candidates: Vec::with_capacity(capacity),
            next_candidates: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// The number of candidate pairs the workspace holds without growing.
    pub fn capacity(&self) -> usize {
        self.candidates.capacity().min(self.next_candidates.capacity())
    }

    /// Release all scratch storage.
    ///
    /// The workspace stays usable; it reallocates on the next query.
    pub fn free(&mut self) {
        *self = IntersectionWorkspace::default();
    }

    /// Statistics for the most recent query.
    pub fn stats(&self) -> &IntersectionStats {
        &self.stats
    }

    /// Find all intersections of two curves.
    ///
    /// On success the intersections are returned in the order discovered,
    /// each with parameters in `[0, 1]`. See [`IntersectionError`] for the
    /// failure modes.
    pub fn curve_intersections(
        &mut self,
        curve1: &BezierCurve,
        curve2: &BezierCurve,
        opts: &IntersectionOpts,
    ) -> Result<Intersections, IntersectionError> {
        validate(curve1)?;
        validate(curve2)?;
        self.stats = IntersectionStats::default();
        self.candidates.clear();
        self.next_candidates.clear();
        self.raw.clear();

        let scale1 = curve_scale(curve1);
        let scale2 = curve_scale(curve2);
        let point_tolerance = opts.point_tolerance * scale1.max(scale2);

        if curve1.degree() == curve2.degree()
            && curve1.degree() > 0
            && bbox_intersect(curve1.nodes(), curve2.nodes()) != BoxIntersection::Disjoint
        {
            if let Some((first, second)) =
                coincident_ranges(curve1, curve2, point_tolerance, opts.dedup_tolerance)
            {
                debug!("curves coincide for s in {first:?} and t in {second:?}");
                return Err(IntersectionError::Coincident { first, second });
            }
        }

        self.subdivide(
            curve1,
            curve2,
            opts,
            opts.linearization_tolerance * scale1,
            opts.linearization_tolerance * scale2,
        )?;
        self.refine(curve1, curve2, opts, point_tolerance)
    }

    /// Run subdivision rounds until no candidates are left, collecting
    /// chord crossings into `self.raw`.
    fn subdivide(
        &mut self,
        curve1: &BezierCurve,
        curve2: &BezierCurve,
        opts: &IntersectionOpts,
        flat_tolerance1: f64,
        flat_tolerance2: f64,
    ) -> Result<(), IntersectionError> {
        let IntersectionWorkspace {
            candidates,
            next_candidates,
            raw,
            hull_sorted,
            hull1,
            hull2,
            stats,
        } = self;

        candidates.push(CandidatePair {
            first: SubCurve::whole(curve1),
            second: SubCurve::whole(curve2),
        });
        let mut depth = 0;
        while !candidates.is_empty() {
            stats.rounds += 1;
            stats.peak_candidates = stats.peak_candidates.max(candidates.len());
            trace!("round {}: {} live candidate pairs", stats.rounds, candidates.len());

            if candidates.len() > opts.hull_prune_threshold {
                let before = candidates.len();
                candidates.retain(|pair| {
                    convex_hull(pair.first.curve.nodes(), hull_sorted, hull1);
                    convex_hull(pair.second.curve.nodes(), hull_sorted, hull2);
                    polygons_collide(hull1, hull2)
                });
                stats.hull_prunes += before - candidates.len();
            }

            for pair in candidates.drain(..) {
                match bbox_intersect(pair.first.curve.nodes(), pair.second.curve.nodes()) {
                    BoxIntersection::Disjoint => {
                        stats.bbox_prunes += 1;
                        continue;
                    }
                    BoxIntersection::Tangent => stats.tangent_boxes += 1,
                    BoxIntersection::Intersection => (),
                }
                let flat1 = pair.first.curve.linearization_error() <= flat_tolerance1;
                let flat2 = pair.second.curve.linearization_error() <= flat_tolerance2;
                if flat1 && flat2 {
                    intersect_chords(&pair, raw, opts.dedup_tolerance)?;
                    continue;
                }
                let children2 = pair.second.children(flat2);
                for first in pair.first.children(flat1) {
                    for second in &children2 {
                        next_candidates.push(CandidatePair {
                            first: first.clone(),
                            second: second.clone(),
                        });
                    }
                }
            }

            if next_candidates.is_empty() {
                break;
            }
            if depth == opts.max_depth {
                debug!("subdivision limit of {depth} splits reached");
                next_candidates.clear();
                return Err(IntersectionError::SubdivisionLimit { depth });
            }
            depth += 1;
            if next_candidates.len() > opts.max_candidates {
                let count = next_candidates.len();
                debug!("{count} live candidate pairs exceed the budget of {}", opts.max_candidates);
                next_candidates.clear();
                return Err(IntersectionError::TooManyCandidates { count });
            }
            core::mem::swap(candidates, next_candidates);
        }
        Ok(())
    }

    /// Polish the raw candidates, then snap and deduplicate them.
    fn refine(
        &mut self,
        curve1: &BezierCurve,
        curve2: &BezierCurve,
        opts: &IntersectionOpts,
        point_tolerance: f64,
    ) -> Result<Intersections, IntersectionError> {
        let pair = CurvePair::new(curve1, curve2);
        let mut result = Intersections::default();
        let mut residuals = SmallVec::new();
        let mut failures = 0;
        for &(s0, t0) in &self.raw {
            self.stats.newton_refinements += 1;
            let outcome =
                pair.full_newton(s0, t0, opts.newton_max_iterations, opts.newton_tolerance);
            let close = |s: f64, t: f64| {
                let residual = pair.residual(s, t);
                (residual <= point_tolerance).then_some((s, t, residual))
            };
            let refined = wiggle_interval(outcome.s, PARAM_WIGGLE)
                .zip(wiggle_interval(outcome.t, PARAM_WIGGLE))
                .and_then(|(s, t)| close(s, t));
            let accepted = match refined {
                Some(found) => Some(found),
                None => match (
                    wiggle_interval(s0, PARAM_WIGGLE),
                    wiggle_interval(t0, PARAM_WIGGLE),
                ) {
                    (Some(s), Some(t)) => match close(s, t) {
                        Some(found) => Some(found),
                        None => {
                            failures += 1;
                            debug!("Newton refinement failed near s = {s0}, t = {t0}: {outcome:?}");
                            None
                        }
                    },
                    // A crossing of the chords' extensions, not of the curves.
                    _ => None,
                },
            };
            if let Some((s, t, residual)) = accepted {
                let point = curve1.eval(s);
                result.add(
                    &mut residuals,
                    Intersection { s, t, point },
                    residual,
                    opts.dedup_tolerance,
                );
            }
        }
        self.stats.newton_failures = failures;
        if result.is_empty() && failures > 0 {
            return Err(IntersectionError::NoConvergence {
                candidates: failures,
            });
        }
        Ok(result)
    }
}

/// Find all intersections of two curves with default options.
///
/// This allocates a fresh [`IntersectionWorkspace`]; keep one around and
/// call [`IntersectionWorkspace::curve_intersections`] for repeated queries.
pub fn curve_intersections(
    curve1: &BezierCurve,
    curve2: &BezierCurve,
) -> Result<Intersections, IntersectionError> {
    IntersectionWorkspace::new().curve_intersections(curve1, curve2, &IntersectionOpts::default())
}

fn validate(curve: &BezierCurve) -> Result<(), IntersectionError> {
    if curve.is_empty() {
        Err(IntersectionError::EmptyCurve)
    } else if !curve.is_finite() {
        Err(IntersectionError::NonFiniteInput)
    } else {
        Ok(())
    }
}

/// Intersect the chords of a pair of flat sub-curves.
///
/// Collinear chords that meet in a single point give that point as a
/// candidate. An overlap of positive length, or a chord of zero length,
/// is an error.
fn intersect_chords(
    pair: &CandidatePair,
    raw: &mut Vec<(f64, f64)>,
    dedup: f64,
) -> Result<(), IntersectionError> {
    let (Some(chord0), Some(chord1)) = (pair.first.curve.chord(), pair.second.curve.chord())
    else {
        return Ok(());
    };
    let (s, t) = match chord0.crossing_params(&chord1) {
        Some((s, t)) => {
            let range = -CHORD_SLACK..=1.0 + CHORD_SLACK;
            if !range.contains(&s) || !range.contains(&t) {
                return Ok(());
            }
            (s, t)
        }
        None if parallel_different(chord0.p0, chord0.p1, chord1.p0, chord1.p1) => return Ok(()),
        None => match collinear_touch(&chord0, &chord1) {
            Some(touch) => touch,
            None => {
                debug!(
                    "parallel chords overlap: s in {}..{}, t in {}..{}",
                    pair.first.start, pair.first.end, pair.second.start, pair.second.end
                );
                return Err(IntersectionError::ParallelSegments);
            }
        },
    };
    let s = pair.first.param(s);
    let t = pair.second.param(t);
    let seen = raw
        .iter()
        .any(|&(s0, t0)| (s - s0).abs().max((t - t0).abs()) < dedup);
    if !seen {
        raw.push((s, t));
    }
    Ok(())
}

/// The common point of two collinear chords, if they share only one.
///
/// Each chord's extent is projected onto the other. Returns the chord
/// parameters of the shared point when both overlaps are no longer than
/// [`CHORD_SLACK`], and `None` for an overlap of positive length. A chord
/// of zero length is singular and also gives `None`.
fn collinear_touch(chord0: &Line, chord1: &Line) -> Option<(f64, f64)> {
    let overlap = |onto: &Line, other: &Line| {
        let d = onto.p1 - onto.p0;
        let len2 = d.hypot2();
        if len2 == 0.0 {
            return None;
        }
        let u = (other.p0 - onto.p0).dot(d) / len2;
        let v = (other.p1 - onto.p0).dot(d) / len2;
        Some((u.min(v).max(0.0), u.max(v).min(1.0)))
    };
    let (lo0, hi0) = overlap(chord0, chord1)?;
    let (lo1, hi1) = overlap(chord1, chord0)?;
    if hi0 - lo0 > CHORD_SLACK || hi1 - lo1 > CHORD_SLACK {
        return None;
    }
    Some((0.5 * (lo0 + hi0), 0.5 * (lo1 + hi1)))
}

/// Check whether two curves of the same degree share a common segment.
///
/// The endpoints of each curve are located on the other. If that gives
/// exactly two distinct parameter pairs, both curves are restricted to the
/// ranges between them and the control points compared.
///
/// Curves with matching control points, in either direction, coincide
/// entirely. This is checked first since the endpoints of a closed curve
/// locate ambiguously.
fn coincident_ranges(
    curve1: &BezierCurve,
    curve2: &BezierCurve,
    tolerance: f64,
    dedup: f64,
) -> Option<((f64, f64), (f64, f64))> {
    if nodes_close(curve1.nodes(), curve2.nodes(), tolerance) {
        return Some(((0.0, 1.0), (0.0, 1.0)));
    }
    if nodes_close(curve1.nodes(), curve2.subsegment(1.0..0.0).nodes(), tolerance) {
        return Some(((0.0, 1.0), (1.0, 0.0)));
    }
    let mut pairs: ArrayVec<(f64, f64), 4> = ArrayVec::new();
    let mut push = |s: f64, t: f64| {
        if !pairs
            .iter()
            .any(|&(s0, t0)| (s - s0).abs().max((t - t0).abs()) < dedup)
        {
            pairs.push((s, t));
        }
    };
    for (s, pt) in [(0.0, curve1.start()), (1.0, curve1.end())] {
        if let Some(t) = curve2.locate(pt) {
            push(s, t);
        }
    }
    for (t, pt) in [(0.0, curve2.start()), (1.0, curve2.end())] {
        if let Some(s) = curve1.locate(pt) {
            push(s, t);
        }
    }
    let [(s0, t0), (s1, t1)] = pairs.as_slice() else {
        return None;
    };
    let (s0, t0, s1, t1) = (*s0, *t0, *s1, *t1);
    if (s1 - s0).abs() < dedup || (t1 - t0).abs() < dedup {
        return None;
    }
    let piece1 = curve1.subsegment(s0..s1);
    let piece2 = curve2.subsegment(t0..t1);
    if !nodes_close(piece1.nodes(), piece2.nodes(), tolerance) {
        return None;
    }
    if s0 <= s1 {
        Some(((s0, s1), (t0, t1)))
    } else {
        Some(((s1, s0), (t1, t0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment_intersection;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_near(x: f64, y: f64, epsilon: f64) {
        assert!((x - y).abs() < epsilon, "{x} != {y}");
    }

    fn line(p0: (f64, f64), p1: (f64, f64)) -> BezierCurve {
        BezierCurve::new([p0, p1])
    }

    fn s_curve() -> BezierCurve {
        // y = 6 s (1 - s) (1 - 2 s) over x = 3 s; zero at s = 0, 0.5, 1.
        BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, -2.0), (3.0, 0.0)])
    }

    #[test]
    fn crossing_lines() {
        let c1 = line((0.0, 0.0), (1.0, 1.0));
        let c2 = line((0.0, 1.0), (1.0, 0.0));
        let result = curve_intersections(&c1, &c2).unwrap();
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.len(), 1);
        let hit = result.as_slice()[0];
        assert_near(hit.s, 0.5, 1e-14);
        assert_near(hit.t, 0.5, 1e-14);
        assert_near(hit.point.x, 0.5, 1e-14);
        assert_near(hit.point.y, 0.5, 1e-14);
    }

    #[test]
    fn three_crossings() {
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let result = curve_intersections(&s_curve(), &axis).unwrap();
        let mut params: Vec<(f64, f64)> = result.iter().map(|p| (p.s, p.t)).collect();
        params.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(params.len(), 3, "{params:?}");
        for (&(s, t), expected) in params.iter().zip([0.0, 0.5, 1.0]) {
            assert_near(s, expected, 1e-12);
            assert_near(t, expected, 1e-12);
        }
    }

    #[test]
    fn round_trip_distance() {
        // Both curves have x = 3 s, so intersections have s = t; the
        // difference of the y coordinates changes sign over [0, 1].
        let c1 = BezierCurve::new([(0.0, 0.0), (1.0, 3.0), (2.0, -3.0), (3.0, 1.0)]);
        let c2 = BezierCurve::new([(0.0, 1.0), (1.0, -2.0), (2.0, 3.0), (3.0, -1.0)]);
        let result = curve_intersections(&c1, &c2).unwrap();
        assert!(!result.is_empty());
        for hit in &result {
            assert!((0.0..=1.0).contains(&hit.s));
            assert!((0.0..=1.0).contains(&hit.t));
            assert!(c1.eval(hit.s).distance(c2.eval(hit.t)) < 1e-9);
            assert_near(hit.s, hit.t, 1e-9);
        }
    }

    #[test]
    fn disjoint_curves_skip_newton() {
        let c1 = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let c2 = BezierCurve::new([(0.0, 5.0), (1.0, 7.0), (2.0, 5.0)]);
        let mut workspace = IntersectionWorkspace::new();
        let result = workspace
            .curve_intersections(&c1, &c2, &IntersectionOpts::default())
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.status(), Status::NoIntersections);
        assert_eq!(workspace.stats().newton_refinements, 0);
        assert_eq!(workspace.stats().bbox_prunes, 1);
        assert_eq!(workspace.stats().rounds, 1);
    }

    #[test]
    fn tangent_touch() {
        // The arch y = x (2 - x) peaks at (1, 1), where it touches the
        // line y = 1.
        let arch = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let top = line((0.0, 1.0), (2.0, 1.0));
        let mut workspace = IntersectionWorkspace::new();
        let result = workspace
            .curve_intersections(&arch, &top, &IntersectionOpts::default())
            .unwrap();
        assert_eq!(result.len(), 1, "{result:?}");
        let hit = result.as_slice()[0];
        assert_near(hit.s, 0.5, 1e-7);
        assert_near(hit.t, 0.5, 1e-7);
        assert!(workspace.stats().tangent_boxes > 0);
    }

    #[test]
    fn dedup_across_boundaries() {
        // The crossing at s = 0.5 lies on the boundary of the first
        // subdivision, so several pairs see it.
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let result = curve_intersections(&s_curve(), &axis).unwrap();
        let middle = result
            .iter()
            .filter(|p| (p.s - 0.5).abs() < 1e-3)
            .count();
        assert_eq!(middle, 1);
    }

    #[test]
    fn identical_quadratics_coincide() {
        let c = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (3.0, 1.0)]);
        let err = curve_intersections(&c, &c.clone()).unwrap_err();
        assert_eq!(err.status(), Status::Parallel);
        match err {
            IntersectionError::Coincident { first, second } => {
                assert_near(first.0, 0.0, 1e-9);
                assert_near(first.1, 1.0, 1e-9);
                assert_near(second.0, 0.0, 1e-9);
                assert_near(second.1, 1.0, 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlapping_lines_coincide() {
        let c1 = line((0.0, 0.0), (2.0, 0.0));
        let c2 = line((1.0, 0.0), (3.0, 0.0));
        match curve_intersections(&c1, &c2) {
            Err(IntersectionError::Coincident { first, second }) => {
                assert_near(first.0, 0.5, 1e-9);
                assert_near(first.1, 1.0, 1e-9);
                assert_near(second.0, 0.0, 1e-9);
                assert_near(second.1, 0.5, 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parallel_lines() {
        let c1 = line((0.0, 0.0), (1.0, 1.0));
        let c2 = line((0.0, 1.0), (1.0, 2.0));
        let result = curve_intersections(&c1, &c2).unwrap();
        assert!(result.is_empty());

        // Collinear, meeting end to start: a single common point.
        let c3 = line((1.0, 1.0), (2.0, 2.0));
        let result = curve_intersections(&c1, &c3).unwrap();
        assert_eq!(result.len(), 1);
        let hit = result.as_slice()[0];
        assert_eq!((hit.s, hit.t), (1.0, 0.0));
        assert_eq!(hit.point, Point::new(1.0, 1.0));
    }

    #[test]
    fn collinear_overlap() {
        // A line against a collinear quadratic sharing part of it.
        let c1 = line((0.0, 0.0), (2.0, 0.0));
        let c2 = BezierCurve::new([(1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let err = curve_intersections(&c1, &c2).unwrap_err();
        assert_eq!(err, IntersectionError::ParallelSegments);
        assert_eq!(err.status().code(), 3);
    }

    #[test]
    fn tangent_vertices() {
        // Mirror images touching at (1, 1). The flat pieces on either side
        // of the touching point have collinear chords.
        let arch = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let cup = BezierCurve::new([(0.0, 2.0), (1.0, 0.0), (2.0, 2.0)]);
        let mut workspace = IntersectionWorkspace::new();
        let result = workspace
            .curve_intersections(&arch, &cup, &IntersectionOpts::default())
            .unwrap();
        assert_eq!(result.len(), 1, "{result:?}");
        let hit = result.as_slice()[0];
        assert_near(hit.s, 0.5, 1e-7);
        assert_near(hit.t, 0.5, 1e-7);
        assert!(hit.point.distance(Point::new(1.0, 1.0)) < 1e-9);
        assert!(workspace.stats().newton_refinements > 0);
    }

    #[test]
    fn smooth_join() {
        // Two quadratics joined end to start with a common tangent.
        let c1 = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let c2 = BezierCurve::new([(2.0, 0.0), (3.0, -2.0), (4.0, 0.0)]);
        let result = curve_intersections(&c1, &c2).unwrap();
        assert_eq!(result.len(), 1, "{result:?}");
        let hit = result.as_slice()[0];
        assert_near(hit.s, 1.0, 1e-9);
        assert_near(hit.t, 0.0, 1e-9);
        assert!(hit.point.distance(Point::new(2.0, 0.0)) < 1e-9);
    }

    #[test]
    fn point_curve() {
        let c = line((0.0, 0.0), (1.0, 1.0));
        let on = BezierCurve::new([(0.5, 0.5)]);
        let off = BezierCurve::new([(0.5, 0.0)]);
        assert_eq!(
            curve_intersections(&c, &on),
            Err(IntersectionError::ParallelSegments)
        );
        assert!(curve_intersections(&c, &off).unwrap().is_empty());
    }

    #[test]
    fn bad_input() {
        let c = line((0.0, 0.0), (1.0, 1.0));
        let empty = BezierCurve::default();
        let nan = line((0.0, f64::NAN), (1.0, 1.0));
        assert_eq!(
            curve_intersections(&empty, &c),
            Err(IntersectionError::EmptyCurve)
        );
        let err = curve_intersections(&c, &nan).unwrap_err();
        assert_eq!(err, IntersectionError::NonFiniteInput);
        assert_eq!(err.status(), Status::BadInput);
    }

    #[test]
    fn budget_exceeded() {
        // A quadratic against its degree elevation is not caught by the
        // coincidence check, so the overlapping pairs multiply.
        let quad = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        let cubic = BezierCurve::new([
            (0.0, 0.0),
            (2.0 / 3.0, 4.0 / 3.0),
            (4.0 / 3.0, 4.0 / 3.0),
            (2.0, 0.0),
        ]);
        let opts = IntersectionOpts::default().with_max_candidates(256);
        let err = IntersectionWorkspace::new()
            .curve_intersections(&quad, &cubic, &opts)
            .unwrap_err();
        assert_eq!(err.status(), Status::TooManyCandidates);

        let shallow = IntersectionOpts::default().with_max_depth(0);
        let diagonal = line((0.0, 0.0), (3.0, 3.0));
        let err = IntersectionWorkspace::new()
            .curve_intersections(&s_curve(), &diagonal, &shallow)
            .unwrap_err();
        assert_eq!(err, IntersectionError::SubdivisionLimit { depth: 0 });

        // No split is needed for these.
        let far = line((10.0, 10.0), (11.0, 12.0));
        let mut workspace = IntersectionWorkspace::new();
        let result = workspace
            .curve_intersections(&s_curve(), &far, &shallow)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(workspace.stats().bbox_prunes, 1);
        let crossing = line((0.0, 1.0), (1.0, 0.0));
        let result = workspace
            .curve_intersections(&line((0.0, 0.0), (1.0, 1.0)), &crossing, &shallow)
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn closed_curves_coincide() {
        let c = BezierCurve::new([(0.0, 0.0), (3.0, 3.0), (-3.0, 3.0), (0.0, 0.0)]);
        assert_eq!(
            curve_intersections(&c, &c.clone()),
            Err(IntersectionError::Coincident {
                first: (0.0, 1.0),
                second: (0.0, 1.0)
            })
        );
        let reversed = BezierCurve::new([(0.0, 0.0), (-3.0, 3.0), (3.0, 3.0), (0.0, 0.0)]);
        assert_eq!(
            curve_intersections(&c, &reversed),
            Err(IntersectionError::Coincident {
                first: (0.0, 1.0),
                second: (1.0, 0.0)
            })
        );
    }

    #[test]
    fn refinement_failures() {
        // Without iterations and with no slack, no approximate crossing
        // is good enough.
        let strict = IntersectionOpts::default()
            .with_newton_max_iterations(0)
            .with_point_tolerance(0.0);
        let c1 = BezierCurve::new([(0.0, 0.0), (1.0, 3.0), (2.0, -3.0), (3.0, 1.0)]);
        let c2 = BezierCurve::new([(0.0, 1.0), (1.0, -2.0), (2.0, 3.0), (3.0, -1.0)]);
        let mut workspace = IntersectionWorkspace::new();
        let err = workspace.curve_intersections(&c1, &c2, &strict).unwrap_err();
        assert!(
            matches!(err, IntersectionError::NoConvergence { candidates } if candidates > 0),
            "{err:?}"
        );
        assert_eq!(err.status(), Status::NoConvergence);
        assert!(workspace.stats().newton_failures > 0);

        // y = s meets the wave exactly at the shared start point, and at
        // s = (9 - sqrt(21)) / 12 only approximately. The exact one is
        // still reported.
        let slope = line((0.0, 0.0), (3.0, 1.0));
        let result = workspace
            .curve_intersections(&s_curve(), &slope, &strict)
            .unwrap();
        assert_eq!(result.len(), 1, "{result:?}");
        let hit = result.as_slice()[0];
        assert_eq!((hit.s, hit.t), (0.0, 0.0));
        assert!(workspace.stats().newton_failures > 0);
    }

    #[test]
    fn idempotent_with_reuse() {
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let mut workspace = IntersectionWorkspace::new();
        let opts = IntersectionOpts::default();
        let first = workspace.curve_intersections(&s_curve(), &axis, &opts);
        // An unrelated query in between.
        let c1 = line((0.0, 0.0), (1.0, 1.0));
        let c2 = line((0.0, 1.0), (1.0, 0.0));
        workspace.curve_intersections(&c1, &c2, &opts).unwrap();
        let second = workspace.curve_intersections(&s_curve(), &axis, &opts);
        assert_eq!(first, second);
        assert_eq!(first, curve_intersections(&s_curve(), &axis));
    }

    #[test]
    fn free_and_reuse() {
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let mut workspace = IntersectionWorkspace::with_capacity(16);
        assert!(workspace.capacity() >= 16);
        let opts = IntersectionOpts::default();
        let before = workspace.curve_intersections(&s_curve(), &axis, &opts);
        workspace.free();
        assert_eq!(workspace.capacity(), 0);
        assert_eq!(*workspace.stats(), IntersectionStats::default());
        workspace.free();
        let after = workspace.curve_intersections(&s_curve(), &axis, &opts);
        assert_eq!(before, after);
    }

    #[test]
    fn copy_to_buffer() {
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let result = curve_intersections(&s_curve(), &axis).unwrap();
        assert_eq!(result.len(), 3);

        let mut small = [-1.0; 4];
        assert_eq!(
            result.copy_to_slice(&mut small),
            Err(IntersectionError::InsufficientSpace {
                required: 3,
                capacity: 2
            })
        );
        assert_eq!(small, [-1.0; 4]);

        let mut big = [-1.0; 8];
        assert_eq!(result.copy_to_slice(&mut big), Ok(3));
        for (pair, hit) in big.chunks_exact(2).zip(&result) {
            assert_eq!(pair, [hit.s, hit.t]);
        }
        assert_eq!(&big[6..], [-1.0, -1.0]);
    }

    #[test]
    fn hull_pruning() {
        // Force hull pruning on every round; the answer must not change.
        let axis = line((0.0, 0.0), (3.0, 0.0));
        let opts = IntersectionOpts::default().with_hull_prune_threshold(0);
        let mut workspace = IntersectionWorkspace::new();
        let pruned = workspace
            .curve_intersections(&s_curve(), &axis, &opts)
            .unwrap();
        assert_eq!(pruned.len(), 3);
        assert_eq!(
            pruned.len(),
            curve_intersections(&s_curve(), &axis).unwrap().len()
        );
    }

    #[test]
    fn status_codes() {
        let codes = [
            (Status::Success, 0),
            (Status::NoIntersections, 1),
            (Status::TooManyCandidates, 2),
            (Status::Parallel, 3),
            (Status::NoConvergence, 4),
            (Status::InsufficientSpace, 5),
            (Status::BadInput, 6),
        ];
        for (status, code) in codes {
            assert_eq!(status.code(), code);
        }
        assert_eq!(
            IntersectionError::NoConvergence { candidates: 2 }.status(),
            Status::NoConvergence
        );
    }

    #[test]
    fn random_line_pairs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut workspace = IntersectionWorkspace::new();
        let opts = IntersectionOpts::default();
        let rand_pt = |rng: &mut StdRng| (rng.random::<f64>(), rng.random::<f64>());
        for _ in 0..200 {
            let (a0, a1) = (rand_pt(&mut rng), rand_pt(&mut rng));
            let (b0, b1) = (rand_pt(&mut rng), rand_pt(&mut rng));
            let c1 = line(a0, a1);
            let c2 = line(b0, b1);
            let Some((s, t)) =
                segment_intersection(a0.into(), a1.into(), b0.into(), b1.into())
            else {
                continue;
            };
            let inside = |u: f64| (0.01..=0.99).contains(&u);
            let outside = |u: f64| !(-0.01..=1.01).contains(&u);
            let result = workspace.curve_intersections(&c1, &c2, &opts).unwrap();
            if inside(s) && inside(t) {
                assert_eq!(result.len(), 1);
                let hit = result.as_slice()[0];
                assert_near(hit.s, s, 1e-9);
                assert_near(hit.t, t, 1e-9);
            } else if outside(s) || outside(t) {
                assert!(result.is_empty());
            }
        }
    }
}
