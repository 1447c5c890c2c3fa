// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersections of Bézier curves.
//!
//! This crate finds all the points where two Bézier curves of any degree
//! meet. Both curves are subdivided round by round, discarding pairs of
//! pieces whose bounding boxes are disjoint, until the surviving pieces are
//! flat enough to be treated as line segments. The crossings of those
//! segments are then polished to full precision with Newton's method.
//!
//! The geometric predicates used along the way, [`linearization_error`],
//! [`segment_intersection`], [`parallel_different`] and [`bbox_intersect`],
//! are available on their own, as is the single Newton step
//! [`newton_refine_intersect`].
//!
//! # Examples
//!
//! Two crossing diagonals of the unit square:
//! ```
//! use bezier_intersect::{curve_intersections, BezierCurve, Point, Status};
//!
//! let c1 = BezierCurve::new([(0.0, 0.0), (1.0, 1.0)]);
//! let c2 = BezierCurve::new([(0.0, 1.0), (1.0, 0.0)]);
//! let hits = curve_intersections(&c1, &c2).unwrap();
//! assert_eq!(hits.status(), Status::Success);
//! assert_eq!(hits.len(), 1);
//! let hit = hits.as_slice()[0];
//! assert!((hit.s - 0.5).abs() < 1e-12 && (hit.t - 0.5).abs() < 1e-12);
//! assert!(hit.point.distance(Point::new(0.5, 0.5)) < 1e-12);
//! ```
//!
//! Repeated queries can share an [`IntersectionWorkspace`], which keeps
//! its buffers between calls, and write the parameters into a flat buffer:
//! ```
//! use bezier_intersect::{BezierCurve, IntersectionOpts, IntersectionWorkspace};
//!
//! let wave = BezierCurve::new([(0.0, 0.0), (1.0, 2.0), (2.0, -2.0), (3.0, 0.0)]);
//! let axis = BezierCurve::new([(0.0, 0.0), (3.0, 0.0)]);
//! let mut workspace = IntersectionWorkspace::new();
//! let hits = workspace
//!     .curve_intersections(&wave, &axis, &IntersectionOpts::default())
//!     .unwrap();
//! assert_eq!(hits.len(), 3);
//!
//! let mut params = [0.0; 6];
//! assert_eq!(hits.copy_to_slice(&mut params), Ok(3));
//! workspace.free();
//! ```
//!
//! # Feature Flags
//!
//! The following crate [feature flags](https://doc.rust-lang.org/cargo/reference/features.html#dependency-features) are available:
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm][].
//!   This is useful for `no_std` environments.
//!   However, note that the `libm` crate is not as efficient as the standard library.
//! - `mint`: Enable `From`/`Into` conversion of points and vectors with [mint][] types.
//! - `euclid`: Enable `From`/`Into` conversion of points, vectors and rectangles with
//!   [euclid][] types.
//! - `serde`: Implement `serde::Deserialize` and `serde::Serialize` on curves, options
//!   and results.
//! - `schemars`: Add best-effort support for using these types in JSON schemas using
//!   [schemars][].
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//! Note that this crate does require that an allocator is available (i.e. it uses [alloc]).
//!
//! # Logging
//!
//! Progress is reported through the [log][] facade: each subdivision round
//! at the `trace` level, and exceeded budgets, failed refinements and
//! coincident curves at the `debug` level. No logger is installed.
//!
//! [libm]: https://docs.rs/libm
//! [mint]: https://docs.rs/mint
//! [euclid]: https://docs.rs/euclid
//! [schemars]: https://docs.rs/schemars
//! [log]: https://docs.rs/log

// LINEBENDER LINT SET - lib.rs - v1
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![allow(
    clippy::many_single_char_names,
    clippy::excessive_precision,
    reason = "numeric code with short names and exact constants"
)]
#![allow(
    trivial_numeric_casts,
    clippy::cast_possible_truncation,
    clippy::exhaustive_enums,
    clippy::match_same_arms,
    clippy::shadow_unrelated,
    clippy::missing_assert_message,
    clippy::return_self_not_must_use,
    reason = "deferred from the Linebender lint set"
)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("bezier-intersect requires either the `std` or `libm` feature");

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use libm as _;

extern crate alloc;

mod bezier;
pub mod common;
mod curve_intersections;
mod hull;
mod line;
mod newton;
mod param_curve;
mod point;
mod rect;
mod vec2;

#[cfg(feature = "euclid")]
mod interop_euclid;

pub use crate::bezier::{linearization_error, BezierCurve};
pub use crate::curve_intersections::{
    curve_intersections, Intersection, IntersectionError, IntersectionOpts, IntersectionStats,
    IntersectionWorkspace, Intersections, Status,
};
pub use crate::line::{parallel_different, segment_intersection, Line};
pub use crate::newton::newton_refine_intersect;
pub use crate::param_curve::{ParamCurve, ParamCurveDeriv};
pub use crate::point::Point;
pub use crate::rect::{bbox_intersect, BoxIntersection, Rect};
pub use crate::vec2::Vec2;
