// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Common mathematical operations

#![allow(missing_docs)]

#[cfg(not(feature = "std"))]
mod sealed {
    /// A [sealed trait](https://predr.ag/blog/definitive-guide-to-sealed-traits-in-rust/)
    /// which stops [`super::FloatFuncs`] from being implemented outside bezier-intersect.
    pub trait FloatFuncsSealed {}
}

/// Defines a trait that chooses between libstd or libm implementations of float methods.
macro_rules! define_float_funcs {
    ($(
        fn $name:ident(self $(,$arg:ident: $arg_ty:ty)*) -> $ret:ty
        => $lname:ident/$lfname:ident;
    )+) => {

        /// Since core doesn't depend upon libm, this provides libm implementations
        /// of float functions which are typically provided by the std library, when
        /// the `std` feature is not enabled.
        ///
        /// For documentation, see the respective methods on [`f32`] and [`f64`].
        #[cfg(not(feature = "std"))]
        pub trait FloatFuncs : Sized + sealed::FloatFuncsSealed {
            $(fn $name(self $(,$arg: $arg_ty)*) -> $ret;)+
        }

        #[cfg(not(feature = "std"))]
        impl sealed::FloatFuncsSealed for f32 {}

        #[cfg(not(feature = "std"))]
        impl FloatFuncs for f32 {
            $(fn $name(self $(,$arg: $arg_ty)*) -> $ret {
                #[cfg(feature = "libm")]
                return libm::$lfname(self $(,$arg as _)*);

                #[cfg(not(feature = "libm"))]
                compile_error!("bezier-intersect requires either the `std` or `libm` feature")
            })+
        }

        #[cfg(not(feature = "std"))]
        impl sealed::FloatFuncsSealed for f64 {}
        #[cfg(not(feature = "std"))]
        impl FloatFuncs for f64 {
            $(fn $name(self $(,$arg: $arg_ty)*) -> $ret {
                #[cfg(feature = "libm")]
                return libm::$lname(self $(,$arg as _)*);

                #[cfg(not(feature = "libm"))]
                compile_error!("bezier-intersect requires either the `std` or `libm` feature")
            })+
        }
    }
}

define_float_funcs! {
    fn abs(self) -> Self => fabs/fabsf;
    fn hypot(self, other: Self) -> Self => hypot/hypotf;
    fn mul_add(self, a: Self, b: Self) -> Self => fma/fmaf;
    fn sqrt(self) -> Self => sqrt/sqrtf;
}

/// Solve the 2x2 linear system `[a b; c d] * [x; y] = [r0; r1]`.
///
/// Returns `None` when the matrix is singular, including the case where
/// the determinant is so small relative to the entries that the solution
/// would be dominated by roundoff.
///
/// The solve uses partial pivoting on the first column, which keeps the
/// elimination stable for badly scaled rows.
pub fn solve_2x2(a: f64, b: f64, c: f64, d: f64, r0: f64, r1: f64) -> Option<(f64, f64)> {
    // Pivot so that the larger entry of the first column is eliminated against.
    let (a, b, c, d, r0, r1) = if c.abs() > a.abs() {
        (c, d, a, b, r1, r0)
    } else {
        (a, b, c, d, r0, r1)
    };
    let scale = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
    if a == 0.0 || !scale.is_finite() {
        return None;
    }
    let factor = c / a;
    let d_reduced = (-factor).mul_add(b, d);
    if d_reduced.abs() <= SINGULAR_RATIO * scale {
        return None;
    }
    let y = (-factor).mul_add(r0, r1) / d_reduced;
    let x = (-b).mul_add(y, r0) / a;
    if x.is_finite() && y.is_finite() {
        Some((x, y))
    } else {
        None
    }
}

/// Relative size under which a pivot is treated as zero.
///
/// This is a few ulps of the largest matrix entry.
pub const SINGULAR_RATIO: f64 = 4.0 * f64::EPSILON;

/// Snap a parameter that lies within `wiggle` of the unit interval onto it.
///
/// Returns `None` if the value is farther than `wiggle` outside `[0, 1]`.
#[inline]
pub fn wiggle_interval(value: f64, wiggle: f64) -> Option<f64> {
    if (0.0..=1.0).contains(&value) {
        Some(value)
    } else if value < 0.0 && value >= -wiggle {
        Some(0.0)
    } else if value > 1.0 && value <= 1.0 + wiggle {
        Some(1.0)
    } else {
        None
    }
}
