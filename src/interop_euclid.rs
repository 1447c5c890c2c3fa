// Copyright 2025 the bezier-intersect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use euclid::UnknownUnit;

impl From<euclid::Vector2D<f64, UnknownUnit>> for crate::Vec2 {
    fn from(value: euclid::Vector2D<f64, UnknownUnit>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<crate::Vec2> for euclid::Vector2D<f64, UnknownUnit> {
    fn from(value: crate::Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<euclid::Point2D<f64, UnknownUnit>> for crate::Point {
    fn from(value: euclid::Point2D<f64, UnknownUnit>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<crate::Point> for euclid::Point2D<f64, UnknownUnit> {
    fn from(value: crate::Point) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<euclid::Box2D<f64, UnknownUnit>> for crate::Rect {
    fn from(value: euclid::Box2D<f64, UnknownUnit>) -> Self {
        Self::from_points(value.min, value.max)
    }
}

impl From<crate::Rect> for euclid::Box2D<f64, UnknownUnit> {
    fn from(value: crate::Rect) -> Self {
        Self::new(
            euclid::Point2D::new(value.x0, value.y0),
            euclid::Point2D::new(value.x1, value.y1),
        )
    }
}
