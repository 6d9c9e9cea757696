//! Angle helpers. All angles are in degrees, measured clockwise from the
//! positive x-axis with the y-axis pointing down (screen convention).

use super::{Point2d, Vector2d};
use cgmath::{Deg, Rad};

/// Wraps an angle into the range `[0, 360)`.
pub fn normalize_angle_deg(deg: f64) -> f64 {
    if (0.0..360.0).contains(&deg) {
        return deg;
    }
    let wrapped = deg.rem_euclid(360.0);
    // `rem_euclid` rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wraps an angle into the range `(-180, 180]`.
pub fn normalize_angle_signed(deg: f64) -> f64 {
    if deg > -180.0 && deg <= 180.0 {
        return deg;
    }
    let wrapped = normalize_angle_deg(deg);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// A unit vector pointing along the given heading.
pub fn heading_vector(deg: f64) -> Vector2d {
    let rad: Rad<f64> = Deg(deg).into();
    Vector2d::new(rad.0.cos(), rad.0.sin())
}

/// The heading, in `[0, 360)`, of the ray from `from` towards `to`.
pub fn bearing_deg(from: Point2d, to: Point2d) -> f64 {
    let delta = to - from;
    normalize_angle_deg(delta.y.atan2(delta.x).to_degrees())
}
