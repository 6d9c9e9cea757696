//! Single-hitch tractor-trailer kinematics.
//!
//! The trailer is never integrated on its own: only its heading evolves,
//! and its position is recomputed from the hitch each time it is needed.

use crate::math::{heading_vector, normalize_angle_deg, normalize_angle_signed, Point2d};

/// The point a distance `offset` behind `pos` along `heading_deg`.
pub fn point_behind(pos: Point2d, heading_deg: f64, offset: f64) -> Point2d {
    pos - heading_vector(heading_deg) * offset
}

/// The angular velocity of the trailer in degrees per second.
///
/// # Parameters
/// * `cab_speed` - The signed speed of the cab
/// * `angle_diff` - The cab heading minus the trailer heading, in `(-180, 180]`
/// * `arm` - The distance from the hitch to the trailer's centre
pub fn trailer_yaw_rate(cab_speed: f64, angle_diff: f64, arm: f64) -> f64 {
    ((cab_speed / arm) * angle_diff.to_radians().sin()).to_degrees()
}

/// Advances the trailer heading by one time step.
///
/// The trailer swings towards the cab when driving forward,
/// and away from it when reversing.
pub fn advance_trailer_heading(
    cab_heading: f64,
    trailer_heading: f64,
    cab_speed: f64,
    arm: f64,
    dt: f64,
) -> f64 {
    let angle_diff = normalize_angle_signed(cab_heading - trailer_heading);
    let rate = trailer_yaw_rate(cab_speed, angle_diff, arm);
    normalize_angle_deg(trailer_heading + rate * dt)
}
