use super::{heading_vector, right_normal, Point2d};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a corner of a rotated rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Corner {
    FrontRight,
    FrontLeft,
    BackLeft,
    BackRight,
}

impl Corner {
    /// The corners in the order produced by [rotated_rectangle_corners].
    pub const ALL: [Corner; 4] = [
        Corner::FrontRight,
        Corner::FrontLeft,
        Corner::BackLeft,
        Corner::BackRight,
    ];
}

/// Computes the corners of a rectangle rotated to face `heading_deg`.
///
/// The corners are always returned in the order front-right, front-left,
/// back-left, back-right, where "right" is to the right of an observer
/// facing along the heading.
///
/// # Parameters
/// * `centre` - The centre of the rectangle
/// * `half_length` - Half the extent along the heading
/// * `half_width` - Half the extent across the heading
/// * `heading_deg` - The heading in degrees
pub fn rotated_rectangle_corners(
    centre: Point2d,
    half_length: f64,
    half_width: f64,
    heading_deg: f64,
) -> [Point2d; 4] {
    let fwd = heading_vector(heading_deg) * half_length;
    let right = right_normal(heading_vector(heading_deg)) * half_width;
    [
        centre + fwd + right,
        centre + fwd - right,
        centre - fwd - right,
        centre - fwd + right,
    ]
}
