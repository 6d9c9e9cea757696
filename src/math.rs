//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use angle::*;
pub use frame::{right_normal, to_local};
pub use rect::{rotated_rectangle_corners, Corner};

mod angle;
mod frame;
mod rect;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
