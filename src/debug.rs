//! Optional capture of per-frame debug geometry, enabled by the `debug` feature.
//!
//! Without the feature every function here compiles to nothing.

use crate::math::Point2d;
#[cfg(feature = "debug")]
use serde::Serialize;

/// A primitive recorded for the current frame.
#[cfg(feature = "debug")]
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DebugShape {
    Line {
        name: &'static str,
        p1: [f64; 2],
        p2: [f64; 2],
    },
    Circle {
        name: &'static str,
        centre: [f64; 2],
        radius: f64,
    },
}

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<DebugShape>> = Default::default();
);

#[allow(unused)]
pub fn debug_line(name: &'static str, p1: Point2d, p2: Point2d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(DebugShape::Line {
            name,
            p1: [p1.x, p1.y],
            p2: [p2.x, p2.y],
        })
    })
}

#[allow(unused)]
pub fn debug_circle(name: &'static str, centre: Point2d, radius: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(DebugShape::Circle {
            name,
            centre: [centre.x, centre.y],
            radius,
        })
    })
}

/// Drains the shapes recorded since the last call into a JSON array.
#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    let shapes = DEBUG_FRAME.with(|frame| frame.take());
    serde_json::to_value(shapes).unwrap_or_default()
}
