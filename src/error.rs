//! Errors raised while validating simulation configuration.

use thiserror::Error;

/// A configuration value that would make the simulation ill-defined.
///
/// These are checked once, when a truck, arena, track or controller is
/// constructed; the per-tick code assumes they hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A hitch arm must have positive length, otherwise the trailer's
    /// angular velocity is undefined.
    #[error("hitch offset `{name}` must be positive, got {value}")]
    NonPositiveHitchArm {
        /// Which offset was invalid.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Friction is a per-tick speed multiplier and must lie in `(0, 1]`.
    #[error("friction must lie in (0, 1], got {0}")]
    FrictionOutOfRange(f64),

    /// A dimension, speed or rate that must be strictly positive.
    #[error("`{name}` must be positive, got {value}")]
    NonPositive {
        /// Which parameter was invalid.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The walls leave no interior space.
    #[error("arena of {width}x{height} has no interior with walls {wall_thickness} thick")]
    ArenaTooSmall {
        width: f64,
        height: f64,
        wall_thickness: f64,
    },

    /// A lane needs at least two centerline points.
    #[error("lane centerline needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// A track needs at least one lane.
    #[error("track has no lanes")]
    NoLanes,

    /// The oval does not fit inside the arena.
    #[error("track radii ({radius_x}, {radius_y}) must be positive")]
    TrackDoesNotFit { radius_x: f64, radius_y: f64 },

    /// Lane keeping thresholds must satisfy `0 <= centered < emergency`.
    #[error("lane keeping thresholds must satisfy 0 <= centered ({centered}) < emergency ({emergency})")]
    UnorderedThresholds { centered: f64, emergency: f64 },
}

/// Checks that `value` is strictly positive.
pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
