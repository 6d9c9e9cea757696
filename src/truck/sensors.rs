use crate::arena::Arena;
use crate::debug::debug_line;
use crate::math::{heading_vector, Point2d};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of proximity sensors mounted on the cab.
pub const SENSOR_COUNT: usize = 8;

/// The angle between neighbouring sensors, in degrees.
const SENSOR_SPACING: f64 = 45.0;

/// A ring of ray-cast proximity sensors fixed to the cab.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorArray {
    /// The offset of each sensor from the cab heading, in degrees.
    offsets: [f64; SENSOR_COUNT],
    /// The most recent readings.
    distances: [f64; SENSOR_COUNT],
    /// The distance reported when a ray hits nothing.
    max_range: f64,
}

impl SensorArray {
    /// Creates a sensor array with every reading saturated at `max_range`.
    pub fn new(max_range: f64) -> Self {
        let mut offsets = [0.0; SENSOR_COUNT];
        for (i, offset) in offsets.iter_mut().enumerate() {
            *offset = i as f64 * SENSOR_SPACING;
        }
        Self {
            offsets,
            distances: [max_range; SENSOR_COUNT],
            max_range,
        }
    }

    /// The angular offset of each sensor from the cab heading.
    pub fn offsets(&self) -> &[f64; SENSOR_COUNT] {
        &self.offsets
    }

    /// The latest distance readings, one per sensor.
    pub fn distances(&self) -> &[f64; SENSOR_COUNT] {
        &self.distances
    }

    /// The maximum range of a sensor.
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// The smallest reading across all sensors.
    pub fn min_distance(&self) -> f64 {
        self.distances.iter().copied().fold(self.max_range, f64::min)
    }

    /// Whether any sensor reads closer than `threshold`.
    pub fn any_below(&self, threshold: f64) -> bool {
        self.distances.iter().any(|dist| *dist < threshold)
    }

    /// Casts every ray from `origin` and overwrites all readings.
    ///
    /// Each ray is only tested against the walls it points towards,
    /// and rays which find nothing within range read `max_range`.
    pub(crate) fn update(&mut self, origin: Point2d, heading: f64, arena: &Arena) {
        let xs = arena.x_bounds();
        let ys = arena.y_bounds();

        for (offset, distance) in self.offsets.iter().zip(self.distances.iter_mut()) {
            let dir = heading_vector(heading + offset);
            let mut min_dist = self.max_range;

            let mut hit = |dist: f64| {
                if dist > 0.0 && dist < min_dist {
                    min_dist = dist;
                }
            };
            if dir.x < 0.0 {
                hit((origin.x - xs.min) / -dir.x);
            }
            if dir.x > 0.0 {
                hit((xs.max - origin.x) / dir.x);
            }
            if dir.y < 0.0 {
                hit((origin.y - ys.min) / -dir.y);
            }
            if dir.y > 0.0 {
                hit((ys.max - origin.y) / dir.y);
            }

            *distance = min_dist;
            debug_line("sensor", origin, origin + dir * min_dist);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn arena() -> Arena {
        Arena::new(1400.0, 900.0, 20.0).unwrap()
    }

    #[test]
    fn offsets_are_evenly_spaced() {
        let sensors = SensorArray::new(200.0);
        assert_eq!(sensors.offsets()[0], 0.0);
        assert_eq!(sensors.offsets()[2], 90.0);
        assert_eq!(sensors.offsets()[7], 315.0);
    }

    #[test]
    fn rays_hit_the_nearest_wall() {
        let mut sensors = SensorArray::new(200.0);
        sensors.update(Point2d::new(100.0, 450.0), 0.0, &arena());
        let d = sensors.distances();
        // Forward has nothing in range, backward hits the left wall
        assert_eq!(d[0], 200.0);
        assert_approx_eq!(d[4], 80.0);
        // Diagonally back-left: 80 / cos(45deg)
        assert_approx_eq!(d[3], 80.0 * 2.0_f64.sqrt());
        assert_approx_eq!(sensors.min_distance(), 80.0);
        assert!(sensors.any_below(81.0));
        assert!(!sensors.any_below(80.0 - 1e-6));
    }

    #[test]
    fn open_space_saturates_at_max_range() {
        let mut sensors = SensorArray::new(200.0);
        sensors.update(Point2d::new(700.0, 450.0), 33.0, &arena());
        assert!(sensors.distances().iter().all(|d| *d == 200.0));
    }
}
