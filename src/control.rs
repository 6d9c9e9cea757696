//! Autopilots and manual driving.
//!
//! Every driver, human or automatic, ends up calling [Truck::apply_control]
//! with a signed throttle and a signed steering intent, positive to the right.

pub use lane_keeping::{LaneKeepingController, LaneKeepingParams, LaneKeepingState};
pub use parking::{ParkingController, ParkingParams, ParkingStage};

use crate::truck::Truck;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod lane_keeping;
mod parking;

/// The keys currently held by a human driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManualInput {
    pub throttle_up: bool,
    pub throttle_down: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

impl ManualInput {
    /// The throttle implied by the held keys; opposing keys cancel out.
    pub fn throttle(&self) -> f64 {
        axis(self.throttle_down, self.throttle_up)
    }

    /// The steering intent implied by the held keys; opposing keys cancel out.
    pub fn steer(&self) -> f64 {
        axis(self.steer_left, self.steer_right)
    }

    /// Drives the truck for one time step.
    pub fn apply(&self, truck: &mut Truck, dt: f64) {
        truck.apply_control(self.throttle(), self.steer(), dt);
    }
}

fn axis(negative: bool, positive: bool) -> f64 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// The sign of `value`, or zero for zero.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// The steering intent that changes the heading in the direction of
/// `heading_change` while travelling at `speed`.
///
/// Heading changes flip sign in reverse, so the wheels must too.
pub(crate) fn wheel_direction(heading_change: f64, speed: f64) -> f64 {
    sign(heading_change) * sign(speed)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use crate::truck::TruckAttributes;

    #[test]
    fn opposing_keys_cancel() {
        let input = ManualInput {
            throttle_up: true,
            throttle_down: true,
            steer_left: true,
            ..Default::default()
        };
        assert_eq!(input.throttle(), 0.0);
        assert_eq!(input.steer(), -1.0);
    }

    #[test]
    fn manual_steering_turns_left() {
        let mut truck =
            Truck::new(&TruckAttributes::default(), Point2d::new(500.0, 400.0), 90.0, 100.0)
                .unwrap();
        let input = ManualInput {
            steer_left: true,
            ..Default::default()
        };
        input.apply(&mut truck, 0.1);
        assert!(truck.heading() < 90.0);
        assert_eq!(truck.speed(), 100.0);
    }

    #[test]
    fn wheels_flip_in_reverse() {
        assert_eq!(wheel_direction(12.0, 100.0), 1.0);
        assert_eq!(wheel_direction(12.0, -60.0), -1.0);
        assert_eq!(wheel_direction(-3.0, -60.0), 1.0);
        assert_eq!(wheel_direction(5.0, 0.0), 0.0);
    }
}
