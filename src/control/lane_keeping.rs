use crate::error::{positive, ConfigError};
use crate::track::Track;
use crate::truck::Truck;
use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gains and thresholds of a [LaneKeepingController].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaneKeepingParams {
    /// The speed to hold.
    pub target_speed: f64,
    /// Proportional gain on the lateral error.
    pub kp_lateral: f64,
    /// Proportional gain on the heading error.
    pub kp_heading: f64,
    /// Derivative gain on the lateral error.
    pub kd_lateral: f64,
    /// Lateral errors below this count as centered.
    pub centered_threshold: f64,
    /// Lateral errors above this trigger an emergency correction.
    pub emergency_threshold: f64,
}

impl Default for LaneKeepingParams {
    fn default() -> Self {
        Self {
            target_speed: 120.0,
            kp_lateral: 0.5,
            kp_heading: 2.0,
            kd_lateral: 0.2,
            centered_threshold: 15.0,
            emergency_threshold: 35.0,
        }
    }
}

impl LaneKeepingParams {
    /// Checks the thresholds are positive and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("centered_threshold", self.centered_threshold)?;
        positive("target_speed", self.target_speed)?;
        if !(self.centered_threshold < self.emergency_threshold) {
            return Err(ConfigError::UnorderedThresholds {
                centered: self.centered_threshold,
                emergency: self.emergency_threshold,
            });
        }
        Ok(())
    }
}

/// How far off the centerline a lane-keeping truck is, and which way it is correcting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneKeepingState {
    /// Well within the lane.
    Centered,
    /// Drifted right, steering left.
    CorrectingLeft,
    /// Drifted left, steering right.
    CorrectingRight,
    /// Far to the left.
    EmergencyLeft,
    /// Far to the right.
    EmergencyRight,
}

impl LaneKeepingState {
    /// The display name of the state.
    pub fn name(self) -> &'static str {
        match self {
            LaneKeepingState::Centered => "CENTERED",
            LaneKeepingState::CorrectingLeft => "CORRECTING_LEFT",
            LaneKeepingState::CorrectingRight => "CORRECTING_RIGHT",
            LaneKeepingState::EmergencyLeft => "EMERGENCY_LEFT",
            LaneKeepingState::EmergencyRight => "EMERGENCY_RIGHT",
        }
    }

    /// Whether this state calls for an aggressive correction.
    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            LaneKeepingState::EmergencyLeft | LaneKeepingState::EmergencyRight
        )
    }
}

impl fmt::Display for LaneKeepingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Steers a truck towards the centerline of a lane with a PD law.
#[derive(Clone, Debug)]
pub struct LaneKeepingController {
    params: LaneKeepingParams,
    state: LaneKeepingState,
    enabled: bool,
    /// The index of the lane to follow.
    target_lane: usize,
    /// The lateral error seen on the previous tick, for the derivative term.
    previous_error: f64,
}

/// Corrections no larger than this produce no steering.
const STEER_DEADBAND: f64 = 0.5;

/// The largest steering intent the controller will command.
const MAX_STEER: f64 = 3.0;

/// Speed errors no larger than this are left alone.
const SPEED_TOLERANCE: f64 = 5.0;

/// The throttle used to nudge the speed towards the target.
const SPEED_NUDGE: f64 = 0.5;

/// Emergency states multiply the correction by this.
const EMERGENCY_GAIN: f64 = 2.0;

impl Default for LaneKeepingController {
    fn default() -> Self {
        Self {
            params: LaneKeepingParams::default(),
            state: LaneKeepingState::Centered,
            enabled: false,
            target_lane: 1,
            previous_error: 0.0,
        }
    }
}

impl LaneKeepingController {
    /// Creates a disabled controller following the middle lane of a three-lane track.
    pub fn new(params: LaneKeepingParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &LaneKeepingParams {
        &self.params
    }

    /// The state computed on the last enabled tick.
    pub fn state(&self) -> LaneKeepingState {
        self.state
    }

    /// The display name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.previous_error = 0.0;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.previous_error = 0.0;
    }

    /// Flips between enabled and disabled, returning the new setting.
    pub fn toggle(&mut self) -> bool {
        if self.enabled {
            self.disable();
        } else {
            self.enable();
        }
        info!(
            "Lane keeping {}",
            if self.enabled { "enabled" } else { "disabled" }
        );
        self.enabled
    }

    /// The index of the lane being followed.
    pub fn target_lane(&self) -> usize {
        self.target_lane
    }

    /// Selects the lane to follow. The index is checked against the track on
    /// the next [Self::update].
    pub fn set_target_lane(&mut self, index: usize) {
        if index != self.target_lane {
            info!("Target lane changed to {}", index);
        }
        self.target_lane = index;
    }

    /// The lateral error remembered for the derivative term.
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Classifies a signed lateral error, positive to the right.
    pub fn state_for(&self, lateral_error: f64) -> LaneKeepingState {
        let magnitude = lateral_error.abs();
        let drifted_right = lateral_error > 0.0;
        if magnitude < self.params.centered_threshold {
            LaneKeepingState::Centered
        } else if magnitude > self.params.emergency_threshold {
            if drifted_right {
                LaneKeepingState::EmergencyRight
            } else {
                LaneKeepingState::EmergencyLeft
            }
        } else if drifted_right {
            LaneKeepingState::CorrectingLeft
        } else {
            LaneKeepingState::CorrectingRight
        }
    }

    /// Drives the truck for one time step. Does nothing while disabled.
    ///
    /// # Panics
    /// If the target lane is not on `track`.
    pub fn update(&mut self, truck: &mut Truck, track: &Track, dt: f64) {
        if !self.enabled {
            return;
        }
        let lane = track.lane(self.target_lane);
        let lateral_error = lane.lateral_error(truck);
        let heading_error = lane.heading_error(truck);

        let state = self.state_for(lateral_error);
        if state != self.state {
            debug!("Lane keeping {} -> {}", self.state, state);
            self.state = state;
        }

        let derivative = (lateral_error - self.previous_error) / dt;
        self.previous_error = lateral_error;

        let p = &self.params;
        let mut correction =
            -p.kp_lateral * lateral_error - p.kp_heading * heading_error - p.kd_lateral * derivative;
        if state.is_emergency() {
            correction *= EMERGENCY_GAIN;
        }

        let steer = if correction.abs() > STEER_DEADBAND {
            correction.clamp(-MAX_STEER, MAX_STEER)
        } else {
            0.0
        };

        let speed_error = p.target_speed - truck.speed();
        let throttle = if speed_error.abs() > SPEED_TOLERANCE {
            SPEED_NUDGE.copysign(speed_error)
        } else {
            0.0
        };

        truck.apply_control(throttle, steer, dt);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use crate::track::Lane;
    use crate::truck::TruckAttributes;
    use assert_approx_eq::assert_approx_eq;

    const EPS: f64 = 1e-6;

    fn straight_track() -> Track {
        let lane = Lane::straight(0, 80.0, Point2d::new(0.0, 0.0), 0.0, 3000.0, 5.0).unwrap();
        Track::from_lanes(vec![lane]).unwrap()
    }

    fn controller() -> LaneKeepingController {
        let mut controller = LaneKeepingController::default();
        controller.set_target_lane(0);
        controller.enable();
        controller
    }

    #[test]
    fn thresholds_map_to_states() {
        use LaneKeepingState::*;
        let c = LaneKeepingController::default();
        assert_eq!(c.state_for(15.0 - EPS), Centered);
        assert_eq!(c.state_for(15.0), CorrectingLeft);
        assert_eq!(c.state_for(15.0 + EPS), CorrectingLeft);
        assert_eq!(c.state_for(35.0 - EPS), CorrectingLeft);
        assert_eq!(c.state_for(35.0), CorrectingLeft);
        assert_eq!(c.state_for(35.0 + EPS), EmergencyRight);

        assert_eq!(c.state_for(-15.0 + EPS), Centered);
        assert_eq!(c.state_for(-15.0), CorrectingRight);
        assert_eq!(c.state_for(-35.0), CorrectingRight);
        assert_eq!(c.state_for(-35.0 - EPS), EmergencyLeft);
        assert_eq!(c.state_for(0.0), Centered);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let params = LaneKeepingParams {
            centered_threshold: 40.0,
            ..Default::default()
        };
        assert_eq!(
            LaneKeepingController::new(params).unwrap_err(),
            ConfigError::UnorderedThresholds {
                centered: 40.0,
                emergency: 35.0
            }
        );
    }

    #[test]
    fn enabling_resets_derivative_memory() {
        let track = straight_track();
        let attribs = TruckAttributes::default();
        let mut truck = Truck::new(&attribs, Point2d::new(100.0, 20.0), 0.0, 80.0).unwrap();
        let mut controller = controller();
        controller.update(&mut truck, &track, 0.016);
        assert_approx_eq!(controller.previous_error(), 20.0, 1e-9);
        assert_eq!(controller.state(), LaneKeepingState::CorrectingLeft);

        assert!(!controller.toggle());
        assert_eq!(controller.previous_error(), 0.0);
        controller.enable();
        assert_eq!(controller.previous_error(), 0.0);
    }

    #[test]
    fn disabled_controller_leaves_truck_alone() {
        let track = straight_track();
        let attribs = TruckAttributes::default();
        let mut truck = Truck::new(&attribs, Point2d::new(100.0, 30.0), 0.0, 80.0).unwrap();
        let mut controller = LaneKeepingController::default();
        controller.set_target_lane(0);
        controller.update(&mut truck, &track, 0.016);
        assert_eq!(truck.heading(), 0.0);
        assert_eq!(truck.speed(), 80.0);
        assert_eq!(controller.state(), LaneKeepingState::Centered);
    }

    #[test]
    fn steers_left_when_right_of_centre() {
        let track = straight_track();
        let attribs = TruckAttributes::default();
        let mut truck = Truck::new(&attribs, Point2d::new(100.0, 40.0), 0.0, 80.0).unwrap();
        let mut controller = controller();
        controller.update(&mut truck, &track, 0.016);
        // Heading decreases when turning left
        assert!(truck.heading() > 180.0);
        assert_eq!(controller.state(), LaneKeepingState::EmergencyRight);
        // Throttle nudges towards 120
        assert_approx_eq!(truck.speed(), 80.0 + 300.0 * 0.016 * 0.5);
    }

    #[test]
    fn small_corrections_fall_in_the_deadband() {
        let track = straight_track();
        let attribs = TruckAttributes::default();
        let fresh = || Truck::new(&attribs, Point2d::new(100.0, 0.5), 0.0, 120.0).unwrap();
        let mut controller = controller();
        // Prime the derivative term so the next tick sees no change
        controller.update(&mut fresh(), &track, 0.016);
        let mut truck = fresh();
        controller.update(&mut truck, &track, 0.016);
        // -0.5 * 0.5 = -0.25, inside the deadband
        assert_eq!(truck.heading(), 0.0);
        assert_eq!(truck.speed(), 120.0);
    }
}
