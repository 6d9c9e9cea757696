use super::wheel_direction;
use crate::debug::debug_circle;
use crate::math::{bearing_deg, normalize_angle_signed, Point2d};
use crate::parking::ParkingTarget;
use crate::truck::Truck;
use cgmath::MetricSpace;
use log::info;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speeds, distances and tolerances of a [ParkingController].
///
/// Angles are in degrees. Speeds are magnitudes; the controller picks the direction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParkingParams {
    /// How far in front of the bay the approach ends.
    pub approach_distance: f64,
    /// The approach finishes within this radius of the approach point.
    pub approach_radius: f64,
    pub approach_speed: f64,
    /// Bearing errors smaller than this are not corrected on the approach.
    pub approach_deadband: f64,
    /// Any sensor closer than this slows the approach.
    pub approach_clearance: f64,
    pub cautious_speed: f64,
    pub cautious_deadband: f64,
    pub align_speed: f64,
    /// Reversing starts once the heading error is below this.
    pub align_tolerance: f64,
    pub reverse_speed: f64,
    /// Cab-trailer angles beyond this take priority over heading corrections.
    pub jackknife_limit: f64,
    /// Heading errors smaller than this are not corrected while reversing.
    pub reverse_deadband: f64,
    /// Any sensor closer than this stops the truck while reversing.
    pub reverse_clearance: f64,
    /// Fine adjustment starts within this radius of the bay...
    pub adjust_radius: f64,
    /// ...and this heading error.
    pub adjust_tolerance: f64,
    pub adjust_reverse_speed: f64,
    pub adjust_forward_speed: f64,
    /// Within this radius of the bay only the heading is corrected.
    pub settle_radius: f64,
    /// Heading errors smaller than this leave the truck at rest.
    pub settle_deadband: f64,
}

impl Default for ParkingParams {
    fn default() -> Self {
        Self {
            approach_distance: 150.0,
            approach_radius: 50.0,
            approach_speed: 100.0,
            approach_deadband: 10.0,
            approach_clearance: 30.0,
            cautious_speed: 50.0,
            cautious_deadband: 5.0,
            align_speed: 15.0,
            align_tolerance: 15.0,
            reverse_speed: 60.0,
            jackknife_limit: 30.0,
            reverse_deadband: 5.0,
            reverse_clearance: 25.0,
            adjust_radius: 30.0,
            adjust_tolerance: 15.0,
            adjust_reverse_speed: 30.0,
            adjust_forward_speed: 15.0,
            settle_radius: 10.0,
            settle_deadband: 3.0,
        }
    }
}

/// The stages of a reverse parking maneuver, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParkingStage {
    /// Driving to a point in front of the bay.
    #[default]
    Approach,
    /// Turning to face along the bay.
    Align,
    /// Reversing into the bay.
    BackIn,
    /// Creeping to the final pose.
    Adjust,
    /// Done.
    Parked,
}

impl ParkingStage {
    /// The display name of the stage.
    pub fn name(self) -> &'static str {
        match self {
            ParkingStage::Approach => "APPROACH",
            ParkingStage::Align => "ALIGN",
            ParkingStage::BackIn => "BACK_IN",
            ParkingStage::Adjust => "ADJUST",
            ParkingStage::Parked => "PARKED",
        }
    }
}

impl fmt::Display for ParkingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stage asks of the truck for one tick.
#[derive(Clone, Copy, Debug)]
struct Maneuver {
    /// The speed to set, if any.
    speed: Option<f64>,
    /// The desired heading change; only its sign is used.
    turn: f64,
}

impl Maneuver {
    /// Leave the truck as it is.
    const COAST: Self = Self {
        speed: None,
        turn: 0.0,
    };

    fn drive(speed: f64, turn: f64) -> Self {
        Self {
            speed: Some(speed),
            turn,
        }
    }
}

/// Backs a truck into a [ParkingTarget] through a fixed sequence of stages.
#[derive(Clone, Debug, Default)]
pub struct ParkingController {
    params: ParkingParams,
    stage: ParkingStage,
    enabled: bool,
}

impl ParkingController {
    /// Creates a disabled controller.
    pub fn new(params: ParkingParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &ParkingParams {
        &self.params
    }

    /// The current stage.
    pub fn stage(&self) -> ParkingStage {
        self.stage
    }

    /// The display name of the current stage.
    pub fn state_name(&self) -> &'static str {
        self.stage.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables the controller and restarts the maneuver from the approach.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.stage = ParkingStage::Approach;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Flips between enabled and disabled, returning the new setting.
    pub fn toggle(&mut self) -> bool {
        if self.enabled {
            self.disable();
        } else {
            self.enable();
        }
        info!(
            "Parking autopilot {}",
            if self.enabled { "enabled" } else { "disabled" }
        );
        self.enabled
    }

    /// The point the approach stage drives towards.
    pub fn approach_point(&self, target: &ParkingTarget) -> Point2d {
        target.point_ahead(self.params.approach_distance)
    }

    /// Drives the truck for one time step. Does nothing while disabled.
    ///
    /// The target is evaluated first, so the truck counts as parked as soon
    /// as it meets the target's tolerances, whatever stage it was in.
    pub fn update(&mut self, truck: &mut Truck, target: &mut ParkingTarget, dt: f64) {
        if !self.enabled {
            return;
        }
        if target.evaluate(truck) {
            self.transition(ParkingStage::Parked);
            return;
        }

        let maneuver = match self.stage {
            ParkingStage::Approach => self.approach(truck, target),
            ParkingStage::Align => self.align(truck, target),
            ParkingStage::BackIn => self.back_in(truck, target),
            ParkingStage::Adjust => self.adjust(truck, target),
            ParkingStage::Parked => return,
        };

        if let Some(speed) = maneuver.speed {
            truck.set_speed(speed);
        }
        let steer = wheel_direction(maneuver.turn, maneuver.speed.unwrap_or(truck.speed()));
        truck.apply_control(0.0, steer, dt);
    }

    fn transition(&mut self, stage: ParkingStage) {
        if stage != self.stage {
            info!("State: {} -> {}", self.stage, stage);
            self.stage = stage;
        }
    }

    fn approach(&mut self, truck: &Truck, target: &ParkingTarget) -> Maneuver {
        let p = self.params;
        let point = self.approach_point(target);
        debug_circle("approach point", point, p.approach_radius);

        if truck.position().distance(point) < p.approach_radius {
            self.transition(ParkingStage::Align);
            return Maneuver::COAST;
        }

        let bearing_error =
            normalize_angle_signed(bearing_deg(truck.position(), point) - truck.heading());
        let (speed, deadband) = if truck.sensors().any_below(p.approach_clearance) {
            (p.cautious_speed, p.cautious_deadband)
        } else {
            (p.approach_speed, p.approach_deadband)
        };
        let turn = if bearing_error.abs() > deadband {
            bearing_error
        } else {
            0.0
        };
        Maneuver::drive(speed, turn)
    }

    fn align(&mut self, truck: &Truck, target: &ParkingTarget) -> Maneuver {
        let heading_error = target.heading_error(truck);
        if heading_error.abs() < self.params.align_tolerance {
            self.transition(ParkingStage::BackIn);
            return Maneuver::COAST;
        }
        Maneuver::drive(self.params.align_speed, heading_error)
    }

    fn back_in(&mut self, truck: &Truck, target: &ParkingTarget) -> Maneuver {
        let p = self.params;
        let heading_error = target.heading_error(truck);
        let jackknife = truck.jackknife_angle();

        let turn = if jackknife.abs() > p.jackknife_limit {
            // Turning the cab towards the trailer shrinks the angle between them
            -jackknife
        } else if heading_error.abs() > p.reverse_deadband {
            heading_error
        } else {
            0.0
        };
        let mut maneuver = Maneuver::drive(-p.reverse_speed, turn);

        if target.position_error(truck) < p.adjust_radius
            && heading_error.abs() < p.adjust_tolerance
        {
            self.transition(ParkingStage::Adjust);
        }
        if truck.sensors().any_below(p.reverse_clearance) {
            maneuver.speed = Some(0.0);
        }
        maneuver
    }

    fn adjust(&mut self, truck: &Truck, target: &ParkingTarget) -> Maneuver {
        let p = self.params;
        let heading_error = target.heading_error(truck);
        if target.position_error(truck) > p.settle_radius {
            Maneuver::drive(-p.adjust_reverse_speed, 0.0)
        } else if heading_error.abs() > p.settle_deadband {
            Maneuver::drive(p.adjust_forward_speed, heading_error)
        } else {
            Maneuver::drive(0.0, 0.0)
        }
    }
}
