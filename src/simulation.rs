use crate::arena::{Arena, Contact, Contacts};
use crate::control::{
    LaneKeepingController, LaneKeepingParams, ManualInput, ParkingController, ParkingParams,
};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::error::ConfigError;
use crate::math::Point2d;
use crate::parking::ParkingTarget;
use crate::track::{Track, TrackAttributes};
use crate::truck::{CabPose, TrailerPose, Truck, TruckAttributes, SENSOR_COUNT};
use crate::{RigId, RigSet};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance between the demo trucks' spawn points and the arena's top and bottom edges.
const DEMO_SPAWN_INSET: f64 = 80.0;

/// Gap between the parking demo's trailer tail and the left wall.
const PARKING_SPAWN_CLEARANCE: f64 = 40.0;

/// Everything needed to build a [Simulation].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// The outer width of the arena.
    pub width: f64,
    /// The outer height of the arena.
    pub height: f64,
    /// The thickness of the arena walls.
    pub wall_thickness: f64,
    /// The attributes shared by every truck.
    pub truck: TruckAttributes,
    /// The layout of the oval track.
    pub track: TrackAttributes,
    /// Gains for the lane-keeping autopilots.
    pub lane_keeping: LaneKeepingParams,
    /// Speeds and tolerances for the parking autopilots.
    pub parking: ParkingParams,
    /// Seeds the generator used to place parking targets.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
            wall_thickness: 20.0,
            truck: TruckAttributes::default(),
            track: TrackAttributes::default(),
            lane_keeping: LaneKeepingParams::default(),
            parking: ParkingParams::default(),
            seed: 0,
        }
    }
}

/// A discrete user command, applied to the player's rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Switch between manual driving and the autopilot.
    ToggleAutonomy,
    /// Follow a different lane. Ignored by parking rigs.
    SelectLane(usize),
    /// Put the player's rig back where it started and clear the lane metrics.
    Reset,
}

/// The autopilot fitted to a rig.
#[derive(Clone, Debug)]
pub enum Autopilot {
    LaneKeeping(LaneKeepingController),
    Parking {
        controller: ParkingController,
        target: ParkingTarget,
    },
}

impl Autopilot {
    /// Whether the autopilot is driving.
    pub fn is_enabled(&self) -> bool {
        match self {
            Autopilot::LaneKeeping(controller) => controller.is_enabled(),
            Autopilot::Parking { controller, .. } => controller.is_enabled(),
        }
    }

    /// The display name of the autopilot's state.
    pub fn state_name(&self) -> &'static str {
        match self {
            Autopilot::LaneKeeping(controller) => controller.state_name(),
            Autopilot::Parking { controller, .. } => controller.state_name(),
        }
    }

    fn toggle(&mut self) -> bool {
        match self {
            Autopilot::LaneKeeping(controller) => controller.toggle(),
            Autopilot::Parking { controller, .. } => controller.toggle(),
        }
    }
}

/// A truck together with its autopilot.
#[derive(Clone, Debug)]
pub struct Rig {
    truck: Truck,
    autopilot: Autopilot,
    /// The wall contacts found on the last tick.
    contacts: Contacts,
    /// The rig as it was added, restored on reset.
    initial: Box<(Truck, Autopilot)>,
}

impl Rig {
    fn new(truck: Truck, autopilot: Autopilot) -> Self {
        let initial = Box::new((truck.clone(), autopilot.clone()));
        Self {
            truck,
            autopilot,
            contacts: Contacts::new(),
            initial,
        }
    }

    pub fn truck(&self) -> &Truck {
        &self.truck
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    /// The wall contacts found on the last tick.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// The lane-keeping controller, if this rig has one.
    pub fn lane_keeping(&self) -> Option<&LaneKeepingController> {
        match &self.autopilot {
            Autopilot::LaneKeeping(controller) => Some(controller),
            Autopilot::Parking { .. } => None,
        }
    }

    /// The parking target, if this rig is parking.
    pub fn parking_target(&self) -> Option<&ParkingTarget> {
        match &self.autopilot {
            Autopilot::LaneKeeping(_) => None,
            Autopilot::Parking { target, .. } => Some(target),
        }
    }

    /// Replaces the truck and autopilot with fresh copies of the originals.
    fn reset(&mut self) {
        let (truck, autopilot) = self.initial.as_ref().clone();
        self.truck = truck;
        self.autopilot = autopilot;
        self.contacts.clear();
    }

    /// Runs the autopilot, or the manual input if the autopilot is off.
    fn drive(&mut self, track: &Track, manual: Option<&ManualInput>, dt: f64) {
        match &mut self.autopilot {
            Autopilot::LaneKeeping(controller) if controller.is_enabled() => {
                controller.update(&mut self.truck, track, dt);
            }
            Autopilot::Parking { controller, target } if controller.is_enabled() => {
                controller.update(&mut self.truck, target, dt);
            }
            Autopilot::LaneKeeping(_) => {
                if let Some(input) = manual {
                    input.apply(&mut self.truck, dt);
                }
            }
            Autopilot::Parking { target, .. } => {
                if let Some(input) = manual {
                    input.apply(&mut self.truck, dt);
                }
                target.evaluate(&self.truck);
            }
        }
    }
}

/// How well the player keeps to their lane.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneMetrics {
    /// The total distance driven.
    pub distance: f64,
    /// Seconds spent inside the target lane.
    pub time_in_lane: f64,
    /// Seconds spent outside the target lane.
    pub time_out_of_lane: f64,
    /// The number of times the truck left the target lane.
    pub departures: usize,
    /// Whether the truck was in its lane on the previous tick.
    was_in_lane: bool,
}

impl Default for LaneMetrics {
    fn default() -> Self {
        Self {
            distance: 0.0,
            time_in_lane: 0.0,
            time_out_of_lane: 0.0,
            departures: 0,
            was_in_lane: true,
        }
    }
}

impl LaneMetrics {
    /// Accumulates one tick.
    pub fn record(&mut self, speed: f64, in_lane: bool, dt: f64) {
        self.distance += speed.abs() * dt;
        if in_lane {
            self.time_in_lane += dt;
        } else {
            self.time_out_of_lane += dt;
            if self.was_in_lane {
                self.departures += 1;
            }
        }
        self.was_in_lane = in_lane;
    }

    /// The share of recorded time spent in lane, as a percentage.
    pub fn in_lane_percentage(&self) -> f64 {
        let total = self.time_in_lane + self.time_out_of_lane;
        if total > 0.0 {
            100.0 * self.time_in_lane / total
        } else {
            0.0
        }
    }
}

/// What an autopilot is measuring against.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Diagnostics {
    Lane {
        /// The index of the target lane.
        lane: usize,
        lateral_error: f64,
        heading_error: f64,
        distance_to_left_edge: f64,
        distance_to_right_edge: f64,
        in_lane: bool,
    },
    Parking {
        target_x: f64,
        target_y: f64,
        target_angle: f64,
        position_error: f64,
        angle_error: f64,
        parked: bool,
    },
}

/// A read-only view of a rig for display.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigSnapshot {
    pub id: RigId,
    pub cab: CabPose,
    pub trailer: TrailerPose,
    pub sensors: [f64; SENSOR_COUNT],
    /// The display name of the autopilot's state.
    pub state: String,
    pub autonomous: bool,
    pub colliding: bool,
    pub diagnostics: Diagnostics,
}

/// A fleet of articulated trucks driving around a walled arena.
pub struct Simulation {
    /// The configuration the simulation was built from.
    config: SimulationConfig,
    /// The walls.
    arena: Arena,
    /// The lanes followed by lane-keeping rigs.
    track: Track,
    /// The rigs being simulated.
    rigs: RigSet,
    /// The rig driven by commands and manual input.
    player: Option<RigId>,
    /// The keys currently held by the player.
    manual: ManualInput,
    /// Lane-keeping performance of the player.
    metrics: LaneMetrics,
    /// Places parking targets.
    rng: StdRng,
    /// The current frame of simulation.
    frame: usize,
    /// The elapsed simulated time in s.
    time: f64,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates an empty simulation.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.truck.validate()?;
        config.lane_keeping.validate()?;
        let arena = Arena::new(config.width, config.height, config.wall_thickness)?;
        let track = Track::oval(&arena, &config.track)?;
        Ok(Self {
            config,
            arena,
            track,
            rigs: RigSet::with_key(),
            player: None,
            manual: ManualInput::default(),
            metrics: LaneMetrics::default(),
            rng: StdRng::seed_from_u64(config.seed),
            frame: 0,
            time: 0.0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// Creates the lane-keeping scenario: a manually driven player on the
    /// bottom of the oval, and two autonomous trucks on the outer lanes.
    pub fn lane_keeping_demo(config: SimulationConfig) -> Result<Self, ConfigError> {
        let mut sim = Self::new(config)?;
        let centre = sim.arena.centre();
        let half_height = 0.5 * config.height;

        let player = sim.add_lane_keeper(
            Point2d::new(centre.x, half_height + (half_height - DEMO_SPAWN_INSET)),
            180.0,
            0.0,
            1,
            false,
        )?;
        sim.set_player(player);

        let top = Point2d::new(centre.x, half_height - (half_height - DEMO_SPAWN_INSET));
        let last_lane = sim.track.lane_count() - 1;
        sim.add_lane_keeper(top, 0.0, 80.0, 0, true)?;
        sim.add_lane_keeper(top, 0.0, 80.0, last_lane, true)?;
        Ok(sim)
    }

    /// Creates the parking scenario: one autonomous truck and a parking
    /// target placed from the configured seed.
    pub fn parking_demo(config: SimulationConfig) -> Result<Self, ConfigError> {
        let mut sim = Self::new(config)?;
        let target =
            ParkingTarget::random(&mut sim.rng, &sim.arena, config.parking.approach_distance);
        let tail = config.truck.rig_length() + 0.5 * config.truck.trailer_length;
        let start = Point2d::new(
            sim.arena.x_bounds().min + tail + PARKING_SPAWN_CLEARANCE,
            sim.arena.centre().y,
        );
        let truck = Truck::new(&config.truck, start, 0.0, 0.0)?;
        let mut controller = ParkingController::new(config.parking);
        controller.enable();
        info!(
            "Parking target at ({:.0}, {:.0}), facing {}",
            target.position().x,
            target.position().y,
            target.angle()
        );
        let id = sim.add_rig(truck, Autopilot::Parking { controller, target });
        sim.set_player(id);
        Ok(sim)
    }

    /// Adds a rig to the simulation. It is simulated after every rig added before it.
    pub fn add_rig(&mut self, truck: Truck, autopilot: Autopilot) -> RigId {
        self.rigs.insert(Rig::new(truck, autopilot))
    }

    /// Adds a truck with a lane-keeping autopilot.
    pub fn add_lane_keeper(
        &mut self,
        pos: Point2d,
        heading: f64,
        speed: f64,
        lane: usize,
        enabled: bool,
    ) -> Result<RigId, ConfigError> {
        assert!(lane < self.track.lane_count(), "no lane {}", lane);
        let truck = Truck::new(&self.config.truck, pos, heading, speed)?;
        let mut controller = LaneKeepingController::new(self.config.lane_keeping)?;
        controller.set_target_lane(lane);
        if enabled {
            controller.enable();
        }
        Ok(self.add_rig(truck, Autopilot::LaneKeeping(controller)))
    }

    /// Chooses the rig that receives commands and manual input.
    pub fn set_player(&mut self, id: RigId) {
        self.player = Some(id);
    }

    /// The rig that receives commands and manual input.
    pub fn player(&self) -> Option<RigId> {
        self.player
    }

    /// Sets the keys held by the player. They only take effect while the
    /// player's autopilot is off.
    pub fn set_manual_input(&mut self, input: ManualInput) {
        self.manual = input;
    }

    /// Applies a user command to the player's rig.
    ///
    /// # Panics
    /// If `SelectLane` names a lane that isn't on the track.
    pub fn apply_command(&mut self, command: Command) {
        let Some(player) = self.player else {
            return;
        };
        let rig = &mut self.rigs[player];
        match command {
            Command::ToggleAutonomy => {
                rig.autopilot.toggle();
            }
            Command::SelectLane(lane) => {
                assert!(lane < self.track.lane_count(), "no lane {}", lane);
                if let Autopilot::LaneKeeping(controller) = &mut rig.autopilot {
                    controller.set_target_lane(lane);
                }
            }
            Command::Reset => {
                rig.reset();
                self.metrics = LaneMetrics::default();
                info!("System reset");
            }
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Each rig moves, reads its sensors and drives, in the order the rigs
    /// were added. Wall collisions are resolved once every rig has moved.
    ///
    /// # Panics
    /// If `dt` is not positive.
    pub fn step(&mut self, dt: f64) {
        assert!(dt > 0.0, "time step must be positive, got {}", dt);

        for (id, rig) in &mut self.rigs {
            rig.truck.step(dt);
            rig.truck.update_sensors(&self.arena);
            let manual = (Some(id) == self.player).then_some(&self.manual);
            rig.drive(&self.track, manual, dt);
        }
        self.resolve_collisions();
        self.update_metrics(dt);

        self.frame += 1;
        self.time += dt;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The elapsed simulated time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// The player's lane-keeping performance since the last reset.
    pub fn metrics(&self) -> &LaneMetrics {
        &self.metrics
    }

    /// Clears the player's lane-keeping performance.
    pub fn reset_metrics(&mut self) {
        self.metrics = LaneMetrics::default();
    }

    /// Gets a reference to the rig with the given ID.
    pub fn get_rig(&self, id: RigId) -> &Rig {
        &self.rigs[id]
    }

    /// Returns an iterator over all the rigs, in the order they are simulated.
    pub fn iter_rigs(&self) -> impl Iterator<Item = (RigId, &Rig)> {
        self.rigs.iter()
    }

    /// Describes a rig for display.
    pub fn snapshot(&self, id: RigId) -> RigSnapshot {
        let rig = &self.rigs[id];
        let truck = &rig.truck;
        let diagnostics = match &rig.autopilot {
            Autopilot::LaneKeeping(controller) => {
                let lane = self.track.lane(controller.target_lane());
                Diagnostics::Lane {
                    lane: lane.index(),
                    lateral_error: lane.lateral_error(truck),
                    heading_error: lane.heading_error(truck),
                    distance_to_left_edge: lane.distance_to_left_edge(truck),
                    distance_to_right_edge: lane.distance_to_right_edge(truck),
                    in_lane: lane.is_in_lane(truck),
                }
            }
            Autopilot::Parking { target, .. } => Diagnostics::Parking {
                target_x: target.position().x,
                target_y: target.position().y,
                target_angle: target.angle(),
                position_error: target.position_error(truck),
                angle_error: target.angle_error(truck),
                parked: target.is_parked(),
            },
        };
        RigSnapshot {
            id,
            cab: truck.cab_pose(),
            trailer: truck.trailer_pose(),
            sensors: *truck.sensors().distances(),
            state: rig.autopilot.state_name().to_owned(),
            autonomous: rig.autopilot.is_enabled(),
            colliding: truck.is_colliding(),
            diagnostics,
        }
    }

    /// Describes every rig, in the order they are simulated.
    pub fn snapshots(&self) -> Vec<RigSnapshot> {
        self.rigs.keys().map(|id| self.snapshot(id)).collect()
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Pushes every rig back inside the walls.
    fn resolve_collisions(&mut self) {
        for rig in self.rigs.values_mut() {
            rig.contacts = self.arena.resolve_collisions(&mut rig.truck);
        }
    }

    /// Accumulates the player's lane-keeping performance.
    fn update_metrics(&mut self, dt: f64) {
        let Some(rig) = self.player.and_then(|id| self.rigs.get(id)) else {
            return;
        };
        if let Some(controller) = rig.lane_keeping() {
            let lane = self.track.lane(controller.target_lane());
            let in_lane = lane.is_in_lane(&rig.truck);
            self.metrics.record(rig.truck.speed(), in_lane, dt);
        }
    }
}
