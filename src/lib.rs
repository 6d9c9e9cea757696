pub use arena::{Arena, Body, Contact, Contacts, Wall};
pub use cgmath;
pub use control::{
    LaneKeepingController, LaneKeepingParams, LaneKeepingState, ManualInput, ParkingController,
    ParkingParams, ParkingStage,
};
pub use error::ConfigError;
pub use parking::{ParkingTarget, ParkingTolerances};
pub use simulation::{
    Autopilot, Command, Diagnostics, LaneMetrics, Rig, RigSnapshot, Simulation, SimulationConfig,
};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use track::{Lane, RoadPoint, Track, TrackAttributes};
pub use truck::{CabPose, SensorArray, TrailerPose, Truck, TruckAttributes, SENSOR_COUNT};
pub use util::Interval;

mod arena;
pub mod control;
mod debug;
mod error;
pub mod math;
mod parking;
mod simulation;
pub mod track;
pub mod truck;
mod util;

new_key_type! {
    /// Unique ID of a [Rig].
    pub struct RigId;
}

type RigSet = SlotMap<RigId, Rig>;
