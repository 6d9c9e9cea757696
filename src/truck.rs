use self::hitch::{advance_trailer_heading, point_behind};
use crate::arena::Arena;
use crate::error::{positive, ConfigError};
use crate::math::{
    heading_vector, normalize_angle_deg, normalize_angle_signed, rotated_rectangle_corners,
    Point2d, Vector2d,
};
use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use sensors::{SensorArray, SENSOR_COUNT};

mod hitch;
mod sensors;

/// Below this absolute speed the truck cannot turn.
pub const STALL_SPEED: f64 = 10.0;

/// Speeds below this are snapped to zero after friction is applied.
const STOP_SPEED: f64 = 1.0;

/// How long a collision stays flagged, in seconds.
pub const COLLISION_DISPLAY_TIME: f64 = 2.0;

/// The attributes of a simulated truck.
///
/// Lengths are in world units (pixels on screen), speeds in units per second.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TruckAttributes {
    /// The length of the cab.
    pub cab_length: f64,
    /// The width of the cab.
    pub cab_width: f64,
    /// The length of the trailer.
    pub trailer_length: f64,
    /// The width of the trailer.
    pub trailer_width: f64,
    /// Distance from the cab's centre back to the hitch.
    pub hitch_offset_from_cab_rear: f64,
    /// Distance from the hitch back to the trailer's centre.
    pub hitch_offset_from_trailer_front: f64,
    /// The top forward speed. Reverse is capped at half of this.
    pub max_speed: f64,
    /// Speed gained per second of full throttle.
    pub acceleration: f64,
    /// Per-tick speed multiplier, in `(0, 1]`.
    pub friction: f64,
    /// Heading change per second at full steering and top speed, in degrees.
    pub turn_rate: f64,
    /// The range of each proximity sensor.
    pub max_sensor_range: f64,
}

impl Default for TruckAttributes {
    fn default() -> Self {
        let cab_length = 40.0;
        let trailer_length = 80.0;
        Self {
            cab_length,
            cab_width: 30.0,
            trailer_length,
            trailer_width: 25.0,
            hitch_offset_from_cab_rear: cab_length / 2.0,
            hitch_offset_from_trailer_front: trailer_length / 2.0,
            max_speed: 200.0,
            acceleration: 300.0,
            friction: 0.95,
            turn_rate: 120.0,
            max_sensor_range: 200.0,
        }
    }
}

impl TruckAttributes {
    /// Checks the attributes describe a physically meaningful rig.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("hitch_offset_from_cab_rear", self.hitch_offset_from_cab_rear),
            ("hitch_offset_from_trailer_front", self.hitch_offset_from_trailer_front),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveHitchArm { name, value });
            }
        }
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(ConfigError::FrictionOutOfRange(self.friction));
        }
        positive("cab_length", self.cab_length)?;
        positive("cab_width", self.cab_width)?;
        positive("trailer_length", self.trailer_length)?;
        positive("trailer_width", self.trailer_width)?;
        positive("max_speed", self.max_speed)?;
        positive("acceleration", self.acceleration)?;
        positive("turn_rate", self.turn_rate)?;
        positive("max_sensor_range", self.max_sensor_range)?;
        Ok(())
    }

    /// The distance between the cab's centre and the trailer's centre
    /// when the two are aligned.
    pub fn rig_length(&self) -> f64 {
        self.hitch_offset_from_cab_rear + self.hitch_offset_from_trailer_front
    }

    /// The permitted speed range.
    pub fn speed_range(&self) -> Interval<f64> {
        Interval::new(-0.5 * self.max_speed, self.max_speed)
    }
}

/// The pose of the cab.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CabPose {
    pub x: f64,
    pub y: f64,
    /// The heading in degrees, in `[0, 360)`.
    pub heading: f64,
    /// The signed speed; negative when reversing.
    pub speed: f64,
}

/// The pose of the trailer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrailerPose {
    pub x: f64,
    pub y: f64,
    /// The heading in degrees, in `[0, 360)`.
    pub heading: f64,
}

/// Records the most recent wall collision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionFlag {
    /// Whether a collision happened within the display time.
    active: bool,
    /// The truck's clock at the time of the last collision.
    timestamp: f64,
}

/// A simulated articulated truck: a powered cab towing a trailer on a single hitch.
#[derive(Clone, Debug)]
pub struct Truck {
    /// The truck's attributes.
    attribs: TruckAttributes,
    /// The world space coordinates of the centre of the cab.
    pos: Point2d,
    /// The cab heading in degrees.
    heading: f64,
    /// The signed cab speed.
    speed: f64,
    /// The trailer heading in degrees.
    trailer_heading: f64,
    /// The proximity sensors.
    sensors: SensorArray,
    /// The elapsed simulation time seen by this truck, in s.
    clock: f64,
    /// The last collision.
    collision: CollisionFlag,
}

impl Truck {
    /// Creates a new truck with its trailer aligned directly behind the cab.
    pub fn new(
        attributes: &TruckAttributes,
        pos: Point2d,
        heading: f64,
        speed: f64,
    ) -> Result<Self, ConfigError> {
        attributes.validate()?;
        let heading = normalize_angle_deg(heading);
        Ok(Self {
            attribs: *attributes,
            pos,
            heading,
            speed: attributes.speed_range().clamp(speed),
            trailer_heading: heading,
            sensors: SensorArray::new(attributes.max_sensor_range),
            clock: 0.0,
            collision: CollisionFlag::default(),
        })
    }

    /// The truck's attributes.
    pub fn attributes(&self) -> &TruckAttributes {
        &self.attribs
    }

    /// The coordinates in world space of the centre of the cab.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The cab heading in degrees, in `[0, 360)`.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// A unit vector in world space aligned with the cab's heading.
    pub fn direction(&self) -> Vector2d {
        heading_vector(self.heading)
    }

    /// The cab's signed speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The trailer heading in degrees, in `[0, 360)`.
    pub fn trailer_heading(&self) -> f64 {
        self.trailer_heading
    }

    /// The hitch point, behind the cab's centre.
    pub fn hitch_point(&self) -> Point2d {
        point_behind(self.pos, self.heading, self.attribs.hitch_offset_from_cab_rear)
    }

    /// The centre of the trailer, derived from the hitch point and the trailer heading.
    pub fn trailer_position(&self) -> Point2d {
        point_behind(
            self.hitch_point(),
            self.trailer_heading,
            self.attribs.hitch_offset_from_trailer_front,
        )
    }

    /// The point on the trailer that attaches to the hitch.
    pub fn trailer_front_attachment(&self) -> Point2d {
        self.trailer_position()
            + heading_vector(self.trailer_heading) * self.attribs.hitch_offset_from_trailer_front
    }

    /// The signed angle between the cab and the trailer, in `(-180, 180]`.
    pub fn jackknife_angle(&self) -> f64 {
        normalize_angle_signed(self.heading - self.trailer_heading)
    }

    /// The current cab pose.
    pub fn cab_pose(&self) -> CabPose {
        CabPose {
            x: self.pos.x,
            y: self.pos.y,
            heading: self.heading,
            speed: self.speed,
        }
    }

    /// The current trailer pose.
    pub fn trailer_pose(&self) -> TrailerPose {
        let pos = self.trailer_position();
        TrailerPose {
            x: pos.x,
            y: pos.y,
            heading: self.trailer_heading,
        }
    }

    /// The corners of the cab, front-right first.
    pub fn cab_corners(&self) -> [Point2d; 4] {
        rotated_rectangle_corners(
            self.pos,
            0.5 * self.attribs.cab_length,
            0.5 * self.attribs.cab_width,
            self.heading,
        )
    }

    /// The corners of the trailer, front-right first.
    pub fn trailer_corners(&self) -> [Point2d; 4] {
        rotated_rectangle_corners(
            self.trailer_position(),
            0.5 * self.attribs.trailer_length,
            0.5 * self.attribs.trailer_width,
            self.trailer_heading,
        )
    }

    /// The proximity sensors.
    pub fn sensors(&self) -> &SensorArray {
        &self.sensors
    }

    /// Whether the truck hit a wall within the last [COLLISION_DISPLAY_TIME] seconds.
    pub fn is_colliding(&self) -> bool {
        self.collision.active
    }

    /// The truck's clock at the time of the most recent collision, if one is flagged.
    pub fn collision_time(&self) -> Option<f64> {
        self.collision.active.then_some(self.collision.timestamp)
    }

    /// Whether the truck is stationary.
    pub fn has_stopped(&self) -> bool {
        self.speed == 0.0
    }

    /// Applies throttle and steering for one time step.
    ///
    /// Throttle changes speed first; the clamped speed then scales the
    /// steering, so turning authority grows with speed and reverses when
    /// backing up. Below [STALL_SPEED] steering has no effect.
    ///
    /// # Parameters
    /// * `throttle` - Signed throttle, where `1.0` is full acceleration
    /// * `steer` - Signed steering intent, positive to the right
    /// * `dt` - The time step in seconds
    pub fn apply_control(&mut self, throttle: f64, steer: f64, dt: f64) {
        let speed = self.speed + self.attribs.acceleration * dt * throttle;
        self.speed = self.attribs.speed_range().clamp(speed);

        if self.speed.abs() > STALL_SPEED && steer != 0.0 {
            let authority = self.speed / self.attribs.max_speed;
            let turn = self.attribs.turn_rate * dt * authority * steer;
            self.heading = normalize_angle_deg(self.heading + turn);
        }
    }

    /// Sets the cab speed directly, within the permitted range.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = self.attribs.speed_range().clamp(speed);
    }

    /// Integrates the cab's motion and drags the trailer along.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub fn step(&mut self, dt: f64) {
        self.speed *= self.attribs.friction;
        if self.speed.abs() < STOP_SPEED {
            self.speed = 0.0;
        }

        self.pos += self.direction() * self.speed * dt;
        self.trailer_heading = advance_trailer_heading(
            self.heading,
            self.trailer_heading,
            self.speed,
            self.attribs.hitch_offset_from_trailer_front,
            dt,
        );

        self.clock += dt;
        if self.collision.active && self.clock - self.collision.timestamp > COLLISION_DISPLAY_TIME
        {
            self.collision.active = false;
        }
    }

    /// Casts the proximity sensor rays against the arena walls.
    pub fn update_sensors(&mut self, arena: &Arena) {
        self.sensors.update(self.pos, self.heading, arena);
    }

    /// Moves the cab, and with it the hitch and trailer.
    pub(crate) fn translate(&mut self, delta: Vector2d) {
        self.pos += delta;
    }

    /// Reverses the cab's direction of travel, keeping `restitution` of its speed.
    pub(crate) fn bounce(&mut self, restitution: f64) {
        self.set_speed(-restitution * self.speed);
    }

    /// Flags a collision at the current time.
    pub(crate) fn on_collision(&mut self) {
        self.collision = CollisionFlag {
            active: true,
            timestamp: self.clock,
        };
    }

    /// Overrides the trailer heading. Only used to set up test scenarios.
    #[cfg(test)]
    pub(crate) fn set_trailer_heading(&mut self, heading: f64) {
        self.trailer_heading = normalize_angle_deg(heading);
    }
}
