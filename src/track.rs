//! Lane centerlines and the errors a lane-keeping controller steers against.

use crate::arena::Arena;
use crate::error::{positive, ConfigError};
use crate::math::{
    heading_vector, normalize_angle_deg, normalize_angle_signed, right_normal, to_local, Point2d,
    Vector2d,
};
use crate::truck::Truck;
use cgmath::MetricSpace;
use itertools::Itertools;
use log::info;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The clearance from the lane edge below which a truck is no longer "in lane".
pub const LANE_MARGIN: f64 = 15.0;

/// A sample point on a lane centerline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoadPoint {
    pub x: f64,
    pub y: f64,
    /// The direction of travel at this point, in degrees.
    pub angle: f64,
}

impl RoadPoint {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }

    /// The point's position.
    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }

    /// A unit vector along the direction of travel.
    pub fn tangent(&self) -> Vector2d {
        heading_vector(self.angle)
    }
}

/// A single lane: a closed loop of centerline points plus a width.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane's index within its track.
    index: usize,
    /// The lane width.
    width: f64,
    /// The centerline. The point after the last is the first.
    centerline: Vec<RoadPoint>,
}

/// The attributes of an oval track.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackAttributes {
    /// The number of parallel lanes.
    pub lane_count: usize,
    /// The width of each lane.
    pub lane_width: f64,
    /// The clearance between the inner face of the walls and the middle lane.
    pub margin: f64,
    /// The number of centerline samples per lane.
    pub point_count: usize,
}

impl Default for TrackAttributes {
    fn default() -> Self {
        Self {
            lane_count: 3,
            lane_width: 80.0,
            margin: 120.0,
            point_count: 200,
        }
    }
}

/// A set of parallel lanes.
#[derive(Clone, Debug)]
pub struct Track {
    lanes: Vec<Lane>,
}

/// Samples an oval and shifts it sideways to form a lane centerline.
///
/// The tangent comes from the parametric derivative, so every lane built
/// from the same oval shares one direction of travel per sample index,
/// whichever side it is offset to.
///
/// # Parameters
/// * `centre` - The centre of the oval
/// * `radius_x` - The horizontal radius
/// * `radius_y` - The vertical radius
/// * `lateral_offset` - The shift to the right of the direction of travel
/// * `point_count` - The number of samples
pub fn generate_oval_path(
    centre: Point2d,
    radius_x: f64,
    radius_y: f64,
    lateral_offset: f64,
    point_count: usize,
) -> Vec<RoadPoint> {
    (0..point_count)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / point_count as f64;
            let base = centre + Vector2d::new(radius_x * theta.cos(), radius_y * theta.sin());
            let (dx, dy) = (-radius_x * theta.sin(), radius_y * theta.cos());
            let angle = normalize_angle_deg(dy.atan2(dx).to_degrees());
            let pos = base + right_normal(heading_vector(angle)) * lateral_offset;
            RoadPoint::new(pos.x, pos.y, angle)
        })
        .collect()
}

impl Lane {
    /// Creates a lane from an existing centerline.
    pub fn from_points(
        index: usize,
        width: f64,
        centerline: Vec<RoadPoint>,
    ) -> Result<Self, ConfigError> {
        positive("lane_width", width)?;
        if centerline.len() < 2 {
            return Err(ConfigError::TooFewPoints(centerline.len()));
        }
        Ok(Self {
            index,
            width,
            centerline,
        })
    }

    /// Creates a straight lane starting at `start`, sampled every `spacing` units.
    pub fn straight(
        index: usize,
        width: f64,
        start: Point2d,
        heading: f64,
        length: f64,
        spacing: f64,
    ) -> Result<Self, ConfigError> {
        positive("spacing", spacing)?;
        let dir = heading_vector(heading);
        let count = (length / spacing).floor() as usize + 1;
        let points = (0..count)
            .map(|i| start + dir * (i as f64 * spacing))
            .map(|p| RoadPoint::new(p.x, p.y, normalize_angle_deg(heading)))
            .collect();
        Self::from_points(index, width, points)
    }

    /// The lane's index within its track.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The lane width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The centerline points, in order of travel.
    pub fn centerline(&self) -> &[RoadPoint] {
        &self.centerline
    }

    /// The index of the point after `idx`, wrapping around the loop.
    pub fn next_index(&self, idx: usize) -> usize {
        (idx + 1) % self.centerline.len()
    }

    /// Finds the centerline point closest to `pos`.
    /// Ties resolve to the lowest index.
    pub fn find_closest_point_index(&self, pos: Point2d) -> usize {
        self.centerline
            .iter()
            .map(|point| point.position().distance2(pos))
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0)
    }

    /// The centerline point closest to `pos`.
    pub fn closest_point(&self, pos: Point2d) -> &RoadPoint {
        &self.centerline[self.find_closest_point_index(pos)]
    }

    /// The signed distance of the cab from the centerline,
    /// positive when the cab is to the right of the direction of travel.
    pub fn lateral_error(&self, truck: &Truck) -> f64 {
        let point = self.closest_point(truck.position());
        to_local(truck.position(), point.position(), point.tangent()).y
    }

    /// The cab heading relative to the direction of travel, in `(-180, 180]`.
    pub fn heading_error(&self, truck: &Truck) -> f64 {
        let point = self.closest_point(truck.position());
        normalize_angle_signed(truck.heading() - point.angle)
    }

    /// The direction of travel nearest the cab.
    pub fn desired_heading(&self, truck: &Truck) -> f64 {
        self.closest_point(truck.position()).angle
    }

    /// Whether the cab is inside the lane with at least [LANE_MARGIN] to spare.
    pub fn is_in_lane(&self, truck: &Truck) -> bool {
        self.lateral_error(truck).abs() < 0.5 * self.width - LANE_MARGIN
    }

    /// The distance from the cab to the left edge of the lane.
    pub fn distance_to_left_edge(&self, truck: &Truck) -> f64 {
        0.5 * self.width + self.lateral_error(truck)
    }

    /// The distance from the cab to the right edge of the lane.
    pub fn distance_to_right_edge(&self, truck: &Truck) -> f64 {
        0.5 * self.width - self.lateral_error(truck)
    }
}

impl Track {
    /// Builds a track from individual lanes.
    pub fn from_lanes(lanes: Vec<Lane>) -> Result<Self, ConfigError> {
        if lanes.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        Ok(Self { lanes })
    }

    /// Builds an oval track of parallel lanes centred in the arena.
    /// Lane 0 is offset furthest to the left of the direction of travel.
    pub fn oval(arena: &Arena, attribs: &TrackAttributes) -> Result<Self, ConfigError> {
        if attribs.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        positive("lane_width", attribs.lane_width)?;

        let centre = arena.centre();
        let inset = arena.wall_thickness() + attribs.margin;
        let radius_x = 0.5 * arena.width() - inset;
        let radius_y = 0.5 * arena.height() - inset;
        if !(radius_x > 0.0 && radius_y > 0.0) {
            return Err(ConfigError::TrackDoesNotFit { radius_x, radius_y });
        }

        info!(
            "Creating oval track with centre ({}, {}), radius_x={}, radius_y={}",
            centre.x, centre.y, radius_x, radius_y
        );

        let middle = 0.5 * (attribs.lane_count - 1) as f64;
        let lanes = (0..attribs.lane_count)
            .map(|i| {
                let offset = (i as f64 - middle) * attribs.lane_width;
                let points =
                    generate_oval_path(centre, radius_x, radius_y, offset, attribs.point_count);
                info!("  Lane {} created with {} points, offset={}", i, points.len(), offset);
                Lane::from_points(i, attribs.lane_width, points)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_lanes(lanes)
    }

    /// The lanes, in index order.
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// The number of lanes.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Gets a lane by index.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn lane(&self, index: usize) -> &Lane {
        &self.lanes[index]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::truck::TruckAttributes;
    use assert_approx_eq::assert_approx_eq;

    fn truck_at(x: f64, y: f64, heading: f64) -> Truck {
        Truck::new(&TruckAttributes::default(), Point2d::new(x, y), heading, 0.0).unwrap()
    }

    fn straight_lane() -> Lane {
        Lane::straight(0, 80.0, Point2d::new(0.0, 100.0), 0.0, 1000.0, 10.0).unwrap()
    }

    #[test]
    fn oval_tangents_run_clockwise_on_screen() {
        let points = generate_oval_path(Point2d::new(0.0, 0.0), 100.0, 50.0, 0.0, 4);
        assert_eq!(points.len(), 4);
        // Rightmost point heads down the screen, bottom point heads left
        assert_approx_eq!(points[0].x, 100.0);
        assert_approx_eq!(points[0].angle, 90.0);
        assert_approx_eq!(points[1].y, 50.0);
        assert_approx_eq!(points[1].angle, 180.0);
    }

    #[test]
    fn lanes_share_a_tangent_field() {
        let arena = Arena::new(1400.0, 900.0, 20.0).unwrap();
        let track = Track::oval(&arena, &TrackAttributes::default()).unwrap();
        assert_eq!(track.lane_count(), 3);

        let inner = &track.lane(0).centerline()[37];
        let middle = &track.lane(1).centerline()[37];
        let outer = &track.lane(2).centerline()[37];
        assert_eq!(inner.angle, middle.angle);
        assert_eq!(outer.angle, middle.angle);
        assert_approx_eq!(inner.position().distance(middle.position()), 80.0);
        assert_approx_eq!(outer.position().distance(middle.position()), 80.0);
    }

    #[test]
    fn oval_must_fit() {
        let arena = Arena::new(250.0, 250.0, 20.0).unwrap();
        let err = Track::oval(&arena, &TrackAttributes::default()).unwrap_err();
        assert!(matches!(err, ConfigError::TrackDoesNotFit { .. }));

        let attribs = TrackAttributes {
            lane_count: 0,
            ..Default::default()
        };
        let arena = Arena::new(1400.0, 900.0, 20.0).unwrap();
        assert_eq!(Track::oval(&arena, &attribs).unwrap_err(), ConfigError::NoLanes);
    }

    #[test]
    fn centerline_wraps() {
        let lane = straight_lane();
        assert_eq!(lane.centerline().len(), 101);
        assert_eq!(lane.next_index(100), 0);
        assert_eq!(lane.next_index(5), 6);
    }

    #[test]
    fn closest_point_prefers_lowest_index_on_ties() {
        let lane = straight_lane();
        // Exactly halfway between samples 10 and 11
        assert_eq!(lane.find_closest_point_index(Point2d::new(105.0, 130.0)), 10);
        assert_eq!(lane.find_closest_point_index(Point2d::new(-50.0, 100.0)), 0);
    }

    #[test]
    fn lateral_error_is_positive_to_the_right() {
        let lane = straight_lane();
        // Facing +x with y pointing down, the right-hand side is +y
        let right = truck_at(300.0, 140.0, 0.0);
        assert_approx_eq!(lane.lateral_error(&right), 40.0);
        assert_approx_eq!(lane.distance_to_left_edge(&right), 80.0);
        assert_approx_eq!(lane.distance_to_right_edge(&right), 0.0);
        assert!(!lane.is_in_lane(&right));

        let left = truck_at(300.0, 80.0, 0.0);
        assert_approx_eq!(lane.lateral_error(&left), -20.0);
        assert!(lane.is_in_lane(&left));
    }

    #[test]
    fn in_lane_keeps_a_margin() {
        let lane = straight_lane();
        assert!(lane.is_in_lane(&truck_at(300.0, 124.9, 0.0)));
        assert!(!lane.is_in_lane(&truck_at(300.0, 125.0, 0.0)));
    }

    #[test]
    fn heading_error_is_signed() {
        let lane = straight_lane();
        assert_approx_eq!(lane.heading_error(&truck_at(300.0, 100.0, 350.0)), -10.0);
        assert_approx_eq!(lane.heading_error(&truck_at(300.0, 100.0, 15.0)), 15.0);
        assert_eq!(lane.desired_heading(&truck_at(300.0, 100.0, 15.0)), 0.0);
    }
}
