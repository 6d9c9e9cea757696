//! Tests that drive a single truck with the lane-keeping autopilot.

use truck_sim::{
    math::Point2d, Lane, LaneKeepingController, LaneKeepingState, Track, Truck, TruckAttributes,
};

const DT: f64 = 0.016;

fn straight_track() -> Track {
    let lane = Lane::straight(0, 80.0, Point2d::new(-100.0, 0.0), 0.0, 3495.0, 5.0).unwrap();
    Track::from_lanes(vec![lane]).unwrap()
}

fn lane_keeper() -> LaneKeepingController {
    let mut controller = LaneKeepingController::default();
    controller.set_target_lane(0);
    controller.enable();
    controller
}

/// Test that a truck starting 40 units right of the centerline closes the
/// gap without ever drifting back out, until it is centered.
#[test]
fn lateral_error_shrinks_monotonically_until_centered() {
    let track = straight_track();
    let lane = track.lane(0);
    let mut truck =
        Truck::new(&TruckAttributes::default(), Point2d::new(0.0, 40.0), 0.0, 80.0).unwrap();
    let mut controller = lane_keeper();

    let mut previous = lane.lateral_error(&truck).abs();
    let mut centered_at = None;
    for tick in 0..1000 {
        truck.step(DT);
        let error = lane.lateral_error(&truck).abs();
        assert!(
            error <= previous + 1e-9,
            "lateral error grew from {} to {} on tick {}",
            previous,
            error,
            tick
        );
        previous = error;

        controller.update(&mut truck, &track, DT);
        if controller.state() == LaneKeepingState::Centered {
            centered_at = Some(tick);
            break;
        }
    }

    let tick = centered_at.expect("truck never centered");
    assert!(tick > 0);
    assert!(lane.lateral_error(&truck).abs() < 15.0);
    assert!(lane.is_in_lane(&truck));
}

/// Test that the truck starting still accelerates and still centers.
#[test]
fn centers_from_standstill() {
    let track = straight_track();
    let mut truck =
        Truck::new(&TruckAttributes::default(), Point2d::new(0.0, 40.0), 0.0, 0.0).unwrap();
    let mut controller = lane_keeper();

    let centered = (0..1000).any(|_| {
        truck.step(DT);
        controller.update(&mut truck, &track, DT);
        controller.state() == LaneKeepingState::Centered
    });
    assert!(centered);
    assert!(truck.speed() > 10.0);
}

/// Test that a truck left of the lane reports left-hand states and steers right.
#[test]
fn left_offsets_report_left_states() {
    let track = straight_track();
    let mut controller = lane_keeper();

    let mut truck =
        Truck::new(&TruckAttributes::default(), Point2d::new(0.0, -20.0), 0.0, 80.0).unwrap();
    controller.update(&mut truck, &track, DT);
    assert_eq!(controller.state(), LaneKeepingState::CorrectingRight);
    assert!(truck.heading() > 0.0 && truck.heading() < 180.0);

    let mut truck =
        Truck::new(&TruckAttributes::default(), Point2d::new(0.0, -38.0), 0.0, 80.0).unwrap();
    controller.update(&mut truck, &track, DT);
    assert_eq!(controller.state(), LaneKeepingState::EmergencyLeft);
    assert_eq!(controller.state_name(), "EMERGENCY_LEFT");
}
