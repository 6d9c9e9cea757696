use crate::arena::Arena;
use crate::math::{heading_vector, normalize_angle_deg, normalize_angle_signed, Point2d};
use crate::truck::Truck;
use cgmath::MetricSpace;
use itertools::Itertools;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use smallvec::SmallVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Randomly placed targets keep at least this far from the arena's outer edge.
const PLACEMENT_MARGIN: f64 = 100.0;

/// How close a truck must be to count as parked.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParkingTolerances {
    /// Maximum distance between the cab's centre and the target.
    pub position: f64,
    /// Maximum heading difference, in degrees.
    pub angle: f64,
    /// Maximum absolute speed.
    pub speed: f64,
}

impl Default for ParkingTolerances {
    fn default() -> Self {
        Self {
            position: 10.0,
            angle: 10.0,
            speed: 20.0,
        }
    }
}

/// A parking bay: a target pose for the cab.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParkingTarget {
    /// The target position of the cab's centre.
    pos: Point2d,
    /// The target heading in degrees.
    angle: f64,
    /// The length of the marked bay.
    length: f64,
    /// The width of the marked bay.
    width: f64,
    /// The parking criteria.
    tolerances: ParkingTolerances,
    /// The result of the last evaluation.
    is_parked: bool,
}

impl ParkingTarget {
    /// Creates a parking target with the default bay size and tolerances.
    pub fn new(pos: Point2d, angle: f64) -> Self {
        Self {
            pos,
            angle: normalize_angle_deg(angle),
            length: 130.0,
            width: 40.0,
            tolerances: ParkingTolerances::default(),
            is_parked: false,
        }
    }

    /// Replaces the parking criteria.
    pub fn with_tolerances(self, tolerances: ParkingTolerances) -> Self {
        Self { tolerances, ..self }
    }

    /// Places a target at random within the arena, facing one of the four
    /// axis directions whose point `approach_distance` ahead is also inside.
    ///
    /// All randomness comes from `rng`, so a seeded generator reproduces
    /// the same sequence of targets.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, arena: &Arena, approach_distance: f64) -> Self {
        let margin_x = f64::min(PLACEMENT_MARGIN, 0.5 * arena.width());
        let margin_y = f64::min(PLACEMENT_MARGIN, 0.5 * arena.height());
        let xs = Uniform::new_inclusive(margin_x, arena.width() - margin_x);
        let ys = Uniform::new_inclusive(margin_y, arena.height() - margin_y);
        let pos = Point2d::new(xs.sample(rng), ys.sample(rng));

        let candidates = (0..4)
            .map(|quarter_turns| Self::new(pos, 90.0 * quarter_turns as f64))
            .collect::<SmallVec<[_; 4]>>();
        let reachable = candidates
            .iter()
            .filter(|target| arena.contains(target.point_ahead(approach_distance)))
            .copied()
            .collect::<SmallVec<[_; 4]>>();

        if reachable.is_empty() {
            // Arena too small for any approach; face whichever way gets closest to the centre.
            let centre = arena.centre();
            let nearest = candidates
                .iter()
                .position_min_by(|a, b| {
                    let da = a.point_ahead(approach_distance).distance2(centre);
                    let db = b.point_ahead(approach_distance).distance2(centre);
                    da.total_cmp(&db)
                })
                .unwrap_or(0);
            return candidates[nearest];
        }
        reachable[rng.gen_range(0..reachable.len())]
    }

    /// The target position of the cab's centre.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The target heading in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// The length of the marked bay.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The width of the marked bay.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The parking criteria.
    pub fn tolerances(&self) -> &ParkingTolerances {
        &self.tolerances
    }

    /// The result of the last call to [Self::evaluate].
    pub fn is_parked(&self) -> bool {
        self.is_parked
    }

    /// The point `distance` units ahead of the target along its heading.
    pub fn point_ahead(&self, distance: f64) -> Point2d {
        self.pos + heading_vector(self.angle) * distance
    }

    /// The distance from the cab's centre to the target.
    pub fn position_error(&self, truck: &Truck) -> f64 {
        truck.position().distance(self.pos)
    }

    /// The signed heading error, target minus cab, in `(-180, 180]`.
    pub fn heading_error(&self, truck: &Truck) -> f64 {
        normalize_angle_signed(self.angle - truck.heading())
    }

    /// The absolute heading difference, in `[0, 180]`.
    pub fn angle_error(&self, truck: &Truck) -> f64 {
        self.heading_error(truck).abs()
    }

    /// Decides whether the truck is parked, and remembers the answer.
    pub fn evaluate(&mut self, truck: &Truck) -> bool {
        let tol = &self.tolerances;
        self.is_parked = self.position_error(truck) < tol.position
            && self.angle_error(truck) < tol.angle
            && truck.speed().abs() < tol.speed;
        self.is_parked
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::truck::TruckAttributes;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn truck(x: f64, y: f64, heading: f64, speed: f64) -> Truck {
        Truck::new(&TruckAttributes::default(), Point2d::new(x, y), heading, speed).unwrap()
    }

    #[test]
    fn parked_requires_all_three_criteria() {
        let mut target = ParkingTarget::new(Point2d::new(400.0, 450.0), 0.0);
        assert!(target.evaluate(&truck(405.0, 452.0, 355.0, 0.0)));
        assert!(target.is_parked());

        assert!(!target.evaluate(&truck(415.0, 450.0, 0.0, 0.0)));
        assert!(!target.is_parked());
        assert!(!target.evaluate(&truck(400.0, 450.0, 12.0, 0.0)));
        assert!(!target.evaluate(&truck(400.0, 450.0, 0.0, -25.0)));
    }

    #[test]
    fn angle_error_wraps() {
        let target = ParkingTarget::new(Point2d::new(0.0, 0.0), 270.0);
        assert_approx_eq!(target.angle_error(&truck(0.0, 0.0, 10.0, 0.0)), 100.0);
        assert_approx_eq!(target.heading_error(&truck(0.0, 0.0, 280.0, 0.0)), -10.0);
    }

    #[test]
    fn point_ahead_follows_heading() {
        let target = ParkingTarget::new(Point2d::new(400.0, 400.0), 90.0);
        let p = target.point_ahead(150.0);
        assert_approx_eq!(p.x, 400.0);
        assert_approx_eq!(p.y, 550.0);
    }

    #[test]
    fn random_targets_are_reproducible_and_inside() {
        let arena = Arena::new(1400.0, 900.0, 20.0).unwrap();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let target = ParkingTarget::random(&mut a, &arena, 150.0);
            assert_eq!(target, ParkingTarget::random(&mut b, &arena, 150.0));
            let p = target.position();
            assert!((100.0..=1300.0).contains(&p.x));
            assert!((100.0..=800.0).contains(&p.y));
            assert_eq!(target.angle() % 90.0, 0.0);
            assert!(!target.is_parked());
        }
    }

    #[test]
    fn random_targets_leave_room_to_approach() {
        let arena = Arena::new(1400.0, 900.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..500 {
            let target = ParkingTarget::random(&mut rng, &arena, 150.0);
            assert!(
                arena.contains(target.point_ahead(150.0)),
                "approach point of {:?} is outside the arena",
                target
            );
        }
    }

    #[test]
    fn cramped_arena_faces_the_centre() {
        let arena = Arena::new(400.0, 300.0, 20.0).unwrap();
        let centre = arena.centre();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let target = ParkingTarget::random(&mut rng, &arena, 500.0);
            let chosen = target.point_ahead(500.0).distance(centre);
            for quarter_turns in 0..4 {
                let other = ParkingTarget::new(target.position(), 90.0 * quarter_turns as f64);
                assert!(chosen <= other.point_ahead(500.0).distance(centre) + 1e-9);
            }
        }
    }
}
