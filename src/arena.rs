use crate::debug::debug_circle;
use crate::error::{positive, ConfigError};
use crate::math::{Corner, Point2d, Vector2d};
use crate::truck::Truck;
use crate::util::Interval;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The fraction of speed kept, with its sign flipped, after hitting a wall.
pub const RESTITUTION: f64 = 0.5;

/// A rectangular walled arena with no interior obstacles.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Arena {
    /// The outer width.
    width: f64,
    /// The outer height.
    height: f64,
    /// The thickness of each of the four walls.
    wall_thickness: f64,
}

/// One of the four arena walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

/// The part of the truck that touched a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Body {
    Cab,
    Trailer,
}

/// A wall penetration found while resolving collisions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    pub wall: Wall,
    pub body: Body,
    /// The corner that went deepest. Ties go to the first in [Corner::ALL].
    pub corner: Corner,
    /// How far that corner lay beyond the wall.
    pub depth: f64,
}

/// The contacts found for a single truck, at most one per wall and body.
pub type Contacts = SmallVec<[Contact; 4]>;

impl Wall {
    pub const ALL: [Wall; 4] = [Wall::Left, Wall::Right, Wall::Top, Wall::Bottom];

    /// The translation that moves a point `depth` units back inside this wall.
    fn push_out(self, depth: f64) -> Vector2d {
        match self {
            Wall::Left => Vector2d::new(depth, 0.0),
            Wall::Right => Vector2d::new(-depth, 0.0),
            Wall::Top => Vector2d::new(0.0, depth),
            Wall::Bottom => Vector2d::new(0.0, -depth),
        }
    }
}

impl Arena {
    /// Creates an arena, checking the walls leave an interior to drive in.
    pub fn new(width: f64, height: f64, wall_thickness: f64) -> Result<Self, ConfigError> {
        positive("width", width)?;
        positive("height", height)?;
        if !(wall_thickness >= 0.0) || 2.0 * wall_thickness >= f64::min(width, height) {
            return Err(ConfigError::ArenaTooSmall {
                width,
                height,
                wall_thickness,
            });
        }
        Ok(Self {
            width,
            height,
            wall_thickness,
        })
    }

    /// The outer width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The outer height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The thickness of each wall.
    pub fn wall_thickness(&self) -> f64 {
        self.wall_thickness
    }

    /// The horizontal extent of the interior.
    pub fn x_bounds(&self) -> Interval<f64> {
        Interval::new(self.wall_thickness, self.width - self.wall_thickness)
    }

    /// The vertical extent of the interior.
    pub fn y_bounds(&self) -> Interval<f64> {
        Interval::new(self.wall_thickness, self.height - self.wall_thickness)
    }

    /// The centre of the arena.
    pub fn centre(&self) -> Point2d {
        Point2d::new(self.x_bounds().midpoint(), self.y_bounds().midpoint())
    }

    /// Whether a point lies within the interior.
    pub fn contains(&self, point: Point2d) -> bool {
        self.x_bounds().contains(point.x) && self.y_bounds().contains(point.y)
    }

    /// How far `point` lies beyond `wall`, or zero if it doesn't.
    fn depth(&self, wall: Wall, point: Point2d) -> f64 {
        match wall {
            Wall::Left => self.x_bounds().depth_below(point.x),
            Wall::Right => self.x_bounds().depth_above(point.x),
            Wall::Top => self.y_bounds().depth_below(point.y),
            Wall::Bottom => self.y_bounds().depth_above(point.y),
        }
    }

    /// Finds the walls penetrated by a rectangle, with its deepest corner
    /// beyond each.
    ///
    /// # Parameters
    /// * `corners` - The corners, in the order of [Corner::ALL]
    pub fn penetrations(&self, corners: &[Point2d; 4]) -> SmallVec<[(Wall, Corner, f64); 4]> {
        Wall::ALL
            .into_iter()
            .filter_map(|wall| {
                let (corner, depth) = Corner::ALL
                    .into_iter()
                    .zip(corners)
                    .map(|(corner, point)| (corner, self.depth(wall, *point)))
                    .fold((Corner::FrontRight, 0.0), |deepest, next| {
                        if next.1 > deepest.1 {
                            next
                        } else {
                            deepest
                        }
                    });
                (depth > 0.0).then_some((wall, corner, depth))
            })
            .collect()
    }

    /// Pushes a truck back inside the walls.
    ///
    /// The cab is translated by exactly the depth of each wall it penetrates.
    /// The trailer is never moved directly, as it hangs off the hitch.
    /// If either body touched a wall the cab bounces back once with
    /// [RESTITUTION], and the truck's collision flag is raised.
    pub fn resolve_collisions(&self, truck: &mut Truck) -> Contacts {
        let mut contacts = Contacts::new();
        let bodies = [
            (Body::Cab, truck.cab_corners()),
            (Body::Trailer, truck.trailer_corners()),
        ];
        for (body, corners) in bodies {
            for (wall, corner, depth) in self.penetrations(&corners) {
                contacts.push(Contact {
                    wall,
                    body,
                    corner,
                    depth,
                });
            }
        }

        if contacts.is_empty() {
            return contacts;
        }

        for contact in contacts.iter().filter(|c| c.body == Body::Cab) {
            truck.translate(contact.wall.push_out(contact.depth));
        }
        truck.bounce(RESTITUTION);
        truck.on_collision();

        debug!("collision: {:?}", contacts);
        debug_circle("collision", truck.position(), 5.0);
        contacts
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::truck::TruckAttributes;
    use assert_approx_eq::assert_approx_eq;

    fn arena() -> Arena {
        Arena::new(1400.0, 900.0, 20.0).unwrap()
    }

    fn truck(x: f64, y: f64, heading: f64, speed: f64) -> Truck {
        Truck::new(&TruckAttributes::default(), Point2d::new(x, y), heading, speed).unwrap()
    }

    #[test]
    fn rejects_arena_without_interior() {
        assert!(Arena::new(30.0, 900.0, 20.0).is_err());
        assert!(Arena::new(-5.0, 900.0, 20.0).is_err());
        assert!(Arena::new(100.0, 100.0, 0.0).is_ok());
    }

    #[test]
    fn free_truck_is_untouched() {
        let mut truck = truck(700.0, 450.0, 30.0, 80.0);
        let contacts = arena().resolve_collisions(&mut truck);
        assert!(contacts.is_empty());
        assert_eq!(truck.speed(), 80.0);
        assert!(!truck.is_colliding());
    }

    #[test]
    fn cab_is_pushed_out_of_left_wall_exactly() {
        let depth = 7.5;
        // Facing the left wall with the nose `depth` inside it
        let mut truck = truck(20.0 + 20.0 - depth, 450.0, 180.0, 80.0);
        let contacts = arena().resolve_collisions(&mut truck);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].wall, Wall::Left);
        assert_eq!(contacts[0].body, Body::Cab);
        assert_eq!(contacts[0].corner, Corner::FrontRight);
        assert_approx_eq!(contacts[0].depth, depth);

        let min_x = truck
            .cab_corners()
            .iter()
            .map(|c| c.x)
            .fold(f64::INFINITY, f64::min);
        assert_approx_eq!(min_x, 20.0, 1e-9);
        assert_eq!(truck.speed(), -40.0);
        assert!(truck.is_colliding());
    }

    #[test]
    fn trailer_contact_bounces_without_moving_the_cab() {
        // Reversing towards the bottom wall; the trailer's tail is 10 units past it
        let mut truck = truck(700.0, 790.0, 270.0, -50.0);
        let before = truck.position();
        let contacts = arena().resolve_collisions(&mut truck);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].wall, Wall::Bottom);
        assert_eq!(contacts[0].body, Body::Trailer);
        assert!(matches!(
            contacts[0].corner,
            Corner::BackLeft | Corner::BackRight
        ));
        assert_eq!(truck.position(), before);
        assert_eq!(truck.speed(), 25.0);
        assert!(truck.is_colliding());
    }

    #[test]
    fn corner_hits_push_out_on_both_axes() {
        let mut truck = truck(30.0, 30.0, 225.0, 60.0);
        let contacts = arena().resolve_collisions(&mut truck);
        assert!(contacts.iter().any(|c| c.wall == Wall::Left));
        assert!(contacts.iter().any(|c| c.wall == Wall::Top));
        for corner in truck.cab_corners() {
            assert!(corner.x >= 20.0 - 1e-9 && corner.y >= 20.0 - 1e-9);
        }
        assert_eq!(truck.speed(), -30.0);
    }
}
