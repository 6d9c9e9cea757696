use super::{Point2d, Vector2d};
use cgmath::InnerSpace;

/// The unit normal to the right of `dir`, as seen by an observer facing along it.
///
/// With the y-axis pointing down the screen this is a clockwise quarter turn.
pub fn right_normal(dir: Vector2d) -> Vector2d {
    Vector2d::new(-dir.y, dir.x)
}

/// Expresses `point` in a frame anchored at `origin` whose x-axis runs along
/// the unit vector `forward` and whose y-axis runs to its right.
pub fn to_local(point: Point2d, origin: Point2d, forward: Vector2d) -> Vector2d {
    let offset = point - origin;
    Vector2d::new(offset.dot(forward), offset.dot(right_normal(forward)))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn right_of_east_is_down_the_screen() {
        assert_eq!(right_normal(Vector2d::new(1.0, 0.0)), Vector2d::new(0.0, 1.0));
        assert_eq!(right_normal(Vector2d::new(0.0, 1.0)), Vector2d::new(-1.0, 0.0));
    }

    #[test]
    fn local_coordinates() {
        let forward = Vector2d::new(0.0, -1.0);
        let local = to_local(Point2d::new(13.0, 7.0), Point2d::new(10.0, 10.0), forward);
        assert_approx_eq!(local.x, 3.0);
        assert_approx_eq!(local.y, 3.0);
    }
}
