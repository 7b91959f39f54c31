//! Collision tests between shapes and a circular probe (the robot footprint
//! translated to the probed position).
//!
//! Ordinary shapes block the probe whenever it overlaps them, touching
//! included. Inverted shapes block the probe whenever it is not fully
//! contained inside them.

use crate::{Circle, Rectangle};

pub(crate) fn circle_blocks(circle: &Circle, inverted: bool, probe: &Circle) -> bool {
    let reach = if inverted {
        circle.radius() - probe.radius()
    } else {
        circle.radius() + probe.radius()
    };
    if reach < 0. {
        // The probe cannot fit inside the circle.
        return true;
    }
    let overlaps = circle.center().distance_squared(probe.center()) <= reach * reach;
    overlaps ^ inverted
}

pub(crate) fn rectangle_blocks(rectangle: &Rectangle, inverted: bool, probe: &Circle) -> bool {
    let local = rectangle.to_local(probe.center());
    let half = rectangle.half_extents();

    if inverted {
        let abs = local.abs();
        if abs.x > half.x || abs.y > half.y {
            return true;
        }
        let margin = (half - abs).min_element();
        margin <= probe.radius()
    } else {
        let closest = local.clamp(-half, half);
        local.distance_squared(closest) <= probe.radius() * probe.radius()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use glam::DVec2;

    use super::*;

    fn probe(x: f64, y: f64, radius: f64) -> Circle {
        Circle::new(DVec2::new(x, y), radius)
    }

    #[test]
    fn test_circle() {
        let circle = Circle::new(DVec2::new(1., 1.), 2.);

        assert!(circle_blocks(&circle, false, &probe(1., 1., 0.)));
        assert!(circle_blocks(&circle, false, &probe(3., 1., 0.)));
        assert!(!circle_blocks(&circle, false, &probe(3.01, 1., 0.)));
        assert!(circle_blocks(&circle, false, &probe(3.4, 1., 0.5)));
        assert!(!circle_blocks(&circle, false, &probe(1., 3.6, 0.5)));
    }

    #[test]
    fn test_inverted_circle() {
        let circle = Circle::new(DVec2::ZERO, 2.);

        assert!(!circle_blocks(&circle, true, &probe(0., 0., 0.5)));
        assert!(!circle_blocks(&circle, true, &probe(1.4, 0., 0.5)));
        assert!(circle_blocks(&circle, true, &probe(1.6, 0., 0.5)));
        assert!(circle_blocks(&circle, true, &probe(0., -5., 0.5)));
        // The probe does not fit at all.
        assert!(circle_blocks(&circle, true, &probe(0., 0., 3.)));
    }

    #[test]
    fn test_rectangle() {
        let rectangle = Rectangle::new(DVec2::new(2., 0.), DVec2::new(4., 2.), 0.);

        assert!(rectangle_blocks(&rectangle, false, &probe(2., 0., 0.)));
        assert!(rectangle_blocks(&rectangle, false, &probe(4., 1., 0.)));
        assert!(!rectangle_blocks(&rectangle, false, &probe(4.1, 0., 0.)));
        assert!(rectangle_blocks(&rectangle, false, &probe(4.4, 0., 0.5)));
        // Near a corner, the distance is measured to the corner itself.
        assert!(!rectangle_blocks(&rectangle, false, &probe(4.4, 1.4, 0.5)));
        assert!(rectangle_blocks(&rectangle, false, &probe(4.3, 1.3, 0.5)));
    }

    #[test]
    fn test_rotated_rectangle() {
        let rectangle = Rectangle::new(DVec2::ZERO, DVec2::new(4., 0.2), FRAC_PI_4);

        assert!(rectangle_blocks(&rectangle, false, &probe(1., 1., 0.)));
        assert!(!rectangle_blocks(&rectangle, false, &probe(1., -1., 0.)));
        assert!(!rectangle_blocks(&rectangle, false, &probe(1.9, 0., 0.)));
    }

    #[test]
    fn test_inverted_rectangle() {
        let rectangle = Rectangle::new(DVec2::ZERO, DVec2::new(4., 2.), 0.);

        assert!(!rectangle_blocks(&rectangle, true, &probe(0., 0., 0.5)));
        assert!(!rectangle_blocks(&rectangle, true, &probe(1.4, 0.4, 0.5)));
        assert!(rectangle_blocks(&rectangle, true, &probe(1.6, 0., 0.5)));
        assert!(rectangle_blocks(&rectangle, true, &probe(0., 0.6, 0.5)));
        assert!(rectangle_blocks(&rectangle, true, &probe(3., 0., 0.)));
        assert!(rectangle_blocks(&rectangle, true, &probe(0., -1.5, 0.)));
    }
}
