use crate::point::Point;

const FULL_TURN_DEGREES: f64 = 360.0;
const HALF_TURN_DEGREES: f64 = 180.0;

/// Interior angle `∠abc` in degrees, with `b` as the vertex.
///
/// The result is always in `[0, 180]`: reflex angles are folded onto their
/// complement so that the value reads as joint flexion regardless of which ray
/// comes first. Returns `None` when either ray has zero length.
pub fn joint_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let ray_a = a - b;
    let ray_c = c - b;
    if ray_a.dot(ray_a) == 0.0 || ray_c.dot(ray_c) == 0.0 {
        return None;
    }

    let radians = (ray_c.y().atan2(ray_c.x()) - ray_a.y().atan2(ray_a.x())).abs();
    let mut degrees = radians.to_degrees();
    if degrees > HALF_TURN_DEGREES {
        degrees = FULL_TURN_DEGREES - degrees;
    }

    Some(degrees.max(0.0).min(HALF_TURN_DEGREES)).filter(|angle| angle.is_finite())
}

#[cfg(test)]
mod tests {
    use super::joint_angle;
    use crate::point::Point;
    use assert_approx_eq::assert_approx_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y).unwrap()
    }

    #[test]
    fn right_angle() {
        let angle = joint_angle(p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0)).unwrap();
        assert_approx_eq!(angle, 90.0);
    }

    #[test]
    fn straight_arm() {
        let angle = joint_angle(p(0.2, 0.2), p(0.4, 0.4), p(0.6, 0.6)).unwrap();
        assert_approx_eq!(angle, 180.0);
    }

    #[test]
    fn fully_folded() {
        let angle = joint_angle(p(0.5, 0.9), p(0.5, 0.5), p(0.5, 0.7)).unwrap();
        assert_approx_eq!(angle, 0.0);
    }

    #[test]
    fn reflex_is_folded_to_complement() {
        // atan2 difference here is 270 degrees before folding
        let angle = joint_angle(p(0.0, -1.0), p(0.0, 0.0), p(-1.0, 0.0)).unwrap();
        assert_approx_eq!(angle, 90.0);
    }

    #[test]
    fn symmetric_in_rays() {
        let triples = [
            (p(0.1, 0.2), p(0.4, 0.5), p(0.9, 0.1)),
            (p(0.9, 0.9), p(0.5, 0.1), p(0.0, 0.3)),
            (p(0.3, 0.7), p(0.31, 0.69), p(0.8, 0.8)),
        ];
        for &(a, b, c) in triples.iter() {
            let forward = joint_angle(a, b, c).unwrap();
            let backward = joint_angle(c, b, a).unwrap();
            assert_approx_eq!(forward, backward);
            assert!((0.0..=180.0).contains(&forward));
        }
    }

    #[test]
    fn degenerate_rays_have_no_angle() {
        assert_eq!(joint_angle(p(0.5, 0.5), p(0.5, 0.5), p(0.1, 0.1)), None);
        assert_eq!(joint_angle(p(0.1, 0.1), p(0.5, 0.5), p(0.5, 0.5)), None);
    }
}
