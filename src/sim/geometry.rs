//! Path geometry helpers shared by placement and movement

use glam::Vec2;

/// Squared distance from `p` to the segment `a`-`b`
///
/// Degenerate segments (a == b) fall back to point distance.
pub fn dist_to_segment_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let l2 = ab.length_squared();
    if l2 == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / l2).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Smallest squared distance from `p` to any segment of a polyline
///
/// Returns `f32::INFINITY` for paths with fewer than two points.
pub fn dist_to_polyline_sq(p: Vec2, path: &[Vec2]) -> f32 {
    path.windows(2)
        .map(|w| dist_to_segment_sq(p, w[0], w[1]))
        .fold(f32::INFINITY, f32::min)
}

/// Outcome of one movement step toward a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Closer than one step: snapped onto the target
    Arrived(Vec2),
    /// Moved one full step along the straight line
    Moved(Vec2),
}

/// Move `from` toward `to` by `speed`, snapping when the target is closer than one step
///
/// A step that lands exactly on `to` reports `Moved`; arrival is reported on
/// the following call.
pub fn step_toward(from: Vec2, to: Vec2, speed: f32) -> Step {
    let delta = to - from;
    let dist = delta.length();
    if dist < speed || dist == 0.0 {
        Step::Arrived(to)
    } else {
        Step::Moved(from + delta / dist * speed)
    }
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Total length of a polyline
pub fn path_length(path: &[Vec2]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Point at `distance` along a polyline, clamped to its ends
pub fn point_along(path: &[Vec2], distance: f32) -> Option<Vec2> {
    let mut remaining = distance.max(0.0);
    for w in path.windows(2) {
        let len = w[0].distance(w[1]);
        if remaining <= len {
            if len == 0.0 {
                return Some(w[0]);
            }
            return Some(lerp(w[0], w[1], remaining / len));
        }
        remaining -= len;
    }
    path.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance_projects_onto_interior() {
        let d = dist_to_segment_sq(Vec2::new(5.0, 3.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_segment_distance_clamps_to_endpoints() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!((dist_to_segment_sq(Vec2::new(-3.0, 4.0), a, b) - 25.0).abs() < 1e-5);
        assert!((dist_to_segment_sq(Vec2::new(13.0, 4.0), a, b) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Vec2::new(2.0, 2.0);
        assert!((dist_to_segment_sq(Vec2::new(5.0, 6.0), a, a) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_polyline_distance() {
        let path = [Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(100.0, 100.0)];
        assert!((dist_to_polyline_sq(Vec2::new(90.0, 50.0), &path) - 100.0).abs() < 1e-4);
        assert_eq!(dist_to_polyline_sq(Vec2::ZERO, &path[..1]), f32::INFINITY);
    }

    #[test]
    fn test_step_toward() {
        let target = Vec2::new(10.0, 0.0);
        assert_eq!(step_toward(Vec2::ZERO, target, 4.0), Step::Moved(Vec2::new(4.0, 0.0)));
        assert_eq!(step_toward(Vec2::new(8.0, 0.0), target, 4.0), Step::Arrived(target));
    }

    #[test]
    fn test_step_toward_exact_distance_moves() {
        let target = Vec2::new(10.0, 0.0);
        assert_eq!(step_toward(Vec2::new(6.0, 0.0), target, 4.0), Step::Moved(target));
        assert_eq!(step_toward(target, target, 4.0), Step::Arrived(target));
        // Zero speed never divides by a zero distance
        assert_eq!(step_toward(target, target, 0.0), Step::Arrived(target));
    }

    #[test]
    fn test_point_along() {
        let path = [Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(100.0, 100.0)];
        assert_eq!(path_length(&path), 200.0);
        assert_eq!(point_along(&path, 50.0), Some(Vec2::new(50.0, 0.0)));
        assert_eq!(point_along(&path, 150.0), Some(Vec2::new(100.0, 50.0)));
        assert_eq!(point_along(&path, 500.0), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(point_along(&[], 5.0), None);
    }
}
