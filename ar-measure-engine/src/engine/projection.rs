use bevy::prelude::*;

/// Pixel position of a projected world point for the current frame.
///
/// `depth` is the normalised device depth after the perspective divide. Layout
/// ignores it; it is kept so callers can tell points behind the viewer apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

impl ScreenPoint {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn distance(&self, other: &ScreenPoint) -> f32 {
        self.position().distance(other.position())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Project a world-space point into viewport pixels.
///
/// NDC x maps to `(x + 1) * width / 2` and NDC y to `(-y + 1) * height / 2`
/// because screen y grows downward. Points behind the camera produce inverted or
/// non-finite coordinates rather than an error.
pub fn project(point: Vec3, view_projection: &Mat4, viewport: Vec2) -> ScreenPoint {
    let ndc = view_projection.project_point3(point);

    ScreenPoint {
        x: (ndc.x + 1.0) * viewport.x / 2.0,
        y: (-ndc.y + 1.0) * viewport.y / 2.0,
        depth: ndc.z,
    }
}

/// Top-left origin that centres a box of `size` on `anchor`.
pub fn centred_origin(anchor: Vec2, size: Vec2) -> Vec2 {
    anchor - size * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn view_projection(eye: Vec3, target: Vec3, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_infinite_reverse_rh(70f32.to_radians(), aspect, 0.01);
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        projection * view
    }

    #[test]
    fn optical_axis_projects_to_viewport_centre() {
        let cases = [
            (Vec3::ZERO, Vec3::NEG_Z, Vec2::new(1920.0, 1080.0)),
            (Vec3::new(3.0, 1.5, -2.0), Vec3::new(0.0, 0.0, 0.0), Vec2::new(390.0, 844.0)),
            (Vec3::new(-1.0, 4.0, 2.0), Vec3::new(-1.0, 0.0, 1.9), Vec2::new(800.0, 600.0)),
        ];

        for (eye, target, viewport) in cases {
            let vp = view_projection(eye, target, viewport.x / viewport.y);
            let axis = (target - eye).normalize();
            for depth in [0.5, 2.0, 7.5] {
                let screen = project(eye + axis * depth, &vp, viewport);
                assert!((screen.x - viewport.x / 2.0).abs() < EPSILON, "{screen:?}");
                assert!((screen.y - viewport.y / 2.0).abs() < EPSILON, "{screen:?}");
            }
        }
    }

    #[test]
    fn screen_y_grows_downward() {
        let viewport = Vec2::new(800.0, 600.0);
        let vp = view_projection(Vec3::ZERO, Vec3::NEG_Z, viewport.x / viewport.y);

        let above = project(Vec3::new(0.0, 0.5, -2.0), &vp, viewport);
        let right = project(Vec3::new(0.5, 0.0, -2.0), &vp, viewport);

        assert!(above.y < viewport.y / 2.0);
        assert!(right.x > viewport.x / 2.0);
    }

    #[test]
    fn static_camera_has_no_drift() {
        let viewport = Vec2::new(1280.0, 720.0);
        let vp = view_projection(Vec3::new(0.0, 1.4, 1.0), Vec3::ZERO, viewport.x / viewport.y);
        let midpoint = Vec3::new(0.5, 0.0, 0.0);

        let first = project(midpoint, &vp, viewport);
        for _ in 0..100 {
            assert_eq!(project(midpoint, &vp, viewport), first);
        }
    }

    #[test]
    fn point_behind_camera_does_not_panic() {
        let viewport = Vec2::new(640.0, 480.0);
        let vp = view_projection(Vec3::ZERO, Vec3::NEG_Z, viewport.x / viewport.y);

        let behind = project(Vec3::new(0.2, 0.1, 3.0), &vp, viewport);
        let at_eye = project(Vec3::ZERO, &vp, viewport);

        // Behind the viewer the horizontal offset flips sides.
        assert!(behind.is_finite());
        assert!(behind.x < viewport.x / 2.0);
        // The eye itself divides by w = 0.
        assert!(!at_eye.is_finite());
    }

    #[test]
    fn centred_origin_offsets_by_half_size() {
        let origin = centred_origin(Vec2::new(100.0, 50.0), Vec2::new(40.0, 20.0));
        assert_eq!(origin, Vec2::new(80.0, 40.0));
    }
}
