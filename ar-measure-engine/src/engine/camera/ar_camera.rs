use crate::engine::projection::{ScreenPoint, project};
use bevy::prelude::*;

/// Marks the camera whose pose stands for the AR device.
#[derive(Component)]
pub struct ArViewer;

/// The viewer camera's state for the current frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ArCamera {
    pub view_projection: Mat4,
    /// World-from-viewer transform.
    pub viewer: Mat4,
    /// Logical pixels.
    pub viewport: Vec2,
}

impl Default for ArCamera {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            viewer: Mat4::IDENTITY,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl ArCamera {
    /// Viewer at `eye` looking at `target` with the default perspective.
    #[cfg(test)]
    pub fn looking_at(eye: Vec3, target: Vec3, viewport: Vec2) -> Self {
        let viewer = Transform::from_translation(eye)
            .looking_at(target, Vec3::Y)
            .compute_matrix();
        Self::from_viewer(viewer, viewport)
    }

    /// Default perspective for a viewer with the given world-from-viewer transform.
    #[cfg(test)]
    pub fn from_viewer(viewer: Mat4, viewport: Vec2) -> Self {
        use constants::camera::{VIEWER_FOV_DEGREES, VIEWER_NEAR};

        let projection = Mat4::perspective_infinite_reverse_rh(
            VIEWER_FOV_DEGREES.to_radians(),
            viewport.x / viewport.y,
            VIEWER_NEAR,
        );

        Self {
            view_projection: projection * viewer.inverse(),
            viewer,
            viewport,
        }
    }

    pub fn project(&self, point: Vec3) -> ScreenPoint {
        project(point, &self.view_projection, self.viewport)
    }
}

/// Refresh `ArCamera` from the viewer camera. Reads the local transform so the
/// snapshot matches the pose the controller set earlier this frame.
pub fn sync_ar_camera(
    mut ar_camera: ResMut<ArCamera>,
    viewers: Query<(&Camera, &Transform), With<ArViewer>>,
) {
    let Ok((camera, transform)) = viewers.single() else {
        return;
    };

    let viewer = transform.compute_matrix();
    ar_camera.viewer = viewer;
    ar_camera.view_projection = camera.clip_from_view() * viewer.inverse();
    if let Some(viewport) = camera.logical_viewport_size() {
        ar_camera.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_centre() {
        let viewport = Vec2::new(390.0, 844.0);
        let camera = ArCamera::looking_at(Vec3::new(0.3, 1.4, 0.8), Vec3::ZERO, viewport);

        let screen = camera.project(Vec3::ZERO);

        assert!(screen.position().distance(viewport / 2.0) < 1e-2);
    }

    #[test]
    fn viewer_matrix_holds_eye_position() {
        let camera = ArCamera::looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec2::ONE);
        assert!(camera.viewer.w_axis.truncate().distance(Vec3::new(1.0, 2.0, 3.0)) < 1e-5);
    }
}
