use crate::engine::tracking::hit_test::Pose;
use crate::tools::frame_loop::{FrameLoop, MeasureVisuals};
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

/// Where a tap would land right now. Hidden whenever the last hit-test missed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorGeometry {
    pose: Pose,
    visible: bool,
}

impl CursorGeometry {
    /// Take this frame's hit-test result. A miss hides the cursor but keeps the last pose.
    pub fn apply(&mut self, hit: Option<Pose>) {
        match hit {
            Some(pose) => {
                self.pose = pose;
                self.visible = true;
            }
            None => self.visible = false,
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Cursor position, only while visible.
    pub fn position(&self) -> Option<Vec3> {
        self.visible.then(|| self.pose.position())
    }
}

#[derive(Component)]
pub struct Reticle;

/// Ring plus centre dot, laid flat in the surface plane of the hit pose.
pub fn spawn_reticle(mut commands: Commands, visuals: Res<MeasureVisuals>) {
    let flat = Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2));

    commands
        .spawn((Reticle, Transform::default(), Visibility::Hidden))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(visuals.reticle_ring.clone()),
                MeshMaterial3d(visuals.reticle_material.clone()),
                flat,
            ));
            parent.spawn((
                Mesh3d(visuals.reticle_dot.clone()),
                MeshMaterial3d(visuals.reticle_material.clone()),
                flat,
            ));
        });
}

pub fn update_reticle(
    frame_loop: Res<FrameLoop>,
    mut reticles: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    let cursor = frame_loop.cursor();
    for (mut transform, mut visibility) in &mut reticles {
        if cursor.is_visible() {
            *transform = cursor.pose().transform();
            *visibility = Visibility::Inherited;
        } else {
            *visibility = Visibility::Hidden;
        }
    }
}
