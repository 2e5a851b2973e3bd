use crate::engine::camera::ar_camera::ArViewer;
use bevy::input::mouse::MouseMotion;
use bevy::math::EulerRot;
use bevy::prelude::*;
use constants::camera::{VIEWER_EYE_HEIGHT, VIEWER_FAR, VIEWER_FOV_DEGREES, VIEWER_NEAR};

/// Simulated device pose, driven by keyboard and mouse when no AR runtime is present.
#[derive(Resource)]
pub struct ViewerRig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for ViewerRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, VIEWER_EYE_HEIGHT, 1.0),
            yaw: 0.0,
            pitch: -0.9,
        }
    }
}

impl ViewerRig {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation())
    }
}

pub fn spawn_viewer_camera(mut commands: Commands, rig: Res<ViewerRig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: VIEWER_FOV_DEGREES.to_radians(),
            near: VIEWER_NEAR,
            far: VIEWER_FAR,
            ..default()
        }),
        rig.transform(),
        ArViewer,
    ));
}

pub fn viewer_controller(
    mut viewers: Query<&mut Transform, With<ArViewer>>,
    mut rig: ResMut<ViewerRig>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut transform) = viewers.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    // Right drag looks around, left click stays free for taps
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        rig.yaw += -mouse_delta.x * yaw_sens;
        rig.pitch += -mouse_delta.y * pitch_sens;
        rig.pitch = rig.pitch.clamp(-1.55, 1.55);
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        move_input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        move_input.y -= 1.0;
    }

    if move_input != Vec3::ZERO {
        // Walk in the horizontal plane regardless of pitch
        let heading = Quat::from_rotation_y(rig.yaw);
        let forward = heading * Vec3::Z;
        let right = heading * Vec3::X;

        let mut speed = 1.0;
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            speed *= 3.0;
        }
        if keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) {
            speed *= 0.25;
        }

        let world_delta = right * move_input.x + Vec3::Y * move_input.y + forward * move_input.z;
        rig.position += world_delta.normalize() * speed * time.delta_secs();
    }

    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    transform.translation = transform.translation.lerp(rig.position, lerp_speed);
    transform.rotation = transform.rotation.slerp(rig.rotation(), lerp_speed);
}
