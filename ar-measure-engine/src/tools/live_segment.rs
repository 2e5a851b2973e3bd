use crate::tools::frame_loop::{FrameLoop, MeasureVisuals};
use bevy::prelude::*;

/// Preview line from the pending point to wherever the cursor currently is.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSegment {
    start: Vec3,
    end: Vec3,
    visual: Option<Entity>,
}

impl LiveSegment {
    /// Zero-length segment anchored at `start`.
    pub fn new(start: Vec3) -> Self {
        Self {
            start,
            end: start,
            visual: None,
        }
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn set_end(&mut self, end: Vec3) {
        self.end = end;
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn visual(&self) -> Option<Entity> {
        self.visual
    }

    pub fn attach_visual(&mut self, entity: Entity) {
        self.visual = Some(entity);
    }

    /// Transform that stretches a unit cube along +X into this segment.
    pub fn line_transform(&self, width: f32) -> Transform {
        let direction = (self.end - self.start).normalize_or_zero();
        let rotation = if direction == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::X, direction)
        };

        Transform::from_translation((self.start + self.end) * 0.5)
            .with_rotation(rotation)
            .with_scale(Vec3::new(self.length(), width, width))
    }
}

#[derive(Component)]
pub struct LiveSegmentLine;

pub fn spawn_live_segment(
    commands: &mut Commands,
    visuals: &MeasureVisuals,
    segment: &LiveSegment,
) -> Entity {
    commands
        .spawn((
            Mesh3d(visuals.line_mesh.clone()),
            MeshMaterial3d(visuals.line_material.clone()),
            segment.line_transform(visuals.line_width),
            LiveSegmentLine,
        ))
        .id()
}

/// Stretch the preview line to the segment's latest endpoints.
pub fn update_live_segment_visual(
    frame_loop: Res<FrameLoop>,
    visuals: Res<MeasureVisuals>,
    mut lines: Query<&mut Transform, With<LiveSegmentLine>>,
) {
    let Some(segment) = frame_loop.session().live_segment() else {
        return;
    };
    let Some(entity) = segment.visual() else {
        return;
    };
    if let Ok(mut transform) = lines.get_mut(entity) {
        *transform = segment.line_transform(visuals.line_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_segment_is_zero_length() {
        let segment = LiveSegment::new(Vec3::new(1.0, 0.0, 2.0));

        assert_eq!(segment.start(), segment.end());
        assert_eq!(segment.length(), 0.0);

        let transform = segment.line_transform(0.01);
        assert_eq!(transform.translation, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(transform.scale.x, 0.0);
        assert!(transform.rotation.is_finite());
    }

    #[test]
    fn line_transform_spans_endpoints() {
        let mut segment = LiveSegment::new(Vec3::ZERO);
        segment.set_end(Vec3::new(0.0, 0.0, -2.0));

        let transform = segment.line_transform(0.01);

        assert_eq!(transform.translation, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(transform.scale, Vec3::new(2.0, 0.01, 0.01));
        let tip = transform.transform_point(Vec3::new(0.5, 0.0, 0.0));
        assert!(tip.distance(Vec3::new(0.0, 0.0, -2.0)) < 1e-5);
    }
}
