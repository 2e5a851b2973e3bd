use crate::engine::camera::ar_camera::ArCamera;
use crate::engine::projection::centred_origin;
use crate::tools::frame_loop::FrameLoop;
use crate::tools::measure::{Measurement, MeasurementId, MeasureSettings};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// How the per-label pixel distance is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelDistanceMode {
    /// Each measurement's own endpoints, projected and measured on screen.
    #[default]
    PerMeasurement,
    /// Screen distance between the first two label anchors, shared by every label.
    /// Zero until two measurements exist.
    FirstTwoLabels,
}

/// Ordered collection of finalised measurements and their screen-space anchors.
#[derive(Debug, Default)]
pub struct LabelField {
    entries: Vec<Measurement>,
}

impl LabelField {
    pub fn push(&mut self, measurement: Measurement) {
        self.entries.push(measurement);
    }

    /// Measurements in insertion order.
    pub fn measurements(&self) -> &[Measurement] {
        &self.entries
    }

    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MeasurementId) -> Option<&mut Measurement> {
        self.entries.iter_mut().find(|m| m.id == id)
    }

    pub fn take_all(&mut self) -> Vec<Measurement> {
        std::mem::take(&mut self.entries)
    }

    /// Reproject every anchor for this frame's camera and refresh pixel distances.
    pub fn update(&mut self, camera: &ArCamera, mode: PixelDistanceMode) {
        for measurement in &mut self.entries {
            let anchor = camera.project(measurement.label_anchor);
            measurement.screen_position = anchor.is_finite().then(|| anchor.position());
        }

        match mode {
            PixelDistanceMode::PerMeasurement => {
                for measurement in &mut self.entries {
                    let a = camera.project(measurement.point_a);
                    let b = camera.project(measurement.point_b);
                    measurement.pixel_distance = rounded_pixels(a.distance(&b));
                }
            }
            PixelDistanceMode::FirstTwoLabels => {
                let [first, second, ..] = self.entries.as_slice() else {
                    return;
                };
                let a = camera.project(first.label_anchor);
                let b = camera.project(second.label_anchor);
                let pixels = rounded_pixels(a.distance(&b));
                for measurement in &mut self.entries {
                    measurement.pixel_distance = pixels;
                }
            }
        }
    }
}

fn rounded_pixels(distance: f32) -> f32 {
    if distance.is_finite() {
        distance.round()
    } else {
        0.0
    }
}

/// Screen-space text visual pinned to a measurement's midpoint.
#[derive(Component, Debug, Clone, Copy)]
pub struct MeasurementLabel {
    pub measurement: MeasurementId,
}

pub fn spawn_label(
    commands: &mut Commands,
    settings: &MeasureSettings,
    measurement: &Measurement,
) -> Entity {
    commands
        .spawn((
            Text::new(measurement.label_text()),
            TextFont {
                font_size: settings.label_font_size,
                ..default()
            },
            TextColor(settings.label_colour),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            Visibility::Hidden,
            MeasurementLabel {
                measurement: measurement.id,
            },
        ))
        .id()
}

/// Move each label so its centre sits on the projected midpoint and refresh its text.
pub fn update_label_visuals(
    frame_loop: Res<FrameLoop>,
    mut labels: Query<(
        &MeasurementLabel,
        &mut Node,
        &mut Text,
        &mut Visibility,
        &ComputedNode,
    )>,
) {
    for (label, mut node, mut text, mut visibility, computed) in &mut labels {
        let Some(measurement) = frame_loop.session().measurement(label.measurement) else {
            continue;
        };

        let Some(anchor) = measurement.screen_position else {
            *visibility = Visibility::Hidden;
            continue;
        };

        let size = computed.size() * computed.inverse_scale_factor();
        let origin = centred_origin(anchor, size);
        node.left = Val::Px(origin.x);
        node.top = Val::Px(origin.y);
        *visibility = Visibility::Inherited;

        let content = measurement.label_text();
        if text.0 != content {
            text.0 = content;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EYE: Vec3 = Vec3::new(0.0, 2.0, 2.0);

    fn camera() -> ArCamera {
        ArCamera::looking_at(EYE, Vec3::ZERO, Vec2::new(1000.0, 800.0))
    }

    fn field_with(pairs: &[(Vec3, Vec3)]) -> LabelField {
        let mut field = LabelField::default();
        for (i, (a, b)) in pairs.iter().enumerate() {
            field.push(Measurement::new(i as MeasurementId, *a, *b));
        }
        field
    }

    #[test]
    fn anchors_follow_projection() {
        let cam = camera();
        let mut field = field_with(&[(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0))]);

        field.update(&cam, PixelDistanceMode::PerMeasurement);

        let expected = cam.project(Vec3::ZERO).position();
        let actual = field.measurements()[0].screen_position.expect("projected");
        assert!(actual.distance(expected) < 1e-3);
        assert!(actual.distance(Vec2::new(500.0, 400.0)) < 1e-2);
    }

    #[test]
    fn anchor_at_viewer_hides_label() {
        // Pure translation keeps the view transform exact, so the eye lands on w = 0.
        let cam = ArCamera::from_viewer(Mat4::from_translation(EYE), Vec2::new(1000.0, 800.0));
        let mut field = field_with(&[
            (EYE, EYE),
            (Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)),
        ]);

        field.update(&cam, PixelDistanceMode::PerMeasurement);

        let hidden = &field.measurements()[0];
        assert_eq!(hidden.screen_position, None);
        assert_eq!(hidden.pixel_distance, 0.0);
        assert!(field.measurements()[1].screen_position.is_some());
    }

    #[test]
    fn per_measurement_pixel_distance_uses_own_endpoints() {
        let cam = camera();
        let mut field = field_with(&[
            (Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)),
            (Vec3::ZERO, Vec3::ZERO),
        ]);

        field.update(&cam, PixelDistanceMode::PerMeasurement);

        let a = cam.project(Vec3::new(-0.5, 0.0, 0.0));
        let b = cam.project(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(field.measurements()[0].pixel_distance, a.distance(&b).round());
        assert_eq!(field.measurements()[1].pixel_distance, 0.0);
    }

    #[test]
    fn first_two_labels_mode_shares_anchor_distance() {
        let cam = camera();
        let mut field = field_with(&[
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(-0.5, 0.0, 0.0)),
            (Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -2.0)),
        ]);

        field.update(&cam, PixelDistanceMode::FirstTwoLabels);

        let a = cam.project(Vec3::new(-0.75, 0.0, 0.0));
        let b = cam.project(Vec3::new(0.75, 0.0, 0.0));
        let expected = a.distance(&b).round();
        for m in field.measurements() {
            assert_eq!(m.pixel_distance, expected);
        }
    }

    #[test]
    fn first_two_labels_mode_needs_two_measurements() {
        let mut field = field_with(&[(Vec3::ZERO, Vec3::X)]);

        field.update(&camera(), PixelDistanceMode::FirstTwoLabels);

        assert_eq!(field.measurements()[0].pixel_distance, 0.0);
    }

    #[test]
    fn switching_mode_takes_effect_next_update() {
        let cam = camera();
        let mut field = field_with(&[
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(-0.5, 0.0, 0.0)),
            (Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.5, 0.0, 0.0)),
        ]);

        field.update(&cam, PixelDistanceMode::PerMeasurement);
        let [first, second] = field.measurements() else {
            panic!("two measurements expected");
        };
        assert_ne!(first.pixel_distance, second.pixel_distance);

        field.update(&cam, PixelDistanceMode::FirstTwoLabels);
        let [first, second] = field.measurements() else {
            panic!("two measurements expected");
        };
        assert_eq!(first.pixel_distance, second.pixel_distance);
    }

    #[test]
    fn static_camera_keeps_labels_still() {
        let cam = camera();
        let mut field = field_with(&[(Vec3::new(0.2, 0.0, 0.3), Vec3::new(-0.4, 0.0, 0.1))]);

        field.update(&cam, PixelDistanceMode::PerMeasurement);
        let first = field.measurements()[0].clone();
        for _ in 0..50 {
            field.update(&cam, PixelDistanceMode::PerMeasurement);
            assert_eq!(field.measurements()[0], first);
        }
    }

    #[test]
    fn take_all_empties_in_order() {
        let mut field = field_with(&[(Vec3::ZERO, Vec3::X), (Vec3::ZERO, Vec3::Y)]);

        let taken = field.take_all();

        assert_eq!(taken.iter().map(|m| m.id).collect::<Vec<_>>(), vec![0, 1]);
        assert!(field.measurements().is_empty());
    }
}
