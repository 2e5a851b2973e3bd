use crate::tools::label_field::{LabelField, PixelDistanceMode};
use crate::tools::live_segment::LiveSegment;
use bevy::prelude::*;
use constants::interaction::CENTIMETRES_PER_METRE;
use constants::render_settings::{
    DRAW_LINE_WIDTH, LABEL_COLOUR, LABEL_FONT_SIZE, LINE_COLOUR, RETICLE_COLOUR,
};
use serde::{Deserialize, Serialize};

pub type MeasurementId = u32;

/// Tunables for the measuring experience.
#[derive(Resource, Debug, Clone)]
pub struct MeasureSettings {
    pub pixel_distance_mode: PixelDistanceMode,
    pub label_colour: Color,
    pub label_font_size: f32,
    pub line_colour: Color,
    pub line_width: f32,
    pub reticle_colour: Color,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            pixel_distance_mode: PixelDistanceMode::default(),
            label_colour: LABEL_COLOUR,
            label_font_size: LABEL_FONT_SIZE,
            line_colour: LINE_COLOUR,
            line_width: DRAW_LINE_WIDTH,
            reticle_colour: RETICLE_COLOUR,
        }
    }
}

/// Euclidean distance between two world points, in metres.
pub fn distance_3d(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Metres to whole centimetres, rounded to nearest.
pub fn to_centimetres(metres: f32) -> u32 {
    (metres * CENTIMETRES_PER_METRE).round() as u32
}

/// Centre of the segment joining `a` and `b`.
pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

/// A completed two-point measurement.
///
/// Endpoints, distance and anchor are fixed at creation. `pixel_distance` and
/// `screen_position` are rewritten every frame by the label field.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: MeasurementId,
    pub point_a: Vec3,
    pub point_b: Vec3,
    /// Metres.
    pub distance: f32,
    pub label_anchor: Vec3,
    pub pixel_distance: f32,
    pub screen_position: Option<Vec2>,
    /// Screen-space label visual, once spawned.
    pub label: Option<Entity>,
}

impl Measurement {
    pub fn new(id: MeasurementId, point_a: Vec3, point_b: Vec3) -> Self {
        Self {
            id,
            point_a,
            point_b,
            distance: distance_3d(point_a, point_b),
            label_anchor: midpoint(point_a, point_b),
            pixel_distance: 0.0,
            screen_position: None,
            label: None,
        }
    }

    pub fn distance_cm(&self) -> u32 {
        to_centimetres(self.distance)
    }

    pub fn label_text(&self) -> String {
        format!("{} cm, {} px", self.distance_cm(), self.pixel_distance)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "start": [self.point_a.x, self.point_a.y, self.point_a.z],
            "end": [self.point_b.x, self.point_b.y, self.point_b.z],
            "distance_cm": self.distance_cm(),
            "label_anchor": [self.label_anchor.x, self.label_anchor.y, self.label_anchor.z],
            "pixel_distance": self.pixel_distance,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingSecondPoint,
}

/// First point of an in-progress measurement and the line previewing it.
#[derive(Debug, Clone, PartialEq)]
struct PendingMeasurement {
    point: Vec3,
    segment: LiveSegment,
}

/// Result of dispatching one tap into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// Cursor hidden, nothing changed.
    Ignored,
    /// First point placed, a live segment now previews the measurement.
    Started { point: Vec3 },
    /// Second point placed. The returned segment has been disposed by the session
    /// and its visual must be removed by the caller.
    Completed {
        measurement: MeasurementId,
        segment: LiveSegment,
    },
}

/// Everything a session held when it ended. Callers remove the visuals.
#[derive(Debug, Default)]
pub struct SessionTeardown {
    pub segment: Option<LiveSegment>,
    pub measurements: Vec<Measurement>,
}

impl SessionTeardown {
    /// Entities of every visual the teardown released.
    pub fn visuals(&self) -> Vec<Entity> {
        self.segment
            .iter()
            .filter_map(LiveSegment::visual)
            .chain(self.measurements.iter().filter_map(|m| m.label))
            .collect()
    }
}

/// Two-point measurement state machine: Idle <-> AwaitingSecondPoint.
#[derive(Debug, Default)]
pub struct MeasurementSession {
    pending: Option<PendingMeasurement>,
    labels: LabelField,
    next_id: MeasurementId,
}

impl MeasurementSession {
    pub fn state(&self) -> SessionState {
        if self.pending.is_some() {
            SessionState::AwaitingSecondPoint
        } else {
            SessionState::Idle
        }
    }

    pub fn pending_point(&self) -> Option<Vec3> {
        self.pending.as_ref().map(|p| p.point)
    }

    pub fn live_segment(&self) -> Option<&LiveSegment> {
        self.pending.as_ref().map(|p| &p.segment)
    }

    pub fn measurements(&self) -> &[Measurement] {
        self.labels.measurements()
    }

    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.labels.get(id)
    }

    pub fn labels_mut(&mut self) -> &mut LabelField {
        &mut self.labels
    }

    /// Handle a tap at `point`. Taps are dropped while the cursor is not visible.
    pub fn on_tap(&mut self, point: Vec3, cursor_visible: bool) -> TapOutcome {
        if !cursor_visible {
            return TapOutcome::Ignored;
        }

        match self.pending.take() {
            None => {
                self.pending = Some(PendingMeasurement {
                    point,
                    segment: LiveSegment::new(point),
                });
                TapOutcome::Started { point }
            }
            Some(pending) => {
                let id = self.next_id;
                self.next_id += 1;
                self.labels.push(Measurement::new(id, pending.point, point));
                TapOutcome::Completed {
                    measurement: id,
                    segment: pending.segment,
                }
            }
        }
    }

    /// Move the live end of the in-progress segment. No-op when Idle.
    pub fn update_live_endpoint(&mut self, cursor: Vec3) {
        if let Some(pending) = self.pending.as_mut() {
            pending.segment.set_end(cursor);
        }
    }

    pub fn attach_segment_visual(&mut self, entity: Entity) {
        if let Some(pending) = self.pending.as_mut() {
            pending.segment.attach_visual(entity);
        }
    }

    pub fn attach_label(&mut self, id: MeasurementId, entity: Entity) {
        if let Some(measurement) = self.labels.get_mut(id) {
            measurement.label = Some(entity);
        }
    }

    /// Abandon the pending point, returning its segment for disposal.
    pub fn cancel(&mut self) -> Option<LiveSegment> {
        self.pending.take().map(|p| p.segment)
    }

    /// Drop the pending point, live segment and every measurement.
    pub fn end(&mut self) -> SessionTeardown {
        SessionTeardown {
            segment: self.cancel(),
            measurements: self.labels.take_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let points = [
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.25, 4.0, -7.5),
        ];
        for a in points {
            assert_eq!(distance_3d(a, a), 0.0);
            for b in points {
                assert_eq!(distance_3d(a, b), distance_3d(b, a));
                assert!(distance_3d(a, b) >= 0.0);
            }
        }
    }

    #[test]
    fn degenerate_measurement_is_defined() {
        let p = Vec3::new(0.3, 0.0, -1.2);
        let m = Measurement::new(0, p, p);

        assert_eq!(m.distance_cm(), 0);
        assert_eq!(m.label_anchor, p);
    }

    #[test]
    fn centimetres_round_to_nearest() {
        assert_eq!(to_centimetres(1.0), 100);
        assert_eq!(to_centimetres(0.1234), 12);
        assert_eq!(to_centimetres(0.1251), 13);
    }

    #[test]
    fn tap_while_cursor_hidden_is_ignored() {
        let mut session = MeasurementSession::default();

        let outcome = session.on_tap(Vec3::ONE, false);

        assert_eq!(outcome, TapOutcome::Ignored);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.pending_point(), None);
        assert!(session.live_segment().is_none());
    }

    #[test]
    fn two_visible_taps_create_one_measurement() {
        let mut session = MeasurementSession::default();

        let first = session.on_tap(Vec3::ZERO, true);
        assert_eq!(first, TapOutcome::Started { point: Vec3::ZERO });
        assert_eq!(session.state(), SessionState::AwaitingSecondPoint);
        assert_eq!(session.pending_point(), Some(Vec3::ZERO));

        let second = session.on_tap(Vec3::new(1.0, 0.0, 0.0), true);
        let TapOutcome::Completed { measurement, segment } = second else {
            panic!("expected completion, got {second:?}");
        };

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.live_segment().is_none());
        assert_eq!(segment.start(), Vec3::ZERO);
        assert_eq!(session.measurements().len(), 1);

        let m = session.measurement(measurement).expect("measurement stored");
        assert_eq!(m.point_a, Vec3::ZERO);
        assert_eq!(m.point_b, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(m.distance_cm(), 100);
        assert_eq!(m.label_anchor, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn hidden_tap_while_awaiting_keeps_pending_point() {
        let mut session = MeasurementSession::default();
        session.on_tap(Vec3::X, true);

        assert_eq!(session.on_tap(Vec3::Y, false), TapOutcome::Ignored);
        assert_eq!(session.state(), SessionState::AwaitingSecondPoint);
        assert_eq!(session.pending_point(), Some(Vec3::X));
    }

    #[test]
    fn live_endpoint_follows_cursor_only_while_awaiting() {
        let mut session = MeasurementSession::default();
        session.update_live_endpoint(Vec3::ONE);
        assert!(session.live_segment().is_none());

        session.on_tap(Vec3::ZERO, true);
        session.update_live_endpoint(Vec3::new(0.0, 0.0, -2.0));

        let segment = session.live_segment().expect("segment while awaiting");
        assert_eq!(segment.start(), Vec3::ZERO);
        assert_eq!(segment.end(), Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn measurement_uses_tap_point_not_preview() {
        let mut session = MeasurementSession::default();
        session.on_tap(Vec3::ZERO, true);
        session.update_live_endpoint(Vec3::new(5.0, 0.0, 0.0));

        session.on_tap(Vec3::new(2.0, 0.0, 0.0), true);

        assert_eq!(session.measurements()[0].distance_cm(), 200);
    }

    #[test]
    fn end_while_awaiting_clears_everything_and_restarts_fresh() {
        let mut session = MeasurementSession::default();
        session.on_tap(Vec3::ZERO, true);
        session.on_tap(Vec3::X, true);
        session.on_tap(Vec3::Z, true);
        session.attach_segment_visual(Entity::from_raw(9));

        let teardown = session.end();

        assert!(teardown.segment.is_some());
        assert_eq!(teardown.measurements.len(), 1);
        assert_eq!(teardown.visuals(), vec![Entity::from_raw(9)]);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.measurements().is_empty());

        assert_eq!(
            session.on_tap(Vec3::Y, true),
            TapOutcome::Started { point: Vec3::Y }
        );
        assert_eq!(session.pending_point(), Some(Vec3::Y));
    }

    #[test]
    fn measurement_ids_keep_insertion_order() {
        let mut session = MeasurementSession::default();
        for i in 0..3 {
            let x = i as f32;
            session.on_tap(Vec3::new(x, 0.0, 0.0), true);
            session.on_tap(Vec3::new(x, 0.0, 1.0), true);
        }

        let ids: Vec<_> = session.measurements().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn cancel_returns_segment_exactly_once() {
        let mut session = MeasurementSession::default();
        session.on_tap(Vec3::ZERO, true);

        assert!(session.cancel().is_some());
        assert!(session.cancel().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
