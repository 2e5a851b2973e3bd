use crate::engine::tracking::hit_test::{
    Hit, HitTestBackend, HitTestSource, HitTestSourceFuture, Pose, ReferenceSpace, TrackedFrame,
};
use bevy::prelude::*;
use bevy::tasks::futures_lite::future;
use constants::camera::VIEWER_FAR;
use constants::interaction::{SIMULATED_SOURCE_LATENCY_FRAMES, SIMULATED_SURFACE_HEIGHT};
use std::task::Poll;

/// Hit-test backend that casts the viewer's forward ray against a horizontal surface.
///
/// Stands in for the AR runtime on desktop and in tests. The source request
/// resolves after `resolve_after_frames` polls to mimic the runtime's latency.
pub struct ViewerRayBackend {
    surface_height: f32,
    max_range: f32,
    resolve_after_frames: u32,
    next_source_id: u32,
    active: Option<HitTestSource>,
}

impl Default for ViewerRayBackend {
    fn default() -> Self {
        Self::new(
            SIMULATED_SURFACE_HEIGHT,
            VIEWER_FAR,
            SIMULATED_SOURCE_LATENCY_FRAMES,
        )
    }
}

impl ViewerRayBackend {
    pub fn new(surface_height: f32, max_range: f32, resolve_after_frames: u32) -> Self {
        Self {
            surface_height,
            max_range,
            resolve_after_frames,
            next_source_id: 1,
            active: None,
        }
    }

    fn surface_intersection(&self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        if direction.y.abs() < 0.001 {
            return None;
        }
        let t = (self.surface_height - origin.y) / direction.y;
        if t > 0.0 && t <= self.max_range {
            Some(origin + direction * t)
        } else {
            None
        }
    }
}

impl HitTestBackend for ViewerRayBackend {
    fn request_hit_test_source(&mut self, space: ReferenceSpace) -> HitTestSourceFuture {
        let source = HitTestSource::new(self.next_source_id, space);
        self.next_source_id += 1;
        self.active = Some(source);

        let mut remaining = self.resolve_after_frames;
        Box::pin(future::poll_fn(move |cx| {
            if remaining == 0 {
                return Poll::Ready(Ok(source));
            }
            remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }))
    }

    fn query(&self, source: &HitTestSource, frame: &TrackedFrame) -> Vec<Hit> {
        if self.active != Some(*source) {
            return Vec::new();
        }

        // Surface normal is world up, so the hit pose keeps an identity orientation.
        self.surface_intersection(frame.viewer_position(), frame.viewer_forward())
            .map(|point| Hit {
                pose: Pose::from_translation(point),
            })
            .into_iter()
            .collect()
    }

    fn release_hit_test_source(&mut self, source: HitTestSource) {
        if self.active == Some(source) {
            self.active = None;
        }
    }

    fn cancel_hit_test_source_request(&mut self) {
        if let Some(source) = self.active.take() {
            debug!("Dropped unresolved hit-test source {}", source.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tracking::surface_tracker::SurfaceTracker;
    use bevy::tasks::block_on;

    fn looking_down_at(eye: Vec3, target: Vec3) -> TrackedFrame {
        let viewer = Transform::from_translation(eye).looking_at(target, Vec3::Z);
        TrackedFrame::new(0, viewer.compute_matrix())
    }

    #[test]
    fn forward_ray_hits_surface() {
        let mut backend = ViewerRayBackend::new(0.0, 20.0, 0);
        let source = HitTestSource::new(1, ReferenceSpace::Viewer);
        backend.active = Some(source);

        let frame = looking_down_at(Vec3::new(0.0, 1.0, 1.0), Vec3::ZERO);
        let hits = backend.query(&source, &frame);

        assert_eq!(hits.len(), 1);
        assert!(hits[0].pose.position().distance(Vec3::ZERO) < 1e-4);
    }

    #[test]
    fn ray_pointing_away_or_parallel_misses() {
        let mut backend = ViewerRayBackend::new(0.0, 20.0, 0);
        let source = HitTestSource::new(1, ReferenceSpace::Viewer);
        backend.active = Some(source);

        let upward = looking_down_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, -1.0));
        let level = TrackedFrame::new(0, Mat4::from_translation(Vec3::Y));

        assert!(backend.query(&source, &upward).is_empty());
        assert!(backend.query(&source, &level).is_empty());
    }

    #[test]
    fn surface_beyond_range_misses() {
        let mut backend = ViewerRayBackend::new(0.0, 2.0, 0);
        let source = HitTestSource::new(1, ReferenceSpace::Viewer);
        backend.active = Some(source);

        let frame = looking_down_at(Vec3::new(0.0, 1.0, 10.0), Vec3::ZERO);
        assert!(backend.query(&source, &frame).is_empty());
    }

    #[test]
    fn released_source_no_longer_queries() {
        let mut backend = ViewerRayBackend::new(0.0, 20.0, 0);
        let source = HitTestSource::new(1, ReferenceSpace::Viewer);
        backend.active = Some(source);
        backend.release_hit_test_source(source);

        let frame = looking_down_at(Vec3::new(0.0, 1.0, 1.0), Vec3::ZERO);
        assert!(backend.query(&source, &frame).is_empty());
    }

    #[test]
    fn cancelled_request_leaves_no_live_source() {
        let mut backend = ViewerRayBackend::new(0.0, 20.0, 5);
        let request = backend.request_hit_test_source(ReferenceSpace::Viewer);
        let source = HitTestSource::new(1, ReferenceSpace::Viewer);
        assert_eq!(backend.active, Some(source));

        drop(request);
        backend.cancel_hit_test_source_request();

        assert!(backend.active.is_none());
        let frame = looking_down_at(Vec3::new(0.0, 1.0, 1.0), Vec3::ZERO);
        assert!(backend.query(&source, &frame).is_empty());
    }

    #[test]
    fn restart_after_cancel_issues_new_source() {
        let mut backend = ViewerRayBackend::new(0.0, 20.0, 0);
        drop(backend.request_hit_test_source(ReferenceSpace::Viewer));
        backend.cancel_hit_test_source_request();

        let request = backend.request_hit_test_source(ReferenceSpace::Viewer);
        let source = block_on(request).expect("zero-latency request resolves");

        assert_eq!(source.id(), 2);
        assert_eq!(backend.active, Some(source));
    }

    #[test]
    fn tracker_over_simulated_backend_waits_for_latency() {
        let mut tracker = SurfaceTracker::new(ViewerRayBackend::new(0.0, 20.0, 2));
        tracker.initialize();
        let frame = looking_down_at(Vec3::new(0.0, 1.0, 1.0), Vec3::ZERO);

        assert_eq!(tracker.poll(&frame), None);
        assert_eq!(tracker.poll(&frame), None);
        assert!(tracker.poll(&frame).is_some());
    }
}
