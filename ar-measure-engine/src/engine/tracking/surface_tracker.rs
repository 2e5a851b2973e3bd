use crate::engine::tracking::hit_test::{
    HitTestBackend, HitTestSource, HitTestSourceFuture, Pose, ReferenceSpace, TrackedFrame,
};
use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future};
use serde::Serialize;

/// Observable state of the hit-test source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Unrequested,
    Pending,
    Ready,
    Failed,
    Released,
}

enum SourceSlot {
    Unrequested,
    Pending(HitTestSourceFuture),
    Ready(HitTestSource),
    Failed,
    Released,
}

/// Polls the environment once per tracked frame for the surface under the viewer ray.
pub struct SurfaceTracker {
    backend: Box<dyn HitTestBackend>,
    slot: SourceSlot,
}

impl SurfaceTracker {
    pub fn new(backend: impl HitTestBackend) -> Self {
        Self {
            backend: Box::new(backend),
            slot: SourceSlot::Unrequested,
        }
    }

    pub fn status(&self) -> SourceStatus {
        match self.slot {
            SourceSlot::Unrequested => SourceStatus::Unrequested,
            SourceSlot::Pending(_) => SourceStatus::Pending,
            SourceSlot::Ready(_) => SourceStatus::Ready,
            SourceSlot::Failed => SourceStatus::Failed,
            SourceSlot::Released => SourceStatus::Released,
        }
    }

    /// Request the viewer-bound hit-test source. Does nothing while a request is
    /// in flight or a source is already held.
    pub fn initialize(&mut self) {
        if matches!(self.slot, SourceSlot::Pending(_) | SourceSlot::Ready(_)) {
            return;
        }

        info!("Requesting hit-test source bound to viewer space");
        self.slot = SourceSlot::Pending(
            self.backend
                .request_hit_test_source(ReferenceSpace::Viewer),
        );
    }

    /// Closest surface pose under the viewer ray, or `None` when nothing is hit,
    /// the source has not resolved yet, or the tracker was released.
    pub fn poll(&mut self, frame: &TrackedFrame) -> Option<Pose> {
        self.resolve_pending();

        let SourceSlot::Ready(source) = &self.slot else {
            return None;
        };

        let viewer = frame.viewer_position();
        self.backend
            .query(source, frame)
            .into_iter()
            .map(|hit| hit.pose)
            .min_by(|a, b| {
                a.position()
                    .distance_squared(viewer)
                    .total_cmp(&b.position().distance_squared(viewer))
            })
    }

    /// Hand the source back to the runtime. Safe to call in any state.
    pub fn release(&mut self) {
        match std::mem::replace(&mut self.slot, SourceSlot::Released) {
            SourceSlot::Ready(source) => {
                self.backend.release_hit_test_source(source);
                info!("Released hit-test source {}", source.id());
            }
            SourceSlot::Pending(_) => {
                self.backend.cancel_hit_test_source_request();
                info!("Cancelled pending hit-test source request");
            }
            _ => {}
        }
    }

    fn resolve_pending(&mut self) {
        let SourceSlot::Pending(request) = &mut self.slot else {
            return;
        };
        let Some(result) = block_on(future::poll_once(request)) else {
            return;
        };

        self.slot = match result {
            Ok(source) => {
                info!(
                    "Hit-test source {} ready ({:?} space)",
                    source.id(),
                    source.space()
                );
                SourceSlot::Ready(source)
            }
            Err(error) => {
                warn!("Hit-test source request failed: {}", error);
                SourceSlot::Failed
            }
        };
    }
}
