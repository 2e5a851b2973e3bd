//! Environment hit-testing for the surface cursor.
//!
//! The hosting AR runtime owns the actual hit-test machinery. This module models
//! it as a capability (`HitTestBackend`) and wraps it in a `SurfaceTracker` that
//! the frame loop polls once per tracked frame.
//!
//! ## Lifecycle
//!
//! ```text
//! initialize()  ──> request_hit_test_source(Viewer)  (future, resolves later)
//!   poll(frame) ──> source pending?  -> None (cursor hidden)
//!               ──> source ready?    -> query(source, frame) -> closest Pose
//! release()     ──> release_hit_test_source(source), later polls return None
//! ```


/// Per-frame surface tracking over a lazily resolved hit-test source.
pub mod surface_tracker;

/// Viewer-ray hit testing against a flat surface, used when no AR runtime is present.
pub mod simulated_backend;
