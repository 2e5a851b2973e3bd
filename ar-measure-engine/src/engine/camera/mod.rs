//! Viewer camera for the measuring session.
//!
//! `ArCamera` carries the per-frame view-projection and viewport that anchors are
//! projected with. The viewer controller stands in for device motion when the
//! engine runs without an AR runtime.

/// Per-frame view-projection snapshot of the viewer camera.
pub mod ar_camera;

/// Viewer camera spawning and keyboard/mouse driven device-motion stand-in.
pub mod viewer_controller;
