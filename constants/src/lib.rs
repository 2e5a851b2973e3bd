//! Shared tunables for the AR measuring engine.

pub mod camera;
pub mod interaction;
pub mod render_settings;
