//! Core application setup.
//!
//! Handles window configuration and plugin initialisation for both native
//! and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the frame loop, RPC bridge, viewer camera
/// and platform-specific configurations.
pub mod app_setup;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
