//! Scene lighting and spatial reference.

/// Ambient and directional lighting plus a flat grid marking the simulated surface.
pub mod environment;
