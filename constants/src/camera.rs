/// Vertical field of view of the viewer camera (degrees).
pub const VIEWER_FOV_DEGREES: f32 = 70.0;

/// Near clip plane (metres).
pub const VIEWER_NEAR: f32 = 0.01;

/// Far clip plane (metres). Also bounds the simulated hit-test ray.
pub const VIEWER_FAR: f32 = 20.0;

/// Height of the simulated viewer above the tracked surface (metres).
pub const VIEWER_EYE_HEIGHT: f32 = 1.4;
