/// Scale from metres to the centimetres shown on labels.
pub const CENTIMETRES_PER_METRE: f32 = 100.0;

/// Frames the simulated hit-test source takes to resolve after being requested.
pub const SIMULATED_SOURCE_LATENCY_FRAMES: u32 = 3;

/// Height of the simulated tracked surface (metres, world Y).
pub const SIMULATED_SURFACE_HEIGHT: f32 = 0.0;

/// Interval between FPS notifications sent to the host page (seconds).
pub const FPS_NOTIFICATION_INTERVAL: f32 = 0.5;
