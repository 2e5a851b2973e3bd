//! Tap-to-measure tool running over an AR session.
//!
//! A reticle follows the tracked surface under the centre of the view. The first
//! tap pins a point and starts a preview line to the reticle; the second tap
//! finishes the measurement and pins a label at its midpoint. Labels track
//! their anchors on screen every frame until the session ends.
//!
//! ## Per-Frame Order
//!
//! ```text
//! Input      read pointer / touch / keyboard / RPC
//!   └─> Lifecycle  start or end the session
//!       └─> Taps       place points against last frame's cursor
//!           └─> Track      hit-test, move cursor, stretch preview, reproject labels
//!               └─> Visuals    sync reticle, line and label entities
//! ```
//!
//! ## Cross-Platform Considerations
//!
//! - Native: left click places points, Escape ends and Enter restarts the session
//! - WASM: canvas touches place points, the host page drives everything else via RPC

/// Reticle state and visuals for the surface cursor.
pub mod cursor;

/// Per-frame orchestrator plus the systems and plugin that drive it.
pub mod frame_loop;

/// Completed measurements and their screen-space label anchors.
pub mod label_field;

/// Preview line between the first point and the cursor.
pub mod live_segment;

/// Measurement records and the two-tap session state machine.
pub mod measure;
