//! JSON-RPC 2.0 bridge to the embedding web page over iframe postMessage.
//!
//! Requests carrying an `id` get a response; requests without one are acted on
//! silently. Messages whose `jsonrpc` is not `"2.0"` are rejected with `-32600`.
//!
//! ## Methods
//!
//! - `tap`: place a point at the cursor, same as touching the canvas
//! - `start_session` / `end_session`: begin or tear down the AR session
//! - `get_measurements`: session state, tracking status, pixel mode and completed measurements
//! - `set_pixel_distance_mode`: `{"mode": "per_measurement" | "first_two_labels"}`
//! - `get_fps`: current frame rate
//!
//! ## Notifications
//!
//! - `tracking_changed`: cursor found or lost the surface
//! - `measure_started` / `measure_updated` / `measure_completed`: measurement lifecycle
//! - `measure_cleared`: session ended, every measurement removed
//! - `session_state_changed`: session started or ended
//! - `fps_update`: periodic frame rate report
//!
//! Errors: `-32600` invalid request, `-32601` method not found, `-32602` invalid
//! params, `-32603` internal error.

pub mod web_rpc;
