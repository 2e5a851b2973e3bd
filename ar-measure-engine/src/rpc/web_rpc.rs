use crate::tools::frame_loop::{ArSessionEvent, FrameLoop, TapEvent, TapSource};
use crate::tools::label_field::PixelDistanceMode;
use crate::tools::measure::MeasureSettings;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the host page and Bevy.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to host page without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the host page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    #[cfg(test)]
    pub fn queued_notifications(&self) -> impl Iterator<Item = &RpcNotification> {
        self.outgoing_notifications.iter()
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            // Attempt JSON parsing to validate RPC format before queuing.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
            return;
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from host page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    diagnostics: Res<DiagnosticsStore>,
    frame_loop: Res<FrameLoop>,
    mut settings: ResMut<MeasureSettings>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut tap_events: EventWriter<TapEvent>,
    mut session_events: EventWriter<ArSessionEvent>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);

                if let Some(response) = handle_rpc_request(
                    &request,
                    &diagnostics,
                    &frame_loop,
                    &mut settings,
                    &mut tap_events,
                    &mut session_events,
                ) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Malformed RPC message: {}", parse_error);
                rpc_interface.send_notification(
                    "debug_message",
                    serde_json::json!({
                        "message": format!("Parse error: {}", parse_error)
                    }),
                );
            }
        }
    }
}

/// Dispatch one request. Notifications (no ID) are acted on but never answered.
fn handle_rpc_request(
    request: &RpcRequest,
    diagnostics: &DiagnosticsStore,
    frame_loop: &FrameLoop,
    settings: &mut MeasureSettings,
    tap_events: &mut EventWriter<TapEvent>,
    session_events: &mut EventWriter<ArSessionEvent>,
) -> Option<RpcResponse> {
    if request.jsonrpc != "2.0" {
        warn!("Rejected RPC message with version {:?}", request.jsonrpc);
        let id = request.id.clone()?;
        return Some(create_error_response(
            id,
            -32600,
            "Invalid Request",
            Some(serde_json::json!({"jsonrpc": request.jsonrpc})),
        ));
    }

    let result = match request.method.as_str() {
        "tap" => handle_tap(tap_events),
        "start_session" => handle_session_change(ArSessionEvent::Start, session_events),
        "end_session" => handle_session_change(ArSessionEvent::End, session_events),
        "get_measurements" => handle_get_measurements(frame_loop, settings),
        "set_pixel_distance_mode" => handle_set_pixel_distance_mode(&request.params, settings),
        "get_fps" => handle_get_fps(diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            let id = request.id.clone()?;
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({"method": request.method})),
            ));
        }
    };

    // Only requests with IDs get a response.
    let id = request.id.clone()?;

    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Forward a tap from the page's DOM overlay into the frame loop.
fn handle_tap(tap_events: &mut EventWriter<TapEvent>) -> Result<serde_json::Value, RpcError> {
    tap_events.write(TapEvent {
        source: TapSource::Rpc,
    });

    Ok(serde_json::json!({ "queued": true }))
}

fn handle_session_change(
    event: ArSessionEvent,
    session_events: &mut EventWriter<ArSessionEvent>,
) -> Result<serde_json::Value, RpcError> {
    session_events.write(event);
    info!("Session lifecycle event dispatched: {:?}", event);

    let state = match event {
        ArSessionEvent::Start => "starting",
        ArSessionEvent::End => "ending",
    };
    Ok(serde_json::json!({ "state": state }))
}

/// Snapshot of the session: state, tracking, cursor and every finished measurement.
fn handle_get_measurements(
    frame_loop: &FrameLoop,
    settings: &MeasureSettings,
) -> Result<serde_json::Value, RpcError> {
    let encode = |value: Result<serde_json::Value, serde_json::Error>| {
        value.map_err(|e| RpcError::internal_error(&format!("Failed to encode session: {}", e)))
    };

    let session = frame_loop.session();
    let state = encode(serde_json::to_value(session.state()))?;
    let tracking = encode(serde_json::to_value(frame_loop.tracker_status()))?;
    let pixel_mode = encode(serde_json::to_value(settings.pixel_distance_mode))?;
    let measurements: Vec<_> = session.measurements().iter().map(|m| m.to_json()).collect();

    Ok(serde_json::json!({
        "running": frame_loop.is_running(),
        "state": state,
        "tracking": tracking,
        "cursor_visible": frame_loop.cursor().is_visible(),
        "pixel_distance_mode": pixel_mode,
        "measurements": measurements,
    }))
}

/// Switch how label pixel distances are computed. Applies from the next frame.
fn handle_set_pixel_distance_mode(
    params: &serde_json::Value,
    settings: &mut MeasureSettings,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct ModeParams {
        mode: PixelDistanceMode,
    }

    let parsed = serde_json::from_value::<ModeParams>(params.clone()).map_err(|_| {
        RpcError::invalid_params("Expected 'mode': \"per_measurement\" or \"first_two_labels\"")
    })?;

    settings.pixel_distance_mode = parsed.mode;
    info!("Pixel distance mode set to {:?}", parsed.mode);

    Ok(serde_json::json!({ "mode": params["mode"] }))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to parent window (host page).
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
