use crate::engine::camera::ar_camera::{ArCamera, sync_ar_camera};
use crate::engine::tracking::hit_test::{HitTestBackend, TrackedFrame};
use crate::engine::tracking::simulated_backend::ViewerRayBackend;
use crate::engine::tracking::surface_tracker::{SourceStatus, SurfaceTracker};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::cursor::{CursorGeometry, spawn_reticle, update_reticle};
use crate::tools::label_field::{PixelDistanceMode, spawn_label, update_label_visuals};
use crate::tools::live_segment::{spawn_live_segment, update_live_segment_visual};
use crate::tools::measure::{
    MeasureSettings, MeasurementSession, SessionState, SessionTeardown, TapOutcome, to_centimetres,
};
use bevy::prelude::*;
use constants::render_settings::{
    RETICLE_DOT_RADIUS, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS, RETICLE_RESOLUTION,
};

/// Per-frame orchestrator owning the tracker, the cursor and the measurement session.
///
/// Taps (`on_tap`) and frames (`on_frame`) are the only two ways state changes,
/// both dispatched from the same schedule so their order is explicit.
#[derive(Resource)]
pub struct FrameLoop {
    tracker: SurfaceTracker,
    cursor: CursorGeometry,
    session: MeasurementSession,
    frame_index: u64,
    running: bool,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(ViewerRayBackend::default())
    }
}

/// What changed during one `on_frame` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub cursor_visible: bool,
    pub visibility_changed: bool,
}

impl FrameLoop {
    pub fn new(backend: impl HitTestBackend) -> Self {
        Self {
            tracker: SurfaceTracker::new(backend),
            cursor: CursorGeometry::default(),
            session: MeasurementSession::default(),
            frame_index: 0,
            running: false,
        }
    }

    pub fn cursor(&self) -> &CursorGeometry {
        &self.cursor
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut MeasurementSession {
        &mut self.session
    }

    pub fn tracker_status(&self) -> SourceStatus {
        self.tracker.status()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin a session: request the hit-test source. It resolves on a later frame.
    /// Returns false when a session was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.tracker.initialize();
        self.running = true;
        info!("AR measuring session started");
        true
    }

    /// Poll tracking, move the cursor and live segment, then reproject labels.
    pub fn on_frame(
        &mut self,
        viewer: Mat4,
        camera: &ArCamera,
        pixel_mode: PixelDistanceMode,
    ) -> FrameReport {
        let frame = TrackedFrame::new(self.frame_index, viewer);
        self.frame_index += 1;

        let was_visible = self.cursor.is_visible();
        let hit = if self.running {
            self.tracker.poll(&frame)
        } else {
            None
        };
        self.cursor.apply(hit);

        if let Some(position) = self.cursor.position() {
            self.session.update_live_endpoint(position);
        }

        self.session.labels_mut().update(camera, pixel_mode);

        FrameReport {
            cursor_visible: self.cursor.is_visible(),
            visibility_changed: was_visible != self.cursor.is_visible(),
        }
    }

    /// Dispatch a tap against the cursor as it stands right now.
    pub fn on_tap(&mut self) -> TapOutcome {
        self.session
            .on_tap(self.cursor.pose().position(), self.cursor.is_visible())
    }

    /// Release the hit-test source and drop all transient and finished geometry.
    pub fn end(&mut self) -> SessionTeardown {
        self.tracker.release();
        self.cursor.hide();
        self.running = false;
        let teardown = self.session.end();
        info!(
            "AR measuring session ended, cleared {} measurement(s)",
            teardown.measurements.len()
        );
        teardown
    }
}

/// A discrete tap from the input layer.
#[derive(Event, Debug, Clone, Copy)]
pub struct TapEvent {
    pub source: TapSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapSource {
    Pointer,
    Rpc,
}

/// Session lifecycle notifications from the host.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArSessionEvent {
    Start,
    End,
}

/// Shared mesh and material handles for the measuring visuals.
#[derive(Resource, Default)]
pub struct MeasureVisuals {
    pub reticle_ring: Handle<Mesh>,
    pub reticle_dot: Handle<Mesh>,
    pub reticle_material: Handle<StandardMaterial>,
    pub line_mesh: Handle<Mesh>,
    pub line_material: Handle<StandardMaterial>,
    pub line_width: f32,
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameLoopSet {
    Input,
    Lifecycle,
    Taps,
    Track,
    Visuals,
}

pub fn setup_measure_visuals(
    mut commands: Commands,
    settings: Res<MeasureSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let unlit = |colour: Color| StandardMaterial {
        base_color: colour,
        unlit: true,
        cull_mode: None,
        ..default()
    };

    commands.insert_resource(MeasureVisuals {
        reticle_ring: meshes.add(
            Annulus::new(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS)
                .mesh()
                .resolution(RETICLE_RESOLUTION),
        ),
        reticle_dot: meshes.add(
            Circle::new(RETICLE_DOT_RADIUS)
                .mesh()
                .resolution(RETICLE_RESOLUTION),
        ),
        reticle_material: materials.add(unlit(settings.reticle_colour)),
        line_mesh: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
        line_material: materials.add(unlit(settings.line_colour)),
        line_width: settings.line_width,
    });
}

pub fn start_session_on_launch(mut events: EventWriter<ArSessionEvent>) {
    events.write(ArSessionEvent::Start);
}

pub fn read_pointer_taps(
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut taps: EventWriter<TapEvent>,
) {
    if mouse.just_pressed(MouseButton::Left) || touches.any_just_pressed() {
        taps.write(TapEvent {
            source: TapSource::Pointer,
        });
    }
}

/// Escape ends the session and Enter starts a new one (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn session_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut events: EventWriter<ArSessionEvent>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        events.write(ArSessionEvent::End);
    }
    if keyboard.just_pressed(KeyCode::Enter) {
        events.write(ArSessionEvent::Start);
    }
}

#[cfg(target_arch = "wasm32")]
pub fn session_keyboard_shortcuts() {
    // The host page drives the session lifecycle over RPC.
}

pub fn handle_session_events(
    mut commands: Commands,
    mut events: EventReader<ArSessionEvent>,
    mut frame_loop: ResMut<FrameLoop>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        match event {
            ArSessionEvent::Start => {
                if !frame_loop.start() {
                    debug!("Session start ignored: already running");
                    continue;
                }
                rpc_interface.send_notification(
                    "session_state_changed",
                    serde_json::json!({ "state": "started" }),
                );
            }
            ArSessionEvent::End => {
                let teardown = frame_loop.end();
                for entity in teardown.visuals() {
                    commands.entity(entity).despawn();
                }
                rpc_interface.send_notification("measure_cleared", serde_json::json!({}));
                rpc_interface.send_notification(
                    "session_state_changed",
                    serde_json::json!({ "state": "ended" }),
                );
            }
        }
    }
}

pub fn handle_tap_events(
    mut commands: Commands,
    mut taps: EventReader<TapEvent>,
    mut frame_loop: ResMut<FrameLoop>,
    settings: Res<MeasureSettings>,
    visuals: Res<MeasureVisuals>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for tap in taps.read() {
        match frame_loop.on_tap() {
            TapOutcome::Ignored => {
                debug!("Tap from {:?} ignored: no surface under cursor", tap.source);
            }
            TapOutcome::Started { point } => {
                if let Some(segment) = frame_loop.session().live_segment() {
                    let entity = spawn_live_segment(&mut commands, &visuals, segment);
                    frame_loop.session_mut().attach_segment_visual(entity);
                }
                rpc_interface.send_notification(
                    "measure_started",
                    serde_json::json!({ "position": [point.x, point.y, point.z] }),
                );
            }
            TapOutcome::Completed {
                measurement,
                segment,
            } => {
                if let Some(entity) = segment.visual() {
                    commands.entity(entity).despawn();
                }

                let Some(completed) = frame_loop.session().measurement(measurement).cloned() else {
                    continue;
                };
                let label = spawn_label(&mut commands, &settings, &completed);
                frame_loop.session_mut().attach_label(measurement, label);

                info!(
                    "Measurement {} completed: {} cm",
                    completed.id,
                    completed.distance_cm()
                );
                rpc_interface.send_notification("measure_completed", completed.to_json());
            }
        }
    }
}

pub fn advance_frame_loop(
    camera: Res<ArCamera>,
    settings: Res<MeasureSettings>,
    mut frame_loop: ResMut<FrameLoop>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let camera = *camera;
    let report = frame_loop.on_frame(camera.viewer, &camera, settings.pixel_distance_mode);

    if report.visibility_changed {
        rpc_interface.send_notification(
            "tracking_changed",
            serde_json::json!({ "visible": report.cursor_visible }),
        );
    }
}

/// Publish the preview distance while the second point is being aimed.
pub fn notify_live_measurement(
    frame_loop: Res<FrameLoop>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let session = frame_loop.session();
    if session.state() != SessionState::AwaitingSecondPoint || !frame_loop.cursor().is_visible() {
        return;
    }
    let Some(segment) = session.live_segment() else {
        return;
    };

    let (start, end) = (segment.start(), segment.end());
    rpc_interface.send_notification(
        "measure_updated",
        serde_json::json!({
            "start": [start.x, start.y, start.z],
            "end": [end.x, end.y, end.z],
            "distance_cm": to_centimetres(segment.length()),
        }),
    );
}

pub struct FrameLoopPlugin;

impl Plugin for FrameLoopPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MeasureSettings>()
            .init_resource::<FrameLoop>()
            .init_resource::<ArCamera>()
            .add_event::<TapEvent>()
            .add_event::<ArSessionEvent>()
            .configure_sets(
                Update,
                (
                    FrameLoopSet::Input,
                    FrameLoopSet::Lifecycle,
                    FrameLoopSet::Taps,
                    FrameLoopSet::Track,
                    FrameLoopSet::Visuals,
                )
                    .chain(),
            )
            .add_systems(
                Startup,
                (setup_measure_visuals, spawn_reticle, start_session_on_launch).chain(),
            )
            .add_systems(
                Update,
                (
                    (read_pointer_taps, session_keyboard_shortcuts).in_set(FrameLoopSet::Input),
                    handle_session_events.in_set(FrameLoopSet::Lifecycle),
                    handle_tap_events.in_set(FrameLoopSet::Taps),
                    (sync_ar_camera, advance_frame_loop)
                        .chain()
                        .in_set(FrameLoopSet::Track),
                    (
                        update_reticle,
                        update_live_segment_visual,
                        update_label_visuals,
                        notify_live_measurement,
                    )
                        .in_set(FrameLoopSet::Visuals),
                ),
            );
    }
}
