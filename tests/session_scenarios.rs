use jamline::core::playback::{AudioEngine, TickReport};
use jamline::messaging::{CollabBus, CollabEndpoint, LoopbackServer, OutboundEvent};
use jamline::render::{RenderedNote, Renderer};
use jamline::{JamSession, Note, NoteId, SessionConfig, Viewport, Waveform};
use serde_json::json;

const NOW: i64 = 1_700_000_000_000;
const SURFACE: Viewport = Viewport { width: 800.0, height: 600.0 };
const CENTER: (f64, f64) = (400.0, 300.0);

#[derive(Default)]
struct Engine {
    clock: f64,
    starts: usize,
    triggers: Vec<(Waveform, f64, f64)>,
    volume_db: Option<f32>,
}

impl AudioEngine for Engine {
    fn start(&mut self) -> anyhow::Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn now(&self) -> f64 {
        self.clock
    }

    fn trigger(&mut self, waveform: Waveform, frequency: f64, start_at: f64, _duration: f64) {
        self.triggers.push((waveform, frequency, start_at));
    }

    fn set_volume(&mut self, db: f32) {
        self.volume_db = Some(db);
    }
}

#[derive(Default)]
struct Canvas {
    provisional: Vec<NoteId>,
    retired: Vec<NoteId>,
    pulses: Vec<NoteId>,
    cursors_removed: Vec<String>,
    last_scroll: f64,
    audio_on: Option<bool>,
}

impl Renderer for Canvas {
    fn scroll_to(&mut self, offset_px: f64) {
        self.last_scroll = offset_px;
    }

    fn draw_provisional(&mut self, note: &Note, _left_px: f64, _offset_y_px: f64) {
        self.provisional.push(note.id.clone());
    }

    fn remove_provisional(&mut self, id: &NoteId) {
        self.retired.push(id.clone());
    }

    fn pulse(&mut self, id: &NoteId) {
        self.pulses.push(id.clone());
    }

    fn remove_cursor(&mut self, user_id: &str) {
        self.cursors_removed.push(user_id.to_string());
    }

    fn audio_state(&mut self, enabled: bool) {
        self.audio_on = Some(enabled);
    }
}

fn session_with(config: SessionConfig) -> (JamSession<Engine, Canvas>, CollabEndpoint) {
    let (bus, endpoint) = CollabBus::channel();
    let mut session = JamSession::new(config, NOW, Engine::default(), Canvas::default(), bus);
    session.set_viewport(Some(SURFACE));
    (session, endpoint)
}

fn session() -> (JamSession<Engine, Canvas>, CollabEndpoint) {
    session_with(SessionConfig { user_color: Some("#f80".into()), ..Default::default() })
}

#[test]
fn note_at_center_plays_on_the_next_tick() {
    let (mut s, endpoint) = session_with(SessionConfig { zoom_y: 2.0, ..Default::default() });
    assert_eq!(s.view().mapper().world_to_screen_x(NOW), 0.0);

    let id = s.pointer_down(NOW, (CENTER.0, CENTER.1 + 30.0)).unwrap();
    let note = s.store().get(&id).unwrap().clone();
    assert!((note.x - NOW).abs() <= 1);
    assert_eq!(note.y, 15.0);
    assert!(note.is_optimistic());
    assert_eq!(s.renderer().audio_on, Some(true));
    assert_eq!(s.renderer().provisional, vec![id.clone()]);

    let outbound = endpoint.take_outbound();
    assert_eq!(outbound[0], OutboundEvent::AddNote { x: note.x, y: 30.0 });
    assert!(matches!(outbound[1], OutboundEvent::CursorMove { .. }));

    let report = s.frame(NOW);
    assert_eq!(report.fired, vec![id.clone()]);
    assert_eq!(s.engine().triggers.len(), 1);
    assert_eq!(s.renderer().pulses, vec![id]);
    assert_eq!(s.renderer().last_scroll, 0.0);
}

#[test]
fn continuous_drag_within_one_window_creates_one_note() {
    let (mut s, _endpoint) = session();
    s.pointer_down(NOW, CENTER);
    for dt in [10, 20, 30, 40] {
        assert!(s.pointer_move(NOW + dt, (CENTER.0 + dt as f64, CENTER.1)).is_none());
    }
    assert_eq!(s.store().len(), 1);

    assert!(s.pointer_move(NOW + 60, CENTER).is_some());
    s.pointer_up();
    assert!(s.pointer_move(NOW + 200, CENTER).is_none());
    assert_eq!(s.store().len(), 2);
}

#[test]
fn echo_replaces_optimistic_note_without_replaying() {
    let (mut s, endpoint) = session();
    let mut server = LoopbackServer::new(endpoint);

    let temp = s.pointer_down(NOW, CENTER).unwrap();
    s.frame(NOW);
    assert_eq!(s.engine().triggers.len(), 1);

    server.pump();
    s.frame(NOW + 16);

    assert_eq!(s.store().len(), 1);
    assert!(!s.store().contains(&temp));
    let confirmed = s.store().get(&NoteId::Confirmed("1".into())).unwrap();
    assert!(confirmed.played());
    assert_eq!(s.renderer().retired, vec![temp]);
    assert_eq!(s.engine().triggers.len(), 1);
}

#[test]
fn early_echo_is_played_once_as_confirmed() {
    let (mut s, endpoint) = session();
    let mut server = LoopbackServer::new(endpoint).with_waveform(Waveform::Square);

    // Placed 200 px (2 s) ahead, confirmed long before it is due
    s.pointer_down(NOW, (CENTER.0 + 200.0, CENTER.1));
    server.pump();
    s.frame(NOW + 10);
    assert!(s.engine().triggers.is_empty());
    assert!(s.store().iter().all(|n| !n.is_optimistic()));

    s.frame(NOW + 1_950);
    s.frame(NOW + 1_990);
    s.frame(NOW + 2_050);
    assert_eq!(s.engine().triggers.len(), 1);
    assert_eq!(s.engine().triggers[0].0, Waveform::Square);
}

#[test]
fn peer_cursor_expires_without_refresh() {
    let (mut s, endpoint) = session();
    let t0 = NOW;
    endpoint.deliver_event("cursor_move", json!({ "user_id": "peer", "dt": 500.0, "dy": 20.0, "color": "#00f" }));
    s.frame(t0);

    let cursor = s.cursors().get("peer").unwrap();
    assert_eq!(cursor.screen, (450.0, 320.0));

    s.frame(t0 + 9_000);
    assert!(s.cursors().get("peer").is_some());

    s.frame(t0 + 10_001);
    assert!(s.cursors().get("peer").is_none());
    assert_eq!(s.renderer().cursors_removed, vec!["peer".to_string()]);
    assert_eq!(s.cursors().pending_timers(), 0);
}

#[test]
fn pinch_zoom_is_published_and_echoed() {
    let (mut s, endpoint) = session();
    let mut server = LoopbackServer::new(endpoint.clone());

    assert_eq!(s.wheel(-100.0, false), None);
    let zoom = s.wheel(-100.0, true).unwrap();
    assert!((zoom - 0.2).abs() < 1e-12);
    assert_eq!(s.view().zoom_x(), zoom);

    server.pump();
    s.frame(NOW);
    assert!((s.view().zoom_x() - 0.2).abs() < 1e-12);

    assert_eq!(s.wheel(-10_000.0, true), Some(0.5));
}

#[test]
fn nothing_plays_before_the_audio_gesture() {
    let (mut s, endpoint) = session();
    endpoint.deliver_event("new_note", json!({ "id": 9, "x": NOW, "y": 0.0, "waveform": "bagpipe" }));
    s.frame(NOW);
    assert!(s.engine().triggers.is_empty());
    assert_eq!(s.engine().starts, 0);

    assert!(s.toggle_audio());
    s.frame(NOW + 50);
    assert_eq!(s.engine().triggers.len(), 1);
    let (waveform, freq, _) = s.engine().triggers[0];
    assert_eq!(waveform, Waveform::Sine);
    assert!((freq - 440.0).abs() < 0.5);

    assert!(!s.toggle_audio());
    assert_eq!(s.engine().starts, 1);
}

#[test]
fn malformed_events_do_not_stop_the_frame() {
    let (mut s, endpoint) = session();
    s.start_audio();
    endpoint.deliver("{{{");
    endpoint.deliver_event("new_note", json!({ "x": NOW }));
    endpoint.deliver_event("teleport", json!({}));
    endpoint.deliver_event("new_note", json!({ "id": "ok", "x": NOW + 20 }));

    let report = s.frame(NOW);
    assert_eq!(report.fired, vec![NoteId::Confirmed("ok".into())]);
}

#[test]
fn rendered_notes_reconcile_pending_optimistic_entries() {
    let (mut s, _endpoint) = session();
    let temp = s.pointer_down(NOW, (CENTER.0 + 100.0, CENTER.1)).unwrap();
    let x = s.store().get(&temp).unwrap().x;

    let rendered = vec![
        RenderedNote { id: "41".into(), x, y: 0.0, waveform: "sine".into() },
        RenderedNote { id: "42".into(), x: x + 500, y: 16.66, waveform: "triangle".into() },
    ];
    assert_eq!(s.sync_rendered(&rendered), 2);
    assert_eq!(s.store().len(), 2);
    assert!(s.store().pending_optimistic().is_empty());

    // Already known ids are left alone
    assert_eq!(s.sync_rendered(&rendered), 0);
}

#[test]
fn stale_notes_are_pruned_each_tick() {
    let (mut s, endpoint) = session();
    endpoint.deliver_event("new_note", json!({ "id": 1, "x": NOW - 4_000 }));
    endpoint.deliver_event("new_note", json!({ "id": 2, "x": NOW - 6_000 }));
    let report = s.frame(NOW);
    assert_eq!(report.pruned, 1);
    assert_eq!(s.store().len(), 1);
}

#[test]
fn teardown_cancels_and_detaches() {
    let (mut s, endpoint) = session();
    endpoint.deliver_event("cursor_move", json!({ "user_id": "a" }));
    endpoint.deliver_event("cursor_move", json!({ "user_id": "b" }));
    s.frame(NOW);
    assert_eq!(s.cursors().len(), 2);

    s.teardown();
    assert!(s.is_torn_down());
    assert!(s.cursors().is_empty());
    assert_eq!(s.cursors().pending_timers(), 0);
    assert!(!endpoint.deliver_event("cursor_move", json!({ "user_id": "c" })));
    assert!(s.pointer_down(NOW, CENTER).is_none());
    assert_eq!(s.frame(NOW + 16), TickReport::default());
}

#[test]
fn missing_surface_disables_pointer_features() {
    let (bus, endpoint) = CollabBus::channel();
    let mut s = JamSession::new(SessionConfig::default(), NOW, Engine::default(), Canvas::default(), bus);
    assert!(s.pointer_down(NOW, CENTER).is_none());
    endpoint.deliver_event("cursor_move", json!({ "user_id": "a" }));
    s.frame(NOW);
    assert!(s.cursors().is_empty());
    assert!(endpoint.take_outbound().is_empty());
}

#[test]
fn peer_zoom_is_clamped_like_local_pinch() {
    let (mut s, endpoint) = session();
    endpoint.deliver_event("view_update", json!({ "zoom_x": 5.0, "zoom_y": 2.0 }));
    s.frame(NOW);
    assert_eq!(s.view().zoom_x(), 0.5);
    assert_eq!(s.view().zoom_y(), 2.0);

    endpoint.deliver_event("view_update", json!({ "zoom_x": 0.001 }));
    s.frame(NOW + 16);
    assert_eq!(s.view().zoom_x(), 0.01);
}

#[test]
fn volume_reaches_the_engine() {
    let (mut s, _endpoint) = session_with(SessionConfig { volume_db: -3.0, ..Default::default() });
    assert_eq!(s.engine().volume_db, Some(-3.0));
    s.set_volume(-12.0);
    assert_eq!(s.engine().volume_db, Some(-12.0));
}

#[test]
fn notes_take_the_settings_current_at_placement() {
    let (mut s, _endpoint) = session();
    let first = s.pointer_down(NOW, CENTER).unwrap();
    s.pointer_up();

    s.set_waveform(Waveform::Sawtooth);
    s.set_user_color("#123");
    let second = s.pointer_down(NOW + 100, CENTER).unwrap();

    let first = s.store().get(&first).unwrap();
    assert_eq!(first.waveform, Waveform::Sine);
    assert_eq!(first.color.as_deref(), Some("#f80"));

    let second = s.store().get(&second).unwrap();
    assert_eq!(second.waveform, Waveform::Sawtooth);
    assert_eq!(second.color.as_deref(), Some("#123"));
    assert_eq!(s.user_color(), "#123");
}
