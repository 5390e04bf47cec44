//! Composition root: one of everything per session, driven by the host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::core::cursor::CursorBroadcaster;
use crate::core::input::{OptimisticNoteController, Placement};
use crate::core::oscillator::Waveform;
use crate::core::playback::{AudioEngine, AudioGate, PlaybackScheduler, TickReport};
use crate::core::timeline::{Note, NoteId, NoteStore, Upsert};
use crate::core::view::{clamp_zoom_x, ViewState, Viewport};
use crate::messaging::{CollabBus, InboundEvent, OutboundEvent, RemoteNote};
use crate::render::{RenderedNote, Renderer};
use crate::utils::helpers::{format_clock, now_ms};

/// Inbound events handled per frame; the rest wait for the next one.
pub const MAX_INBOUND_PER_FRAME: usize = 64;

pub struct JamSession<E: AudioEngine, R: Renderer> {
    config: SessionConfig,
    user_color: String,
    view: ViewState,
    viewport: Option<Viewport>,
    store: NoteStore,
    scheduler: PlaybackScheduler,
    cursors: CursorBroadcaster,
    controller: OptimisticNoteController,
    gate: AudioGate,
    engine: E,
    renderer: R,
    bus: CollabBus,
    torn_down: bool,
}

impl<E: AudioEngine, R: Renderer> JamSession<E, R> {
    /// `now` becomes the world-time origin unless the config pins one.
    pub fn new(config: SessionConfig, now: i64, mut engine: E, renderer: R, bus: CollabBus) -> Self {
        let base_time = config.base_time.unwrap_or(now);
        let view = ViewState::with_zoom(base_time, config.zoom_x, config.zoom_y);
        let user_color = config.resolve_user_color();
        engine.set_volume(config.volume_db);

        log::info!(
            "session started: base {} zoom {:.3}x{:.3} color {}",
            base_time, view.zoom_x(), view.zoom_y(), user_color
        );

        Self {
            config,
            user_color,
            view,
            viewport: None,
            store: NoteStore::new(),
            scheduler: PlaybackScheduler::new(),
            cursors: CursorBroadcaster::new(),
            controller: OptimisticNoteController::new(),
            gate: AudioGate::new(),
            engine,
            renderer,
            bus,
            torn_down: false,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Attach or drop the interaction surface. Without one, pointer input and
    /// peer cursor placement are disabled.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
        if let Some(vp) = viewport {
            self.cursors.relayout(&self.view, vp, &mut self.renderer);
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn cursors(&self) -> &CursorBroadcaster {
        &self.cursors
    }

    pub fn gate(&self) -> &AudioGate {
        &self.gate
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn user_color(&self) -> &str {
        &self.user_color
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.config.waveform = waveform;
    }

    pub fn set_user_color(&mut self, color: impl Into<String>) {
        self.user_color = color.into();
    }

    pub fn set_volume(&mut self, db: f32) {
        self.config.volume_db = db;
        self.engine.set_volume(db);
    }

    /// One animation frame: inbound events, cursor expiry, scroll and clock,
    /// then playback.
    pub fn frame(&mut self, now: i64) -> TickReport {
        if self.torn_down {
            return TickReport::default();
        }

        self.pump_inbound(now);
        self.cursors.expire(now, &mut self.renderer);

        let offset = self.view.mapper().scroll_offset(now);
        self.renderer.scroll_to(offset);
        self.renderer.show_clock(&format_clock(now));

        self.scheduler.tick(now, &mut self.store, &self.gate, &mut self.engine, &mut self.renderer)
    }

    pub fn pump_inbound(&mut self, now: i64) -> usize {
        let events = self.bus.drain(MAX_INBOUND_PER_FRAME);
        let n = events.len();
        for event in events {
            self.handle_inbound(now, event);
        }
        n
    }

    pub fn handle_inbound(&mut self, now: i64, event: InboundEvent) {
        match event {
            InboundEvent::NewNote(note) => {
                self.accept_remote(note);
            },
            InboundEvent::CursorMove(peer) => match self.viewport {
                Some(vp) => self.cursors.peer_moved(now, peer, &self.view, vp, &mut self.renderer),
                None => log::trace!("no cursor surface, ignoring {}", peer.user_id),
            },
            InboundEvent::ViewUpdate { zoom_x, zoom_y } => {
                if let Some(zx) = zoom_x {
                    self.view.set_zoom_x(clamp_zoom_x(zx));
                }
                if let Some(zy) = zoom_y {
                    self.view.set_zoom_y(zy);
                }
                if let Some(vp) = self.viewport {
                    self.cursors.relayout(&self.view, vp, &mut self.renderer);
                }
            },
        }
    }

    fn accept_remote(&mut self, note: RemoteNote) -> Upsert {
        let outcome = self.store.upsert_remote(Note::confirmed(note.id, note.x, note.y, note.waveform));
        if let Upsert::Merged { retired, .. } = &outcome {
            self.renderer.remove_provisional(retired);
        }
        outcome
    }

    /// Reconcile notes the renderer has materialized but the store has not seen.
    pub fn sync_rendered(&mut self, rendered: &[RenderedNote]) -> usize {
        let mut added = 0;
        for element in rendered {
            if self.store.contains(&NoteId::Confirmed(element.id.clone())) {
                continue;
            }
            self.accept_remote(RemoteNote {
                id: element.id.clone(),
                x: element.x,
                y: element.y,
                waveform: Waveform::from_tag_or_sine(Some(&element.waveform)),
            });
            added += 1;
        }
        added
    }

    /// Pointer pressed at surface position `pos`. Doubles as the audio gesture.
    pub fn pointer_down(&mut self, now: i64, pos: (f64, f64)) -> Option<NoteId> {
        let vp = self.viewport?;
        if self.torn_down {
            return None;
        }
        if !self.gate.is_enabled() {
            let enabled = self.gate.ensure_started(&mut self.engine);
            self.renderer.audio_state(enabled);
        }

        let offset = vp.offset_from_center(pos.0, pos.1);
        let placement = Placement { color: &self.user_color, waveform: self.config.waveform };
        let id = self.controller.press(
            now, offset, &self.view, placement, &mut self.store, &self.bus, &mut self.renderer,
        );
        self.cursors.publish_now(now, offset, &self.view, &self.bus);
        Some(id)
    }

    /// Pointer moved; publishes the cursor and, while drawing, lays down notes.
    pub fn pointer_move(&mut self, now: i64, pos: (f64, f64)) -> Option<NoteId> {
        let vp = self.viewport?;
        if self.torn_down {
            return None;
        }
        let offset = vp.offset_from_center(pos.0, pos.1);
        self.cursors.pointer_moved(now, offset, &self.view, &self.bus);

        let placement = Placement { color: &self.user_color, waveform: self.config.waveform };
        self.controller.drag(
            now, offset, &self.view, placement, &mut self.store, &self.bus, &mut self.renderer,
        )
    }

    pub fn pointer_up(&mut self) {
        self.controller.release();
    }

    /// Wheel input. With the control modifier it is a pinch zoom; returns the new scale.
    pub fn wheel(&mut self, delta_y: f64, ctrl: bool) -> Option<f64> {
        if !ctrl || self.torn_down {
            return None;
        }
        let zoom = self.view.pinch(delta_y);
        self.bus.publish(OutboundEvent::UpdateZoomX { value: zoom });
        if let Some(vp) = self.viewport {
            self.cursors.relayout(&self.view, vp, &mut self.renderer);
        }
        Some(zoom)
    }

    /// Audio button: start on first use, then mute/unmute.
    pub fn toggle_audio(&mut self) -> bool {
        let enabled = self.gate.toggle(&mut self.engine);
        self.renderer.audio_state(enabled);
        enabled
    }

    pub fn start_audio(&mut self) -> bool {
        let enabled = self.gate.ensure_started(&mut self.engine);
        self.renderer.audio_state(enabled);
        enabled
    }

    /// Cancel all timers, take peer cursors down and detach from the
    /// collaboration layer. Later frames and input are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.cursors.teardown(&mut self.renderer);
        self.controller.release();
        self.bus.detach();
        self.torn_down = true;
        log::info!("session torn down");
    }
}

/// Stop switch for a running [`FrameLoop`].
#[derive(Debug, Clone)]
pub struct FrameLoopHandle {
    stop: Arc<AtomicBool>,
}

impl FrameLoopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Fixed-rate driver for [`JamSession::frame`] on the calling thread.
pub struct FrameLoop {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl FrameLoop {
    pub fn new(frame_rate: u32) -> Self {
        let fps = frame_rate.clamp(1, 240);
        Self {
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> FrameLoopHandle {
        FrameLoopHandle { stop: Arc::clone(&self.stop) }
    }

    /// Run until stopped or the session is torn down. `host` runs before each
    /// frame with the frame's timestamp, for input and other callbacks.
    pub fn run<E, R, F>(&self, session: &mut JamSession<E, R>, mut host: F) -> u64
    where
        E: AudioEngine,
        R: Renderer,
        F: FnMut(&mut JamSession<E, R>, i64),
    {
        let mut frames = 0;
        while !self.stop.load(Ordering::Relaxed) && !session.is_torn_down() {
            let started = Instant::now();
            let now = now_ms();
            host(session, now);
            session.frame(now);
            frames += 1;

            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        log::debug!("frame loop exited after {} frames", frames);
        frames
    }
}
