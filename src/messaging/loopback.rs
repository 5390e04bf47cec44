//! In-process stand-in for the collaboration layer.
//!
//! Assigns authoritative ids to created notes and echoes them back, the way
//! the real server does for the creating client and every peer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use serde_json::json;

use super::{CollabEndpoint, OutboundEvent};
use crate::core::oscillator::Waveform;
use crate::core::view::{clamp_zoom_x, DEFAULT_ZOOM_X, DEFAULT_ZOOM_Y};

pub struct LoopbackServer {
    endpoint: CollabEndpoint,
    zoom_x: f64,
    zoom_y: f64,
    waveform: Waveform,
    next_id: u64,
    mirror: Option<(String, String)>,
}

impl LoopbackServer {
    pub fn new(endpoint: CollabEndpoint) -> Self {
        Self {
            endpoint,
            zoom_x: DEFAULT_ZOOM_X,
            zoom_y: DEFAULT_ZOOM_Y,
            waveform: Waveform::Sine,
            next_id: 1,
            mirror: None,
        }
    }

    /// Vertical scale used to turn incoming pixel offsets into world units.
    pub fn with_zoom_y(mut self, zoom_y: f64) -> Self {
        if zoom_y.is_finite() && zoom_y > 0.0 {
            self.zoom_y = zoom_y;
        }
        self
    }

    /// Waveform stamped on notes created through this server.
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    /// Echo the client's own cursor back as a peer called `user_id`.
    pub fn with_mirror(mut self, user_id: impl Into<String>, color: impl Into<String>) -> Self {
        self.mirror = Some((user_id.into(), color.into()));
        self
    }

    pub fn zoom_x(&self) -> f64 {
        self.zoom_x
    }

    /// Handle everything published so far. Returns how many events were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.endpoint.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    fn handle(&mut self, event: OutboundEvent) {
        match event {
            OutboundEvent::AddNote { x, y } => {
                let id = self.next_id;
                self.next_id += 1;
                let note = json!({
                    "id": id,
                    "x": x,
                    "y": y / self.zoom_y,
                    "waveform": self.waveform.tag(),
                });
                self.endpoint.deliver_event("new_note", json!({ "note": note }));
            },
            OutboundEvent::UpdateZoomX { value } => {
                self.zoom_x = clamp_zoom_x(value);
                self.endpoint.deliver_event("view_update", json!({ "zoom_x": self.zoom_x }));
            },
            OutboundEvent::CursorMove { dt, dy } => {
                if let Some((user_id, color)) = &self.mirror {
                    self.endpoint.deliver_event(
                        "cursor_move",
                        json!({ "user_id": user_id, "dt": dt, "dy": dy, "color": color }),
                    );
                }
            },
        }
    }

    /// Serve on a background thread until `stop` is raised or the session detaches.
    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                match self.endpoint.recv_timeout(Duration::from_millis(20)) {
                    Ok(event) => self.handle(event),
                    Err(RecvTimeoutError::Timeout) => {},
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::debug!("loopback server stopped");
        })
    }
}
