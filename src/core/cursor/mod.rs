//! Pointer presence: throttled outbound positions, inbound peer cursors with expiry.

use std::collections::HashMap;

use crate::core::input::Throttle;
use crate::core::timer::{TimerHandle, TimerQueue};
use crate::core::view::{ViewState, Viewport};
use crate::messaging::{CollabBus, OutboundEvent, PeerCursor};
use crate::render::Renderer;

pub const CURSOR_THROTTLE_MS: i64 = 50;
/// A peer cursor with no refresh for this long is removed.
pub const CURSOR_TIMEOUT_MS: i64 = 10_000;

/// A peer's pointer as seen by this viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub user_id: String,
    /// World offset from the peer's view center: milliseconds.
    pub dt: f64,
    /// World offset from the peer's view center: vertical units.
    pub dy: f64,
    pub color: String,
    /// Position on this viewer's surface, under this viewer's zoom.
    pub screen: (f64, f64),
    timer: TimerHandle,
}

#[derive(Debug)]
pub struct CursorBroadcaster {
    throttle: Throttle,
    cursors: HashMap<String, Cursor>,
    timers: TimerQueue<String>,
}

impl Default for CursorBroadcaster {
    fn default() -> Self {
        Self {
            throttle: Throttle::new(CURSOR_THROTTLE_MS),
            cursors: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }
}

impl CursorBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// World-space offset of a pixel offset from the view center.
    pub fn world_offset(view: &ViewState, offset: (f64, f64)) -> (f64, f64) {
        let mapper = view.mapper();
        (mapper.screen_to_world_x(offset.0), mapper.screen_to_world_y(offset.1))
    }

    /// Pointer moved locally; publishes at most once per throttle interval.
    pub fn pointer_moved(&mut self, now: i64, offset: (f64, f64), view: &ViewState, bus: &CollabBus) -> bool {
        if !self.throttle.try_pass(now) {
            return false;
        }
        self.send(offset, view, bus);
        true
    }

    /// Publish regardless of the throttle (pointer press), restarting the interval.
    pub fn publish_now(&mut self, now: i64, offset: (f64, f64), view: &ViewState, bus: &CollabBus) {
        self.throttle.stamp(now);
        self.send(offset, view, bus);
    }

    fn send(&self, offset: (f64, f64), view: &ViewState, bus: &CollabBus) {
        let (dt, dy) = Self::world_offset(view, offset);
        bus.publish(OutboundEvent::CursorMove { dt, dy });
    }

    /// A peer's position arrived: place it under our own view and push its
    /// expiry out, cancelling the previous one.
    pub fn peer_moved(
        &mut self,
        now: i64,
        peer: PeerCursor,
        view: &ViewState,
        viewport: Viewport,
        renderer: &mut dyn Renderer,
    ) {
        let screen = view.mapper().offset_to_screen(viewport.center(), peer.dt, peer.dy);
        let deadline = now + CURSOR_TIMEOUT_MS;

        match self.cursors.get_mut(&peer.user_id) {
            Some(cursor) => {
                self.timers.cancel(cursor.timer);
                cursor.timer = self.timers.schedule(deadline, peer.user_id.clone());
                cursor.dt = peer.dt;
                cursor.dy = peer.dy;
                cursor.color = peer.color;
                cursor.screen = screen;
                renderer.place_cursor(&cursor.user_id, &cursor.color, screen.0, screen.1);
            },
            None => {
                log::debug!("peer cursor {} appeared", peer.user_id);
                let timer = self.timers.schedule(deadline, peer.user_id.clone());
                renderer.place_cursor(&peer.user_id, &peer.color, screen.0, screen.1);
                self.cursors.insert(peer.user_id.clone(), Cursor {
                    user_id: peer.user_id,
                    dt: peer.dt,
                    dy: peer.dy,
                    color: peer.color,
                    screen,
                    timer,
                });
            },
        }
    }

    /// Remove every cursor whose expiry is due. Returns the removed user ids.
    pub fn expire(&mut self, now: i64, renderer: &mut dyn Renderer) -> Vec<String> {
        let mut removed = Vec::new();
        for (handle, user_id) in self.timers.expired(now) {
            // A stale handle means the cursor was refreshed in the meantime.
            if self.cursors.get(&user_id).map_or(false, |c| c.timer == handle) {
                self.cursors.remove(&user_id);
                renderer.remove_cursor(&user_id);
                log::debug!("peer cursor {} timed out", user_id);
                removed.push(user_id);
            }
        }
        removed
    }

    /// Re-place all cursors after the local view changed.
    pub fn relayout(&mut self, view: &ViewState, viewport: Viewport, renderer: &mut dyn Renderer) {
        let mapper = view.mapper();
        for cursor in self.cursors.values_mut() {
            cursor.screen = mapper.offset_to_screen(viewport.center(), cursor.dt, cursor.dy);
            renderer.place_cursor(&cursor.user_id, &cursor.color, cursor.screen.0, cursor.screen.1);
        }
    }

    pub fn get(&self, user_id: &str) -> Option<&Cursor> {
        self.cursors.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Cancel every expiry and take all peer cursors down.
    pub fn teardown(&mut self, renderer: &mut dyn Renderer) {
        self.timers.cancel_all();
        for user_id in self.cursors.keys() {
            renderer.remove_cursor(user_id);
        }
        self.cursors.clear();
        self.throttle.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullRenderer;

    fn peer(user_id: &str, dt: f64, dy: f64) -> PeerCursor {
        PeerCursor { user_id: user_id.into(), dt, dy, color: "#0af".into() }
    }

    #[test]
    fn outbound_positions_are_throttled_world_offsets() {
        let view = ViewState::with_zoom(0, 0.2, 2.0);
        let (bus, endpoint) = CollabBus::channel();
        let mut cursors = CursorBroadcaster::new();

        assert!(cursors.pointer_moved(1_000, (40.0, -10.0), &view, &bus));
        assert!(!cursors.pointer_moved(1_020, (41.0, -10.0), &view, &bus));
        assert!(!cursors.pointer_moved(1_050, (42.0, -10.0), &view, &bus));
        assert!(cursors.pointer_moved(1_051, (43.0, -10.0), &view, &bus));

        let sent = endpoint.take_outbound();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], OutboundEvent::CursorMove { dt: 200.0, dy: -5.0 });
    }

    #[test]
    fn peers_render_under_local_zoom() {
        let view = ViewState::with_zoom(0, 0.5, 3.0);
        let mut cursors = CursorBroadcaster::new();
        cursors.peer_moved(0, peer("u1", 100.0, -4.0), &view, Viewport::new(800.0, 600.0), &mut NullRenderer);
        assert_eq!(cursors.get("u1").unwrap().screen, (450.0, 288.0));

        let zoomed = ViewState::with_zoom(0, 0.1, 1.0);
        cursors.relayout(&zoomed, Viewport::new(800.0, 600.0), &mut NullRenderer);
        assert_eq!(cursors.get("u1").unwrap().screen, (410.0, 296.0));
    }

    #[test]
    fn cursor_expires_after_timeout() {
        let view = ViewState::new(0);
        let vp = Viewport::new(100.0, 100.0);
        let mut cursors = CursorBroadcaster::new();
        let t0 = 5_000;
        cursors.peer_moved(t0, peer("u1", 0.0, 0.0), &view, vp, &mut NullRenderer);

        assert!(cursors.expire(t0 + 9_000, &mut NullRenderer).is_empty());
        assert!(cursors.get("u1").is_some());
        assert_eq!(cursors.expire(t0 + 10_001, &mut NullRenderer), vec!["u1".to_string()]);
        assert!(cursors.get("u1").is_none());
        assert_eq!(cursors.pending_timers(), 0);
    }

    #[test]
    fn refresh_replaces_pending_expiry() {
        let view = ViewState::new(0);
        let vp = Viewport::new(100.0, 100.0);
        let mut cursors = CursorBroadcaster::new();
        cursors.peer_moved(0, peer("u1", 0.0, 0.0), &view, vp, &mut NullRenderer);
        cursors.peer_moved(8_000, peer("u1", 5.0, 0.0), &view, vp, &mut NullRenderer);
        assert_eq!(cursors.pending_timers(), 1);

        assert!(cursors.expire(10_500, &mut NullRenderer).is_empty());
        assert_eq!(cursors.get("u1").unwrap().dt, 5.0);
        assert_eq!(cursors.expire(18_000, &mut NullRenderer).len(), 1);
    }

    #[test]
    fn refresh_picks_up_new_color() {
        let view = ViewState::new(0);
        let vp = Viewport::new(100.0, 100.0);
        let mut cursors = CursorBroadcaster::new();
        cursors.peer_moved(0, peer("u1", 0.0, 0.0), &view, vp, &mut NullRenderer);

        let recolored = PeerCursor { color: "#f0f".into(), ..peer("u1", 1.0, 0.0) };
        cursors.peer_moved(100, recolored, &view, vp, &mut NullRenderer);
        assert_eq!(cursors.get("u1").unwrap().color, "#f0f");
    }

    #[test]
    fn teardown_clears_everything() {
        let view = ViewState::new(0);
        let vp = Viewport::new(100.0, 100.0);
        let mut cursors = CursorBroadcaster::new();
        cursors.peer_moved(0, peer("a", 0.0, 0.0), &view, vp, &mut NullRenderer);
        cursors.peer_moved(0, peer("b", 0.0, 0.0), &view, vp, &mut NullRenderer);
        cursors.teardown(&mut NullRenderer);
        assert!(cursors.is_empty());
        assert_eq!(cursors.pending_timers(), 0);
    }
}
