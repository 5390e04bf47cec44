use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use serde_json::Value;

use super::{InboundEvent, OutboundEvent};

/// Session side of the collaboration layer.
///
/// Outbound events are fire-and-forget: a failed send is logged and dropped,
/// never retried. Inbound events arrive as raw JSON and are validated here,
/// at the boundary.
pub struct CollabBus {
    outbound: Option<Sender<OutboundEvent>>,
    inbound: Option<Receiver<String>>,
}

/// Transport side: whatever actually talks to peers holds this.
#[derive(Clone)]
pub struct CollabEndpoint {
    inbound: Sender<String>,
    outbound: Receiver<OutboundEvent>,
}

impl CollabBus {
    /// Create a connected bus/endpoint pair
    pub fn channel() -> (CollabBus, CollabEndpoint) {
        let (out_tx, out_rx) = unbounded();
        let (in_tx, in_rx) = unbounded();

        let bus = CollabBus {
            outbound: Some(out_tx),
            inbound: Some(in_rx),
        };
        let endpoint = CollabEndpoint {
            inbound: in_tx,
            outbound: out_rx,
        };
        (bus, endpoint)
    }

    pub fn is_attached(&self) -> bool {
        self.outbound.is_some()
    }

    /// Send an event without waiting on it. Returns whether it was handed off.
    pub fn publish(&self, event: OutboundEvent) -> bool {
        let Some(sender) = &self.outbound else {
            log::trace!("bus detached, dropping {}", event.name());
            return false;
        };
        match sender.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("collaboration layer gone, dropped {}", e.0.name());
                false
            },
        }
    }

    /// Take up to `max_messages` pending inbound events. Malformed payloads
    /// are logged and skipped.
    pub fn drain(&self, max_messages: usize) -> Vec<InboundEvent> {
        let Some(receiver) = &self.inbound else {
            return Vec::new();
        };

        let mut events = Vec::new();
        while events.len() < max_messages {
            match receiver.try_recv() {
                Ok(text) => match InboundEvent::from_json(&text) {
                    Ok(event) => events.push(event),
                    Err(e) => log::warn!("dropping inbound event: {}", e),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("collaboration transport disconnected");
                    break;
                },
            }
        }
        events
    }

    /// Drop both channel ends; the transport sees a disconnect.
    pub fn detach(&mut self) {
        self.outbound = None;
        self.inbound = None;
    }
}

impl CollabEndpoint {
    /// Deliver a raw inbound JSON envelope to the session.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.inbound.send(text.into()).is_ok()
    }

    pub fn deliver_event(&self, event: &str, payload: Value) -> bool {
        self.deliver(serde_json::json!({ "event": event, "payload": payload }).to_string())
    }

    pub fn try_recv(&self) -> Option<OutboundEvent> {
        self.outbound.try_recv().ok()
    }

    /// Everything the session has published so far.
    pub fn take_outbound(&self) -> Vec<OutboundEvent> {
        self.outbound.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Result<OutboundEvent, crossbeam_channel::RecvTimeoutError> {
        self.outbound.recv_timeout(timeout)
    }
}
