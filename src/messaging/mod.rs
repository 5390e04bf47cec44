mod bus;
pub mod loopback;
mod types;

pub use bus::{CollabBus, CollabEndpoint};
pub use loopback::LoopbackServer;
pub use types::{InboundEvent, OutboundEvent, PeerCursor, ProtocolError, RemoteNote, DEFAULT_PEER_COLOR};
