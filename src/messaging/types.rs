use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::oscillator::Waveform;

/// Color given to peers whose events arrive without one.
pub const DEFAULT_PEER_COLOR: &str = "#ccc";

/// Events this client sends to the collaboration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// `y` is the raw pixel offset from center; the receiver divides by its vertical scale.
    AddNote { x: i64, y: f64 },
    CursorMove { dt: f64, dy: f64 },
    UpdateZoomX { value: f64 },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::AddNote { .. } => "add_note",
            OutboundEvent::CursorMove { .. } => "cursor_move",
            OutboundEvent::UpdateZoomX { .. } => "update_zoom_x",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An authoritative note as announced by the collaboration layer
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteNote {
    pub id: String,
    pub x: i64,
    pub y: f64,
    pub waveform: Waveform,
}

/// A peer's pointer, as a world-space offset from that peer's view center
#[derive(Debug, Clone, PartialEq)]
pub struct PeerCursor {
    pub user_id: String,
    pub dt: f64,
    pub dy: f64,
    pub color: String,
}

/// Validated events arriving from the collaboration layer
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    NewNote(RemoteNote),
    CursorMove(PeerCursor),
    ViewUpdate { zoom_x: Option<f64>, zoom_y: Option<f64> },
}

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    #[error("{event}: missing field `{field}`")]
    MissingField { event: &'static str, field: &'static str },
    #[error("{event}: invalid `{field}`: {value}")]
    InvalidField { event: &'static str, field: &'static str, value: String },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Value,
}

impl InboundEvent {
    /// Parse a `{ "event": ..., "payload": {...} }` envelope.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::from_parts(&envelope.event, &envelope.payload)
    }

    /// Validate a loosely-typed payload. Only identity and timing fields are
    /// mandatory; everything else falls back to a default.
    pub fn from_parts(event: &str, payload: &Value) -> Result<Self, ProtocolError> {
        match event {
            "new_note" => {
                // The note may arrive bare or wrapped as { "note": {...} }
                let note = payload.get("note").filter(|n| n.is_object()).unwrap_or(payload);
                parse_new_note(note).map(InboundEvent::NewNote)
            },
            "cursor_move" => parse_cursor(payload).map(InboundEvent::CursorMove),
            "view_update" => Ok(InboundEvent::ViewUpdate {
                zoom_x: positive(payload.get("zoom_x")),
                zoom_y: positive(payload.get("zoom_y")),
            }),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

fn parse_new_note(note: &Value) -> Result<RemoteNote, ProtocolError> {
    const EVENT: &str = "new_note";

    let id = match note.get("id") {
        None | Some(Value::Null) => return Err(ProtocolError::MissingField { event: EVENT, field: "id" }),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(ProtocolError::InvalidField { event: EVENT, field: "id", value: other.to_string() })
        },
    };

    let x = match note.get("x") {
        None | Some(Value::Null) => return Err(ProtocolError::MissingField { event: EVENT, field: "x" }),
        Some(value) => integer(value).ok_or_else(|| ProtocolError::InvalidField {
            event: EVENT,
            field: "x",
            value: value.to_string(),
        })?,
    };

    let y = number(note.get("y")).unwrap_or_else(|| {
        log::warn!("new_note {}: bad or missing y, using center pitch", id);
        0.0
    });

    let waveform = Waveform::from_tag_or_sine(note.get("waveform").and_then(Value::as_str));

    Ok(RemoteNote { id, x, y, waveform })
}

fn parse_cursor(payload: &Value) -> Result<PeerCursor, ProtocolError> {
    const EVENT: &str = "cursor_move";

    let user_id = match payload.get("user_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        None | Some(Value::Null) => {
            return Err(ProtocolError::MissingField { event: EVENT, field: "user_id" })
        },
        Some(other) => {
            return Err(ProtocolError::InvalidField { event: EVENT, field: "user_id", value: other.to_string() })
        },
    };

    Ok(PeerCursor {
        user_id,
        dt: number(payload.get("dt")).unwrap_or(0.0),
        dy: number(payload.get("dy")).unwrap_or(0.0),
        color: payload
            .get("color")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_PEER_COLOR)
            .to_string(),
    })
}

/// Finite number, from a JSON number or a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Epoch milliseconds; fractional values are floored.
fn integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    number(Some(value)).map(|f| f.floor() as i64)
}

fn positive(value: Option<&Value>) -> Option<f64> {
    number(value).filter(|v| *v > 0.0)
}
