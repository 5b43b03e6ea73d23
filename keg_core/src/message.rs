//! Scale firmware message format: `type|id|rssi|value`.
//!
//! `ping` carries only liveness and signal strength; `push` also carries the
//! current weight in grams. Extra chunks after `value` are ignored.

use crate::error::KegError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Ping,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMessage {
    pub kind: MessageKind,
    /// Firmware message counter
    pub id: u64,
    pub rssi: f64,
    /// Weight in grams; always `Some` for `push`.
    pub value: Option<f64>,
}

fn invalid(msg: impl Into<String>) -> KegError {
    KegError::InvalidMessage(msg.into())
}

fn number(chunk: &str, what: &str) -> Result<f64, KegError> {
    let v = chunk
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("could not parse {what} from {chunk:?}")))?;
    if !v.is_finite() {
        return Err(invalid(format!("{what} must be finite")));
    }
    Ok(v)
}

impl ScaleMessage {
    pub fn parse(body: &str) -> Result<Self, KegError> {
        let chunks: Vec<&str> = body.trim().split('|').collect();
        if chunks.len() < 4 {
            return Err(invalid(format!(
                "expected 4 chunks separated by '|', got {}",
                chunks.len()
            )));
        }

        let kind = match chunks[0].trim() {
            "ping" => MessageKind::Ping,
            "push" => MessageKind::Push,
            other => return Err(invalid(format!("unknown message type {other:?}"))),
        };
        let id = chunks[1]
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(format!("could not parse id from {:?}", chunks[1])))?;
        let rssi = number(chunks[2], "rssi")?;
        let value = match kind {
            MessageKind::Push => Some(number(chunks[3], "value")?),
            MessageKind::Ping => None,
        };

        Ok(Self {
            kind,
            id,
            rssi,
            value,
        })
    }
}
