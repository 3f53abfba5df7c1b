use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame has an empty component name")]
    MissingComponent,
}

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub component: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl InboundFrame {
    pub fn new(
        component: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            component: component.into(),
            kind: kind.into(),
            payload,
        }
    }

    /// Parse a text frame off the socket.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: Self = serde_json::from_str(text)?;
        if frame.component.is_empty() {
            return Err(FrameError::MissingComponent);
        }
        Ok(frame)
    }

    /// Split off the component tag, leaving what the handler sees.
    pub fn into_parts(self) -> (String, ComponentMessage) {
        (self.component, ComponentMessage {
            kind: self.kind,
            payload: self.payload,
        })
    }
}

/// An inbound frame with its component prefix stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMessage {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl ComponentMessage {
    /// String field of the payload, if present.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(|v| v.as_u64())
    }
}

/// A frame sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub component: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
}

impl OutboundFrame {
    pub fn new(
        component: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            component: component.into(),
            kind: kind.into(),
            payload,
        }
    }

    pub fn to_json(&self) -> String {
        // Value-only payloads cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
