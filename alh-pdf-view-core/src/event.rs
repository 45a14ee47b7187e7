//! Events emitted by the controller towards the host

use serde::Serialize;
use serde_json::{json, Value};

/// Controller-to-host notification
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Render { pages: usize },
    PageChanged { page: usize, total: usize },
    ZoomChanged { zoom: f64 },
    Error { error: String },
    PageError { page: usize, error: String },
    Tap,
    LinkHandle { url: String },
}

/// Encoded event, ready for the host's method channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub method: &'static str,
    pub arguments: Value,
}

impl Event {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Render { .. } => "onRender",
            Self::PageChanged { .. } => "onPageChanged",
            Self::ZoomChanged { .. } => "onZoomChanged",
            Self::Error { .. } => "onError",
            Self::PageError { .. } => "onPageError",
            Self::Tap => "onTap",
            Self::LinkHandle { .. } => "onLinkHandle",
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            Self::Render { pages } => json!({ "pages": pages }),
            Self::PageChanged { page, total } => json!({ "page": page, "total": total }),
            Self::ZoomChanged { zoom } => json!({ "zoom": zoom }),
            Self::Error { error } => json!({ "error": error }),
            Self::PageError { page, error } => json!({ "page": page, "error": error }),
            Self::Tap => Value::Null,
            Self::LinkHandle { url } => json!({ "url": url }),
        }
    }

    pub fn encode(&self, channel: &str) -> OutboundMessage {
        OutboundMessage {
            channel: channel.to_string(),
            method: self.method(),
            arguments: self.arguments(),
        }
    }
}
