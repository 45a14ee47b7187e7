//! # alh-pdf-view
//!
//! Embeds a platform PDF view in a host UI framework and drives it over a
//! command/event channel.
//!
//! The platform view is abstracted as a [`RenderSurface`]. The
//! [`ViewportController`] translates between the host's logical zoom, where
//! `1.0` means "the page fits the viewport", and the surface's native scale;
//! it also de-duplicates the surface's page notifications and applies
//! configuration updates without losing the reading position.
//!
//! ```
//! use alh_pdf_view::{Command, resolve_unit_scale, FitPolicy, Size};
//! use serde_json::json;
//!
//! let unit = resolve_unit_scale(Size::new(600.0, 800.0), Size::new(400.0, 600.0), FitPolicy::Both)?;
//! assert_eq!(unit, 1.5);
//!
//! let command = Command::decode("setPage", &json!({ "page": 2, "withAnimation": true }))?;
//! assert_eq!(command, Command::SetPage { page: 2, with_animation: true });
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod fit;
pub mod surface;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use channel::{ChannelRouter, Command, PdfViewChannel};
pub use config::{
    Appearance, ConfigDiff, ConfigField, Configuration, ConfigurationStore, DocumentSource,
    Orientation, Rgb,
};
pub use controller::{PageDirection, Phase, SwipeDirection, ViewportController};
pub use error::{ChannelError, ConfigError, GeometryError, Result, SurfaceError, ViewError};
pub use event::{Event, OutboundMessage};
pub use fit::{resolve_unit_scale, FitPolicy, Size};
pub use surface::{RenderSurface, SubscriptionId, SurfaceNotification, SurfaceTuning};
