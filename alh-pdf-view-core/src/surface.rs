//! The native render surface seen by the controller
//!
//! A surface is the platform's PDF view: it loads the document, draws pages
//! at a native scale and reports what the user did. The controller never
//! renders anything itself.

use crate::config::{Appearance, Configuration};
use crate::error::SurfaceError;
use crate::fit::Size;
use std::time::Duration;

/// Construction-time tuning for a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTuning {
    /// Pages kept rendered on each side of the current page
    pub preload_offset: usize,
    /// Duration of an animated page jump
    pub page_animation: Duration,
}

impl Default for SurfaceTuning {
    fn default() -> Self {
        Self {
            preload_offset: 3,
            page_animation: Duration::from_millis(400),
        }
    }
}

/// Handle returned by [`RenderSurface::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Asynchronous report from the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceNotification {
    /// The visible page changed, possibly as an intermediate step of an animation
    PageChanged { page: usize, total: usize },
    /// The native scale changed, by gesture or by command
    ScaleChanged,
    Tap,
    LinkActivated { url: String },
    PageError { page: usize, error: String },
}

/// Platform PDF view driven by the controller
pub trait RenderSurface {
    /// Loads the configured document, replacing any previous one.
    /// Returns the page count.
    fn load(&mut self, configuration: &Configuration) -> Result<usize, SurfaceError>;

    /// Drops the document and any rendered pages
    fn release(&mut self);

    fn page_count(&self) -> usize;

    fn current_page(&self) -> Option<usize>;

    /// Intrinsic size of a page in surface units
    fn page_size(&self, page: usize) -> Option<Size>;

    fn native_scale(&self) -> f64;

    fn set_native_scale(&mut self, scale: f64, animated: bool);

    fn set_native_scale_bounds(&mut self, min: f64, max: f64);

    fn can_go_next(&self) -> bool;

    fn can_go_previous(&self) -> bool;

    fn go_to_page(&mut self, page: usize, animated: bool);

    fn apply_appearance(&mut self, appearance: &Appearance);

    fn set_scrollbar_visible(&mut self, visible: bool);

    /// Opens a link outside the view when the host does not intercept links
    fn open_external(&mut self, url: &str) {
        tracing::info!("no external handler for {url}");
    }

    /// Starts delivering notifications to [`poll_notification`](Self::poll_notification)
    fn subscribe(&mut self) -> SubscriptionId;

    /// Stops delivery; queued notifications are dropped
    fn unsubscribe(&mut self, id: SubscriptionId);

    fn poll_notification(&mut self) -> Option<SurfaceNotification>;
}
