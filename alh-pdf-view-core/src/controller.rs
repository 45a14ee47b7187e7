//! Viewport controller
//!
//! Sits between the host channel and a [`RenderSurface`]. It owns the
//! mapping between logical zoom (1.0 = page fits the viewport) and the
//! surface's native scale, remembers where navigation was headed, and
//! filters the surface's page notifications so the host sees each page
//! change exactly once.
//!
//! All operations are synchronous and expected on the host's UI thread.

use crate::config::{ConfigDiff, ConfigField, Configuration, ConfigurationStore, Orientation};
use crate::error::{Result, ViewError};
use crate::event::Event;
use crate::fit::{resolve_unit_scale, Size};
use crate::surface::{RenderSurface, SubscriptionId, SurfaceNotification};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Relative navigation target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Next,
    Previous,
}

/// Direction of a swipe gesture on the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Observable navigation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Idle,
    NavigatingInstant,
    NavigatingAnimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentStatus {
    Loaded { pages: usize },
    Failed,
    Disposed,
}

#[derive(Debug, Default)]
struct ViewportState {
    /// Native scale of logical zoom 1.0; `None` until the first layout
    native_unit_scale: Option<f64>,
    has_initialized: bool,
    pending_destination_page: Option<usize>,
    animation_in_flight: bool,
    last_reported_page: Option<usize>,
    pending_configuration: Option<Configuration>,
    viewport: Option<Size>,
    page_size: Option<Size>,
}

/// Drives one embedded PDF view
pub struct ViewportController<S: RenderSurface> {
    surface: S,
    store: ConfigurationStore,
    state: ViewportState,
    document: DocumentStatus,
    last_orientation: Option<Orientation>,
    /// Last viewport from the host; survives reloads
    last_viewport: Option<Size>,
    subscription: Option<SubscriptionId>,
    events: VecDeque<Event>,
}

impl<S: RenderSurface> ViewportController<S> {
    /// Subscribes to the surface and loads the configured document.
    ///
    /// A document that fails to load is reported once as [`Event::Error`];
    /// the controller stays usable but every page or zoom query reports
    /// that nothing is loaded.
    pub fn attach(mut surface: S, configuration: Configuration) -> Self {
        let subscription = surface.subscribe();
        let mut controller = Self {
            surface,
            store: ConfigurationStore::new(configuration),
            state: ViewportState::default(),
            document: DocumentStatus::Failed,
            last_orientation: None,
            last_viewport: None,
            subscription: Some(subscription),
            events: VecDeque::new(),
        };
        controller.load_document();
        controller
    }

    fn load_document(&mut self) {
        self.document = match self.surface.load(self.store.current()) {
            Ok(0) => {
                warn!("document has no pages");
                self.events.push_back(Event::Error {
                    error: "cannot create document: document has no pages".to_string(),
                });
                DocumentStatus::Failed
            }
            Ok(pages) => {
                info!(pages, "document loaded");
                DocumentStatus::Loaded { pages }
            }
            Err(err) => {
                warn!("failed to load document: {err}");
                self.events.push_back(Event::Error {
                    error: err.to_string(),
                });
                DocumentStatus::Failed
            }
        };
    }

    /// Reloads the document under the current configuration, dropping the
    /// geometry-derived state
    fn reload(&mut self, keep_last_reported: bool) {
        let last_reported_page = if keep_last_reported {
            self.state.last_reported_page
        } else {
            None
        };
        self.state = ViewportState {
            last_reported_page,
            ..ViewportState::default()
        };
        self.load_document();
    }

    /// Adopts a configuration queued before the first layout. A new source
    /// or password reopens the document.
    fn adopt_pending_configuration(&mut self) {
        let Some(pending) = self.state.pending_configuration.take() else {
            return;
        };
        let diff = self.store.apply(pending);
        if diff.contains(ConfigField::Source) || diff.contains(ConfigField::Password) {
            info!("document source changed before layout, reloading");
            self.load_document();
        }
    }

    fn ensure_live(&self) -> Result<()> {
        match self.document {
            DocumentStatus::Disposed => Err(ViewError::Disposed),
            _ => Ok(()),
        }
    }

    fn loaded_pages(&self) -> Option<usize> {
        match self.document {
            DocumentStatus::Loaded { pages } => Some(pages),
            _ => None,
        }
    }

    fn apply_zoom_bounds(&mut self, configuration: &Configuration, unit: f64) {
        self.surface
            .set_native_scale_bounds(configuration.min_zoom() * unit, configuration.max_zoom() * unit);
    }

    pub fn configuration(&self) -> &Configuration {
        self.store.current()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_initialized(&self) -> bool {
        self.state.has_initialized
    }

    pub fn is_disposed(&self) -> bool {
        self.document == DocumentStatus::Disposed
    }

    pub fn has_document(&self) -> bool {
        self.loaded_pages().is_some()
    }

    pub fn phase(&self) -> Phase {
        if !self.state.has_initialized {
            Phase::Uninitialized
        } else if self.state.animation_in_flight {
            Phase::NavigatingAnimated
        } else if self.state.pending_destination_page.is_some() {
            Phase::NavigatingInstant
        } else {
            Phase::Idle
        }
    }

    /// Drains the events emitted since the last call
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    /// Measures the reference page on the surface and runs
    /// [`initialize_or_update_geometry`](Self::initialize_or_update_geometry).
    pub fn on_layout(&mut self, viewport: Size) -> Result<()> {
        self.ensure_live()?;
        self.last_viewport = Some(viewport);
        if !self.state.has_initialized {
            self.adopt_pending_configuration();
        }
        let Some(pages) = self.loaded_pages() else {
            return Ok(());
        };
        let configuration = self
            .state
            .pending_configuration
            .as_ref()
            .unwrap_or(self.store.current());
        let reference = configuration.default_page().min(pages - 1);
        let page = self.surface.page_size(reference).ok_or(ViewError::NoDocument)?;
        self.initialize_or_update_geometry(viewport, page)
    }

    /// Entry point for every layout pass.
    ///
    /// The first pass with a loaded document sets up scale, zoom bounds and
    /// the default page. Later passes apply a pending configuration and
    /// re-derive the unit scale when the fit policy or the geometry changed.
    pub fn initialize_or_update_geometry(&mut self, viewport: Size, page: Size) -> Result<()> {
        self.ensure_live()?;
        if !self.state.has_initialized {
            self.adopt_pending_configuration();
        }
        let Some(pages) = self.loaded_pages() else {
            debug!("no document, layout ignored");
            return Ok(());
        };

        if !self.state.has_initialized {
            let configuration = self.store.current().clone();
            let unit = resolve_unit_scale(viewport, page, configuration.fit_policy())?;
            debug!(unit, ?viewport, ?page, "initial unit scale");

            self.state.native_unit_scale = Some(unit);
            self.state.viewport = Some(viewport);
            self.state.page_size = Some(page);
            self.apply_zoom_bounds(&configuration, unit);
            self.surface
                .set_native_scale(configuration.default_zoom_factor() * unit, false);
            let target = configuration.default_page().min(pages - 1);
            self.state.pending_destination_page = None;
            self.state.animation_in_flight = false;
            self.surface.go_to_page(target, false);
            self.surface.set_scrollbar_visible(configuration.show_scrollbar());

            self.state.has_initialized = true;
            self.events.push_back(Event::Render { pages });
            return Ok(());
        }

        let diff = match self.state.pending_configuration.take() {
            Some(next) => self.store.apply(next),
            None => ConfigDiff::default(),
        };
        if !diff.is_empty() {
            debug!(fields = ?diff.fields(), "applying configuration update");
        }

        if diff.contains(ConfigField::Source) || diff.contains(ConfigField::Password) {
            info!("document source changed, reloading");
            self.reload(false);
            return self.on_layout(viewport);
        }

        let configuration = self.store.current().clone();
        let geometry_changed =
            self.state.viewport != Some(viewport) || self.state.page_size != Some(page);

        if diff.needs_rescale() || geometry_changed {
            let zoom = if diff.needs_rescale() {
                configuration.default_zoom_factor()
            } else {
                self.logical_zoom()?
            };
            let unit = resolve_unit_scale(viewport, page, configuration.fit_policy())?;
            debug!(unit, zoom, "re-derived unit scale");

            self.state.native_unit_scale = Some(unit);
            self.apply_zoom_bounds(&configuration, unit);
            self.surface.set_native_scale(zoom * unit, false);
        } else if diff.needs_zoom_bounds() {
            if let Some(unit) = self.state.native_unit_scale {
                self.apply_zoom_bounds(&configuration, unit);
            }
        }

        if diff.contains(ConfigField::ShowScrollbar) {
            self.surface.set_scrollbar_visible(configuration.show_scrollbar());
        }
        if diff.needs_appearance() {
            self.surface.apply_appearance(&configuration.appearance());
        }

        self.state.viewport = Some(viewport);
        self.state.page_size = Some(page);
        Ok(())
    }

    /// Queues a new configuration; it takes effect at the next layout pass,
    /// or right away when the geometry is already known.
    ///
    /// Without a loaded document the configuration is adopted at once, so a
    /// corrected source or password can recover a view that failed to open.
    pub fn update_configuration(&mut self, configuration: Configuration) -> Result<()> {
        self.ensure_live()?;
        self.state.pending_configuration = Some(configuration);

        match (self.state.has_initialized, self.state.viewport, self.state.page_size) {
            (true, Some(viewport), Some(page)) => self.initialize_or_update_geometry(viewport, page),
            _ if !self.has_document() => match self.last_viewport {
                Some(viewport) => self.on_layout(viewport),
                None => {
                    self.adopt_pending_configuration();
                    Ok(())
                }
            },
            _ => Ok(()),
        }
    }

    pub fn set_logical_zoom(&mut self, factor: f64, animated: bool) -> Result<()> {
        self.ensure_live()?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ViewError::InvalidZoom(factor));
        }
        let unit = self.state.native_unit_scale.ok_or(ViewError::NotInitialized)?;
        self.surface.set_native_scale(unit * factor, animated);
        Ok(())
    }

    pub fn reset_zoom(&mut self) -> Result<()> {
        let factor = self.store.current().default_zoom_factor();
        self.set_logical_zoom(factor, false)
    }

    pub fn logical_zoom(&self) -> Result<f64> {
        self.ensure_live()?;
        let unit = self.state.native_unit_scale.ok_or(ViewError::NotInitialized)?;
        Ok(self.surface.native_scale() / unit)
    }

    /// Jumps to `index`. Out-of-range indices, and any request before the
    /// first layout, are rejected with `false` and leave everything untouched.
    ///
    /// No [`Event::PageChanged`] is emitted here; it follows from the
    /// surface's notification.
    pub fn request_page(&mut self, index: i64, animated: bool) -> bool {
        let Some(pages) = self.loaded_pages() else {
            return false;
        };
        if !self.state.has_initialized {
            debug!(index, "page request before first layout");
            return false;
        }
        let page = match usize::try_from(index) {
            Ok(page) if page < pages => page,
            _ => {
                debug!(index, pages, "page request out of range");
                return false;
            }
        };

        // An animated jump to the visible page never produces a matching
        // notification, so there is nothing to wait for.
        let already_visible = self.surface.current_page() == Some(page);
        self.state.pending_destination_page = Some(page);
        self.state.animation_in_flight = animated && !already_visible;
        self.surface.go_to_page(page, animated);
        true
    }

    pub fn request_relative_page(&mut self, direction: PageDirection, animated: bool) -> bool {
        if !self.state.has_initialized {
            return false;
        }

        // Chain from the destination of an unfinished animation. The surface
        // still reports capabilities for the page it is leaving.
        let origin = match (self.state.animation_in_flight, self.state.pending_destination_page) {
            (true, Some(destination)) => {
                let pages = self.loaded_pages().unwrap_or(0);
                let allowed = match direction {
                    PageDirection::Next => destination + 1 < pages,
                    PageDirection::Previous => destination > 0,
                };
                allowed.then_some(destination)
            }
            _ => {
                let allowed = match direction {
                    PageDirection::Next => self.surface.can_go_next(),
                    PageDirection::Previous => self.surface.can_go_previous(),
                };
                if allowed {
                    self.surface.current_page()
                } else {
                    None
                }
            }
        };
        let Some(origin) = origin else {
            return false;
        };

        let target = match direction {
            PageDirection::Next => origin as i64 + 1,
            PageDirection::Previous => origin as i64 - 1,
        };
        self.request_page(target, animated)
    }

    /// Filters a native page notification. Returns whether it was forwarded.
    ///
    /// While an animated jump is in flight, the surface first reports the
    /// page it is leaving; only the destination is passed on. A page equal
    /// to the last forwarded one is never passed on.
    pub fn on_native_page_notification(&mut self, page: usize, total: usize) -> bool {
        let reached_destination = self.state.pending_destination_page == Some(page);

        if self.state.animation_in_flight && !reached_destination {
            debug!(
                page,
                destination = ?self.state.pending_destination_page,
                "suppressing intermediate page"
            );
            return false;
        }
        if reached_destination || !self.state.animation_in_flight {
            self.state.pending_destination_page = None;
            self.state.animation_in_flight = false;
        }
        if self.state.last_reported_page == Some(page) {
            debug!(page, "suppressing duplicate page");
            return false;
        }

        self.state.last_reported_page = Some(page);
        self.events.push_back(Event::PageChanged { page, total });
        true
    }

    /// Returns whether the swipe started a navigation
    pub fn handle_swipe_gesture(&mut self, direction: SwipeDirection) -> bool {
        let configuration = self.store.current();
        if !configuration.enable_swipe() {
            return false;
        }

        let target = match (configuration.swipe_horizontal(), direction) {
            (true, SwipeDirection::Left) | (false, SwipeDirection::Up) => PageDirection::Next,
            (true, SwipeDirection::Right) | (false, SwipeDirection::Down) => PageDirection::Previous,
            _ => return false,
        };
        self.request_relative_page(target, true)
    }

    /// Reloads the document when the orientation flips, reopening it at the
    /// current page. The first report only records the orientation.
    /// Returns whether a reload happened.
    pub fn handle_orientation_changed(
        &mut self,
        orientation: Orientation,
        configuration: Configuration,
    ) -> Result<bool> {
        self.ensure_live()?;
        match self.last_orientation.replace(orientation) {
            Some(last) if last != orientation => {}
            _ => return Ok(false),
        }

        let page = self
            .surface
            .current_page()
            .or(self.state.last_reported_page)
            .unwrap_or(configuration.default_page());
        info!(?orientation, page, "orientation changed, reloading document");

        self.store.apply(configuration.with_default_page(page));
        self.reload(true);
        Ok(true)
    }

    /// Routes one surface notification to the host
    pub fn handle_notification(&mut self, notification: SurfaceNotification) {
        if self.subscription.is_none() {
            return;
        }

        match notification {
            SurfaceNotification::PageChanged { page, total } => {
                self.on_native_page_notification(page, total);
            }
            SurfaceNotification::ScaleChanged => {
                if let Ok(zoom) = self.logical_zoom() {
                    self.events.push_back(Event::ZoomChanged { zoom });
                }
            }
            SurfaceNotification::Tap => self.events.push_back(Event::Tap),
            SurfaceNotification::LinkActivated { url } => {
                if self.store.current().has_on_link_handle() {
                    self.events.push_back(Event::LinkHandle { url });
                } else {
                    self.surface.open_external(&url);
                }
            }
            SurfaceNotification::PageError { page, error } => {
                warn!(page, "page failed to render: {error}");
                self.events.push_back(Event::PageError { page, error });
            }
        }
    }

    /// Handles every notification the surface has queued
    pub fn pump(&mut self) {
        if self.subscription.is_none() {
            return;
        }
        while let Some(notification) = self.surface.poll_notification() {
            self.handle_notification(notification);
        }
    }

    pub fn page_count(&self) -> Option<usize> {
        self.loaded_pages()
    }

    pub fn current_page(&self) -> Option<usize> {
        self.loaded_pages()?;
        self.surface.current_page()
    }

    /// Intrinsic size of the visible page, or of the reference page before
    /// the first navigation
    pub fn page_size(&self) -> Option<Size> {
        let pages = self.loaded_pages()?;
        let page = self
            .surface
            .current_page()
            .unwrap_or(self.store.current().default_page().min(pages - 1));
        self.surface.page_size(page)
    }

    /// Viewport width scaled by the logical zoom
    pub fn page_width(&self) -> Result<f64> {
        let viewport = self.state.viewport.ok_or(ViewError::NotInitialized)?;
        Ok(viewport.width * self.logical_zoom()?)
    }

    /// Viewport height scaled by the logical zoom
    pub fn page_height(&self) -> Result<f64> {
        let viewport = self.state.viewport.ok_or(ViewError::NotInitialized)?;
        Ok(viewport.height * self.logical_zoom()?)
    }

    /// Releases the surface subscription and the document
    pub fn dispose(&mut self) {
        if self.document == DocumentStatus::Disposed {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.surface.unsubscribe(id);
        }
        self.surface.release();
        self.state = ViewportState::default();
        self.events.clear();
        self.document = DocumentStatus::Disposed;
        info!("view disposed");
    }
}

impl<S: RenderSurface> Drop for ViewportController<S> {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.surface.unsubscribe(id);
        }
    }
}
