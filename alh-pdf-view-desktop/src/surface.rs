use crate::renderer::{Document, PdfRenderer};
use alh_pdf_view::{
    Appearance, Configuration, RenderSurface, Size, SubscriptionId, SurfaceError,
    SurfaceNotification, SurfaceTuning,
};
use iced::widget::image::Handle;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Scale multiplier of one zoom step from the keyboard
const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy)]
struct PageAnimation {
    target: usize,
    started: Instant,
}

/// Visible page and the animated jump in progress.
///
/// An animated jump reports the page being left when it starts and the
/// destination once the animation has run.
#[derive(Debug, Default)]
struct Navigation {
    current: Option<usize>,
    animation: Option<PageAnimation>,
}

impl Navigation {
    /// Returns the page to report right away
    fn go_to(&mut self, page: usize, animated: bool, now: Instant) -> Option<usize> {
        if animated {
            self.animation = Some(PageAnimation {
                target: page,
                started: now,
            });
            self.current
        } else {
            self.animation = None;
            self.current = Some(page);
            self.current
        }
    }

    /// Returns the destination once `duration` has passed
    fn tick(&mut self, now: Instant, duration: Duration) -> Option<usize> {
        let animation = self.animation?;
        if now.duration_since(animation.started) < duration {
            return None;
        }
        self.animation = None;
        self.current = Some(animation.target);
        self.current
    }

    fn reset(&mut self, current: Option<usize>) {
        self.current = current;
        self.animation = None;
    }
}

/// `RenderSurface` backed by a pdfium document.
///
/// Animated jumps behave like the mobile views: the page being left is
/// reported when the animation starts, the destination when it ends.
pub struct PdfiumSurface {
    renderer: PdfRenderer,
    tuning: SurfaceTuning,
    document: Option<Document>,
    appearance: Option<Appearance>,
    navigation: Navigation,
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    scrollbar_visible: bool,
    subscription: Option<SubscriptionId>,
    next_subscription: u64,
    queue: VecDeque<SurfaceNotification>,
    page_cache: HashMap<(usize, u32), Handle>, // (page_index, scale in thousandths) -> rendered image
}

impl PdfiumSurface {
    pub fn new(renderer: PdfRenderer, tuning: SurfaceTuning) -> Self {
        Self {
            renderer,
            tuning,
            document: None,
            appearance: None,
            navigation: Navigation::default(),
            scale: 1.0,
            min_scale: 0.0,
            max_scale: f64::MAX,
            scrollbar_visible: true,
            subscription: None,
            next_subscription: 1,
            queue: VecDeque::new(),
            page_cache: HashMap::new(),
        }
    }

    fn notify(&mut self, notification: SurfaceNotification) {
        if self.subscription.is_some() {
            self.queue.push_back(notification);
        }
    }

    fn report_page(&mut self, page: usize) {
        let total = self.page_count();
        self.notify(SurfaceNotification::PageChanged { page, total });
    }

    fn evict_outside_window(&mut self) {
        let Some(current) = self.navigation.current else {
            return;
        };
        let window = current.saturating_sub(self.tuning.preload_offset)
            ..=current + self.tuning.preload_offset;
        self.page_cache.retain(|(page, _), _| window.contains(page));
    }

    pub fn is_animating(&self) -> bool {
        self.navigation.animation.is_some()
    }

    pub fn scrollbar_visible(&self) -> bool {
        self.scrollbar_visible
    }

    pub fn appearance(&self) -> Option<&Appearance> {
        self.appearance.as_ref()
    }

    /// Finishes a page animation once its duration has passed
    pub fn tick(&mut self, now: Instant) {
        if let Some(page) = self.navigation.tick(now, self.tuning.page_animation) {
            self.report_page(page);
            self.evict_outside_window();
        }
    }

    pub fn tap(&mut self) {
        self.notify(SurfaceNotification::Tap);
    }

    /// Keyboard zoom, the desktop stand-in for a pinch gesture
    pub fn zoom_step(&mut self, zoom_in: bool) {
        let factor = if zoom_in { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        self.set_native_scale(self.scale * factor, false);
    }

    /// Current page at the current scale, rendered on demand
    pub fn rendered_page(&mut self) -> Option<Handle> {
        let page_index = self.navigation.current?;
        let appearance = self.appearance?;
        let cache_key = (page_index, (self.scale * 1000.0).round() as u32);

        // Check cache first
        if let Some(handle) = self.page_cache.get(&cache_key) {
            return Some(handle.clone());
        }

        let document = self.document.as_ref()?;
        match document.render_page(page_index, self.scale, &appearance) {
            Ok(img) => {
                let width = img.width();
                let height = img.height();
                let handle = Handle::from_rgba(width, height, img.into_raw());
                self.page_cache.insert(cache_key, handle.clone());
                Some(handle)
            }
            Err(e) => {
                tracing::error!("Failed to render page {}: {:#}", page_index, e);
                self.notify(SurfaceNotification::PageError {
                    page: page_index,
                    error: format!("{e:#}"),
                });
                None
            }
        }
    }
}

impl RenderSurface for PdfiumSurface {
    fn load(&mut self, configuration: &Configuration) -> Result<usize, SurfaceError> {
        self.release();
        let document = self
            .renderer
            .load_document(configuration.source(), configuration.password())
            .map_err(|e| SurfaceError::InvalidDocument(format!("{e:#}")))?;

        let pages = document.page_count();
        tracing::info!(pages, source = ?configuration.source(), "pdfium document opened");
        self.document = Some(document);
        self.appearance = Some(configuration.appearance());
        self.navigation.reset((pages > 0).then_some(0));
        self.scale = 1.0;
        Ok(pages)
    }

    fn release(&mut self) {
        self.document = None;
        self.navigation.reset(None);
        self.page_cache.clear();
    }

    fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, Document::page_count)
    }

    fn current_page(&self) -> Option<usize> {
        self.navigation.current
    }

    fn page_size(&self, page: usize) -> Option<Size> {
        let document = self.document.as_ref()?;
        match document.page_size(page) {
            Ok(size) => Some(size),
            Err(e) => {
                tracing::warn!("no size for page {}: {:#}", page, e);
                None
            }
        }
    }

    fn native_scale(&self) -> f64 {
        self.scale
    }

    fn set_native_scale(&mut self, scale: f64, _animated: bool) {
        let scale = scale.clamp(self.min_scale, self.max_scale);
        if scale != self.scale {
            self.scale = scale;
            self.notify(SurfaceNotification::ScaleChanged);
        }
    }

    fn set_native_scale_bounds(&mut self, min: f64, max: f64) {
        // bounds are not validated upstream
        self.min_scale = min.min(max);
        self.max_scale = max.max(min);
    }

    fn can_go_next(&self) -> bool {
        self.navigation
            .current
            .is_some_and(|page| page + 1 < self.page_count())
    }

    fn can_go_previous(&self) -> bool {
        self.navigation.current.is_some_and(|page| page > 0)
    }

    fn go_to_page(&mut self, page: usize, animated: bool) {
        if page >= self.page_count() {
            return;
        }
        if let Some(reported) = self.navigation.go_to(page, animated, Instant::now()) {
            self.report_page(reported);
        }
        if !animated {
            self.evict_outside_window();
        }
    }

    fn apply_appearance(&mut self, appearance: &Appearance) {
        self.appearance = Some(*appearance);
        self.page_cache.clear();
    }

    fn set_scrollbar_visible(&mut self, visible: bool) {
        self.scrollbar_visible = visible;
    }

    fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscription = Some(id);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscription == Some(id) {
            self.subscription = None;
            self.queue.clear();
        }
    }

    fn poll_notification(&mut self) -> Option<SurfaceNotification> {
        self.queue.pop_front()
    }
}
