//! In-memory surface for exercising the controller without a platform view.

use crate::config::{Appearance, Configuration};
use crate::error::SurfaceError;
use crate::fit::Size;
use crate::surface::{RenderSurface, SubscriptionId, SurfaceNotification};
use std::collections::VecDeque;

/// A call the controller made on the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load { default_page: usize },
    Release,
    SetScale { scale: f64, animated: bool },
    SetBounds { min: f64, max: f64 },
    GoToPage { page: usize, animated: bool },
    Appearance(Appearance),
    Scrollbar(bool),
    OpenExternal(String),
}

/// Surface double that records calls and replays scripted notifications.
///
/// Navigation moves `current_page` immediately but emits nothing; tests
/// script the native notification order with [`emit_page`](Self::emit_page).
#[derive(Debug)]
pub struct RecordingSurface {
    pages: usize,
    page_size: Size,
    current_page: Option<usize>,
    scale: f64,
    fail_load: Option<String>,
    subscription: Option<SubscriptionId>,
    next_subscription: u64,
    queue: VecDeque<SurfaceNotification>,
    calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new(pages: usize, page_size: Size) -> Self {
        Self {
            pages,
            page_size,
            current_page: None,
            scale: 1.0,
            fail_load: None,
            subscription: None,
            next_subscription: 1,
            queue: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Makes every `load` fail with the given reason
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_load: Some(reason.to_string()),
            ..Self::new(0, Size::default())
        }
    }

    /// Lets later loads succeed with `pages` pages of `page_size`
    pub fn accept_loads(&mut self, pages: usize, page_size: Size) {
        self.fail_load = None;
        self.pages = pages;
        self.page_size = page_size;
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Navigation calls only
    pub fn navigations(&self) -> Vec<(usize, bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::GoToPage { page, animated } => Some((*page, *animated)),
                _ => None,
            })
            .collect()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Native scale changed by a pinch gesture
    pub fn pinch_to(&mut self, scale: f64) {
        self.scale = scale;
        self.notify(SurfaceNotification::ScaleChanged);
    }

    /// Native view reports `page` as visible
    pub fn emit_page(&mut self, page: usize) {
        self.current_page = Some(page);
        let total = self.pages;
        self.notify(SurfaceNotification::PageChanged { page, total });
    }

    pub fn notify(&mut self, notification: SurfaceNotification) {
        if self.subscription.is_some() {
            self.queue.push_back(notification);
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn load(&mut self, configuration: &Configuration) -> Result<usize, SurfaceError> {
        self.calls.push(SurfaceCall::Load {
            default_page: configuration.default_page(),
        });
        if let Some(reason) = &self.fail_load {
            return Err(SurfaceError::InvalidDocument(reason.clone()));
        }
        Ok(self.pages)
    }

    fn release(&mut self) {
        self.calls.push(SurfaceCall::Release);
        self.current_page = None;
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn current_page(&self) -> Option<usize> {
        self.current_page
    }

    fn page_size(&self, page: usize) -> Option<Size> {
        (page < self.pages).then_some(self.page_size)
    }

    fn native_scale(&self) -> f64 {
        self.scale
    }

    fn set_native_scale(&mut self, scale: f64, animated: bool) {
        self.calls.push(SurfaceCall::SetScale { scale, animated });
        self.scale = scale;
    }

    fn set_native_scale_bounds(&mut self, min: f64, max: f64) {
        self.calls.push(SurfaceCall::SetBounds { min, max });
    }

    fn can_go_next(&self) -> bool {
        self.current_page.is_some_and(|page| page + 1 < self.pages)
    }

    fn can_go_previous(&self) -> bool {
        self.current_page.is_some_and(|page| page > 0)
    }

    fn go_to_page(&mut self, page: usize, animated: bool) {
        self.calls.push(SurfaceCall::GoToPage { page, animated });
        self.current_page = Some(page);
    }

    fn apply_appearance(&mut self, appearance: &Appearance) {
        self.calls.push(SurfaceCall::Appearance(*appearance));
    }

    fn set_scrollbar_visible(&mut self, visible: bool) {
        self.calls.push(SurfaceCall::Scrollbar(visible));
    }

    fn open_external(&mut self, url: &str) {
        self.calls.push(SurfaceCall::OpenExternal(url.to_string()));
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
