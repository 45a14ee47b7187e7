//! Command/event channel adapter
//!
//! Every embedded view listens on two method channels, `alh_pdf_view_{id}`
//! (user facing) and `alh_pdf_{id}` (package internal), and emits events on
//! the first one. Inbound `(method, arguments)` pairs are decoded into a
//! [`Command`] before anything reaches the controller.

use crate::config::{Configuration, Orientation};
use crate::controller::{PageDirection, ViewportController};
use crate::error::{ChannelError, ViewError};
use crate::event::OutboundMessage;
use crate::fit::Size;
use crate::surface::RenderSurface;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const VIEW_CHANNEL_PREFIX: &str = "alh_pdf_view_";
const INTERNAL_CHANNEL_PREFIX: &str = "alh_pdf_";

/// Decoded host command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PageCount,
    CurrentPage,
    NextPage { with_animation: bool },
    PreviousPage { with_animation: bool },
    SetPage { page: i64, with_animation: bool },
    PageSize,
    PageWidth,
    PageHeight,
    ResetZoom,
    CurrentZoom,
    SetZoom { new_zoom: f64 },
    UpdateConfiguration(Configuration),
    SetOrientation {
        orientation: Orientation,
        configuration: Configuration,
    },
    Dispose,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimationArgs {
    with_animation: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPageArgs {
    page: i64,
    with_animation: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoomArgs {
    new_zoom: f64,
}

#[derive(Deserialize)]
struct OrientationArgs {
    orientation: String,
}

fn decode_args<T: DeserializeOwned>(method: &str, arguments: &Value) -> Result<T, ChannelError> {
    T::deserialize(arguments).map_err(|err| ChannelError::invalid_arguments(method, err))
}

fn decode_configuration(method: &str, arguments: &Value) -> Result<Configuration, ChannelError> {
    Configuration::from_value(arguments).map_err(|err| ChannelError::invalid_arguments(method, err))
}

impl Command {
    pub fn decode(method: &str, arguments: &Value) -> Result<Self, ChannelError> {
        let command = match method {
            "pageCount" => Self::PageCount,
            "currentPage" => Self::CurrentPage,
            "nextPage" => {
                let args: AnimationArgs = decode_args(method, arguments)?;
                Self::NextPage {
                    with_animation: args.with_animation,
                }
            }
            "previousPage" => {
                let args: AnimationArgs = decode_args(method, arguments)?;
                Self::PreviousPage {
                    with_animation: args.with_animation,
                }
            }
            "setPage" => {
                let args: SetPageArgs = decode_args(method, arguments)?;
                Self::SetPage {
                    page: args.page,
                    with_animation: args.with_animation,
                }
            }
            "pageSize" => Self::PageSize,
            "pageWidth" => Self::PageWidth,
            "pageHeight" => Self::PageHeight,
            "resetZoom" => Self::ResetZoom,
            "currentZoom" => Self::CurrentZoom,
            "setZoom" => {
                let args: ZoomArgs = decode_args(method, arguments)?;
                Self::SetZoom {
                    new_zoom: args.new_zoom,
                }
            }
            "updateConfiguration" | "updateCreationParams" => {
                Self::UpdateConfiguration(decode_configuration(method, arguments)?)
            }
            "setOrientation" => {
                let args: OrientationArgs = decode_args(method, arguments)?;
                let orientation = Orientation::from_wire(&args.orientation).ok_or_else(|| {
                    ChannelError::invalid_arguments(
                        method,
                        format!("unknown orientation `{}`", args.orientation),
                    )
                })?;
                Self::SetOrientation {
                    orientation,
                    configuration: decode_configuration(method, arguments)?,
                }
            }
            "dispose" => Self::Dispose,
            other => return Err(ChannelError::NotImplemented(other.to_string())),
        };
        Ok(command)
    }
}

fn size_reply(size: Size) -> Value {
    json!({ "width": size.width, "height": size.height })
}

/// One embedded view bound to its channels
pub struct PdfViewChannel<S: RenderSurface> {
    id: i64,
    controller: ViewportController<S>,
}

impl<S: RenderSurface> PdfViewChannel<S> {
    pub fn new(id: i64, surface: S, configuration: Configuration) -> Self {
        Self {
            id,
            controller: ViewportController::attach(surface, configuration),
        }
    }

    /// Builds a view from the host's creation parameters
    pub fn from_creation_params(id: i64, surface: S, params: &Value) -> Result<Self, ChannelError> {
        let configuration = Configuration::from_value(params)?;
        Ok(Self::new(id, surface, configuration))
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn view_channel(&self) -> String {
        format!("{VIEW_CHANNEL_PREFIX}{}", self.id)
    }

    pub fn internal_channel(&self) -> String {
        format!("{INTERNAL_CHANNEL_PREFIX}{}", self.id)
    }

    pub fn controller(&self) -> &ViewportController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewportController<S> {
        &mut self.controller
    }

    /// Decodes and executes one command, returning the reply value
    pub fn handle(&mut self, method: &str, arguments: &Value) -> Result<Value, ChannelError> {
        let command = Command::decode(method, arguments)?;
        debug!(id = self.id, ?command, "command");
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<Value, ChannelError> {
        let controller = &mut self.controller;
        if controller.is_disposed() && command != Command::Dispose {
            return Err(ViewError::Disposed.into());
        }

        let reply = match command {
            Command::PageCount => json!(controller.page_count().map_or(-1, |pages| pages as i64)),
            Command::CurrentPage => {
                json!(controller.current_page().map_or(-1, |page| page as i64))
            }
            Command::NextPage { with_animation } => {
                json!(controller.request_relative_page(PageDirection::Next, with_animation))
            }
            Command::PreviousPage { with_animation } => {
                json!(controller.request_relative_page(PageDirection::Previous, with_animation))
            }
            Command::SetPage {
                page,
                with_animation,
            } => json!(controller.request_page(page, with_animation)),
            Command::PageSize => size_reply(controller.page_size().ok_or(ViewError::NoDocument)?),
            Command::PageWidth => json!(controller.page_width()?),
            Command::PageHeight => json!(controller.page_height()?),
            Command::ResetZoom => {
                controller.reset_zoom()?;
                Value::Null
            }
            Command::CurrentZoom => json!(controller.logical_zoom()?),
            Command::SetZoom { new_zoom } => {
                controller.set_logical_zoom(new_zoom, true)?;
                Value::Null
            }
            Command::UpdateConfiguration(configuration) => {
                controller.update_configuration(configuration)?;
                Value::Null
            }
            Command::SetOrientation {
                orientation,
                configuration,
            } => {
                controller.handle_orientation_changed(orientation, configuration)?;
                Value::Null
            }
            Command::Dispose => {
                controller.dispose();
                Value::Bool(true)
            }
        };

        controller.pump();
        Ok(reply)
    }

    /// Layout pass from the host. Geometry problems are logged, never
    /// reported to the host.
    pub fn on_layout(&mut self, viewport: Size) {
        match self.controller.on_layout(viewport) {
            Ok(()) => {}
            Err(ViewError::Geometry(err)) => debug!(id = self.id, "layout skipped: {err}"),
            Err(err) => warn!(id = self.id, "layout failed: {err}"),
        }
        self.controller.pump();
    }

    /// Delivers queued surface notifications
    pub fn pump(&mut self) {
        self.controller.pump();
    }

    /// Drains the encoded events for the host
    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        let channel = self.view_channel();
        self.controller
            .take_events()
            .iter()
            .map(|event| event.encode(&channel))
            .collect()
    }
}

/// Routes channel traffic to views by instance id
pub struct ChannelRouter<S: RenderSurface> {
    views: BTreeMap<i64, PdfViewChannel<S>>,
}

impl<S: RenderSurface> Default for ChannelRouter<S> {
    fn default() -> Self {
        Self {
            views: BTreeMap::new(),
        }
    }
}

impl<S: RenderSurface> ChannelRouter<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the view for `id`, replacing any previous one
    pub fn create(&mut self, id: i64, surface: S, params: &Value) -> Result<&mut PdfViewChannel<S>, ChannelError> {
        let view = PdfViewChannel::from_creation_params(id, surface, params)?;
        if let Some(mut previous) = self.views.insert(id, view) {
            previous.controller_mut().dispose();
        }
        self.views.get_mut(&id).ok_or(ChannelError::View(ViewError::Disposed))
    }

    pub fn get(&self, id: i64) -> Option<&PdfViewChannel<S>> {
        self.views.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut PdfViewChannel<S>> {
        self.views.get_mut(&id)
    }

    /// Instance id addressed by a channel name
    pub fn parse_channel(channel: &str) -> Option<i64> {
        channel
            .strip_prefix(VIEW_CHANNEL_PREFIX)
            .or_else(|| channel.strip_prefix(INTERNAL_CHANNEL_PREFIX))
            .and_then(|id| id.parse().ok())
    }

    /// Handles a call on any view channel. A `dispose` also drops the view.
    pub fn handle(&mut self, channel: &str, method: &str, arguments: &Value) -> Result<Value, ChannelError> {
        let id = Self::parse_channel(channel)
            .ok_or_else(|| ChannelError::NotImplemented(format!("{channel}/{method}")))?;
        let view = self
            .views
            .get_mut(&id)
            .ok_or_else(|| ChannelError::NotImplemented(format!("{channel}/{method}")))?;

        let reply = view.handle(method, arguments)?;
        if view.controller().is_disposed() {
            self.views.remove(&id);
        }
        Ok(reply)
    }

    /// Outbound events from every view, in id order
    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        self.views
            .values_mut()
            .flat_map(|view| view.take_outbound())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
