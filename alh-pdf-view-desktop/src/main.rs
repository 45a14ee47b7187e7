use alh_pdf_view::{ChannelRouter, PdfViewChannel, Rgb, Size, SurfaceTuning, SwipeDirection};
use clap::Parser;
use iced::{
    keyboard::{self, key::Named, Key},
    widget::{
        button, column, container, horizontal_space, image as img, image::Handle, mouse_area, row,
        scrollable,
        scrollable::{Direction, Scrollbar},
        text,
    },
    window, Color, Element, Length, Subscription, Task, Theme,
};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod cli;
mod renderer;
mod surface;

use renderer::PdfRenderer;
use surface::PdfiumSurface;

const VIEW_ID: i64 = 0;
const TOOLBAR_HEIGHT: f32 = 52.0;
const STATUS_HEIGHT: f32 = 28.0;
const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("alh_pdf_view=debug,alh_pdf_view_desktop=debug,info")),
        )
        .init();

    let args = cli::Args::parse();
    let params = args.creation_params()?;
    let renderer = PdfRenderer::new()?;
    let tuning = SurfaceTuning {
        preload_offset: args.preload,
        page_animation: args.page_animation(),
    };

    iced::application("PDF Viewer", Viewer::update, Viewer::view)
        .subscription(Viewer::subscription)
        .window(window::Settings {
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .theme(|_| Theme::Dark)
        .run_with(move || Viewer::new(renderer, tuning, params))
        .map_err(|e| anyhow::anyhow!("viewer window failed: {e}"))
}

#[derive(Debug, Clone)]
enum Message {
    Resized(iced::Size),
    Tick,
    NextPage,
    PreviousPage,
    FirstPage,
    Swipe(SwipeDirection),
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Tap,
    CycleFitPolicy,
    ToggleNightMode,
    ToggleScrollbar,
    CloseRequested(window::Id),
}

/// Host side of one embedded view: sends commands over the channel and
/// shows the events that come back
struct Viewer {
    router: ChannelRouter<PdfiumSurface>,
    channel: String,
    params: Value,
    page_image: Option<Handle>,
    status: String,
}

impl Viewer {
    fn new(renderer: PdfRenderer, tuning: SurfaceTuning, params: Value) -> (Self, Task<Message>) {
        let mut router = ChannelRouter::new();
        let surface = PdfiumSurface::new(renderer, tuning);
        let channel = match router.create(VIEW_ID, surface, &params) {
            Ok(view) => view.view_channel(),
            Err(e) => {
                tracing::error!("cannot create view: {e}");
                String::new()
            }
        };

        let mut viewer = Self {
            router,
            channel,
            params,
            page_image: None,
            status: "Loading…".to_string(),
        };
        viewer.drain_events();

        let initial_size = window::get_latest()
            .and_then(window::get_size)
            .map(Message::Resized);
        (viewer, initial_size)
    }

    fn view_mut(&mut self) -> Option<&mut PdfViewChannel<PdfiumSurface>> {
        self.router.get_mut(VIEW_ID)
    }

    fn call(&mut self, method: &str, arguments: Value) -> Option<Value> {
        match self.router.handle(&self.channel, method, &arguments) {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!(code = e.code(), "{} failed: {}", method, e);
                self.status = format!("{method}: {e}");
                None
            }
        }
    }

    fn update_configuration(&mut self, key: &str, value: Value) {
        self.params[key] = value;
        let params = self.params.clone();
        self.call("updateConfiguration", params);
    }

    fn on_resize(&mut self, size: iced::Size) {
        let orientation = if size.height > size.width {
            "Orientation.portrait"
        } else {
            "Orientation.landscape"
        };
        let mut arguments = self.params.clone();
        arguments["orientation"] = json!(orientation);
        self.call("setOrientation", arguments);

        let viewport = Size::new(
            size.width as f64,
            (size.height - TOOLBAR_HEIGHT - STATUS_HEIGHT).max(1.0) as f64,
        );
        if let Some(view) = self.view_mut() {
            view.on_layout(viewport);
        }
    }

    fn drain_events(&mut self) {
        for message in self.router.take_outbound() {
            tracing::info!(
                channel = %message.channel,
                arguments = %message.arguments,
                "{}",
                message.method
            );
            self.status = match message.method {
                "onError" => format!("Error: {}", message.arguments["error"]),
                method => format!("{method} {}", message.arguments),
            };
        }
    }

    fn refresh_page(&mut self) {
        self.page_image = self
            .view_mut()
            .and_then(|view| view.controller_mut().surface_mut().rendered_page());
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let mut task = Task::none();
        match message {
            Message::Resized(size) => self.on_resize(size),
            Message::Tick => {
                if let Some(view) = self.view_mut() {
                    view.controller_mut().surface_mut().tick(Instant::now());
                }
            }
            Message::NextPage => {
                self.call("nextPage", json!({ "withAnimation": true }));
            }
            Message::PreviousPage => {
                self.call("previousPage", json!({ "withAnimation": true }));
            }
            Message::FirstPage => {
                self.call("setPage", json!({ "page": 0, "withAnimation": false }));
            }
            Message::Swipe(direction) => {
                if let Some(view) = self.view_mut() {
                    view.controller_mut().handle_swipe_gesture(direction);
                }
            }
            Message::ZoomIn | Message::ZoomOut => {
                let zoom_in = matches!(message, Message::ZoomIn);
                if let Some(view) = self.view_mut() {
                    view.controller_mut().surface_mut().zoom_step(zoom_in);
                }
            }
            Message::ZoomReset => {
                self.call("resetZoom", Value::Null);
            }
            Message::Tap => {
                if let Some(view) = self.view_mut() {
                    view.controller_mut().surface_mut().tap();
                }
            }
            Message::CycleFitPolicy => {
                let next = match self.params["fitPolicy"].as_str() {
                    Some("FitPolicy.both") => "FitPolicy.width",
                    Some("FitPolicy.width") => "FitPolicy.height",
                    _ => "FitPolicy.both",
                };
                self.update_configuration("fitPolicy", json!(next));
            }
            Message::ToggleNightMode => {
                let night = self.params["nightMode"].as_bool().unwrap_or(false);
                self.update_configuration("nightMode", json!(!night));
            }
            Message::ToggleScrollbar => {
                let visible = self.params["showScrollbar"].as_bool().unwrap_or(true);
                self.update_configuration("showScrollbar", json!(!visible));
            }
            Message::CloseRequested(id) => {
                self.call("dispose", Value::Null);
                task = window::close(id);
            }
        }

        self.refresh_page();
        if let Some(view) = self.view_mut() {
            view.pump();
        }
        self.drain_events();
        task
    }

    fn view(&self) -> Element<Message> {
        let Some(view) = self.router.get(VIEW_ID) else {
            return container(text(&self.status))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        };
        let controller = view.controller();
        let surface = controller.surface();

        let page_label = match (controller.current_page(), controller.page_count()) {
            (Some(page), Some(count)) => format!("Page {} of {}", page + 1, count),
            _ => "No document".to_string(),
        };
        let zoom_label = controller
            .logical_zoom()
            .map(|zoom| format!("{}%", (zoom * 100.0).round() as i32))
            .unwrap_or_else(|_| "–".to_string());
        let fit_label = self.params["fitPolicy"]
            .as_str()
            .and_then(|policy| policy.strip_prefix("FitPolicy."))
            .unwrap_or("both")
            .to_string();
        let night = surface.appearance().is_some_and(|appearance| appearance.night_mode);

        let toolbar = row![
            button("◀").on_press(Message::PreviousPage),
            text(page_label),
            button("▶").on_press(Message::NextPage),
            horizontal_space(),
            button("−").on_press(Message::ZoomOut),
            text(zoom_label),
            button("+").on_press(Message::ZoomIn),
            button("Reset").on_press(Message::ZoomReset),
            horizontal_space(),
            button(text(format!("Fit: {fit_label}"))).on_press(Message::CycleFitPolicy),
            button(if night { "Day" } else { "Night" }).on_press(Message::ToggleNightMode),
            button("Scrollbar").on_press(Message::ToggleScrollbar),
        ]
        .spacing(10)
        .padding(10)
        .height(Length::Fixed(TOOLBAR_HEIGHT));

        let page: Element<Message> = match &self.page_image {
            Some(handle) => img(handle.clone()).into(),
            None => text(&self.status).into(),
        };

        let scrollbar = || {
            if surface.scrollbar_visible() {
                Scrollbar::new()
            } else {
                Scrollbar::new().width(0.0).scroller_width(0.0)
            }
        };
        let background = surface
            .appearance()
            .map_or(Rgb::WHITE, |appearance| appearance.background_color);

        let page_view = container(
            scrollable(container(page).center_x(Length::Shrink))
                .direction(Direction::Both {
                    vertical: scrollbar(),
                    horizontal: scrollbar(),
                })
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(Color::from_rgb8(background.r, background.g, background.b).into()),
            ..container::Style::default()
        });

        let status_bar = container(text(&self.status).size(14))
            .padding([4, 10])
            .height(Length::Fixed(STATUS_HEIGHT));

        column![toolbar, mouse_area(page_view).on_press(Message::Tap), status_bar].into()
    }

    fn is_animating(&self) -> bool {
        self.router
            .get(VIEW_ID)
            .is_some_and(|view| view.controller().surface().is_animating())
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            window::resize_events().map(|(_id, size)| Message::Resized(size)),
            window::close_requests().map(Message::CloseRequested),
            keyboard::on_key_press(key_message),
        ];
        if self.is_animating() {
            subscriptions.push(iced::time::every(FRAME).map(|_| Message::Tick));
        }
        Subscription::batch(subscriptions)
    }
}

/// Arrow keys act as swipes: the right arrow swipes the page to the left
fn key_message(key: Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::ArrowRight) => Some(Message::Swipe(SwipeDirection::Left)),
        Key::Named(Named::ArrowLeft) => Some(Message::Swipe(SwipeDirection::Right)),
        Key::Named(Named::ArrowDown) => Some(Message::Swipe(SwipeDirection::Up)),
        Key::Named(Named::ArrowUp) => Some(Message::Swipe(SwipeDirection::Down)),
        Key::Named(Named::PageDown) => Some(Message::NextPage),
        Key::Named(Named::PageUp) => Some(Message::PreviousPage),
        Key::Named(Named::Home) => Some(Message::FirstPage),
        Key::Character("+") | Key::Character("=") => Some(Message::ZoomIn),
        Key::Character("-") => Some(Message::ZoomOut),
        Key::Character("0") => Some(Message::ZoomReset),
        Key::Character("n") => Some(Message::ToggleNightMode),
        _ => None,
    }
}
