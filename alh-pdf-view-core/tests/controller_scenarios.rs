use alh_pdf_view::testing::{RecordingSurface, SurfaceCall};
use alh_pdf_view::{
    Configuration, DocumentSource, Event, FitPolicy, Orientation, PageDirection, Phase, Rgb, Size,
    SurfaceNotification, SwipeDirection, ViewError, ViewportController,
};
use pretty_assertions::assert_eq;

const PAGE: Size = Size::new(400.0, 600.0);
const LANDSCAPE: Size = Size::new(800.0, 600.0);
const PORTRAIT: Size = Size::new(600.0, 800.0);

fn configuration() -> Configuration {
    Configuration::new(DocumentSource::File("manual.pdf".into()))
}

fn attach(pages: usize, configuration: Configuration) -> ViewportController<RecordingSurface> {
    ViewportController::attach(RecordingSurface::new(pages, PAGE), configuration)
}

fn laid_out(pages: usize, configuration: Configuration) -> ViewportController<RecordingSurface> {
    let mut controller = attach(pages, configuration);
    controller.on_layout(LANDSCAPE).unwrap();
    controller.take_events();
    controller.surface_mut().clear_calls();
    controller
}

fn page_events(controller: &mut ViewportController<RecordingSurface>) -> Vec<usize> {
    controller.pump();
    controller
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            Event::PageChanged { page, .. } => Some(page),
            _ => None,
        })
        .collect()
}

#[test]
fn first_layout_applies_zoom_bounds_and_default_page() {
    let config = configuration()
        .with_fit_policy(FitPolicy::Width)
        .with_zoom(1.5, 0.5, 3.0)
        .with_default_page(2);
    let mut controller = attach(10, config);
    controller.on_layout(LANDSCAPE).unwrap();

    // unit = 800 / 400
    assert_eq!(
        controller.surface().calls(),
        &[
            SurfaceCall::Load { default_page: 2 },
            SurfaceCall::SetBounds { min: 1.0, max: 6.0 },
            SurfaceCall::SetScale {
                scale: 3.0,
                animated: false
            },
            SurfaceCall::GoToPage {
                page: 2,
                animated: false
            },
            SurfaceCall::Scrollbar(true),
        ]
    );
    assert_eq!(controller.take_events(), vec![Event::Render { pages: 10 }]);
    assert_eq!(controller.logical_zoom(), Ok(1.5));
}

#[test]
fn default_page_is_clamped_to_last_page() {
    let mut controller = attach(4, configuration().with_default_page(9));
    controller.on_layout(LANDSCAPE).unwrap();
    assert_eq!(controller.surface().navigations(), vec![(3, false)]);
}

#[test]
fn out_of_range_requests_have_no_side_effects() {
    let mut controller = laid_out(5, configuration());

    assert!(!controller.request_page(-1, false));
    assert!(!controller.request_page(5, true));
    assert!(!controller.request_page(i64::MAX, true));
    assert!(controller.surface().calls().is_empty());

    assert!(controller.request_page(4, true));
    assert_eq!(controller.surface().navigations(), vec![(4, true)]);
    assert!(controller.take_events().is_empty());
}

#[test]
fn duplicate_notifications_are_forwarded_once() {
    let mut controller = laid_out(8, configuration());
    controller.surface_mut().emit_page(3);
    controller.surface_mut().emit_page(3);
    assert_eq!(page_events(&mut controller), vec![3]);
}

#[test]
fn animated_jump_hides_the_page_being_left() {
    let mut controller = laid_out(8, configuration());
    controller.surface_mut().emit_page(0);
    assert_eq!(page_events(&mut controller), vec![0]);

    assert!(controller.request_page(5, true));
    controller.surface_mut().emit_page(4);
    assert_eq!(page_events(&mut controller), Vec::<usize>::new());

    controller.surface_mut().emit_page(5);
    assert_eq!(page_events(&mut controller), vec![5]);

    // back to normal scrolling
    controller.surface_mut().emit_page(6);
    assert_eq!(page_events(&mut controller), vec![6]);
}

#[test]
fn new_navigation_replaces_pending_destination() {
    let mut controller = laid_out(8, configuration());
    assert!(controller.request_page(5, true));
    assert!(controller.request_page(2, true));

    controller.surface_mut().emit_page(5);
    assert_eq!(page_events(&mut controller), Vec::<usize>::new());
    controller.surface_mut().emit_page(2);
    assert_eq!(page_events(&mut controller), vec![2]);
}

#[test]
fn relative_navigation_respects_surface_capabilities() {
    let mut controller = laid_out(3, configuration());
    controller.surface_mut().emit_page(2);
    controller.pump();
    controller.surface_mut().clear_calls();

    assert!(!controller.request_relative_page(PageDirection::Next, false));
    assert!(controller.surface().calls().is_empty());

    assert!(controller.request_relative_page(PageDirection::Previous, false));
    assert_eq!(controller.surface().navigations(), vec![(1, false)]);
}

#[test]
fn navigation_before_first_layout_is_refused() {
    let mut controller = attach(8, configuration());
    assert!(!controller.request_page(4, true));
    assert!(!controller.request_relative_page(PageDirection::Next, true));
    assert!(controller.surface().navigations().is_empty());

    controller.on_layout(PORTRAIT).unwrap();
    assert_eq!(controller.phase(), Phase::Idle);
    for page in 0..3 {
        controller.surface_mut().emit_page(page);
    }
    assert_eq!(page_events(&mut controller), vec![0, 1, 2]);
}

#[test]
fn relative_navigation_during_animation_is_bounded_by_destination() {
    let mut controller = laid_out(4, configuration());
    controller.surface_mut().emit_page(3);
    controller.pump();

    assert!(controller.request_page(1, true));
    // the surface still reports the last page while animating away from it
    controller.surface_mut().emit_page(3);
    assert!(controller.request_relative_page(PageDirection::Next, true));
    assert_eq!(controller.surface().navigations(), vec![(1, true), (2, true)]);

    assert!(controller.request_page(0, true));
    controller.surface_mut().emit_page(3);
    assert!(!controller.request_relative_page(PageDirection::Previous, true));
}

#[test]
fn swipes_follow_the_configured_axis() {
    let mut controller = laid_out(5, configuration().with_swipe(true, true));
    controller.surface_mut().emit_page(1);
    controller.pump();
    controller.surface_mut().clear_calls();

    assert!(!controller.handle_swipe_gesture(SwipeDirection::Up));
    assert!(controller.handle_swipe_gesture(SwipeDirection::Left));
    assert_eq!(controller.surface().navigations(), vec![(2, true)]);

    controller.surface_mut().emit_page(2);
    controller.pump();
    assert!(controller.handle_swipe_gesture(SwipeDirection::Right));
    assert_eq!(controller.surface().navigations(), vec![(2, true), (1, true)]);

    let mut vertical = laid_out(5, configuration().with_swipe(true, false));
    vertical.surface_mut().emit_page(1);
    vertical.pump();
    assert!(!vertical.handle_swipe_gesture(SwipeDirection::Left));
    assert!(vertical.handle_swipe_gesture(SwipeDirection::Down));

    let mut disabled = laid_out(5, configuration().with_swipe(false, true));
    disabled.surface_mut().emit_page(1);
    disabled.pump();
    assert!(!disabled.handle_swipe_gesture(SwipeDirection::Left));
}

#[test]
fn zoom_round_trips_through_native_scale() {
    let mut controller = laid_out(3, configuration().with_fit_policy(FitPolicy::Width));
    controller.set_logical_zoom(2.5, true).unwrap();
    assert_eq!(
        controller.surface().calls(),
        &[SurfaceCall::SetScale {
            scale: 5.0,
            animated: true
        }]
    );
    assert_eq!(controller.logical_zoom(), Ok(2.5));

    controller.reset_zoom().unwrap();
    assert_eq!(controller.logical_zoom(), Ok(1.0));
    assert_eq!(controller.configuration().default_zoom_factor(), 1.0);
}

#[test]
fn scale_notifications_report_logical_zoom() {
    let mut controller = laid_out(3, configuration().with_fit_policy(FitPolicy::Height));
    controller.surface_mut().pinch_to(2.0);
    controller.pump();
    assert_eq!(controller.take_events(), vec![Event::ZoomChanged { zoom: 2.0 }]);
}

#[test]
fn resize_keeps_logical_zoom() {
    let mut controller = laid_out(3, configuration());
    controller.set_logical_zoom(2.0, false).unwrap();
    controller.surface_mut().clear_calls();

    controller.on_layout(PORTRAIT).unwrap();
    // portrait viewport fits the width: 600 / 400
    assert_eq!(
        controller.surface().calls(),
        &[
            SurfaceCall::SetBounds { min: 0.75, max: 6.0 },
            SurfaceCall::SetScale {
                scale: 3.0,
                animated: false
            },
        ]
    );
    assert_eq!(controller.logical_zoom(), Ok(2.0));

    controller.surface_mut().clear_calls();
    controller.on_layout(PORTRAIT).unwrap();
    assert!(controller.surface().calls().is_empty());
}

#[test]
fn configuration_before_layout_waits_for_geometry() {
    let mut controller = attach(3, configuration());
    controller
        .update_configuration(configuration().with_fit_policy(FitPolicy::Width))
        .unwrap();
    assert_eq!(controller.configuration().fit_policy(), FitPolicy::Both);

    controller.on_layout(LANDSCAPE).unwrap();
    assert_eq!(controller.configuration().fit_policy(), FitPolicy::Width);
    assert!(controller
        .surface()
        .calls()
        .contains(&SurfaceCall::SetScale {
            scale: 2.0,
            animated: false
        }));
}

#[test]
fn configuration_updates_only_touch_changed_concerns() {
    let base = configuration();
    let mut controller = laid_out(3, base.clone());

    controller
        .update_configuration(base.clone().with_scrollbar(false))
        .unwrap();
    assert_eq!(controller.surface().calls(), &[SurfaceCall::Scrollbar(false)]);

    controller.surface_mut().clear_calls();
    let night = base.clone().with_scrollbar(false).with_night_mode(true);
    controller.update_configuration(night.clone()).unwrap();
    assert_eq!(
        controller.surface().calls(),
        &[SurfaceCall::Appearance(night.appearance())]
    );

    controller.surface_mut().clear_calls();
    let height = night.clone().with_fit_policy(FitPolicy::Height);
    controller.update_configuration(height).unwrap();
    assert_eq!(
        controller.surface().calls(),
        &[
            SurfaceCall::SetBounds { min: 0.5, max: 4.0 },
            SurfaceCall::SetScale {
                scale: 1.0,
                animated: false
            },
        ]
    );

    controller.surface_mut().clear_calls();
    controller
        .update_configuration(night.with_fit_policy(FitPolicy::Height))
        .unwrap();
    assert!(controller.surface().calls().is_empty());
}

#[test]
fn new_source_reloads_the_document() {
    let mut controller = laid_out(3, configuration());
    controller
        .update_configuration(
            configuration().with_source(DocumentSource::Bytes(vec![b'%', b'P', b'D', b'F'].into())),
        )
        .unwrap();

    let calls = controller.surface().calls();
    assert_eq!(calls[0], SurfaceCall::Load { default_page: 0 });
    assert!(controller.is_initialized());
    assert_eq!(controller.take_events(), vec![Event::Render { pages: 3 }]);
}

#[test]
fn source_change_before_first_layout_reopens_the_document() {
    let mut controller = attach(3, configuration());
    let other = configuration().with_source(DocumentSource::File("other.pdf".into()));
    controller.update_configuration(other.clone()).unwrap();
    controller.on_layout(LANDSCAPE).unwrap();

    assert_eq!(controller.configuration().source(), other.source());
    let loads = controller
        .surface()
        .calls()
        .iter()
        .filter(|call| matches!(call, SurfaceCall::Load { .. }))
        .count();
    assert_eq!(loads, 2);
    assert!(controller.is_initialized());
}

#[test]
fn corrected_source_recovers_a_failed_view() {
    let mut controller =
        ViewportController::attach(RecordingSurface::failing("not a PDF"), configuration());
    controller.on_layout(LANDSCAPE).unwrap();
    controller.take_events();
    assert!(!controller.has_document());

    controller.surface_mut().accept_loads(4, PAGE);
    controller
        .update_configuration(configuration().with_source(DocumentSource::File("fixed.pdf".into())))
        .unwrap();

    assert!(controller.has_document());
    assert!(controller.is_initialized());
    assert_eq!(controller.take_events(), vec![Event::Render { pages: 4 }]);
    assert_eq!(controller.page_count(), Some(4));
}

#[test]
fn orientation_flip_reloads_at_current_page() {
    let mut controller = laid_out(10, configuration());
    controller.surface_mut().emit_page(6);
    assert_eq!(page_events(&mut controller), vec![6]);

    assert_eq!(
        controller.handle_orientation_changed(Orientation::Landscape, configuration()),
        Ok(false)
    );
    assert_eq!(
        controller.handle_orientation_changed(Orientation::Landscape, configuration()),
        Ok(false)
    );
    assert!(controller.surface().calls().is_empty());

    let rotated = configuration().with_background_color(Rgb { r: 0, g: 0, b: 0 });
    assert_eq!(
        controller.handle_orientation_changed(Orientation::Portrait, rotated),
        Ok(true)
    );
    assert_eq!(controller.surface().calls(), &[SurfaceCall::Load { default_page: 6 }]);
    assert!(!controller.is_initialized());
    assert_eq!(controller.set_logical_zoom(1.0, false), Err(ViewError::NotInitialized));

    controller.on_layout(PORTRAIT).unwrap();
    assert_eq!(controller.surface().navigations(), vec![(6, false)]);

    // the reloaded view reports the page the host already knows
    controller.surface_mut().emit_page(6);
    assert_eq!(page_events(&mut controller), Vec::<usize>::new());
}

#[test]
fn broken_document_degrades_quietly() {
    let mut controller =
        ViewportController::attach(RecordingSurface::failing("not a PDF"), configuration());
    assert_eq!(
        controller.take_events(),
        vec![Event::Error {
            error: "invalid document: not a PDF".to_string()
        }]
    );

    controller.on_layout(LANDSCAPE).unwrap();
    assert!(!controller.is_initialized());
    assert!(!controller.request_page(0, false));
    assert_eq!(controller.logical_zoom(), Err(ViewError::NotInitialized));
    assert_eq!(controller.page_count(), None);
    assert!(controller.take_events().is_empty());
}

#[test]
fn taps_links_and_page_errors() {
    let mut controller = laid_out(3, configuration());
    let surface = controller.surface_mut();
    surface.notify(SurfaceNotification::Tap);
    surface.notify(SurfaceNotification::LinkActivated {
        url: "https://example.org".into(),
    });
    surface.notify(SurfaceNotification::PageError {
        page: 1,
        error: "bad stream".into(),
    });
    controller.pump();

    assert_eq!(
        controller.take_events(),
        vec![
            Event::Tap,
            Event::PageError {
                page: 1,
                error: "bad stream".into()
            },
        ]
    );
    assert_eq!(
        controller.surface().calls(),
        &[SurfaceCall::OpenExternal("https://example.org".into())]
    );

    let mut intercepting = laid_out(3, configuration().with_link_handle(true));
    intercepting
        .surface_mut()
        .notify(SurfaceNotification::LinkActivated {
            url: "https://example.org".into(),
        });
    intercepting.pump();
    assert_eq!(
        intercepting.take_events(),
        vec![Event::LinkHandle {
            url: "https://example.org".into()
        }]
    );
    assert!(intercepting.surface().calls().is_empty());
}
