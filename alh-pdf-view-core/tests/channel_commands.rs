use alh_pdf_view::testing::RecordingSurface;
use alh_pdf_view::{ChannelRouter, Configuration, FitPolicy, OutboundMessage, Size};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;

fn creation_params() -> Value {
    json!({
        "filePath": "/data/user/0/app/cache/manual.pdf",
        "fitPolicy": "FitPolicy.both",
        "swipeHorizontal": false,
        "pageFling": true,
        "pageSnap": true,
        "enableSwipe": true,
        "enableDoubleTap": true,
        "defaultPage": 1,
        "defaultZoomFactor": 1.0,
        "minZoom": 0.5,
        "maxZoom": 4.0,
        "password": "",
        "backgroundColor": 0xFFFFFFFFu32,
        "spacing": 0,
        "nightMode": false,
        "showScrollbar": true
    })
}

fn router() -> ChannelRouter<RecordingSurface> {
    let mut router = ChannelRouter::new();
    router
        .create(
            7,
            RecordingSurface::new(12, Size::new(400.0, 600.0)),
            &creation_params(),
        )
        .unwrap();
    router
}

fn methods(messages: &[OutboundMessage]) -> Vec<&'static str> {
    messages.iter().map(|message| message.method).collect()
}

#[test]
fn zoom_commands_wait_for_first_layout() {
    let mut router = router();

    let reply = router.handle("alh_pdf_view_7", "pageCount", &Value::Null).unwrap();
    assert_eq!(reply, json!(12));

    let err = router
        .handle("alh_pdf_view_7", "currentZoom", &Value::Null)
        .unwrap_err();
    assert_eq!(err.code(), "NOT_INITIALIZED");

    router.get_mut(7).unwrap().on_layout(Size::new(800.0, 600.0));
    let outbound = router.take_outbound();
    assert_eq!(methods(&outbound), vec!["onRender"]);
    assert_eq!(outbound[0].channel, "alh_pdf_view_7");
    assert_eq!(outbound[0].arguments, json!({ "pages": 12 }));

    let reply = router.handle("alh_pdf_view_7", "currentZoom", &Value::Null).unwrap();
    assert_eq!(reply, json!(1.0));

    router
        .handle("alh_pdf_view_7", "setZoom", &json!({ "newZoom": 2.0 }))
        .unwrap();
    let reply = router.handle("alh_pdf_view_7", "currentZoom", &Value::Null).unwrap();
    assert_eq!(reply, json!(2.0));

    router.handle("alh_pdf_view_7", "resetZoom", &Value::Null).unwrap();
    let reply = router.handle("alh_pdf_view_7", "currentZoom", &Value::Null).unwrap();
    assert_eq!(reply, json!(1.0));
}

#[test]
fn page_commands_reply_with_booleans() {
    let mut router = router();
    router.get_mut(7).unwrap().on_layout(Size::new(800.0, 600.0));
    router.take_outbound();

    let reply = router
        .handle("alh_pdf_view_7", "setPage", &json!({ "page": 12, "withAnimation": true }))
        .unwrap();
    assert_eq!(reply, json!(false));

    let reply = router
        .handle("alh_pdf_view_7", "setPage", &json!({ "page": 4, "withAnimation": false }))
        .unwrap();
    assert_eq!(reply, json!(true));
    assert_eq!(
        router.handle("alh_pdf_view_7", "currentPage", &Value::Null).unwrap(),
        json!(4)
    );

    let reply = router
        .handle("alh_pdf_view_7", "nextPage", &json!({ "withAnimation": true }))
        .unwrap();
    assert_eq!(reply, json!(true));

    let size = router.handle("alh_pdf_view_7", "pageSize", &Value::Null).unwrap();
    assert_eq!(size, json!({ "width": 400.0, "height": 600.0 }));

    let width = router.handle("alh_pdf_view_7", "pageWidth", &Value::Null).unwrap();
    assert_eq!(width, json!(800.0));
}

#[test]
fn page_changes_are_encoded_on_the_view_channel() {
    let mut router = router();
    let view = router.get_mut(7).unwrap();
    view.on_layout(Size::new(800.0, 600.0));
    view.controller_mut().surface_mut().emit_page(1);
    view.pump();

    let outbound = router.take_outbound();
    assert_eq!(methods(&outbound), vec!["onRender", "onPageChanged"]);
    assert_eq!(outbound[1].arguments, json!({ "page": 1, "total": 12 }));
}

#[test]
fn internal_channel_updates_configuration() {
    let mut router = router();
    router.get_mut(7).unwrap().on_layout(Size::new(800.0, 600.0));

    let mut params = creation_params();
    params["fitPolicy"] = json!("FitPolicy.width");
    router
        .handle("alh_pdf_7", "updateCreationParams", &params)
        .unwrap();

    let view = router.get_mut(7).unwrap();
    assert_eq!(view.controller().configuration().fit_policy(), FitPolicy::Width);
    assert_eq!(view.controller().logical_zoom(), Ok(1.0));
}

#[test]
fn orientation_commands_need_a_known_orientation() {
    let mut router = router();
    let mut params = creation_params();
    params["orientation"] = json!("Orientation.portrait");
    assert_eq!(
        router.handle("alh_pdf_7", "setOrientation", &params).unwrap(),
        Value::Null
    );

    params["orientation"] = json!("sideways");
    let err = router.handle("alh_pdf_7", "setOrientation", &params).unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENTS");
}

#[test]
fn unknown_methods_and_views() {
    let mut router = router();
    let err = router.handle("alh_pdf_view_7", "print", &Value::Null).unwrap_err();
    assert_eq!(err.code(), "NOT_IMPLEMENTED");

    let err = router.handle("alh_pdf_view_8", "pageCount", &Value::Null).unwrap_err();
    assert_eq!(err.code(), "NOT_IMPLEMENTED");
}

#[test]
fn dispose_drops_the_view() {
    let mut router = router();
    assert_eq!(
        router.handle("alh_pdf_view_7", "dispose", &Value::Null).unwrap(),
        json!(true)
    );
    assert!(router.is_empty());
}

#[test]
fn creation_params_from_a_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", creation_params()).unwrap();

    let config = Configuration::from_path(file.path()).unwrap();
    assert_eq!(config.default_page(), 1);
    assert_eq!(config.fit_policy(), FitPolicy::Both);
}
