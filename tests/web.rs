#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, KeyboardEventInit};

wasm_bindgen_test_configure!(run_in_browser);

fn add_element(document: &Document, tag: &str, id: &str) -> web_sys::Element {
    let el = document.create_element(tag).unwrap();
    el.set_id(id);
    document.body().unwrap().append_child(&el).unwrap();
    el
}

async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn press(document: &Document, key: &str) {
    let init = KeyboardEventInit::new();
    init.set_key(key);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    document.dispatch_event(&event).unwrap();
}

#[wasm_bindgen_test(async)]
async fn page_boots_switches_themes_and_closes_the_modal() {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    for id in ["trail-canvas", "starfield", "transition-canvas"] {
        add_element(&document, "canvas", id);
    }
    let overlay = add_element(&document, "div", "tosOverlay");
    let modal = add_element(&document, "div", "tosModal");
    overlay.class_list().add_1("active").unwrap();
    modal.class_list().add_1("active").unwrap();

    portfolio_fx::wasm::boot().expect("boot with all layers present");

    let starfield: HtmlCanvasElement = document
        .get_element_by_id("starfield")
        .unwrap()
        .dyn_into()
        .unwrap();
    let css_width = window.inner_width().unwrap().as_f64().unwrap();
    let expected = (css_width * window.device_pixel_ratio()) as u32;
    assert_eq!(starfield.width(), expected);

    portfolio_fx::wasm::set_theme("matrix").unwrap();
    let body = document.body().unwrap();
    assert_eq!(body.get_attribute("data-theme").as_deref(), Some("matrix"));
    assert!(portfolio_fx::wasm::set_theme("sepia").is_err());
    assert_eq!(body.get_attribute("data-theme").as_deref(), Some("matrix"));

    press(&document, "Escape");
    assert!(!modal.class_list().contains("active"));
    assert!(overlay.class_list().contains("active"));
    sleep_ms(700).await;
    assert!(!overlay.class_list().contains("active"));
}
