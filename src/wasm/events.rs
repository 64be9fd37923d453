use std::cell::RefCell;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, EventTarget, HtmlElement, KeyboardEvent, MouseEvent, Window};

use super::audio::WebAudio;
use super::render::{window_viewport, CanvasLayer, RafClock};
use crate::config::FxConfig;
use crate::input::KeyAction;
use crate::scheduler::TaskId;
use crate::sfx::Sound;
use crate::stage::{AudioPort, Effect, Layers, Stage};
use crate::Result;

type WebStage = Stage<RafClock, CanvasLayer, WebAudio>;

const PLAY_ICON: &str = "ph-fill ph-play-circle";
const PAUSE_ICON: &str = "ph-fill ph-pause-circle";
/// Time the modal's close animation gets before the overlay goes.
const MODAL_CLOSE_MS: i32 = 600;

thread_local! {
    static PAGE: RefCell<Option<Page>> = RefCell::new(None);
}

/// Elements the glue touches besides the canvases. All optional: a page
/// without a cursor outline simply does not get one.
struct Dom {
    window: Window,
    body: Option<HtmlElement>,
    theme_icon: Option<Element>,
    music_icon: Option<Element>,
    cursor_dot: Option<HtmlElement>,
    cursor_outline: Option<HtmlElement>,
    main_container: Option<Element>,
    overlay: Option<HtmlElement>,
}

impl Dom {
    fn find(window: &Window, document: &Document) -> Self {
        let html = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        };
        let query = |sel: &str| document.query_selector(sel).ok().flatten();
        let query_html = |sel: &str| query(sel).and_then(|el| el.dyn_into::<HtmlElement>().ok());
        Self {
            window: window.clone(),
            body: document.body(),
            theme_icon: document.get_element_by_id("themeIcon"),
            music_icon: query(".music-player i"),
            cursor_dot: query_html(".cursor-dot"),
            cursor_outline: query_html(".cursor-outline"),
            main_container: document.get_element_by_id("mainContainer"),
            overlay: html("overlay"),
        }
    }

    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_default()
    }

    fn place(el: &Option<HtmlElement>, (x, y): (f64, f64)) {
        if let Some(el) = el {
            let style = el.style();
            style.set_property("left", &format!("{x}px")).ok();
            style.set_property("top", &format!("{y}px")).ok();
        }
    }

    fn set_music_icon(&self, class: &str) {
        if let Some(icon) = &self.music_icon {
            icon.set_class_name(class);
        }
    }
}

pub(super) struct Page {
    pub(super) stage: WebStage,
    dom: Dom,
}

impl Page {
    fn apply_effects(&mut self) {
        for effect in self.stage.drain_effects() {
            match effect {
                Effect::ThemeApplied(theme) => {
                    if let Some(body) = &self.dom.body {
                        body.set_attribute("data-theme", theme.name()).ok();
                    }
                    if let Some(icon) = &self.dom.theme_icon {
                        icon.set_class_name(&format!("ph-fill {}", theme.icon()));
                    }
                }
                Effect::Sound(sound) => self.stage.audio().play_sound(sound),
                Effect::ToggleAudio => self.toggle_music(),
                Effect::CloseModal => close_modal(&self.dom),
                Effect::AudioStopped => self.dom.set_music_icon(PLAY_ICON),
                Effect::Revealed => {
                    if let Some(main) = &self.dom.main_container {
                        main.class_list().add_1("visible").ok();
                    }
                }
            }
        }
    }

    pub(super) fn toggle_music(&mut self) {
        self.stage.audio().resume();
        if self.stage.audio().is_playing() {
            self.stage.audio().pause();
            self.stage.audio_paused();
            self.dom.set_music_icon(PLAY_ICON);
        } else {
            self.play_music();
        }
    }

    fn play_music(&self) {
        let Some(element) = self.stage.audio().element() else {
            return;
        };
        let promise = match element.play() {
            Ok(promise) => promise,
            Err(e) => {
                log::warn!("play() threw: {e:?}");
                return;
            }
        };
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => {
                    with_page(|page| {
                        page.dom.set_music_icon(PAUSE_ICON);
                        page.stage.audio_started()
                    });
                }
                Err(e) => {
                    log::warn!("autoplay blocked, waiting for interaction: {e:?}");
                    with_page(|page| {
                        page.dom.set_music_icon(PLAY_ICON);
                        Ok(())
                    });
                }
            }
        });
    }
}

/// Runs `f` against the page, then applies whatever effects it queued.
/// Re-entrant calls are dropped rather than panicking on the borrow.
pub(super) fn with_page<R>(f: impl FnOnce(&mut Page) -> Result<R>) -> Option<R> {
    PAGE.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            log::debug!("page busy; event dropped");
            return None;
        };
        let page = slot.as_mut()?;
        let out = f(page)
            .map_err(|e| log::warn!("{e}"))
            .ok();
        page.apply_effects();
        out
    })
}

fn dispatch_frame(task: TaskId, now: f64) {
    with_page(|page| {
        page.stage.on_frame(task, now)?;
        if task == TaskId::Cursor {
            Dom::place(&page.dom.cursor_outline, page.stage.state().pointer.cursor);
        }
        Ok(())
    });
}

fn load_config(document: &Document) -> FxConfig {
    let Some(json) = document
        .get_element_by_id("fx-config")
        .and_then(|el| el.text_content())
    else {
        return FxConfig::default();
    };
    FxConfig::from_json(&json).unwrap_or_else(|e| {
        log::warn!("ignoring #fx-config: {e}");
        FxConfig::default()
    })
}

pub(super) fn boot(window: &Window, document: &Document) -> Result<()> {
    let config = load_config(document);
    let layers = Layers {
        trail: CanvasLayer::find(document, "trail-canvas")?,
        background: CanvasLayer::find(document, "starfield")?,
        transition: CanvasLayer::find(document, "transition-canvas")?,
    };
    let audio = WebAudio::connect(document);
    let bar_count = audio.bar_count();
    let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let mut stage = Stage::new(
        config,
        RafClock::new(dispatch_frame)?,
        layers,
        audio,
        bar_count,
        seed,
    );
    stage.resize(window_viewport(window)?, window.device_pixel_ratio());
    stage.start()?;

    PAGE.with(|cell| {
        *cell.borrow_mut() = Some(Page {
            stage,
            dom: Dom::find(window, document),
        })
    });
    install_listeners(window, document)?;
    log::info!("portfolio fx ready");
    Ok(())
}

fn listen<E: JsCast + 'static>(
    target: &EventTarget,
    event: &str,
    mut handler: impl FnMut(E) + 'static,
) -> Result<()> {
    let closure = Closure::wrap(Box::new(move |e: JsValue| {
        if let Ok(e) = e.dyn_into::<E>() {
            handler(e);
        }
    }) as Box<dyn FnMut(JsValue)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn listen_all<E: JsCast + 'static>(
    document: &Document,
    selector: &str,
    event: &str,
    handler: fn(E),
) -> Result<()> {
    let nodes = document.query_selector_all(selector)?;
    for i in 0..nodes.length() {
        if let Some(node) = nodes.item(i) {
            listen(&node, event, handler)?;
        }
    }
    Ok(())
}

fn install_listeners(window: &Window, document: &Document) -> Result<()> {
    listen(window, "resize", |_: web_sys::Event| {
        with_page(|page| {
            let viewport = window_viewport(&page.dom.window)?;
            let ratio = page.dom.window.device_pixel_ratio();
            page.stage.resize(viewport, ratio);
            Ok(())
        });
    })?;

    listen(window, "mousemove", |e: MouseEvent| {
        let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
        with_page(|page| {
            Dom::place(&page.dom.cursor_dot, (x, y));
            page.stage.pointer_move(x, y);
            Ok(())
        });
    })?;

    listen(document, "keydown", |e: KeyboardEvent| {
        let action = with_page(|page| page.stage.key(&e.key()));
        if action == Some(KeyAction::ToggleAudio) {
            e.prevent_default();
        }
    })?;

    listen_all(document, ".hover-trigger", "mouseenter", |e: MouseEvent| {
        let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
        with_page(|page| {
            page.stage.hover(x, y);
            Ok(())
        });
    })?;
    listen_all(document, ".hover-trigger", "click", |e: MouseEvent| {
        let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
        with_page(|page| {
            page.stage.click(x, y);
            Ok(())
        });
    })?;
    listen_all(document, "[data-tooltip]", "mouseenter", |_: MouseEvent| {
        with_page(|page| {
            page.stage.audio().play_sound(Sound::Hover);
            Ok(())
        });
    })?;
    listen_all(document, "[data-tooltip]", "mousedown", |_: MouseEvent| {
        with_page(|page| {
            page.stage.audio().play_sound(Sound::Click);
            Ok(())
        });
    })?;
    listen_all(document, ".theme-toggle", "click", |_: MouseEvent| {
        with_page(|page| page.stage.toggle_theme());
    })?;
    listen_all(document, "#pfpClick", "click", |_: MouseEvent| {
        with_page(|page| page.stage.pfp_click());
    })?;
    listen_all(document, ".music-player", "click", |_: MouseEvent| {
        with_page(|page| {
            page.toggle_music();
            Ok(())
        });
    })?;
    Ok(())
}

fn close_modal(dom: &Dom) {
    let Some(document) = dom.window.document() else {
        return;
    };
    let Some(overlay) = document.get_element_by_id("tosOverlay") else {
        return;
    };
    if !overlay.class_list().contains("active") {
        return;
    }
    if let Some(modal) = document.get_element_by_id("tosModal") {
        modal.class_list().remove_1("active").ok();
    }
    let body = dom.body.clone();
    let hide_overlay = Closure::once_into_js(move || {
        overlay.class_list().remove_1("active").ok();
        if let Some(body) = body {
            body.style().set_property("overflow", "auto").ok();
        }
    });
    if let Err(e) = dom
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            hide_overlay.unchecked_ref(),
            MODAL_CLOSE_MS,
        )
    {
        log::warn!("modal close timer failed: {e:?}");
    }
}

pub(super) fn enter_site() {
    with_page(|page| {
        page.stage.audio().resume();
        let now = page.dom.now();
        page.stage.enter(now);
        if let Some(overlay) = &page.dom.overlay {
            overlay.style().set_property("opacity", "0").ok();
            overlay.style().set_property("pointer-events", "none").ok();
        }
        page.play_music();
        Ok(())
    });
}
