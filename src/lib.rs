//! Animation core for the portfolio page: cursor trail, starfield and matrix
//! rain background, theme transitions and the audio bar visualizer.
//!
//! Everything outside the wasm32 glue is platform-free and driven through three
//! seams: [`FrameClock`] for frame callbacks, [`Surface`] for canvas drawing
//! and [`AudioPort`] for the music element. Host tests plug in
//! [`ManualClock`] and [`RecordingSurface`].

pub mod background;
pub mod config;
pub mod error;
pub mod input;
pub mod particle;
pub mod scheduler;
pub mod sfx;
pub mod stage;
pub mod state;
pub mod surface;
pub mod theme;
pub mod transition;
pub mod visualizer;

pub use background::{BackgroundField, MatrixRain, Starfield};
pub use config::{AudioConfig, BeatPolicy, FxConfig};
pub use error::{FxError, Result};
pub use input::{KeyAction, SharedPointerState, TypedBuffer};
pub use particle::{Particle, ParticleSet, TrailLayer};
pub use scheduler::{FrameClock, FrameHandle, FrameScheduler, ManualClock, TaskId};
pub use stage::{AudioPort, Effect, Layers, Stage};
pub use state::AppState;
pub use surface::{DrawCmd, RecordingSurface, Surface, Viewport};
pub use theme::{Rgb, Rgba, Theme};
pub use transition::TransitionEffect;
pub use visualizer::{AudioVisualizer, BarStyle, BeatDetector};

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;

    mod audio;
    mod events;
    mod render;

    /// Module entry point. A page missing its canvases keeps working, just
    /// without the effects.
    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        if let Err(e) = boot() {
            log::warn!("effects disabled: {e:?}");
        }
    }

    /// Finds the layers and wires the page listeners.
    pub fn boot() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        events::boot(&window, &document)?;
        Ok(())
    }

    /// Selects a theme by name, e.g. from an inline `onclick`.
    #[wasm_bindgen(js_name = setTheme)]
    pub fn set_theme(name: &str) -> Result<(), JsValue> {
        let theme = name
            .parse::<crate::Theme>()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        events::with_page(|page| page.stage.set_theme(theme));
        Ok(())
    }

    /// Dismisses the landing overlay, warps in the content and tries to start the music.
    #[wasm_bindgen(js_name = enterSite)]
    pub fn enter_site() {
        events::enter_site();
    }

    #[wasm_bindgen(js_name = toggleMusic)]
    pub fn toggle_music() {
        events::with_page(|page| {
            page.toggle_music();
            Ok(())
        });
    }
}
