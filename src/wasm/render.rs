use std::f64::consts::TAU;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, CanvasRenderingContext2d, Document, HtmlCanvasElement, Window};

use crate::scheduler::{FrameClock, FrameHandle, TaskId};
use crate::surface::{Glow, Surface, Viewport};
use crate::theme::Rgba;
use crate::{FxError, Result};

const GLYPH_FONT: &str = "JetBrains Mono";

/// Current window size in CSS pixels.
pub fn window_viewport(window: &Window) -> Result<Viewport> {
    let width = window.inner_width()?.as_f64().ok_or("inner_width is not a number")?;
    let height = window.inner_height()?.as_f64().ok_or("inner_height is not a number")?;
    Ok(Viewport::new(width, height))
}

/// One full-viewport `<canvas>` with its 2D context.
pub struct CanvasLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
    font_px: Option<f64>,
}

impl CanvasLayer {
    pub fn find(document: &Document, id: &'static str) -> Result<Self> {
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| FxError::Dom(format!("canvas #{id} not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| FxError::Dom(format!("#{id} is not a canvas")))?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or(FxError::Canvas(id))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| FxError::Canvas(id))?;
        let viewport = Viewport::new(f64::from(canvas.width()), f64::from(canvas.height()));
        Ok(Self {
            canvas,
            ctx,
            viewport,
            font_px: None,
        })
    }

    fn set_fill(&self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_string());
    }
}

impl Surface for CanvasLayer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport, pixel_ratio: f64) {
        self.viewport = viewport;
        self.canvas.set_width((viewport.width * pixel_ratio) as u32);
        self.canvas.set_height((viewport.height * pixel_ratio) as u32);
        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", viewport.width))
            .ok();
        style
            .set_property("height", &format!("{}px", viewport.height))
            .ok();
        // resizing wipes the context state, font included
        self.ctx
            .set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0)
            .ok();
        self.font_px = None;
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
    }

    fn fade(&mut self, alpha: f64) {
        self.ctx.set_fill_style_str(&format!("rgba(0, 0, 0, {alpha})"));
        self.ctx
            .fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba, glow: Option<Glow>) {
        if let Some(glow) = glow {
            self.ctx.set_shadow_blur(glow.blur);
            self.ctx.set_shadow_color(&glow.color.to_string());
        }
        self.set_fill(color);
        self.ctx.begin_path();
        self.ctx.arc(x, y, radius.max(0.0), 0.0, TAU).ok();
        self.ctx.fill();
        if glow.is_some() {
            self.ctx.set_shadow_blur(0.0);
        }
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        self.set_fill(color);
        self.ctx.fill_rect(x, y, width, height);
    }

    fn glyph(&mut self, glyph: char, x: f64, y: f64, px: f64, color: Rgba) {
        if self.font_px != Some(px) {
            self.ctx.set_font(&format!("{px}px {GLYPH_FONT}"));
            self.font_px = Some(px);
        }
        self.set_fill(color);
        let mut buf = [0u8; 4];
        self.ctx.fill_text(glyph.encode_utf8(&mut buf), x, y).ok();
    }

    fn set_visible(&mut self, visible: bool) {
        self.canvas
            .style()
            .set_property("opacity", if visible { "1" } else { "0" })
            .ok();
    }
}

/// `requestAnimationFrame` behind [`FrameClock`].
///
/// Each task gets one long-lived closure; booking a frame hands that closure
/// to the browser again instead of allocating a new one.
pub struct RafClock {
    window: Window,
    callbacks: Vec<(TaskId, Closure<dyn FnMut(f64)>)>,
}

impl RafClock {
    pub fn new(dispatch: fn(TaskId, f64)) -> Result<Self> {
        let window = window().ok_or("no window")?;
        let callbacks = TaskId::ALL
            .into_iter()
            .map(|task| {
                let closure =
                    Closure::wrap(Box::new(move |now: f64| dispatch(task, now)) as Box<dyn FnMut(f64)>);
                (task, closure)
            })
            .collect();
        Ok(Self { window, callbacks })
    }
}

impl FrameClock for RafClock {
    fn request(&mut self, task: TaskId) -> Result<FrameHandle> {
        let (_, closure) = self
            .callbacks
            .iter()
            .find(|(t, _)| *t == task)
            .ok_or("no frame callback for task")?;
        let id = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())?;
        Ok(FrameHandle(id))
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.window.cancel_animation_frame(handle.0).ok();
    }
}
