//! Drawing seam between the animation core and a canvas layer.

use crate::theme::Rgba;

/// Layer size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Soft shadow drawn behind a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f64,
    pub color: Rgba,
}

/// The handful of 2D operations the effects need.
///
/// The web glue implements this over `CanvasRenderingContext2d`; tests use
/// [`RecordingSurface`].
pub trait Surface {
    fn viewport(&self) -> Viewport;
    fn resize(&mut self, viewport: Viewport, pixel_ratio: f64);
    /// Erase the whole layer.
    fn clear(&mut self);
    /// Cover the whole layer with translucent black.
    fn fade(&mut self, alpha: f64);
    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba, glow: Option<Glow>);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
    fn glyph(&mut self, glyph: char, x: f64, y: f64, px: f64, color: Rgba);
    /// Show or hide the layer element itself.
    fn set_visible(&mut self, visible: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear,
    Fade(f64),
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: Rgba,
        glow: Option<Glow>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgba,
    },
    Glyph {
        glyph: char,
        x: f64,
        y: f64,
        px: f64,
        color: Rgba,
    },
}

/// Headless surface that keeps every command issued since the last
/// [`RecordingSurface::take`].
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    viewport: Viewport,
    pixel_ratio: f64,
    visible: bool,
    commands: Vec<DrawCmd>,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pixel_ratio: 1.0,
            visible: true,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCmd> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn count(&self, pred: impl Fn(&DrawCmd) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport, pixel_ratio: f64) {
        self.viewport = viewport;
        self.pixel_ratio = pixel_ratio;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.push(DrawCmd::Clear);
    }

    fn fade(&mut self, alpha: f64) {
        self.commands.push(DrawCmd::Fade(alpha));
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba, glow: Option<Glow>) {
        self.commands.push(DrawCmd::Circle {
            x,
            y,
            radius,
            color,
            glow,
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        self.commands.push(DrawCmd::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn glyph(&mut self, glyph: char, x: f64, y: f64, px: f64, color: Rgba) {
        self.commands.push(DrawCmd::Glyph {
            glyph,
            x,
            y,
            px,
            color,
        });
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
