//! One-shot overlay bursts fired on theme changes and by the "void" phrase.

use std::f64::consts::TAU;

use rand::Rng;

use crate::surface::{Surface, Viewport};
use crate::theme::{Rgb, Theme};

pub const DEFAULT_FALL_COUNT: usize = 120;
pub const MATRIX_FALL_COUNT: usize = 80;
pub const VOID_COUNT: usize = 100;
pub const VOID_LIFE: u32 = 100;

const GRAVITY: f64 = 0.1;
const SPAWN_Y: f64 = -30.0;
const EXIT_MARGIN: f64 = 30.0;
const GLYPH_PX: f64 = 16.0;
const VOID_SPEED: f64 = 3.0;
const VOID_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FallingParticle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub glyph: Option<char>,
    pub color: Rgb,
}

impl FallingParticle {
    fn spawn(width: f64, glyphs: bool, color: Rgb, rng: &mut impl Rng) -> Self {
        let x = rng.gen::<f64>() * width;
        let vx = if glyphs {
            0.0
        } else {
            (rng.gen::<f64>() - 0.5) * 3.0
        };
        let vy = rng.gen_range(2.0..6.0);
        let (size, glyph) = if glyphs {
            let offset = rng.gen_range(0..96u32);
            (GLYPH_PX, char::from_u32(0x30A0 + offset))
        } else {
            (rng.gen_range(2.0..5.0), None)
        };
        Self {
            x,
            y: SPAWN_Y,
            vx,
            vy,
            size,
            glyph,
            color,
        }
    }

    fn advance(&mut self) {
        self.y += self.vy;
        self.x += self.vx;
        self.vy += GRAVITY;
    }

    fn draw(&self, surface: &mut impl Surface, height: f64) {
        let color = self.color.alpha(1.0 - self.y / height);
        match self.glyph {
            Some(glyph) => surface.glyph(glyph, self.x, self.y, self.size, color),
            None => surface.circle(self.x, self.y, self.size, color, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoidParticle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub life: u32,
}

/// Particle batch of the run currently in flight.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Batch {
    #[default]
    Idle,
    Fall(Vec<FallingParticle>),
    Void { color: Rgb, particles: Vec<VoidParticle> },
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Idle => 0,
            Batch::Fall(p) => p.len(),
            Batch::Void { particles, .. } => particles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overlay effect state. Each trigger replaces the batch wholesale and bumps
/// the generation, so a continuation booked for an older run can tell it has
/// been superseded.
#[derive(Debug, Clone, Default)]
pub struct TransitionEffect {
    batch: Batch,
    generation: u64,
}

impl TransitionEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn is_active(&self) -> bool {
        !self.batch.is_empty()
    }

    fn begin(&mut self, surface: &mut impl Surface, batch: Batch) -> u64 {
        self.generation += 1;
        self.batch = batch;
        surface.clear();
        surface.set_visible(true);
        self.generation
    }

    /// Drops the batch in flight and hides the overlay. Steps booked for it go stale.
    pub fn abort(&mut self, surface: &mut impl Surface) {
        self.generation += 1;
        self.batch = Batch::Idle;
        surface.clear();
        surface.set_visible(false);
    }

    /// Starts a falling burst for `theme`, discarding whatever was in flight.
    pub fn trigger(&mut self, theme: Theme, surface: &mut impl Surface, rng: &mut impl Rng) -> u64 {
        let glyphs = theme.is_matrix_like();
        let count = if glyphs {
            MATRIX_FALL_COUNT
        } else {
            DEFAULT_FALL_COUNT
        };
        let width = surface.viewport().width;
        let color = theme.rgb();
        let particles = (0..count)
            .map(|_| FallingParticle::spawn(width, glyphs, color, rng))
            .collect();
        log::debug!("transition #{} for {theme}: {count} particles", self.generation + 1);
        self.begin(surface, Batch::Fall(particles))
    }

    /// Starts the expanding ring from the centre of the overlay.
    pub fn trigger_void(&mut self, color: Rgb, surface: &mut impl Surface) -> u64 {
        let (cx, cy) = surface.viewport().center();
        let particles = (0..VOID_COUNT)
            .map(|i| {
                let angle = TAU * i as f64 / VOID_COUNT as f64;
                VoidParticle {
                    x: cx,
                    y: cy,
                    vx: angle.cos() * VOID_SPEED,
                    vy: angle.sin() * VOID_SPEED,
                    life: VOID_LIFE,
                }
            })
            .collect();
        self.begin(surface, Batch::Void { color, particles })
    }

    /// Advances and paints one tick of the run tagged `generation`.
    ///
    /// Returns `true` while another tick is wanted. A stale generation or an
    /// exhausted batch returns `false`; exhaustion also hides the overlay.
    pub fn step(&mut self, generation: u64, surface: &mut impl Surface) -> bool {
        if generation != self.generation {
            return false;
        }
        let Viewport { height, .. } = surface.viewport();
        surface.clear();
        match &mut self.batch {
            Batch::Idle => {}
            Batch::Fall(particles) => particles.retain_mut(|p| {
                p.advance();
                p.draw(surface, height);
                p.y <= height + EXIT_MARGIN
            }),
            Batch::Void { color, particles } => particles.retain_mut(|p| {
                p.x += p.vx;
                p.y += p.vy;
                p.life = p.life.saturating_sub(1);
                let alpha = f64::from(p.life) / f64::from(VOID_LIFE);
                surface.circle(p.x, p.y, VOID_RADIUS, color.alpha(alpha), None);
                p.life > 0
            }),
        }

        if self.batch.is_empty() {
            self.batch = Batch::Idle;
            surface.set_visible(false);
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCmd, RecordingSurface};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn overlay() -> RecordingSurface {
        RecordingSurface::new(Viewport::new(800.0, 600.0))
    }

    #[test]
    fn dark_uses_the_default_count() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        fx.trigger(Theme::Dark, &mut surface, &mut rng);
        assert_eq!(fx.batch().len(), DEFAULT_FALL_COUNT);
        let Batch::Fall(particles) = fx.batch() else {
            panic!("expected a falling batch");
        };
        assert!(particles.iter().all(|p| p.glyph.is_none() && p.y == -30.0));
        assert!(surface.is_visible());
    }

    #[test]
    fn matrix_uses_fewer_larger_glyphs() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        fx.trigger(Theme::Matrix, &mut surface, &mut rng);
        let Batch::Fall(particles) = fx.batch() else {
            panic!("expected a falling batch");
        };
        assert_eq!(particles.len(), MATRIX_FALL_COUNT);
        for p in particles {
            assert_eq!(p.size, 16.0);
            assert_eq!(p.vx, 0.0);
            let code = p.glyph.map(u32::from).unwrap();
            assert!((0x30A0..0x3100).contains(&code));
            assert_eq!(p.color, Rgb(0, 255, 65));
        }
    }

    #[test]
    fn runs_to_completion_then_hides() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        let generation = fx.trigger(Theme::Gold, &mut surface, &mut rng);

        let mut ticks = 0;
        while fx.step(generation, &mut surface) {
            ticks += 1;
            assert!(ticks < 1000, "transition never finished");
        }
        assert!(!fx.is_active());
        assert!(!surface.is_visible());
        assert_eq!(fx.batch(), &Batch::Idle);
    }

    #[test]
    fn retrigger_replaces_the_batch() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        let old = fx.trigger(Theme::Dark, &mut surface, &mut rng);
        for _ in 0..10 {
            fx.step(old, &mut surface);
        }
        let new = fx.trigger(Theme::Matrix, &mut surface, &mut rng);
        assert!(new > old);
        assert!(!fx.step(old, &mut surface));

        surface.take();
        assert!(fx.step(new, &mut surface));
        let cmds = surface.take();
        assert_eq!(cmds.iter().filter(|c| matches!(c, DrawCmd::Circle { .. })).count(), 0);
        assert_eq!(
            cmds.iter().filter(|c| matches!(c, DrawCmd::Glyph { .. })).count(),
            MATRIX_FALL_COUNT
        );
    }

    #[test]
    fn abort_hides_the_overlay_and_stales_the_run() {
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        let run = fx.trigger(Theme::Gold, &mut surface, &mut SmallRng::seed_from_u64(5));
        fx.abort(&mut surface);
        assert!(!fx.is_active());
        assert!(!surface.is_visible());
        assert!(!fx.step(run, &mut surface));
    }

    #[test]
    fn void_ring_fades_over_a_hundred_ticks() {
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        let generation = fx.trigger_void(Rgb(1, 2, 3), &mut surface);
        assert_eq!(fx.batch().len(), VOID_COUNT);

        let mut ticks = 1;
        while fx.step(generation, &mut surface) {
            ticks += 1;
        }
        assert_eq!(ticks, VOID_LIFE);
        assert!(!surface.is_visible());
    }

    #[test]
    fn void_particles_leave_the_centre_radially() {
        let mut surface = overlay();
        let mut fx = TransitionEffect::new();
        let generation = fx.trigger_void(Rgb::WHITE, &mut surface);
        fx.step(generation, &mut surface);
        let Batch::Void { particles, .. } = fx.batch() else {
            panic!("expected a void batch");
        };
        for p in particles {
            let r = ((p.x - 400.0).powi(2) + (p.y - 300.0).powi(2)).sqrt();
            assert!((r - 3.0).abs() < 1e-9);
            assert_eq!(p.life, 99);
        }
    }
}
