//! Persistent background layer: twinkling starfield or matrix code rain.

use rand::Rng;

use crate::surface::{Surface, Viewport};
use crate::theme::{Rgb, Theme};

const WARP_STAR_SPEED: f64 = 25.0;
const WARP_STREAK: (f64, f64) = (2.0, 40.0);
const TWINKLE: f64 = 0.01;

const RAIN_FADE: f64 = 0.05;
const RAIN_TRAIL: u32 = 5;
const RAIN_RESET_CHANCE: f64 = 0.025;
const RAIN_STEP: i32 = 1;
const RAIN_WARP_STEP: i32 = 12;

const MATRIX_GLYPHS: &str = "アァカサタナハマヤャラワガザダバパイィキシチニヒミリヰギジヂビピウゥクスツヌフムユュルグズブヅプエェケセテネヘメレヱゲゼデベペオォコソトノホモヨョロヲゴゾドボポヴッンABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#$%^&*()_+-=[]{}|;:\",./<>?";

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
    pub opacity: f64,
    /// Times this star has been recycled.
    pub resets: u32,
}

impl Star {
    fn scattered(viewport: Viewport, rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen::<f64>() * viewport.width,
            y: rng.gen::<f64>() * viewport.height,
            size: rng.gen::<f64>() * 1.5,
            speed: rng.gen_range(0.1..0.4),
            opacity: rng.gen(),
            resets: 0,
        }
    }

    fn recycle(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        self.x = rng.gen::<f64>() * viewport.width;
        self.y = viewport.height;
        self.opacity = rng.gen();
        self.resets += 1;
    }

    pub fn update(&mut self, viewport: Viewport, warping: bool, rng: &mut impl Rng) {
        self.y -= if warping { WARP_STAR_SPEED } else { self.speed };
        if self.y < 0.0 {
            self.recycle(viewport, rng);
        }
        self.opacity = (self.opacity + rng.gen_range(-TWINKLE..TWINKLE)).clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone)]
pub struct Starfield {
    stars: Vec<Star>,
    count: usize,
}

impl Starfield {
    pub fn new(count: usize, viewport: Viewport, rng: &mut impl Rng) -> Self {
        let mut field = Self {
            stars: Vec::with_capacity(count),
            count,
        };
        field.reseed(viewport, rng);
        field
    }

    pub fn reseed(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        self.stars.clear();
        self.stars
            .extend((0..self.count).map(|_| Star::scattered(viewport, rng)));
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn render(
        &mut self,
        surface: &mut impl Surface,
        theme: Theme,
        warping: bool,
        rng: &mut impl Rng,
    ) {
        let viewport = surface.viewport();
        let rgb = theme.star_rgb();
        surface.clear();
        for star in &mut self.stars {
            star.update(viewport, warping, rng);
            let color = rgb.alpha(star.opacity);
            if warping {
                surface.rect(star.x, star.y, WARP_STREAK.0, WARP_STREAK.1, color);
            } else {
                surface.circle(star.x, star.y, star.size, color, None);
            }
        }
    }
}

/// Glyph cell edge in CSS pixels for a layer of the given width.
pub fn rain_cell(width: f64) -> f64 {
    if width < 600.0 {
        12.0
    } else {
        14.0
    }
}

#[derive(Debug, Clone)]
pub struct MatrixRain {
    glyphs: Vec<char>,
    drops: Vec<i32>,
    cell: f64,
}

impl MatrixRain {
    pub fn new(viewport: Viewport, rng: &mut impl Rng) -> Self {
        let mut rain = Self {
            glyphs: MATRIX_GLYPHS.chars().collect(),
            drops: Vec::new(),
            cell: rain_cell(viewport.width),
        };
        rain.reseed(viewport, rng);
        rain
    }

    /// Recomputes the columns for `viewport` and scatters their drops above the top.
    pub fn reseed(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        self.cell = rain_cell(viewport.width);
        let columns = (viewport.width / self.cell).floor().max(0.0) as usize;
        self.drops.clear();
        self.drops.extend((0..columns).map(|_| -rng.gen_range(0..100i32)));
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    pub fn drops(&self) -> &[i32] {
        &self.drops
    }

    pub fn cell(&self) -> f64 {
        self.cell
    }

    pub fn render(
        &mut self,
        surface: &mut impl Surface,
        theme: Theme,
        warping: bool,
        rng: &mut impl Rng,
    ) {
        let height = surface.viewport().height;
        let head = theme.rain_rgb().alpha(1.0);
        let trail_rgb: Rgb = theme.rain_rgb();
        let step = if warping { RAIN_WARP_STEP } else { RAIN_STEP };

        surface.fade(RAIN_FADE);
        for (column, drop) in self.drops.iter_mut().enumerate() {
            let glyph = self.glyphs[rng.gen_range(0..self.glyphs.len())];
            let x = column as f64 * self.cell;
            let y = f64::from(*drop) * self.cell;
            surface.glyph(glyph, x, y, self.cell, head);

            for j in 1..RAIN_TRAIL {
                let ty = y - f64::from(j) * self.cell;
                if ty <= 0.0 {
                    break;
                }
                let alpha = 0.12 - f64::from(j) * 0.02;
                if alpha <= 0.0 {
                    break;
                }
                surface.glyph(glyph, x, ty, self.cell, trail_rgb.alpha(alpha));
            }

            *drop += step;
            if f64::from(*drop) * self.cell > height && rng.gen_bool(RAIN_RESET_CHANCE) {
                *drop = 0;
            }
        }
    }
}

/// The background canvas. Which half renders is decided by the theme every tick.
#[derive(Debug, Clone)]
pub struct BackgroundField {
    pub stars: Starfield,
    pub rain: MatrixRain,
}

impl BackgroundField {
    pub fn new(star_count: usize, viewport: Viewport, rng: &mut impl Rng) -> Self {
        Self {
            stars: Starfield::new(star_count, viewport, rng),
            rain: MatrixRain::new(viewport, rng),
        }
    }

    pub fn resize(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        self.stars.reseed(viewport, rng);
        self.rain.reseed(viewport, rng);
    }

    pub fn render(
        &mut self,
        surface: &mut impl Surface,
        theme: Theme,
        warping: bool,
        rng: &mut impl Rng,
    ) {
        if theme.is_matrix_like() {
            self.rain.render(surface, theme, warping, rng);
        } else {
            self.stars.render(surface, theme, warping, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCmd, RecordingSurface};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup(width: f64, height: f64) -> (RecordingSurface, SmallRng) {
        (
            RecordingSurface::new(Viewport::new(width, height)),
            SmallRng::seed_from_u64(3),
        )
    }

    #[test]
    fn every_star_resets_and_opacity_stays_in_range() {
        let (mut surface, mut rng) = setup(320.0, 240.0);
        let mut field = Starfield::new(40, surface.viewport(), &mut rng);
        // slowest star moves 0.1 px per tick
        let ticks = (240.0 / 0.1) as usize + 10;
        for _ in 0..ticks {
            field.render(&mut surface, Theme::Dark, false, &mut rng);
            surface.take();
            assert!(field
                .stars()
                .iter()
                .all(|s| (0.0..=1.0).contains(&s.opacity)));
        }
        assert!(field.stars().iter().all(|s| s.resets >= 1));
    }

    #[test]
    fn recycled_stars_enter_from_the_bottom() {
        let (surface, mut rng) = setup(100.0, 50.0);
        let mut star = Star::scattered(surface.viewport(), &mut rng);
        star.y = 0.05;
        star.speed = 0.1;
        star.update(surface.viewport(), false, &mut rng);
        assert_eq!(star.resets, 1);
        assert_eq!(star.y, 50.0);
    }

    #[test]
    fn warp_draws_streaks() {
        let (mut surface, mut rng) = setup(200.0, 200.0);
        let mut field = Starfield::new(5, surface.viewport(), &mut rng);
        field.render(&mut surface, Theme::Gold, true, &mut rng);
        let cmds = surface.take();
        assert_eq!(cmds[0], DrawCmd::Clear);
        assert_eq!(
            cmds.iter()
                .filter(|c| matches!(c, DrawCmd::Rect { width, height, .. } if *width == 2.0 && *height == 40.0))
                .count(),
            5
        );
    }

    #[test]
    fn star_colour_follows_theme() {
        let (mut surface, mut rng) = setup(200.0, 200.0);
        let mut field = Starfield::new(3, surface.viewport(), &mut rng);
        field.render(&mut surface, Theme::Light, false, &mut rng);
        assert!(surface
            .commands()
            .iter()
            .all(|c| !matches!(c, DrawCmd::Circle { color, .. } if color.rgb != Rgb::BLACK)));
    }

    #[test]
    fn column_count_tracks_width() {
        let mut rng = SmallRng::seed_from_u64(1);
        let wide = MatrixRain::new(Viewport::new(1400.0, 800.0), &mut rng);
        assert_eq!(wide.cell(), 14.0);
        assert_eq!(wide.columns(), 100);
        assert!(wide.drops().iter().all(|d| (-99..=0).contains(d)));

        let narrow = MatrixRain::new(Viewport::new(360.0, 800.0), &mut rng);
        assert_eq!(narrow.cell(), 12.0);
        assert_eq!(narrow.columns(), 30);
    }

    #[test]
    fn rain_fades_instead_of_clearing() {
        let (mut surface, mut rng) = setup(700.0, 300.0);
        let mut bg = BackgroundField::new(10, surface.viewport(), &mut rng);
        bg.render(&mut surface, Theme::Matrix, false, &mut rng);
        let cmds = surface.take();
        assert_eq!(cmds[0], DrawCmd::Fade(0.05));
        assert!(!cmds.contains(&DrawCmd::Clear));
        assert!(cmds.iter().skip(1).all(|c| matches!(c, DrawCmd::Glyph { .. })));
    }

    #[test]
    fn trail_repeats_the_head_glyph_with_falling_alpha() {
        let (mut surface, mut rng) = setup(14.0, 1000.0);
        let mut rain = MatrixRain::new(surface.viewport(), &mut rng);
        rain.drops = vec![20];
        rain.render(&mut surface, Theme::Christmas, false, &mut rng);

        let glyphs: Vec<_> = surface
            .take()
            .into_iter()
            .filter_map(|c| match c {
                DrawCmd::Glyph { glyph, y, color, .. } => Some((glyph, y, color)),
                _ => None,
            })
            .collect();
        assert_eq!(glyphs.len(), 5);
        assert_eq!(glyphs[0].2, Rgb(255, 51, 102).alpha(1.0));
        assert!(glyphs.iter().all(|g| g.0 == glyphs[0].0));
        let alphas: Vec<_> = glyphs.iter().skip(1).map(|g| g.2.alpha).collect();
        for (got, want) in alphas.iter().zip([0.10, 0.08, 0.06, 0.04]) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(rain.drops(), &[21]);
    }

    #[test]
    fn drops_past_the_bottom_eventually_restart() {
        let (mut surface, mut rng) = setup(14.0, 140.0);
        let mut rain = MatrixRain::new(surface.viewport(), &mut rng);
        rain.drops = vec![11];
        let restarted = (0..2000).any(|_| {
            rain.render(&mut surface, Theme::Matrix, false, &mut rng);
            surface.take();
            rain.drops()[0] == 0
        });
        assert!(restarted);
    }

    #[test]
    fn warp_accelerates_rain() {
        let (mut surface, mut rng) = setup(14.0, 10_000.0);
        let mut rain = MatrixRain::new(surface.viewport(), &mut rng);
        rain.drops = vec![0];
        rain.render(&mut surface, Theme::Matrix, true, &mut rng);
        assert_eq!(rain.drops(), &[12]);
    }
}
