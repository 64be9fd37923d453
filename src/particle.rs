//! Decaying glow particles for the cursor trail and interaction bursts.

use rand::Rng;

use crate::surface::{Glow, Surface};
use crate::theme::Rgb;

const SIZE_DECAY: f64 = 0.95;
const GLOW_BLUR: f64 = 10.0;
const BURST_JITTER: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub age: u32,
    pub max_age: u32,
    pub color: Rgb,
}

impl Particle {
    pub fn spawn(x: f64, y: f64, color: Rgb, rng: &mut impl Rng) -> Self {
        Self {
            x,
            y,
            size: rng.gen_range(2.0..6.0),
            age: 0,
            max_age: rng.gen_range(20..40),
            color,
        }
    }

    pub fn update(&mut self) {
        self.age = self.age.saturating_add(1);
        self.size *= SIZE_DECAY;
    }

    pub fn opacity(&self) -> f64 {
        (1.0 - f64::from(self.age) / f64::from(self.max_age)).max(0.0)
    }

    pub fn is_dead(&self) -> bool {
        self.age >= self.max_age
    }

    pub fn draw(&self, surface: &mut impl Surface) {
        let opacity = self.opacity();
        surface.circle(
            self.x,
            self.y,
            self.size,
            self.color.alpha(opacity),
            Some(Glow {
                blur: GLOW_BLUR,
                color: self.color.alpha(opacity * 0.8),
            }),
        );
    }
}

/// Insertion-ordered particles of one category, optionally capped.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
    capacity: Option<usize>,
}

impl ParticleSet {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Adds `particle` unless the set is at capacity. Returns whether it was kept.
    pub fn push(&mut self, particle: Particle) -> bool {
        if self.is_full() {
            return false;
        }
        self.particles.push(particle);
        true
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.particles.len() >= cap)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Ages every member and drops the ones that expired on this tick.
    pub fn tick(&mut self) {
        self.particles.retain_mut(|p| {
            p.update();
            !p.is_dead()
        });
    }

    pub fn render(&self, surface: &mut impl Surface) {
        for p in &self.particles {
            p.draw(surface);
        }
    }
}

/// Both particle sets that share the trail canvas.
#[derive(Debug, Clone)]
pub struct TrailLayer {
    pub trail: ParticleSet,
    pub bursts: ParticleSet,
}

impl TrailLayer {
    pub fn new(trail_capacity: usize) -> Self {
        Self {
            trail: ParticleSet::with_capacity(trail_capacity),
            bursts: ParticleSet::unbounded(),
        }
    }

    /// Returns `false` once the trail is at capacity.
    pub fn spawn_trail(&mut self, x: f64, y: f64, color: Rgb, rng: &mut impl Rng) -> bool {
        self.trail.push(Particle::spawn(x, y, color, rng))
    }

    /// Scatters `count` particles around `(x, y)`.
    pub fn burst(&mut self, x: f64, y: f64, count: usize, color: Rgb, rng: &mut impl Rng) {
        for _ in 0..count {
            let px = x + (rng.gen::<f64>() - 0.5) * BURST_JITTER;
            let py = y + (rng.gen::<f64>() - 0.5) * BURST_JITTER;
            self.bursts.push(Particle::spawn(px, py, color, rng));
        }
    }

    /// One cursor frame: clear, advance both sets, then paint what survived.
    pub fn frame(&mut self, surface: &mut impl Surface) {
        surface.clear();
        self.trail.tick();
        self.bursts.tick();
        self.trail.render(surface);
        self.bursts.render(surface);
    }

    pub fn len(&self) -> usize {
        self.trail.len() + self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty() && self.bursts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCmd, RecordingSurface, Viewport};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(11)
    }

    #[test]
    fn spawn_ranges() {
        let mut rng = rng();
        for _ in 0..200 {
            let p = Particle::spawn(0.0, 0.0, Rgb::WHITE, &mut rng);
            assert!((2.0..6.0).contains(&p.size));
            assert!((20..40).contains(&p.max_age));
            assert_eq!(p.age, 0);
        }
    }

    #[test]
    fn removed_on_the_tick_it_expires() {
        let mut rng = rng();
        let mut set = ParticleSet::unbounded();
        let mut p = Particle::spawn(1.0, 1.0, Rgb::WHITE, &mut rng);
        p.max_age = 3;
        set.push(p);

        set.tick();
        set.tick();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|p| p.age), Some(2));
        set.tick();
        assert!(set.is_empty());
    }

    #[test]
    fn size_and_opacity_never_grow() {
        let mut rng = rng();
        let mut p = Particle::spawn(0.0, 0.0, Rgb::WHITE, &mut rng);
        let (mut size, mut opacity, mut age) = (p.size, p.opacity(), p.age);
        while !p.is_dead() {
            p.update();
            assert!(p.age > age);
            assert!(p.size <= size);
            assert!(p.opacity() <= opacity);
            (size, opacity, age) = (p.size, p.opacity(), p.age);
        }
        assert_eq!(p.opacity(), 0.0);
    }

    #[test]
    fn capped_set_refuses_overflow() {
        let mut rng = rng();
        let mut layer = TrailLayer::new(3);
        let kept = (0..10)
            .filter(|_| layer.spawn_trail(5.0, 5.0, Rgb::WHITE, &mut rng))
            .count();
        assert_eq!(kept, 3);
        assert_eq!(layer.trail.len(), 3);
    }

    #[test]
    fn bursts_are_unbounded_and_jittered() {
        let mut rng = rng();
        let mut layer = TrailLayer::new(1);
        layer.burst(100.0, 100.0, 64, Rgb::WHITE, &mut rng);
        assert_eq!(layer.bursts.len(), 64);
        assert!(layer
            .bursts
            .iter()
            .all(|p| (p.x - 100.0).abs() <= 10.0 && (p.y - 100.0).abs() <= 10.0));
    }

    #[test]
    fn frame_clears_then_draws_survivors() {
        let mut rng = rng();
        let mut layer = TrailLayer::new(30);
        layer.spawn_trail(1.0, 2.0, Rgb(1, 2, 3), &mut rng);
        layer.burst(10.0, 10.0, 2, Rgb(1, 2, 3), &mut rng);
        let mut surface = RecordingSurface::new(Viewport::new(100.0, 100.0));

        layer.frame(&mut surface);

        let cmds = surface.take();
        assert_eq!(cmds.first(), Some(&DrawCmd::Clear));
        let circles: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Circle { color, glow, .. } => Some((color.alpha, glow.map(|g| g.color.alpha))),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 3);
        for (alpha, glow) in circles {
            assert!(alpha < 1.0);
            assert!((glow.unwrap() - alpha * 0.8).abs() < 1e-9);
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn trail_never_exceeds_capacity(
            capacity in 0usize..64,
            spawns_per_frame in proptest::collection::vec(0usize..20, 1..80),
            seed in any::<u64>(),
        ) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut layer = TrailLayer::new(capacity);
            for spawns in spawns_per_frame {
                for _ in 0..spawns {
                    layer.spawn_trail(0.0, 0.0, Rgb::WHITE, &mut rng);
                    prop_assert!(layer.trail.len() <= capacity);
                }
                layer.trail.tick();
                prop_assert!(layer.trail.len() <= capacity);
            }
        }
    }
}
