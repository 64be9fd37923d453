//! The page-level object that owns state, components and their loops.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::background::BackgroundField;
use crate::config::FxConfig;
use crate::input::{interpret_key, KeyAction, TypedBuffer, PFP_CLICKS};
use crate::particle::TrailLayer;
use crate::scheduler::{FrameClock, FrameScheduler, TaskId};
use crate::sfx::Sound;
use crate::state::AppState;
use crate::surface::{Surface, Viewport};
use crate::theme::Theme;
use crate::transition::TransitionEffect;
use crate::visualizer::{AudioVisualizer, BarStyle, BeatDetector};
use crate::Result;

/// Music source and bar elements as seen by the visualizer loop.
pub trait AudioPort {
    fn is_playing(&self) -> bool;
    /// Overwrites `out` with the current byte spectrum. Leaves it empty when
    /// no analyser is available.
    fn frequency_data(&mut self, out: &mut Vec<u8>);
    /// Applies bar styles. `resting` asks the glue to strip any accent too.
    fn present_bars(&mut self, bars: &[BarStyle], resting: bool);
}

/// The three canvas layers, one per loop family.
#[derive(Debug, Clone)]
pub struct Layers<S> {
    pub trail: S,
    pub background: S,
    pub transition: S,
}

impl<S: Surface> Layers<S> {
    fn resize(&mut self, viewport: Viewport, pixel_ratio: f64) {
        self.trail.resize(viewport, pixel_ratio);
        self.background.resize(viewport, pixel_ratio);
        self.transition.resize(viewport, pixel_ratio);
    }
}

/// Requests for collaborators outside the animation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Update the body theme attribute and the toggle icon.
    ThemeApplied(Theme),
    Sound(Sound),
    ToggleAudio,
    CloseModal,
    /// The entry warp ended; show the main content.
    Revealed,
    /// Playback stopped without a toggle, e.g. the track ended.
    AudioStopped,
}

pub struct Stage<C, S, A> {
    config: FxConfig,
    scheduler: FrameScheduler<C>,
    layers: Layers<S>,
    audio: A,
    state: AppState,
    trail: TrailLayer,
    background: BackgroundField,
    transition: TransitionEffect,
    transition_run: u64,
    visualizer: AudioVisualizer,
    beat: BeatDetector,
    typed: TypedBuffer,
    cycle_index: usize,
    pfp_clicks: u32,
    spectrum: Vec<u8>,
    effects: Vec<Effect>,
    rng: SmallRng,
}

impl<C: FrameClock, S: Surface, A: AudioPort> Stage<C, S, A> {
    pub fn new(
        config: FxConfig,
        clock: C,
        layers: Layers<S>,
        audio: A,
        bar_count: usize,
        seed: u64,
    ) -> Self {
        let mut rng = SmallRng::seed_from_u64(config.seed.unwrap_or(seed));
        let viewport = layers.trail.viewport();
        Self {
            scheduler: FrameScheduler::new(clock),
            state: AppState::new(viewport),
            trail: TrailLayer::new(config.trail.capacity),
            background: BackgroundField::new(config.background.star_count, viewport, &mut rng),
            transition: TransitionEffect::new(),
            transition_run: 0,
            visualizer: AudioVisualizer::new(bar_count, &config.audio),
            beat: BeatDetector::new(config.audio.beat.clone()),
            typed: TypedBuffer::new(),
            cycle_index: 0,
            pfp_clicks: 0,
            spectrum: Vec::new(),
            effects: Vec::new(),
            layers,
            audio,
            config,
            rng,
        }
    }

    /// Starts the always-on loops. Calling it again is harmless.
    pub fn start(&mut self) -> Result<()> {
        self.scheduler.start(TaskId::Cursor)?;
        self.scheduler.start(TaskId::Background)?;
        log::info!("stage running at {:?}", self.state.viewport);
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &FxConfig {
        &self.config
    }

    pub fn layers(&self) -> &Layers<S> {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Layers<S> {
        &mut self.layers
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn scheduler(&self) -> &FrameScheduler<C> {
        &self.scheduler
    }

    pub fn clock_mut(&mut self) -> &mut C {
        self.scheduler.clock_mut()
    }

    pub fn trail(&self) -> &TrailLayer {
        &self.trail
    }

    pub fn background(&self) -> &BackgroundField {
        &self.background
    }

    pub fn transition(&self) -> &TransitionEffect {
        &self.transition
    }

    pub fn visualizer(&self) -> &AudioVisualizer {
        &self.visualizer
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn resize(&mut self, viewport: Viewport, pixel_ratio: f64) {
        self.layers.resize(viewport, pixel_ratio);
        self.state.viewport = viewport;
        self.background.resize(viewport, &mut self.rng);
        log::debug!("resized to {viewport:?} at {pixel_ratio}x");
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let tilt = self.state.content_visible.then_some((
            self.state.viewport.width,
            self.state.viewport.height,
            self.config.cursor.tilt_divisor,
        ));
        self.state.pointer.on_move(x, y, tilt);
        self.trail
            .spawn_trail(x, y, self.state.theme.rgb(), &mut self.rng);
    }

    pub fn burst(&mut self, x: f64, y: f64, count: usize) {
        self.trail
            .burst(x, y, count, self.state.theme.rgb(), &mut self.rng);
    }

    pub fn hover(&mut self, x: f64, y: f64) {
        self.burst(x, y, self.config.trail.hover_burst);
    }

    pub fn click(&mut self, x: f64, y: f64) {
        self.burst(x, y, self.config.trail.click_burst);
    }

    /// Switches the theme and fires its transition.
    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.state.theme = theme;
        self.effects.push(Effect::ThemeApplied(theme));
        self.effects.push(Effect::Sound(Sound::Click));
        self.transition_run = self
            .transition
            .trigger(theme, &mut self.layers.transition, &mut self.rng);
        if theme.is_matrix_like() {
            self.background
                .rain
                .reseed(self.state.viewport, &mut self.rng);
        }
        self.run_transition()
    }

    /// Advances the theme toggle button to the next theme in its cycle.
    pub fn toggle_theme(&mut self) -> Result<()> {
        self.cycle_index = (self.cycle_index + 1) % Theme::CYCLE.len();
        self.set_theme(Theme::CYCLE[self.cycle_index])
    }

    pub fn pfp_click(&mut self) -> Result<()> {
        self.pfp_clicks += 1;
        if self.pfp_clicks >= PFP_CLICKS {
            self.pfp_clicks = 0;
            self.set_theme(Theme::Christmas)?;
        }
        Ok(())
    }

    pub fn void(&mut self) -> Result<()> {
        self.transition_run = self
            .transition
            .trigger_void(self.state.theme.rgb(), &mut self.layers.transition);
        self.run_transition()
    }

    /// Books the loop for a freshly triggered batch. Without a loop the batch
    /// could never drain, so it is dropped along with the overlay.
    fn run_transition(&mut self) -> Result<()> {
        if let Err(e) = self.scheduler.restart(TaskId::Transition) {
            self.transition.abort(&mut self.layers.transition);
            return Err(e);
        }
        Ok(())
    }

    pub fn key(&mut self, key: &str) -> Result<KeyAction> {
        let action = interpret_key(key, self.state.content_visible, &mut self.typed);
        match action {
            KeyAction::SetTheme(theme) => self.set_theme(theme)?,
            KeyAction::Void => self.void()?,
            KeyAction::ToggleAudio => self.effects.push(Effect::ToggleAudio),
            KeyAction::CloseModal => self.effects.push(Effect::CloseModal),
            KeyAction::Typed | KeyAction::Ignored => {}
        }
        Ok(action)
    }

    /// Begins the entry warp; the content is revealed once it elapses.
    pub fn enter(&mut self, now_ms: f64) {
        self.state.warping = true;
        self.state.warp_until_ms = Some(now_ms + self.config.cursor.warp_ms);
        self.effects.push(Effect::Sound(Sound::Click));
    }

    pub fn audio_started(&mut self) -> Result<()> {
        if self.scheduler.start(TaskId::Visualizer)? {
            log::info!("visualizer started");
        }
        Ok(())
    }

    pub fn audio_paused(&mut self) {
        if self.scheduler.stop(TaskId::Visualizer) {
            log::info!("visualizer stopped");
        }
        let bars = self.visualizer.rest();
        self.audio.present_bars(bars, true);
    }

    /// Runs one tick of `task`. Stale callbacks are dropped.
    pub fn on_frame(&mut self, task: TaskId, now_ms: f64) -> Result<()> {
        if !self.scheduler.enter(task) {
            return Ok(());
        }
        let again = match task {
            TaskId::Cursor => {
                self.cursor_frame(now_ms);
                true
            }
            TaskId::Background => {
                self.background.render(
                    &mut self.layers.background,
                    self.state.theme,
                    self.state.warping,
                    &mut self.rng,
                );
                true
            }
            TaskId::Visualizer => self.visualizer_frame(now_ms),
            TaskId::Transition => self
                .transition
                .step(self.transition_run, &mut self.layers.transition),
        };
        if again {
            let booked = self.scheduler.proceed(task);
            if booked.is_err() && task == TaskId::Transition {
                self.transition.abort(&mut self.layers.transition);
            }
            booked
        } else {
            self.scheduler.finish(task);
            Ok(())
        }
    }

    fn cursor_frame(&mut self, now_ms: f64) {
        if let Some(until) = self.state.warp_until_ms {
            if now_ms >= until {
                self.state.warp_until_ms = None;
                self.state.warping = false;
                self.state.content_visible = true;
                self.effects.push(Effect::Revealed);
            }
        }
        self.state.pointer.ease(self.config.cursor.smoothing);
        self.trail.frame(&mut self.layers.trail);
    }

    fn visualizer_frame(&mut self, now_ms: f64) -> bool {
        if !self.audio.is_playing() {
            let bars = self.visualizer.rest();
            self.audio.present_bars(bars, true);
            self.effects.push(Effect::AudioStopped);
            return false;
        }
        self.audio.frequency_data(&mut self.spectrum);
        let bars = self.visualizer.tick(&self.spectrum, now_ms, self.state.theme);
        self.audio.present_bars(bars, false);

        if self.beat.detect(&self.spectrum, now_ms) {
            let Viewport { width, height } = self.state.viewport;
            let x = self.rng.gen::<f64>() * width;
            let y = self.rng.gen::<f64>() * height;
            self.burst(x, y, self.beat.policy().burst);
        }
        true
    }
}
