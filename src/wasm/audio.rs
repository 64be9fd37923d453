use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AnalyserNode, AudioContext, AudioContextState, Document, HtmlAudioElement, HtmlElement,
    OscillatorType,
};

use crate::sfx::{Sound, Waveform, GAIN_FLOOR};
use crate::stage::AudioPort;
use crate::visualizer::{BarAccent, BarStyle};
use crate::{FxError, Result};

const FFT_SIZE: u32 = 256;
const MUSIC_VOLUME: f64 = 0.3;

/// Web Audio graph around the background music element, plus the bar elements.
///
/// Any piece may be missing: a blocked context or a failed source connection
/// leaves the visualizer reading an empty spectrum instead of failing.
pub struct WebAudio {
    element: Option<HtmlAudioElement>,
    ctx: Option<AudioContext>,
    analyser: Option<AnalyserNode>,
    bars: Vec<HtmlElement>,
}

impl WebAudio {
    pub fn connect(document: &Document) -> Self {
        let element = document
            .get_element_by_id("bgMusic")
            .and_then(|el| el.dyn_into::<HtmlAudioElement>().ok());
        if element.is_none() {
            log::warn!("no #bgMusic element; visualizer disabled");
        }
        let bars = collect_bars(document);

        let ctx = match AudioContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("audio context unavailable: {e:?}");
                None
            }
        };
        let analyser = match (&ctx, &element) {
            (Some(ctx), Some(element)) => build_analyser(ctx, element)
                .map_err(|e| log::warn!("{e}"))
                .ok(),
            _ => None,
        };

        Self {
            element,
            ctx,
            analyser,
            bars,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Wakes a context suspended by the autoplay policy.
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                ctx.resume().ok();
            }
        }
    }

    pub fn element(&self) -> Option<&HtmlAudioElement> {
        self.element.as_ref()
    }

    pub fn pause(&self) {
        if let Some(element) = &self.element {
            element.pause().ok();
        }
    }

    pub fn play_sound(&self, sound: Sound) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        if let Err(e) = play_tone(ctx, sound) {
            log::debug!("{e}");
        }
    }
}

fn collect_bars(document: &Document) -> Vec<HtmlElement> {
    let Ok(nodes) = document.query_selector_all(".bar") else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn build_analyser(ctx: &AudioContext, element: &HtmlAudioElement) -> Result<AnalyserNode> {
    let analyser = ctx
        .create_analyser()
        .map_err(|e| FxError::Audio(format!("create_analyser: {e:?}")))?;
    analyser.set_fft_size(FFT_SIZE);
    element.set_volume(MUSIC_VOLUME);

    // A media element can only be wrapped once per page; keep the analyser either way.
    match ctx.create_media_element_source(element) {
        Ok(source) => {
            source
                .connect_with_audio_node(&analyser)
                .map_err(|e| FxError::Audio(format!("connect source: {e:?}")))?;
            analyser
                .connect_with_audio_node(&ctx.destination())
                .map_err(|e| FxError::Audio(format!("connect destination: {e:?}")))?;
        }
        Err(e) => log::info!("audio source likely already connected: {e:?}"),
    }
    Ok(analyser)
}

fn play_tone(ctx: &AudioContext, sound: Sound) -> Result<()> {
    let audio = |e: JsValue| FxError::Audio(format!("{sound:?} blip: {e:?}"));
    let tone = sound.tone();
    let now = ctx.current_time();
    let end = now + tone.duration_s;

    let osc = ctx.create_oscillator().map_err(audio)?;
    let gain = ctx.create_gain().map_err(audio)?;
    osc.connect_with_audio_node(&gain).map_err(audio)?;
    gain.connect_with_audio_node(&ctx.destination())
        .map_err(audio)?;

    osc.set_type(match tone.waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Triangle => OscillatorType::Triangle,
    });
    let freq = osc.frequency();
    freq.set_value_at_time(tone.start_hz as f32, now).map_err(audio)?;
    freq.exponential_ramp_to_value_at_time(tone.end_hz as f32, end)
        .map_err(audio)?;
    let level = gain.gain();
    level.set_value_at_time(tone.gain as f32, now).map_err(audio)?;
    level
        .exponential_ramp_to_value_at_time(GAIN_FLOOR as f32, end)
        .map_err(audio)?;

    osc.start().map_err(audio)?;
    osc.stop_with_when(end).map_err(audio)?;
    Ok(())
}

impl AudioPort for WebAudio {
    fn is_playing(&self) -> bool {
        self.element.as_ref().is_some_and(|e| !e.paused())
    }

    fn frequency_data(&mut self, out: &mut Vec<u8>) {
        out.clear();
        if let Some(analyser) = &self.analyser {
            out.resize(analyser.frequency_bin_count() as usize, 0);
            analyser.get_byte_frequency_data(out);
        }
    }

    fn present_bars(&mut self, bars: &[BarStyle], resting: bool) {
        for (el, bar) in self.bars.iter().zip(bars) {
            let style = el.style();
            style
                .set_property("height", &format!("{}%", bar.height_pct))
                .ok();
            if resting {
                style.set_property("box-shadow", "none").ok();
                style.remove_property("opacity").ok();
                continue;
            }
            match bar.accent {
                Some(BarAccent::Opacity(opacity)) => {
                    style.set_property("opacity", &opacity.to_string()).ok();
                }
                Some(BarAccent::Glow { px, color }) => {
                    style
                        .set_property("box-shadow", &format!("0 0 {px}px {color}"))
                        .ok();
                }
                None => {}
            }
        }
    }
}
