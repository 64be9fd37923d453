//! UI blips for hover and click feedback.

/// Gain every blip ramps down to before it stops.
pub const GAIN_FLOOR: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Hover,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Exponential pitch and gain ramp played by one oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f64,
    pub end_hz: f64,
    pub gain: f64,
    pub duration_s: f64,
}

impl Sound {
    pub fn tone(self) -> Tone {
        match self {
            Sound::Hover => Tone {
                waveform: Waveform::Sine,
                start_hz: 800.0,
                end_hz: 1200.0,
                gain: 0.05,
                duration_s: 0.05,
            },
            Sound::Click => Tone {
                waveform: Waveform::Triangle,
                start_hz: 300.0,
                end_hz: 100.0,
                gain: 0.1,
                duration_s: 0.1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_rises_and_click_falls() {
        let hover = Sound::Hover.tone();
        let click = Sound::Click.tone();
        assert!(hover.end_hz > hover.start_hz);
        assert!(click.end_hz < click.start_hz);
        assert!(hover.duration_s < click.duration_s);
        assert!(GAIN_FLOOR < hover.gain.min(click.gain));
    }
}
