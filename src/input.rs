//! Pointer and keyboard state owned by the event handlers.

use std::collections::VecDeque;

use crate::theme::Theme;

/// Characters remembered for the secret phrases.
pub const TYPED_CAPACITY: usize = 10;
/// Clicks on the profile picture that unlock the christmas theme.
pub const PFP_CLICKS: u32 = 5;

/// What a secret phrase unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    Theme(Theme),
    Void,
}

const PHRASES: [(&str, Secret); 3] = [
    ("purple", Secret::Theme(Theme::Purple)),
    ("wave", Secret::Theme(Theme::Vapor)),
    ("void", Secret::Void),
];

/// Rolling buffer of the last few typed characters.
#[derive(Debug, Clone, Default)]
pub struct TypedBuffer {
    chars: VecDeque<char>,
}

impl TypedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Appends `c`, then clears the buffer and reports a phrase if one now appears.
    pub fn push(&mut self, c: char) -> Option<Secret> {
        self.chars.extend(c.to_lowercase());
        while self.chars.len() > TYPED_CAPACITY {
            self.chars.pop_front();
        }
        let typed = self.as_string();
        let found = PHRASES
            .iter()
            .find(|(phrase, _)| typed.contains(phrase))
            .map(|&(_, secret)| secret);
        if found.is_some() {
            self.chars.clear();
        }
        found
    }
}

/// Outcome of one key press, for the caller to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SetTheme(Theme),
    ToggleAudio,
    CloseModal,
    Void,
    /// Fed to the phrase buffer without completing a phrase.
    Typed,
    Ignored,
}

/// Maps a `KeyboardEvent.key` value to an action, feeding `typed` when the
/// key is an ordinary character.
pub fn interpret_key(key: &str, content_visible: bool, typed: &mut TypedBuffer) -> KeyAction {
    if let Some(theme) = Theme::from_digit(key) {
        return KeyAction::SetTheme(theme);
    }
    if key == " " && content_visible {
        return KeyAction::ToggleAudio;
    }
    if key == "Escape" {
        return KeyAction::CloseModal;
    }

    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return KeyAction::Ignored;
    };
    match typed.push(c) {
        Some(Secret::Theme(theme)) => KeyAction::SetTheme(theme),
        Some(Secret::Void) => KeyAction::Void,
        None => KeyAction::Typed,
    }
}

/// Pointer position, the eased cursor outline chasing it, and the parallax
/// tilt target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedPointerState {
    pub pointer: (f64, f64),
    pub cursor: (f64, f64),
    pub tilt_target: (f64, f64),
}

impl SharedPointerState {
    pub fn centered(width: f64, height: f64) -> Self {
        let center = (width / 2.0, height / 2.0);
        Self {
            pointer: center,
            cursor: center,
            tilt_target: (0.0, 0.0),
        }
    }

    /// Records a pointer sample. The tilt target only follows while `tilt` holds
    /// a `(width, height, divisor)` triple.
    pub fn on_move(&mut self, x: f64, y: f64, tilt: Option<(f64, f64, f64)>) {
        self.pointer = (x, y);
        if let Some((width, height, divisor)) = tilt {
            self.tilt_target = ((width / 2.0 - x) / divisor, (height / 2.0 - y) / divisor);
        }
    }

    /// Eases the cursor outline toward the pointer by `factor` of the gap.
    pub fn ease(&mut self, factor: f64) {
        self.cursor.0 += (self.pointer.0 - self.cursor.0) * factor;
        self.cursor.1 += (self.pointer.1 - self.cursor.1) * factor;
    }
}
