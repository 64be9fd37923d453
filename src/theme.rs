//! Theme set and the colour / icon tables keyed by it.

use std::fmt;
use std::str::FromStr;

/// Opaque RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn alpha(self, alpha: f64) -> Rgba {
        Rgba {
            rgb: self,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

/// Formats as `r,g,b`, the fragment CSS colour functions expect.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {})", self.rgb, self.alpha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Gold,
    Matrix,
    Christmas,
    Purple,
    Vapor,
    Pink,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Dark,
        Theme::Light,
        Theme::Gold,
        Theme::Matrix,
        Theme::Christmas,
        Theme::Purple,
        Theme::Vapor,
        Theme::Pink,
    ];

    /// Order the theme toggle button walks through.
    pub const CYCLE: [Theme; 5] = [
        Theme::Dark,
        Theme::Light,
        Theme::Gold,
        Theme::Matrix,
        Theme::Pink,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Gold => "gold",
            Theme::Matrix => "matrix",
            Theme::Christmas => "christmas",
            Theme::Purple => "purple",
            Theme::Vapor => "vapor",
            Theme::Pink => "pink",
        }
    }

    /// Hotkey mapping for the digit row.
    pub fn from_digit(key: &str) -> Option<Theme> {
        match key {
            "1" => Some(Theme::Dark),
            "2" => Some(Theme::Light),
            "3" => Some(Theme::Gold),
            "4" => Some(Theme::Matrix),
            "5" => Some(Theme::Christmas),
            "6" => Some(Theme::Purple),
            "7" => Some(Theme::Vapor),
            "8" => Some(Theme::Pink),
            _ => None,
        }
    }

    /// Themes whose background is code rain instead of stars.
    pub fn is_matrix_like(self) -> bool {
        matches!(self, Theme::Matrix | Theme::Christmas)
    }

    /// Accent colour used by particles and transitions.
    pub fn rgb(self) -> Rgb {
        match self {
            Theme::Dark => Rgb(150, 150, 255),
            Theme::Light => Rgb(0, 0, 0),
            Theme::Gold => Rgb(255, 215, 0),
            Theme::Matrix => Rgb(0, 255, 65),
            Theme::Christmas => Rgb(255, 51, 102),
            Theme::Purple => Rgb(187, 0, 255),
            Theme::Vapor => Rgb(0, 255, 255),
            Theme::Pink => Rgb(255, 20, 147),
        }
    }

    pub fn star_rgb(self) -> Rgb {
        match self {
            Theme::Light => Rgb::BLACK,
            Theme::Pink => Rgb(255, 20, 147),
            Theme::Dark
            | Theme::Gold
            | Theme::Matrix
            | Theme::Christmas
            | Theme::Purple
            | Theme::Vapor => Rgb::WHITE,
        }
    }

    /// Head colour of the falling code. Only meaningful for matrix-like themes.
    pub fn rain_rgb(self) -> Rgb {
        match self {
            Theme::Christmas => Rgb(255, 51, 102),
            Theme::Dark
            | Theme::Light
            | Theme::Gold
            | Theme::Matrix
            | Theme::Purple
            | Theme::Vapor
            | Theme::Pink => Rgb(0, 255, 0),
        }
    }

    /// Phosphor icon class shown on the theme toggle.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Dark => "ph-moon-stars",
            Theme::Light => "ph-sun",
            Theme::Gold => "ph-crown",
            Theme::Matrix => "ph-code",
            Theme::Christmas => "ph-snowflake",
            Theme::Purple => "ph-lightning",
            Theme::Vapor => "ph-palette",
            Theme::Pink => "ph-heart",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme `{0}`")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownTheme(s.to_owned()))
    }
}
