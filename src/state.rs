use crate::input::SharedPointerState;
use crate::surface::Viewport;
use crate::theme::Theme;

/// Page-wide state read by every loop each frame.
///
/// Each field has one writer: pointer events write `pointer`, theme
/// selection writes `theme`, the entry sequence writes `warping` and
/// `content_visible`, resizes write `viewport`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub theme: Theme,
    pub pointer: SharedPointerState,
    /// Stars streak and rain falls faster while set.
    pub warping: bool,
    pub content_visible: bool,
    pub viewport: Viewport,
    /// Frame time at which the entry warp ends.
    pub warp_until_ms: Option<f64>,
}

impl AppState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            theme: Theme::default(),
            pointer: SharedPointerState::centered(viewport.width, viewport.height),
            warping: false,
            content_visible: false,
            viewport,
            warp_until_ms: None,
        }
    }
}
