/// Result alias that carries the crate-wide [`FxError`] type.
pub type Result<T> = std::result::Result<T, FxError>;

/// Failures surfaced by the animation core and its web glue.
///
/// None of these are fatal to the page: callers log them and skip the
/// dependent effect for the rest of the session.
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    /// A DOM call failed or an expected element was missing.
    #[error("dom: {0}")]
    Dom(String),
    /// A canvas layer could not hand out a 2D context.
    #[error("canvas `{0}` has no 2d context")]
    Canvas(&'static str),
    /// Audio context, analyser or media source setup failed.
    #[error("audio: {0}")]
    Audio(String),
    /// The embedded JSON configuration did not parse.
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

impl FxError {
    /// Creates a DOM error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Dom(msg.into())
    }
}

impl From<&str> for FxError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for FxError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Dom(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<FxError> for wasm_bindgen::JsValue {
    fn from(value: FxError) -> Self {
        wasm_bindgen::JsValue::from_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let fx: FxError = err.into();
        assert!(fx.to_string().starts_with("config:"));
    }
}
