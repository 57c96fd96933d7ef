use thiserror::Error;

/// Failures a render call can report. Everything here is an
/// expected-invalid-input condition; rendering never panics on bad payloads.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error(
        "degenerate layout: inner plot is {inner_width:.1}x{inner_height:.1}px after margin sizing"
    )]
    DegenerateLayout {
        inner_width: f32,
        inner_height: f32,
    },
}

impl ChartError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
