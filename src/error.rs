// Magic Wand — Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The sample buffer does not hold a full window yet.
    #[error("window not ready: {pushed} of {required} samples received")]
    ColdStart { pushed: usize, required: usize },

    /// A tensor crossing the classifier boundary has the wrong element count.
    /// This is a build/configuration bug, never a runtime condition.
    #[error("{what} shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The inference backend failed to run (e.g. accelerator fault).
    #[error("classifier unavailable (status {code})")]
    ClassifierUnavailable { code: i32 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("confidence threshold {0} outside [0, 1]")]
    ThresholdOutOfRange(f32),

    #[error("refractory period must be at least one tick")]
    ZeroRefractory,

    #[error("quantization scale must be positive and finite, got {0}")]
    InvalidScale(f32),
}
