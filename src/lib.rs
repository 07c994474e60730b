//! Magic Wand — accelerometer gesture recognition.
//!
//! A 25 Hz stream of 3-axis samples is windowed (128 samples), fed to an
//! opaque classifier, and the per-class scores are turned into debounced
//! `wing` / `ring` / `slope` events.
//!
//! ```text
//! sensor → SampleBuffer → WindowAssembler → Classifier → GestureDecider → sink
//! ```
//!
//! Everything here runs on the host as well as on the ESP32; the board
//! specific drivers live in the firmware binary.

pub mod assembler;
pub mod buffer;
pub mod classifier;
pub mod config;
pub mod decider;
pub mod error;
pub mod events;
pub mod output;
pub mod pipeline;
pub mod tasks;

pub use classifier::Classifier;
pub use config::{DeciderConfig, PipelineConfig};
pub use error::{ConfigError, PipelineError};
pub use events::{GestureClass, GestureEvent, Sample, ScoreVector};
pub use pipeline::{PipelineController, PipelineState};
