// Magic Wand — Classifier Interface
//
// The pipeline treats inference as a capability: anything that turns a
// 384-element window into four class scores.
//
// Back-ends:
//   1. `HeuristicClassifier` (always available): motion-energy guess so the
//      rest of the firmware can be developed without a model linked in.
//   2. `TflmClassifier`: enable the `tflm` feature; build.rs compiles the
//      inference library from `magic_wand_inferencing/` and links it.

use crate::assembler::{InputFormat, InputTensor};
use crate::config::{GESTURE_COUNT, INPUT_CHANNEL_COUNT, INPUT_ELEMENT_COUNT};
use crate::error::PipelineError;
use crate::events::ScoreVector;

pub trait Classifier {
    /// Input contract of the model. Float unless overridden.
    fn input_format(&self) -> InputFormat {
        InputFormat::Float32
    }

    /// Score one window. Identical input must give identical output.
    fn classify(&mut self, input: InputTensor<'_>) -> Result<ScoreVector, PipelineError>;
}

// ---------------------------------------------------------------------------
// Heuristic back-end — development / testing without a model
// ---------------------------------------------------------------------------

/// Guesses from the mean sample-to-sample change in milli-g.  A still wand
/// scores as no-gesture; strong motion is attributed to the dominant axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    /// Mean |Δa| below this is treated as holding still.
    const STILL_MG: f32 = 20.0;
}

impl Classifier for HeuristicClassifier {
    fn classify(&mut self, input: InputTensor<'_>) -> Result<ScoreVector, PipelineError> {
        let InputTensor::F32(tensor) = input else {
            return Err(PipelineError::ShapeMismatch {
                what: "heuristic float input",
                expected: INPUT_ELEMENT_COUNT,
                actual: 0,
            });
        };

        let mut motion = [0.0f32; INPUT_CHANNEL_COUNT];
        let mut prev: Option<&[f32]> = None;
        for frame in tensor.chunks_exact(INPUT_CHANNEL_COUNT) {
            if let Some(p) = prev {
                for axis in 0..INPUT_CHANNEL_COUNT {
                    motion[axis] += (frame[axis] - p[axis]).abs();
                }
            }
            prev = Some(frame);
        }
        let steps = (tensor.len() / INPUT_CHANNEL_COUNT - 1) as f32;
        for m in motion.iter_mut() {
            *m /= steps;
        }
        let total: f32 = motion.iter().sum();

        let scores = if total < Self::STILL_MG {
            [0.02, 0.02, 0.02, 0.94]
        } else {
            // x-dominant → wing, y-dominant → ring, z-dominant → slope
            let dominant = motion
                .iter()
                .enumerate()
                .fold((0, f32::MIN), |best, (i, &m)| if m > best.1 { (i, m) } else { best })
                .0;
            let share = (motion[dominant] / total).clamp(0.0, 1.0);
            let mut s = [0.0f32; GESTURE_COUNT];
            s[dominant] = share;
            s[GESTURE_COUNT - 1] = 1.0 - share;
            s
        };

        log::debug!("Heuristic inference — motion = {:?}, scores = {:?}", motion, scores);
        Ok(ScoreVector(scores))
    }
}

// ---------------------------------------------------------------------------
// TFLite Micro back-end — calls the compiled C++ inference library
// ---------------------------------------------------------------------------
#[cfg(feature = "tflm")]
mod ffi {
    extern "C" {
        /// Runs the model on `input_len` floats, writing up to `scores_cap`
        /// scores and the number produced to `scores_len`.  0 on success.
        pub fn magic_wand_classify(
            input: *const f32,
            input_len: usize,
            scores: *mut f32,
            scores_cap: usize,
            scores_len: *mut usize,
        ) -> i32;

        pub fn magic_wand_classify_int8(
            input: *const i8,
            input_len: usize,
            scores: *mut f32,
            scores_cap: usize,
            scores_len: *mut usize,
        ) -> i32;
    }
}

#[cfg(feature = "tflm")]
pub struct TflmClassifier {
    format: InputFormat,
}

#[cfg(feature = "tflm")]
impl TflmClassifier {
    pub fn new(format: InputFormat) -> Self {
        Self { format }
    }
}

#[cfg(feature = "tflm")]
impl Classifier for TflmClassifier {
    fn input_format(&self) -> InputFormat {
        self.format
    }

    fn classify(&mut self, input: InputTensor<'_>) -> Result<ScoreVector, PipelineError> {
        // One spare slot so an oversized model output is detected, not truncated.
        let mut scores = [0.0f32; GESTURE_COUNT + 1];
        let mut produced: usize = 0;

        // SAFETY: pointers reference live, correctly sized buffers for the
        // duration of the call; the library does not retain them.
        let status = unsafe {
            match input {
                InputTensor::F32(t) => ffi::magic_wand_classify(
                    t.as_ptr(),
                    t.len(),
                    scores.as_mut_ptr(),
                    scores.len(),
                    &mut produced,
                ),
                InputTensor::I8(t) => ffi::magic_wand_classify_int8(
                    t.as_ptr(),
                    t.len(),
                    scores.as_mut_ptr(),
                    scores.len(),
                    &mut produced,
                ),
            }
        };

        if status != 0 {
            log::error!("TFLM classifier error: {}", status);
            return Err(PipelineError::ClassifierUnavailable { code: status });
        }

        ScoreVector::from_slice(&scores[..produced.min(scores.len())])
    }
}
