// Magic Wand — Samples, Scores & Gesture Events

use crate::config::GESTURE_COUNT;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Sensor Data (3-axis accelerometer reading, one per tick)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

// ---------------------------------------------------------------------------
// Gesture Classification
// ---------------------------------------------------------------------------

/// Model output classes. The discriminant is the score index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureClass {
    Wing = 0,
    Ring = 1,
    Slope = 2,
    NoGesture = 3,
}

impl GestureClass {
    /// All classes in score order.
    pub const ALL: [GestureClass; GESTURE_COUNT] =
        [Self::Wing, Self::Ring, Self::Slope, Self::NoGesture];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wing      => "wing",
            Self::Ring      => "ring",
            Self::Slope     => "slope",
            Self::NoGesture => "none",
        }
    }

    /// Map a training-set label to a class. Unknown labels are negatives.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "wing"  => Self::Wing,
            "ring"  => Self::Ring,
            "slope" => Self::Slope,
            _       => Self::NoGesture,
        }
    }
}

// ---------------------------------------------------------------------------
// Score Vector — classifier output for one window
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector(pub [f32; GESTURE_COUNT]);

impl ScoreVector {
    pub fn from_slice(scores: &[f32]) -> Result<Self, PipelineError> {
        let scores: [f32; GESTURE_COUNT] =
            scores.try_into().map_err(|_| PipelineError::ShapeMismatch {
                what: "classifier output",
                expected: GESTURE_COUNT,
                actual: scores.len(),
            })?;
        Ok(Self(scores))
    }

    /// Winning class and its score. Ties go to the lowest index.
    pub fn argmax(&self) -> (GestureClass, f32) {
        let mut best = GestureClass::Wing;
        let mut best_val = self.0[0];
        for class in &GestureClass::ALL[1..] {
            let val = self.0[class.index()];
            // Strict comparison keeps the earlier class on ties; NaN never wins.
            if val > best_val || best_val.is_nan() {
                best = *class;
                best_val = val;
            }
        }
        (best, best_val)
    }
}

// ---------------------------------------------------------------------------
// Gesture Event — one per classified window
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// `None` when no gesture was recognised (or it was suppressed).
    pub gesture: Option<GestureClass>,
    pub confidence: f32,
    pub tick: u64,
}

impl GestureEvent {
    pub fn none(tick: u64) -> Self {
        Self {
            gesture: None,
            confidence: 0.0,
            tick,
        }
    }

    pub fn is_gesture(&self) -> bool {
        self.gesture.is_some()
    }
}
