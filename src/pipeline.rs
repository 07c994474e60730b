// Magic Wand — Pipeline Controller
//
// One call to `tick` per sample:
//
//   sample → SampleBuffer → (full?) → WindowAssembler → Classifier
//          → GestureDecider → GestureEvent
//
// States:  ColdStart ──full──▶ Ready ──sample──▶ Classifying
//                                ▲                   │
//                                └── Cooldown ◀──────┘ (gesture emitted)

use std::time::{Duration, Instant};

use crate::assembler::WindowAssembler;
use crate::buffer::SampleBuffer;
use crate::classifier::Classifier;
use crate::config::{PipelineConfig, TICK_PERIOD_MS};
use crate::decider::GestureDecider;
use crate::error::PipelineError;
use crate::events::{GestureEvent, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Fewer than a window of samples since start/reset.
    ColdStart,
    /// Next sample will be classified.
    Ready,
    /// Inference in progress.
    Classifying,
    /// A gesture fired recently; new ones are suppressed.
    Cooldown,
}

pub struct PipelineController<C: Classifier> {
    buffer: SampleBuffer,
    assembler: WindowAssembler,
    classifier: C,
    decider: GestureDecider,
    state: PipelineState,
    /// Index of the next tick (0-based, samples seen since reset).
    next_tick: u64,
    latency_budget: Duration,
}

impl<C: Classifier> PipelineController<C> {
    pub fn new(config: PipelineConfig, classifier: C) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            assembler: WindowAssembler::new(config.normalization),
            classifier,
            decider: GestureDecider::new(config.decider),
            state: PipelineState::ColdStart,
            next_tick: 0,
            latency_budget: Duration::from_millis(TICK_PERIOD_MS),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Ticks processed since reset.
    pub fn tick_index(&self) -> u64 {
        self.next_tick
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn decider(&self) -> &GestureDecider {
        &self.decider
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    /// Buffer one sample without classifying it.  The tick still counts, so
    /// refractory timing stays in sample time.  Returns the sample's tick.
    pub fn ingest(&mut self, sample: Sample) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        self.buffer.push(sample);

        self.state = if !self.buffer.is_full() {
            PipelineState::ColdStart
        } else if self.decider.in_refractory(tick) {
            PipelineState::Cooldown
        } else {
            PipelineState::Ready
        };
        tick
    }

    /// Ingest one sample.  Returns `None` during cold start, otherwise the
    /// decision for the window ending at this sample.
    pub fn tick(&mut self, sample: Sample) -> Option<GestureEvent> {
        let tick = self.ingest(sample);
        if !self.buffer.is_full() {
            return None;
        }

        self.state = PipelineState::Classifying;
        let event = match self.classify_window() {
            Ok(scores) => self.decider.decide(&scores, tick),
            Err(PipelineError::ClassifierUnavailable { code }) => {
                log::warn!("Classifier unavailable (status {}) at tick {} — skipping window", code, tick);
                GestureEvent::none(tick)
            }
            // The buffer is full here, so this cannot happen; treat it as "not yet".
            Err(PipelineError::ColdStart { .. }) => GestureEvent::none(tick),
            Err(err @ PipelineError::ShapeMismatch { .. }) => {
                panic!("classifier contract violated: {err}");
            }
        };

        self.state = if self.decider.in_refractory(tick) {
            PipelineState::Cooldown
        } else {
            PipelineState::Ready
        };

        if let Some(gesture) = event.gesture {
            log::info!(
                "Gesture: {} ({:.1}%) at tick {}",
                gesture.label(),
                event.confidence * 100.0,
                tick
            );
        }

        Some(event)
    }

    fn classify_window(&mut self) -> Result<crate::events::ScoreVector, PipelineError> {
        let format = self.classifier.input_format();
        let snapshot = self.buffer.snapshot();
        let input = self.assembler.assemble_as(&snapshot, format)?;

        let started = Instant::now();
        let scores = self.classifier.classify(input)?;
        let elapsed = started.elapsed();

        if elapsed > self.latency_budget {
            log::warn!(
                "Inference took {} ms, over the {} ms tick period",
                elapsed.as_millis(),
                self.latency_budget.as_millis()
            );
        }
        log::debug!("Scores: {:?}", scores.0);
        Ok(scores)
    }

    /// Back to cold start with no refractory memory (system restart).
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.decider.reset();
        self.next_tick = 0;
        self.state = PipelineState::ColdStart;
        log::info!("Pipeline reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::InputTensor;
    use crate::config::{DeciderConfig, INPUT_SAMPLE_COUNT};
    use crate::events::{GestureClass, ScoreVector};

    /// Returns a fixed score vector and counts calls.
    struct FixedClassifier {
        scores: Result<ScoreVector, PipelineError>,
        calls: usize,
    }

    impl FixedClassifier {
        fn new(scores: [f32; 4]) -> Self {
            Self {
                scores: Ok(ScoreVector(scores)),
                calls: 0,
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn classify(&mut self, input: InputTensor<'_>) -> Result<ScoreVector, PipelineError> {
            assert_eq!(input.len(), 384);
            self.calls += 1;
            self.scores.clone()
        }
    }

    fn controller(classifier: FixedClassifier, refractory: u32) -> PipelineController<FixedClassifier> {
        let config = PipelineConfig::new(DeciderConfig::new(0.3, refractory).unwrap());
        PipelineController::new(config, classifier)
    }

    #[test]
    fn test_no_classification_during_cold_start() {
        let mut pipeline = controller(FixedClassifier::new([0.9, 0.0, 0.0, 0.1]), 10);
        for _ in 0..INPUT_SAMPLE_COUNT - 1 {
            assert!(pipeline.tick(Sample::default()).is_none());
            assert_eq!(pipeline.state(), PipelineState::ColdStart);
        }
        assert_eq!(pipeline.classifier_mut().calls, 0);

        let event = pipeline.tick(Sample::default()).unwrap();
        assert_eq!(event.gesture, Some(GestureClass::Wing));
        assert_eq!(event.tick, (INPUT_SAMPLE_COUNT - 1) as u64);
        assert_eq!(pipeline.classifier_mut().calls, 1);
    }

    #[test]
    fn test_cooldown_then_ready() {
        let mut pipeline = controller(FixedClassifier::new([0.05, 0.05, 0.05, 0.85]), 5);
        for _ in 0..INPUT_SAMPLE_COUNT {
            pipeline.tick(Sample::default());
        }
        // No gesture ever fires → never cools down.
        assert_eq!(pipeline.state(), PipelineState::Ready);

        pipeline.classifier_mut().scores = Ok(ScoreVector([0.05, 0.05, 0.85, 0.05]));
        assert!(pipeline.tick(Sample::default()).unwrap().is_gesture());
        assert_eq!(pipeline.state(), PipelineState::Cooldown);

        for _ in 0..4 {
            assert!(!pipeline.tick(Sample::default()).unwrap().is_gesture());
        }
        assert_eq!(pipeline.state(), PipelineState::Cooldown);

        let event = pipeline.tick(Sample::default()).unwrap();
        assert_eq!(event.gesture, Some(GestureClass::Slope));
    }

    #[test]
    fn test_unavailable_classifier_emits_none_and_keeps_ingesting() {
        let mut classifier = FixedClassifier::new([0.0; 4]);
        classifier.scores = Err(PipelineError::ClassifierUnavailable { code: -3 });
        let mut pipeline = controller(classifier, 5);

        for _ in 0..INPUT_SAMPLE_COUNT + 3 {
            if let Some(event) = pipeline.tick(Sample::new(1.0, 2.0, 3.0)) {
                assert_eq!(event, GestureEvent::none(event.tick));
            }
        }
        assert_eq!(pipeline.buffer().pushed(), INPUT_SAMPLE_COUNT + 3);
        assert_eq!(pipeline.classifier_mut().calls, 4);
    }

    #[test]
    #[should_panic(expected = "classifier contract violated")]
    fn test_shape_mismatch_is_fatal() {
        let mut classifier = FixedClassifier::new([0.0; 4]);
        classifier.scores = ScoreVector::from_slice(&[0.5, 0.5]);
        let mut pipeline = controller(classifier, 5);
        for _ in 0..INPUT_SAMPLE_COUNT {
            pipeline.tick(Sample::default());
        }
    }

    #[test]
    fn test_ingest_skips_classification_but_keeps_tick_time() {
        let mut pipeline = controller(FixedClassifier::new([0.9, 0.0, 0.0, 0.1]), 10);
        for _ in 0..INPUT_SAMPLE_COUNT {
            pipeline.tick(Sample::default());
        }
        assert_eq!(pipeline.decider().last_trigger_tick(), Some(127));

        // Nine samples buffered while inference was busy.
        for _ in 0..9 {
            pipeline.ingest(Sample::default());
        }
        assert_eq!(pipeline.classifier_mut().calls, 1);
        assert_eq!(pipeline.state(), PipelineState::Cooldown);
        assert_eq!(pipeline.tick_index(), 137);

        // Tick 137 is exactly one refractory period after the trigger.
        let event = pipeline.tick(Sample::default()).unwrap();
        assert_eq!(event.tick, 137);
        assert!(event.is_gesture());
    }

    #[test]
    fn test_ingest_during_cold_start() {
        let mut pipeline = controller(FixedClassifier::new([0.9, 0.0, 0.0, 0.1]), 10);
        for i in 0..INPUT_SAMPLE_COUNT as u64 {
            assert_eq!(pipeline.ingest(Sample::default()), i);
        }
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert_eq!(pipeline.classifier_mut().calls, 0);
    }

    #[test]
    fn test_reset_returns_to_cold_start() {
        let mut pipeline = controller(FixedClassifier::new([0.9, 0.0, 0.0, 0.1]), 100);
        for _ in 0..INPUT_SAMPLE_COUNT + 1 {
            pipeline.tick(Sample::default());
        }
        assert_eq!(pipeline.state(), PipelineState::Cooldown);

        pipeline.reset();
        assert_eq!(pipeline.state(), PipelineState::ColdStart);
        assert_eq!(pipeline.tick_index(), 0);
        assert_eq!(pipeline.decider().last_trigger_tick(), None);

        for _ in 0..INPUT_SAMPLE_COUNT - 1 {
            assert!(pipeline.tick(Sample::default()).is_none());
        }
        assert!(pipeline.tick(Sample::default()).unwrap().is_gesture());
    }
}
