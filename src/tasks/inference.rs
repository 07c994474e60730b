// Magic Wand — Inference Task
//
// Consumes samples from the sensor queue in arrival order and drives the
// pipeline controller.  Every recognised gesture goes to the output sink.
//
// A classification slower than one tick leaves samples queued behind it.
// Those are buffered without classification and only the newest window is
// scored, so the queue empties on every pass and the sensor never has to
// drop a sample.

use std::sync::mpsc::Receiver;

use crate::classifier::Classifier;
use crate::events::{GestureEvent, Sample};
use crate::output::GestureSink;
use crate::pipeline::PipelineController;

pub fn inference_task<C, S>(
    sample_rx: Receiver<Sample>,
    mut pipeline: PipelineController<C>,
    mut sink: S,
) -> PipelineController<C>
where
    C: Classifier,
    S: GestureSink,
{
    log::info!("Inference task started");

    // Block until a sensor sample arrives; a closed channel ends the task.
    while let Ok(first) = sample_rx.recv() {
        let mut newest = first;
        let mut skipped = 0u32;
        while let Ok(next) = sample_rx.try_recv() {
            pipeline.ingest(newest);
            newest = next;
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("Inference behind by {} samples — buffered without classifying", skipped);
        }

        if let Some(event) = pipeline.tick(newest) {
            dispatch(&mut sink, &event);
        }
    }

    log::warn!("Sample channel closed — exiting inference task");
    pipeline
}

fn dispatch<S: GestureSink>(sink: &mut S, event: &GestureEvent) {
    if !event.is_gesture() {
        return;
    }
    if let Err(e) = sink.emit(event) {
        log::error!("Gesture output failed: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    use crate::assembler::InputTensor;
    use crate::config::{DeciderConfig, PipelineConfig, INPUT_SAMPLE_COUNT};
    use crate::error::PipelineError;
    use crate::events::{GestureClass, ScoreVector};

    /// Always answers wing and counts how often it was asked.
    #[derive(Default)]
    struct AlwaysWing {
        calls: usize,
    }

    impl Classifier for AlwaysWing {
        fn classify(&mut self, _input: InputTensor<'_>) -> Result<ScoreVector, PipelineError> {
            self.calls += 1;
            Ok(ScoreVector([0.9, 0.05, 0.02, 0.03]))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<GestureEvent>);

    impl GestureSink for Collect {
        fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
            self.0.push(*event);
            Ok(())
        }
    }

    fn pipeline(refractory: u32) -> PipelineController<AlwaysWing> {
        let config = PipelineConfig::new(DeciderConfig::new(0.5, refractory).unwrap());
        PipelineController::new(config, AlwaysWing::default())
    }

    #[test]
    fn test_backlog_is_buffered_and_only_newest_window_classified() {
        let total = INPUT_SAMPLE_COUNT + 60;
        let (tx, rx) = mpsc::sync_channel(total);
        for i in 0..total {
            tx.send(Sample::new(i as f32, 0.0, 0.0)).unwrap();
        }
        drop(tx);

        let mut sink = Collect::default();
        let mut pipeline = inference_task(rx, pipeline(50), &mut sink);

        // Every sample reached the buffer, but only the last one was scored.
        assert_eq!(pipeline.tick_index(), total as u64);
        assert_eq!(pipeline.buffer().latest(), Some(Sample::new((total - 1) as f32, 0.0, 0.0)));
        assert_eq!(pipeline.classifier_mut().calls, 1);

        let ticks: Vec<u64> = sink.0.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![(total - 1) as u64]);
        assert!(sink.0.iter().all(|e| e.gesture == Some(GestureClass::Wing)));
    }

    #[test]
    fn test_task_forwards_gestures_until_channel_closes() {
        let (tx, rx) = mpsc::sync_channel(16);
        let producer = thread::spawn(move || {
            for _ in 0..INPUT_SAMPLE_COUNT + 60 {
                tx.send(Sample::default()).unwrap();
            }
        });

        let mut sink = Collect::default();
        let pipeline = inference_task(rx, pipeline(50), &mut sink);
        producer.join().unwrap();

        // How many samples arrive per pass depends on scheduling; the tick
        // count and refractory spacing do not.
        assert_eq!(pipeline.tick_index(), (INPUT_SAMPLE_COUNT + 60) as u64);
        assert!(!sink.0.is_empty());
        assert!(sink.0[0].tick >= (INPUT_SAMPLE_COUNT - 1) as u64);
        for pair in sink.0.windows(2) {
            assert!(pair[1].tick - pair[0].tick >= 50);
        }
        assert!(sink.0.iter().all(|e| e.gesture == Some(GestureClass::Wing)));
    }
}
