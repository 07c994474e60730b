// Magic Wand — Sensor Task
//
// Reads one accelerometer sample per 40 ms tick (25 Hz) and queues it for the
// inference task.  Never blocks on the queue.  The inference task empties the
// queue on every pass, so a drop means a single classification outlasted
// `SAMPLE_QUEUE_DEPTH` ticks; the sample is then counted and lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::TICK_PERIOD_MS;
use crate::events::Sample;

/// Anything that yields one accelerometer reading on demand.
pub trait SampleSource {
    fn read_sample(&mut self) -> anyhow::Result<Sample>;
}

/// Why the sensor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorExit {
    Stopped,
    ReceiverGone,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorStats {
    pub sent: u64,
    pub dropped: u64,
    pub read_errors: u64,
}

pub fn sensor_task<S: SampleSource>(
    mut source: S,
    sample_tx: SyncSender<Sample>,
    stop: Arc<AtomicBool>,
) -> (SensorExit, SensorStats) {
    log::info!("Sensor task started");

    let interval = Duration::from_millis(TICK_PERIOD_MS);
    let mut stats = SensorStats::default();

    loop {
        // Cancellation only at a tick boundary.
        if stop.load(Ordering::Relaxed) {
            log::info!("Sensor task stopped ({:?})", stats);
            return (SensorExit::Stopped, stats);
        }

        let tick_start = Instant::now();

        match source.read_sample() {
            Ok(sample) => match sample_tx.try_send(sample) {
                Ok(()) => stats.sent += 1,
                Err(TrySendError::Full(_)) => {
                    stats.dropped += 1;
                    log::warn!("Sample queue full — dropped sample ({} total)", stats.dropped);
                }
                Err(TrySendError::Disconnected(_)) => {
                    // Receiver dropped: inference task has exited. Shut down cleanly.
                    log::warn!("Sample channel closed — exiting sensor task");
                    return (SensorExit::ReceiverGone, stats);
                }
            },
            Err(e) => {
                stats.read_errors += 1;
                log::warn!("IMU read error: {}", e);
            }
        }

        // Sleep for the remainder of the tick to hold 25 Hz.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
