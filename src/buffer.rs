// Magic Wand — Sample Ring Buffer
//
// Holds the most recent 128 accelerometer samples in a fixed array.  Writes
// overwrite the oldest slot once the buffer has wrapped; reads hand out a
// borrowed chronological view without copying.

use crate::config::INPUT_SAMPLE_COUNT;
use crate::events::Sample;

pub const CAPACITY: usize = INPUT_SAMPLE_COUNT;

pub struct SampleBuffer {
    data: [Sample; CAPACITY],
    /// Next slot to write.
    write_index: usize,
    /// Samples pushed since construction/reset (saturating).
    pushed: usize,
}

impl SampleBuffer {
    pub const fn new() -> Self {
        Self {
            data: [Sample::new(0.0, 0.0, 0.0); CAPACITY],
            write_index: 0,
            pushed: 0,
        }
    }

    /// Append one sample, overwriting the oldest once full.
    pub fn push(&mut self, sample: Sample) {
        self.data[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % CAPACITY;
        self.pushed = self.pushed.saturating_add(1);
    }

    /// True once a full window has been received. Stays true until reset.
    pub fn is_full(&self) -> bool {
        self.pushed >= CAPACITY
    }

    /// Samples currently held.
    pub fn len(&self) -> usize {
        self.pushed.min(CAPACITY)
    }

    pub fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<Sample> {
        if self.is_empty() {
            return None;
        }
        Some(self.data[(self.write_index + CAPACITY - 1) % CAPACITY])
    }

    /// Chronological (oldest first) view of the held samples.
    pub fn snapshot(&self) -> Snapshot<'_> {
        if self.is_full() {
            let (newer, older) = self.data.split_at(self.write_index);
            Snapshot {
                older,
                newer,
                pushed: self.pushed,
            }
        } else {
            Snapshot {
                older: &self.data[..self.write_index],
                newer: &[],
                pushed: self.pushed,
            }
        }
    }

    /// Forget all samples; the next window needs a fresh cold start.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.pushed = 0;
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view over the ring: `older` followed by `newer`.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    older: &'a [Sample],
    newer: &'a [Sample],
    pushed: usize,
}

impl<'a> Snapshot<'a> {
    pub fn len(&self) -> usize {
        self.older.len() + self.newer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the view spans a whole window.
    pub fn is_complete(&self) -> bool {
        self.len() == CAPACITY
    }

    /// Samples pushed into the buffer when the view was taken.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    pub fn get(&self, index: usize) -> Option<&'a Sample> {
        if index < self.older.len() {
            self.older.get(index)
        } else {
            self.newer.get(index - self.older.len())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Sample> + 'a {
        self.older.iter().chain(self.newer.iter())
    }
}
