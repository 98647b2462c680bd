//! Fixed-capacity ring of recent raw samples.
//!
//! The write index advances by one per acquisition, modulo `N`.  Slots not
//! yet written since boot hold zero; [`SampleWindow::filled`] says how many
//! are real.

use super::co::RawSample;

#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize> {
    slots: [RawSample; N],
    head: usize,
    filled: usize,
}

impl<const N: usize> SampleWindow<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0, "sample window needs at least one slot") };
        Self {
            slots: [0; N],
            head: 0,
            filled: 0,
        }
    }

    /// Overwrite the oldest slot with `raw`.
    pub fn push(&mut self, raw: RawSample) {
        self.slots[self.head] = raw;
        self.head = (self.head + 1) % N;
        if self.filled < N {
            self.filled += 1;
        }
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<RawSample> {
        if self.filled == 0 {
            return None;
        }
        Some(self.slots[(self.head + N - 1) % N])
    }

    /// Number of slots written since boot (saturates at `N`).
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == N
    }

    /// Raw slot storage in memory order (not age order).  This is what the
    /// bulk-copy engine reads.
    pub fn slots(&self) -> &[RawSample; N] {
        &self.slots
    }

    /// Point-in-time copy that later pushes cannot tear.
    pub fn snapshot(&self) -> WindowSnapshot<N> {
        WindowSnapshot {
            samples: self.slots,
            filled: self.filled,
        }
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of a [`SampleWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot<const N: usize> {
    samples: [RawSample; N],
    filled: usize,
}

impl<const N: usize> WindowSnapshot<N> {
    pub fn new(samples: [RawSample; N], filled: usize) -> Self {
        Self {
            samples,
            filled: filled.min(N),
        }
    }

    pub fn samples(&self) -> &[RawSample; N] {
        &self.samples
    }

    /// `false` while some slots still hold their boot-time zero.
    pub fn is_warm(&self) -> bool {
        self.filled == N
    }

    pub fn filled(&self) -> usize {
        self.filled
    }
}
