//! Precomputed single-cycle wave tables.
//!
//! Static generation computes one full cycle of the output once, at
//! startup, and then replays it sample by sample from the timer callback.
//! No floating point is needed after the table is built, which is what
//! makes static mode safe to run inside a hardware interrupt.
//!
//! # Sizing
//!
//! One cycle takes `sample_rate / frequency` samples (integer division).
//! With a 180 kHz sample rate a 3 kHz output needs 60 entries; a 200 Hz
//! output at 150 kHz needs 750. Tables are capped at [`MAX_TABLE_LEN`].
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::table::WaveTable;
//! use rs_wavegen::traits::Shape;
//!
//! let table = WaveTable::one_cycle(Shape::Sine, 4, 1.0).unwrap();
//! assert_eq!(table.as_slice(), &[127, 254, 127, 0]);
//!
//! let mut cursor = table.cursor();
//! let played: Vec<u8> = (0..6).map(|_| table.get(cursor.advance())).collect();
//! assert_eq!(played, vec![127, 254, 127, 0, 127, 254]);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::ConfigError;
use crate::traits::{Shape, DAC_MIDPOINT};
use crate::waveform::{to_dac_code, WaveformSet};

/// Largest number of samples a [`WaveTable`] holds.
pub const MAX_TABLE_LEN: usize = 4096;

/// One cycle of DAC codes.
///
/// The codes live on the heap at their exact length, so moving a table
/// (into a source, a generator or a timer callback) copies a pointer, not
/// the cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveTable {
    samples: Box<[u8]>,
}

impl WaveTable {
    /// Build one cycle of `shape`, scaled by `attenuation`.
    ///
    /// Entry `i` is `attenuation · (127 + 127 · shape(i / samples_per_cycle))`,
    /// rounded to the nearest code.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyTable`] if `samples_per_cycle` is zero
    /// - [`ConfigError::TableTooLong`] if it exceeds [`MAX_TABLE_LEN`]
    pub fn one_cycle(
        shape: Shape,
        samples_per_cycle: usize,
        attenuation: f32,
    ) -> Result<Self, ConfigError> {
        check_len(samples_per_cycle)?;
        let mid = DAC_MIDPOINT as f32;
        let samples: Vec<u8> = (0..samples_per_cycle)
            .map(|i| {
                let phase = i as f32 / samples_per_cycle as f32;
                to_dac_code(attenuation * (mid + mid * shape.value(phase)))
            })
            .collect();
        Ok(Self {
            samples: samples.into_boxed_slice(),
        })
    }

    /// Build a table by sampling a waveform sum at `sample_rate_hz`.
    ///
    /// Entry `i` is the set evaluated at `t = i / sample_rate_hz`. The
    /// replay only loops cleanly when every component completes a whole
    /// number of cycles in `samples_per_cycle` samples and does not decay.
    pub fn from_set(
        set: &WaveformSet,
        samples_per_cycle: usize,
        sample_rate_hz: u32,
    ) -> Result<Self, ConfigError> {
        check_len(samples_per_cycle)?;
        if sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        let samples: Vec<u8> = (0..samples_per_cycle)
            .map(|i| set.sample(i as f64 / sample_rate_hz as f64))
            .collect();
        Ok(Self {
            samples: samples.into_boxed_slice(),
        })
    }

    /// Wrap an existing list of codes.
    pub fn from_samples(codes: &[u8]) -> Result<Self, ConfigError> {
        check_len(codes.len())?;
        Ok(Self {
            samples: Box::from(codes),
        })
    }

    /// Number of samples in one cycle. Never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`, wrapping past the end.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.samples[index % self.samples.len()]
    }

    /// The whole cycle.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.samples
    }

    /// Iterate over the cycle once.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.samples.iter().copied()
    }

    /// Smallest and largest code in the table.
    pub fn range(&self) -> (u8, u8) {
        let min = self.samples.iter().copied().min().unwrap_or(0);
        let max = self.samples.iter().copied().max().unwrap_or(0);
        (min, max)
    }

    /// A fresh cursor positioned at the first sample.
    #[inline]
    pub fn cursor(&self) -> TableCursor {
        TableCursor::new(self.len())
    }
}

fn check_len(len: usize) -> Result<(), ConfigError> {
    if len == 0 {
        Err(ConfigError::EmptyTable)
    } else if len > MAX_TABLE_LEN {
        Err(ConfigError::TableTooLong {
            samples_per_cycle: len as u32,
            max: MAX_TABLE_LEN,
        })
    } else {
        Ok(())
    }
}

/// Circular index into a table.
///
/// This is the entire state of static playback: an index that
/// increments once per tick and wraps to zero at the table length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableCursor {
    index: usize,
    len: usize,
}

impl TableCursor {
    /// Creates a cursor over `len` samples. A zero length is treated as one.
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len: len.max(1),
        }
    }

    /// Returns the current index and moves to the next, wrapping at the end.
    #[inline]
    pub fn advance(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        if self.index >= self.len {
            self.index = 0;
        }
        current
    }

    /// Index that the next [`advance`](Self::advance) will return.
    #[inline]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Return to the first sample.
    #[inline]
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
