//! Sample sources: where each timer tick's DAC code comes from.
//!
//! The [`SampleSource`] trait is what the timer callback pulls from. Three
//! built-in sources cover the generation modes:
//!
//! | Source | Mode | Per-tick cost | Interrupt safe |
//! |--------|------|---------------|----------------|
//! | [`StaticSource`] | Static | One table read | Yes |
//! | [`DynamicSource`] | Dynamic | `sin` + `exp` per component | No (float) |
//! | [`SquareToggle`] | Toggle | One compare | Yes |
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::table::WaveTable;
//! use rs_wavegen::traits::{SampleSource, Shape, StaticSource};
//!
//! let table = WaveTable::one_cycle(Shape::Sine, 4, 1.0).unwrap();
//! let mut source = StaticSource::new(table);
//!
//! // Static playback ignores the timestamp
//! assert_eq!(source.next_sample(0), 127);
//! assert_eq!(source.next_sample(999), 254);
//! ```

use crate::table::{TableCursor, WaveTable};
use crate::traits::DAC_BIT_DEPTH;
use crate::waveform::WaveformSet;

/// Produces one DAC code per timer tick.
///
/// Implementations must not block or allocate in `next_sample`.
///
/// # Example Implementation
///
/// ```rust
/// use rs_wavegen::traits::SampleSource;
///
/// /// Emits a rising ramp that wraps at 255.
/// struct Ramp(u8);
///
/// impl SampleSource for Ramp {
///     fn next_sample(&mut self, _now_us: u64) -> u8 {
///         self.0 = self.0.wrapping_add(1);
///         self.0
///     }
/// }
///
/// let mut ramp = Ramp(254);
/// assert_eq!(ramp.next_sample(0), 255);
/// assert_eq!(ramp.next_sample(0), 0);
/// ```
pub trait SampleSource {
    /// Returns the code to emit at `now_us`.
    fn next_sample(&mut self, now_us: u64) -> u8;

    /// Restart from the beginning of the waveform.
    ///
    /// Default implementation does nothing.
    fn reset(&mut self) {}
}

// ============================================================================
// Static
// ============================================================================

/// Replays a precomputed [`WaveTable`].
#[derive(Clone, Debug)]
pub struct StaticSource {
    table: WaveTable,
    cursor: TableCursor,
}

impl StaticSource {
    /// Creates a source positioned at the first sample of `table`.
    pub fn new(table: WaveTable) -> Self {
        let cursor = table.cursor();
        Self { table, cursor }
    }

    /// The table being replayed.
    #[inline]
    pub fn table(&self) -> &WaveTable {
        &self.table
    }

    /// Index of the next sample.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }
}

impl SampleSource for StaticSource {
    #[inline]
    fn next_sample(&mut self, _now_us: u64) -> u8 {
        self.table.get(self.cursor.advance())
    }

    fn reset(&mut self) {
        self.cursor.reset();
    }
}

// ============================================================================
// Dynamic
// ============================================================================

/// Evaluates a [`WaveformSet`] at every tick.
///
/// Time is measured from the first tick after construction or
/// [`reset`](SampleSource::reset), so decaying components restart
/// whenever the source is switched back in.
#[derive(Clone, Debug)]
pub struct DynamicSource {
    set: WaveformSet,
    origin_us: Option<u64>,
}

impl DynamicSource {
    /// Creates a source for `set`.
    pub fn new(set: WaveformSet) -> Self {
        Self {
            set,
            origin_us: None,
        }
    }

    /// The components being summed.
    #[inline]
    pub fn waveforms(&self) -> &WaveformSet {
        &self.set
    }

    /// Seconds elapsed since the origin, or 0 before the first tick.
    pub fn elapsed_secs(&self, now_us: u64) -> f64 {
        match self.origin_us {
            Some(origin) => now_us.saturating_sub(origin) as f64 / 1_000_000.0,
            None => 0.0,
        }
    }
}

impl SampleSource for DynamicSource {
    fn next_sample(&mut self, now_us: u64) -> u8 {
        self.origin_us.get_or_insert(now_us);
        self.set.sample(self.elapsed_secs(now_us))
    }

    fn reset(&mut self) {
        self.origin_us = None;
    }
}

// ============================================================================
// Toggle
// ============================================================================

/// Square wave by flipping between two codes.
///
/// The output holds each level for `half_period_ticks` ticks. With a
/// timer running at twice the output frequency that is one tick per level.
///
/// ```rust
/// use rs_wavegen::traits::{SampleSource, SquareToggle};
///
/// let mut square = SquareToggle::new(128, 0, 2);
/// let out: Vec<u8> = (0..6).map(|_| square.next_sample(0)).collect();
/// assert_eq!(out, vec![0, 0, 128, 128, 0, 0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareToggle {
    high: u8,
    low: u8,
    half_period_ticks: u32,
    count: u32,
    is_high: bool,
}

impl SquareToggle {
    /// Default high level: half of full scale (~1.65V).
    pub const DEFAULT_HIGH: u8 = 1 << (DAC_BIT_DEPTH - 1);

    /// Creates a toggle starting on the low level.
    ///
    /// A `half_period_ticks` of zero is treated as one.
    pub fn new(high: u8, low: u8, half_period_ticks: u32) -> Self {
        Self {
            high,
            low,
            half_period_ticks: half_period_ticks.max(1),
            count: 0,
            is_high: false,
        }
    }

    /// Ticks spent on each level.
    #[inline]
    pub fn half_period_ticks(&self) -> u32 {
        self.half_period_ticks
    }

    /// The high and low codes.
    #[inline]
    pub fn levels(&self) -> (u8, u8) {
        (self.high, self.low)
    }
}

impl Default for SquareToggle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HIGH, 0, 1)
    }
}

impl SampleSource for SquareToggle {
    #[inline]
    fn next_sample(&mut self, _now_us: u64) -> u8 {
        let out = if self.is_high { self.high } else { self.low };
        self.count += 1;
        if self.count >= self.half_period_ticks {
            self.count = 0;
            self.is_high = !self.is_high;
        }
        out
    }

    fn reset(&mut self) {
        self.count = 0;
        self.is_high = false;
    }
}
