//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without an ESP32 attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockDac`] | [`DacOutput`] | Records every written code |
//! | [`MockTimer`] | [`SampleTimer`] | Holds the callback; tests fire ticks by hand |
//! | [`MockClock`] | [`Clock`] | Shared, controllable microsecond clock |
//! | [`MockSystem`] | [`SystemInfo`] | Fixed heap and clock figures |
//! | [`MockPin`] | `embedded_hal::digital::OutputPin` | Records pin levels |
//! | [`MockDelay`] | `embedded_hal::delay::DelayNs` | Records requested delays |
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::{WaveGenerator, GeneratorConfig};
//! use rs_wavegen::hal::MockDac;
//! use rs_wavegen::traits::DacChannel;
//!
//! let config = GeneratorConfig::default();
//! let mut generator = WaveGenerator::new(MockDac::new(DacChannel::Channel1), &config).unwrap();
//!
//! for tick in 0..60u64 {
//!     generator.on_tick(tick * 6).unwrap();
//! }
//!
//! // One full cycle of the default 3 kHz sine
//! let dac = generator.dac();
//! assert_eq!(dac.samples.len(), 60);
//! assert_eq!(dac.samples.iter().max(), Some(&203));
//! ```
//!
//! [`DacOutput`]: crate::traits::DacOutput
//! [`SampleTimer`]: crate::traits::SampleTimer
//! [`Clock`]: crate::traits::Clock
//! [`SystemInfo`]: crate::traits::SystemInfo

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::traits::{Clock, DacChannel, DacOutput, SampleTimer, SystemInfo};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock DAC channel for testing.
///
/// Records every written code. Use the public fields to inspect state
/// after test operations, or to inject failures.
///
/// # Example
///
/// ```rust
/// use rs_wavegen::hal::MockDac;
/// use rs_wavegen::traits::{DacChannel, DacOutput};
///
/// let mut dac = MockDac::new(DacChannel::Channel2);
/// dac.enable().unwrap();
/// dac.write(10).unwrap();
/// dac.write(20).unwrap();
///
/// assert!(dac.enabled);
/// assert_eq!(dac.samples, vec![10, 20]);
/// assert_eq!(dac.last(), Some(20));
///
/// dac.fail_writes = true;
/// assert!(dac.write(30).is_err());
/// assert_eq!(dac.samples.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockDac {
    /// Channel reported by [`DacOutput::channel`].
    pub channel: DacChannel,
    /// Whether the channel is enabled.
    pub enabled: bool,
    /// Every code written, in order.
    pub samples: Vec<u8>,
    /// Make `write` fail.
    pub fail_writes: bool,
    /// Make `enable` fail.
    pub fail_enable: bool,
}

impl MockDac {
    /// Creates a disabled mock on `channel`.
    pub fn new(channel: DacChannel) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    /// Most recently written code.
    pub fn last(&self) -> Option<u8> {
        self.samples.last().copied()
    }
}

impl DacOutput for MockDac {
    type Error = ();

    fn enable(&mut self) -> Result<(), ()> {
        if self.fail_enable {
            return Err(());
        }
        self.enabled = true;
        Ok(())
    }

    fn write(&mut self, code: u8) -> Result<(), ()> {
        if self.fail_writes || !self.enabled {
            return Err(());
        }
        self.samples.push(code);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ()> {
        self.enabled = false;
        Ok(())
    }

    fn channel(&self) -> DacChannel {
        self.channel
    }
}

/// Mock sample timer for testing.
///
/// Stores the callback instead of arming hardware. Tests call
/// [`fire`](Self::fire) or [`run_for`](Self::run_for) to simulate ticks.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use rs_wavegen::hal::MockTimer;
/// use rs_wavegen::traits::SampleTimer;
///
/// let count = Arc::new(AtomicU32::new(0));
/// let seen = count.clone();
///
/// let mut timer = MockTimer::new();
/// timer.start_periodic(100, move || {
///     seen.fetch_add(1, Ordering::Relaxed);
/// }).unwrap();
///
/// assert_eq!(timer.period_us, Some(100));
/// assert_eq!(timer.fire_n(5), 5);
/// assert_eq!(count.load(Ordering::Relaxed), 5);
///
/// timer.stop().unwrap();
/// assert!(!timer.fire());
/// ```
pub struct MockTimer {
    /// Period passed to the last `start_periodic`, while running.
    pub period_us: Option<u32>,
    /// Shortest accepted period.
    pub min_period_us: u32,
    /// Total callback invocations.
    pub fired: u64,
    callback: Option<Box<dyn FnMut() + Send>>,
}

impl MockTimer {
    /// Creates a stopped timer accepting any non-zero period.
    pub fn new() -> Self {
        Self {
            period_us: None,
            min_period_us: 1,
            fired: 0,
            callback: None,
        }
    }

    /// Creates a timer that rejects periods shorter than `min_period_us`.
    pub fn with_min_period(mut self, min_period_us: u32) -> Self {
        self.min_period_us = min_period_us;
        self
    }

    /// Whether a callback is registered.
    pub fn is_running(&self) -> bool {
        self.callback.is_some()
    }

    /// Invoke the callback once. Returns `false` if stopped.
    pub fn fire(&mut self) -> bool {
        match self.callback.as_mut() {
            Some(callback) => {
                callback();
                self.fired += 1;
                true
            }
            None => false,
        }
    }

    /// Invoke the callback `n` times, returning how many ran.
    pub fn fire_n(&mut self, n: usize) -> usize {
        (0..n).take_while(|_| self.fire()).count()
    }

    /// Advance `clock` by one period before each of `ticks` callbacks.
    pub fn run_for(&mut self, clock: &MockClock, ticks: usize) -> usize {
        let period = self.period_us.unwrap_or(0);
        (0..ticks)
            .take_while(|_| {
                clock.advance_us(period);
                self.fire()
            })
            .count()
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MockTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockTimer")
            .field("period_us", &self.period_us)
            .field("min_period_us", &self.min_period_us)
            .field("fired", &self.fired)
            .field("running", &self.is_running())
            .finish()
    }
}

impl SampleTimer for MockTimer {
    type Error = ();

    fn start_periodic<F>(&mut self, period_us: u32, callback: F) -> Result<(), ()>
    where
        F: FnMut() + Send + 'static,
    {
        if period_us == 0 || period_us < self.min_period_us {
            return Err(());
        }
        self.period_us = Some(period_us);
        self.callback = Some(Box::new(callback));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ()> {
        self.period_us = None;
        self.callback = None;
        Ok(())
    }

    fn min_period_us(&self) -> u32 {
        self.min_period_us
    }
}

/// Mock clock for testing.
///
/// Clones share the same time, so a clone can be moved into a tick
/// handler while the test advances the original. Counts microseconds in
/// 32 bits, enough for a little over an hour of simulated time.
///
/// # Example
///
/// ```rust
/// use rs_wavegen::hal::MockClock;
/// use rs_wavegen::traits::Clock;
///
/// let clock = MockClock::new();
/// let shared = clock.clone();
///
/// clock.set_us(1000);
/// clock.advance_us(500);
/// assert_eq!(shared.now_us(), 1500);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    current_us: Arc<AtomicU32>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0us.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in microseconds.
    pub fn set_us(&self, us: u32) {
        self.current_us.store(us, Ordering::Relaxed);
    }

    /// Advances the clock by the given duration.
    pub fn advance_us(&self, us: u32) {
        self.current_us.fetch_add(us, Ordering::Relaxed);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_us.load(Ordering::Relaxed) as u64
    }
}

/// Mock system figures, defaulting to a freshly booted ESP32 at 240 MHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockSystem {
    /// Reported free heap.
    pub free_heap: u32,
    /// Reported low-water mark.
    pub min_free_heap: u32,
    /// Reported CPU clock.
    pub cpu_freq_hz: u32,
    /// Reported APB clock.
    pub apb_freq_hz: u32,
}

impl MockSystem {
    /// Creates a mock with default figures.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MockSystem {
    fn default() -> Self {
        Self {
            free_heap: 301_000,
            min_free_heap: 295_000,
            cpu_freq_hz: 240_000_000,
            apb_freq_hz: 80_000_000,
        }
    }
}

impl SystemInfo for MockSystem {
    fn free_heap(&self) -> u32 {
        self.free_heap
    }

    fn min_free_heap(&self) -> u32 {
        self.min_free_heap
    }

    fn cpu_freq_hz(&self) -> u32 {
        self.cpu_freq_hz
    }

    fn apb_freq_hz(&self) -> u32 {
        self.apb_freq_hz
    }
}

// ============================================================================
// embedded-hal Mocks
// ============================================================================

/// Mock output pin recording every level it is driven to.
#[derive(Debug, Default)]
pub struct MockPin {
    /// Levels in the order they were set (`true` = high).
    pub levels: Vec<bool>,
}

impl MockPin {
    /// Creates a pin with no recorded levels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pin is currently high.
    pub fn is_high(&self) -> bool {
        self.levels.last().copied().unwrap_or(false)
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.push(true);
        Ok(())
    }
}

/// Mock delay recording requested durations instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every requested delay in nanoseconds.
    pub delays_ns: Vec<u32>,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded delays in whole microseconds.
    pub fn delays_us(&self) -> Vec<u32> {
        self.delays_ns.iter().map(|ns| ns / 1000).collect()
    }

    /// Sum of all recorded delays in microseconds.
    pub fn total_us(&self) -> u64 {
        self.delays_ns.iter().map(|&ns| ns as u64).sum::<u64>() / 1000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns);
    }
}
