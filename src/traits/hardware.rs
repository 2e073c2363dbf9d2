//! Hardware abstraction traits for DAC output, sample timing, and diagnostics.
//!
//! This module defines the hardware interfaces that let rs-wavegen run on
//! an ESP32 or entirely on the desktop against mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DacOutput`] | 8-bit digital-to-analog output channel |
//! | [`SampleTimer`] | Periodic callback at the sample rate |
//! | [`Clock`] | Microsecond time source |
//! | [`SystemInfo`] | Heap and clock figures for the settings report |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::traits::{DacChannel, DacOutput};
//! use rs_wavegen::hal::MockDac;
//!
//! let mut dac = MockDac::new(DacChannel::Channel1);
//! dac.enable().unwrap();
//! dac.write(127).unwrap();
//!
//! assert_eq!(dac.samples, vec![127]);
//! assert_eq!(dac.channel().gpio(), 25);
//! ```

/// Bit depth of the ESP32 DAC (fixed in hardware).
pub const DAC_BIT_DEPTH: u32 = 8;

/// Largest DAC code, i.e. full-scale output (~3.3V).
pub const DAC_MAX: u8 = u8::MAX;

/// Half of peak-to-peak. A full-scale sinusoid is `DAC_MIDPOINT ± DAC_MIDPOINT`.
pub const DAC_MIDPOINT: u8 = 127;

/// Scale an 8-bit code onto `0..=full_scale`, rounding down.
///
/// PWM duty, PWM on-time and R-2R ladder levels all map the DAC range
/// linearly onto a different full scale.
///
/// ```
/// use rs_wavegen::traits::scale_code;
///
/// assert_eq!(scale_code(255, 1023), 1023);
/// assert_eq!(scale_code(127, 1000), 498);
/// assert_eq!(scale_code(200, 255), 200);
/// assert_eq!(scale_code(0, 4095), 0);
/// ```
#[inline]
pub const fn scale_code(code: u8, full_scale: u32) -> u32 {
    (code as u64 * full_scale as u64 / DAC_MAX as u64) as u32
}

/// One of the two ESP32 DAC channels.
///
/// # Default
///
/// Defaults to [`Channel1`](Self::Channel1), the pin every sketch wires up first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DacChannel {
    /// DAC channel 1, on GPIO25.
    #[default]
    Channel1,
    /// DAC channel 2, on GPIO26.
    Channel2,
}

impl DacChannel {
    /// Returns the GPIO the channel drives.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_wavegen::traits::DacChannel;
    ///
    /// assert_eq!(DacChannel::Channel1.gpio(), 25);
    /// assert_eq!(DacChannel::Channel2.gpio(), 26);
    /// ```
    #[inline]
    pub const fn gpio(&self) -> u8 {
        match self {
            DacChannel::Channel1 => 25,
            DacChannel::Channel2 => 26,
        }
    }

    /// Returns a short label such as `"DAC1"`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DacChannel::Channel1 => "DAC1",
            DacChannel::Channel2 => "DAC2",
        }
    }

    /// Parse a channel from text input.
    ///
    /// Accepts `"1"`, `"dac1"`, `"channel1"`, `"gpio25"` and the same for
    /// channel 2. Input is trimmed and case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_wavegen::traits::DacChannel;
    ///
    /// assert_eq!(DacChannel::from_text("1"), Some(DacChannel::Channel1));
    /// assert_eq!(DacChannel::from_text(" DAC2 "), Some(DacChannel::Channel2));
    /// assert_eq!(DacChannel::from_text("gpio26"), Some(DacChannel::Channel2));
    /// assert_eq!(DacChannel::from_text("3"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        let matches = |options: &[&str]| options.iter().any(|o| o.eq_ignore_ascii_case(s));
        if matches(&["1", "dac1", "channel1", "gpio25"]) {
            Some(DacChannel::Channel1)
        } else if matches(&["2", "dac2", "channel2", "gpio26"]) {
            Some(DacChannel::Channel2)
        } else {
            None
        }
    }
}

/// Digital-to-analog output trait.
///
/// Implement this for anything that turns an 8-bit code into a voltage:
/// the ESP32's built-in DAC, an R-2R ladder
/// ([`R2rLadder`](crate::ladder::R2rLadder)), LEDC hardware PWM, or a
/// bit-banged PWM pin ([`BitBangPwm`](crate::bitbang::BitBangPwm)) feeding
/// an RC filter.
///
/// # Implementation Notes
///
/// - `write` is called from the sample timer callback, which may be an
///   interrupt. It must not block or allocate.
/// - `enable` must be called before the first `write`.
/// - Output voltage is roughly `Vref * code / 255`.
pub trait DacOutput {
    /// Error type for DAC operations.
    type Error;

    /// Power up the output channel.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Drive the output to `code` (0 = 0V, 255 = full scale).
    fn write(&mut self, code: u8) -> Result<(), Self::Error>;

    /// Release the output channel.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// The channel this output drives.
    fn channel(&self) -> DacChannel;
}

/// Periodic timer that calls back once per sample.
///
/// The sample rate of the generator is exactly the callback rate of this
/// timer, so implementations should be as regular as the hardware allows.
pub trait SampleTimer {
    /// Error type for timer operations.
    type Error;

    /// Start calling `callback` every `period_us` microseconds.
    ///
    /// Any previously registered callback is replaced.
    fn start_periodic<F>(&mut self, period_us: u32, callback: F) -> Result<(), Self::Error>
    where
        F: FnMut() + Send + 'static;

    /// Stop the timer and drop the callback.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Shortest period this timer can sustain, in microseconds.
    fn min_period_us(&self) -> u32 {
        1
    }
}

/// Microsecond time source.
///
/// Dynamic synthesis evaluates the waveform formula at the current time,
/// so the resolution here bounds how smooth the output can be.
///
/// # Example
///
/// ```rust
/// use rs_wavegen::traits::Clock;
/// use rs_wavegen::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.advance_us(1500);
/// assert_eq!(clock.now_us(), 1500);
/// assert_eq!(clock.now_ms(), 1);
/// ```
pub trait Clock {
    /// Microseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_us(&self) -> u64;

    /// Milliseconds since the same epoch.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

/// Heap and clock figures printed in the settings report.
pub trait SystemInfo {
    /// Currently free heap in bytes.
    fn free_heap(&self) -> u32;

    /// Lowest free heap seen since boot, in bytes.
    fn min_free_heap(&self) -> u32;

    /// CPU clock in Hz.
    fn cpu_freq_hz(&self) -> u32;

    /// APB (peripheral bus) clock in Hz. Hardware timers count this clock.
    fn apb_freq_hz(&self) -> u32;

    /// Capture all figures at once.
    fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            free_heap: self.free_heap(),
            min_free_heap: self.min_free_heap(),
            cpu_freq_hz: self.cpu_freq_hz(),
            apb_freq_hz: self.apb_freq_hz(),
        }
    }
}

/// Point-in-time copy of [`SystemInfo`] figures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Currently free heap in bytes.
    pub free_heap: u32,
    /// Lowest free heap since boot, in bytes.
    pub min_free_heap: u32,
    /// CPU clock in Hz.
    pub cpu_freq_hz: u32,
    /// APB clock in Hz.
    pub apb_freq_hz: u32,
}

impl SystemSnapshot {
    /// Free heap above the low-water mark.
    ///
    /// ```
    /// use rs_wavegen::traits::SystemSnapshot;
    ///
    /// let snap = SystemSnapshot { free_heap: 300_000, min_free_heap: 280_000, ..Default::default() };
    /// assert_eq!(snap.used_heap(), 20_000);
    /// ```
    #[inline]
    pub fn used_heap(&self) -> u32 {
        self.free_heap.saturating_sub(self.min_free_heap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // DacChannel Tests
    // =========================================================================

    #[test]
    fn dac_channel_default() {
        assert_eq!(DacChannel::default(), DacChannel::Channel1);
    }

    #[test]
    fn dac_channel_labels() {
        assert_eq!(DacChannel::Channel1.as_str(), "DAC1");
        assert_eq!(DacChannel::Channel2.as_str(), "DAC2");
    }

    #[test]
    fn dac_channel_from_text_variants() {
        assert_eq!(DacChannel::from_text("channel1"), Some(DacChannel::Channel1));
        assert_eq!(DacChannel::from_text("GPIO25"), Some(DacChannel::Channel1));
        assert_eq!(DacChannel::from_text("2"), Some(DacChannel::Channel2));
        assert_eq!(DacChannel::from_text("\tdac2\n"), Some(DacChannel::Channel2));
    }

    #[test]
    fn dac_channel_from_text_invalid() {
        assert_eq!(DacChannel::from_text(""), None);
        assert_eq!(DacChannel::from_text("dac"), None);
        assert_eq!(DacChannel::from_text("gpio27"), None);
    }

    // =========================================================================
    // Default Method Tests
    // =========================================================================

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_us(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn clock_now_ms_default_impl() {
        assert_eq!(FixedClock(0).now_ms(), 0);
        assert_eq!(FixedClock(999).now_ms(), 0);
        assert_eq!(FixedClock(2_500_000).now_ms(), 2500);
    }

    struct FixedSystem;

    impl SystemInfo for FixedSystem {
        fn free_heap(&self) -> u32 {
            1000
        }
        fn min_free_heap(&self) -> u32 {
            1200
        }
        fn cpu_freq_hz(&self) -> u32 {
            240_000_000
        }
        fn apb_freq_hz(&self) -> u32 {
            80_000_000
        }
    }

    #[test]
    fn system_snapshot_default_impl() {
        let snap = FixedSystem.snapshot();
        assert_eq!(snap.free_heap, 1000);
        assert_eq!(snap.cpu_freq_hz, 240_000_000);
        // min above free should not underflow
        assert_eq!(snap.used_heap(), 0);
    }

    struct NullTimer;

    impl SampleTimer for NullTimer {
        type Error = ();

        fn start_periodic<F>(&mut self, _period_us: u32, _callback: F) -> Result<(), ()>
        where
            F: FnMut() + Send + 'static,
        {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn sample_timer_min_period_default() {
        assert_eq!(NullTimer.min_period_us(), 1);
    }
}
