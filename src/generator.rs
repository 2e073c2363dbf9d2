//! Main waveform generator that ties sources, DAC and timer together.
//!
//! This module provides [`WaveGenerator`], the central component that turns
//! timer ticks into DAC writes.
//!
//! # Overview
//!
//! The generator:
//! - Validates the configuration and prepares every sample source once
//! - Emits one sample per [`on_tick`](WaveGenerator::on_tick) call
//! - Swaps between static, dynamic and toggle generation at runtime
//! - Publishes tick counters through a [`GeneratorHandle`]
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::{WaveGenerator, GeneratorConfig, hal::MockDac, traits::DacChannel};
//!
//! let config = GeneratorConfig::default()
//!     .with_frequency_hz(1000)
//!     .with_sample_rate_hz(4000)
//!     .with_attenuation(1.0);
//!
//! let dac = MockDac::new(DacChannel::Channel1);
//! let mut generator = WaveGenerator::new(dac, &config).unwrap();
//!
//! // One timer tick per sample
//! for tick in 0..8u64 {
//!     generator.on_tick(tick * 250).unwrap();
//! }
//!
//! assert_eq!(generator.dac().samples, vec![127, 254, 127, 0, 127, 254, 127, 0]);
//! assert_eq!(generator.state().ticks, 8);
//! ```
//!
//! # Interrupt Context
//!
//! On hardware the generator lives inside the timer callback, moved there by
//! [`into_tick_handler`](WaveGenerator::into_tick_handler). The main loop
//! keeps a [`GeneratorHandle`] to read counters and post mode or stop
//! requests, which are applied at the start of the next tick:
//!
//! ```rust
//! use rs_wavegen::{WaveGenerator, GeneratorConfig, GenerationMode};
//! use rs_wavegen::hal::{MockClock, MockDac, MockTimer};
//! use rs_wavegen::traits::{DacChannel, SampleTimer};
//!
//! let config = GeneratorConfig::default();
//! let generator = WaveGenerator::new(MockDac::new(DacChannel::Channel1), &config).unwrap();
//! let handle = generator.handle();
//!
//! let clock = MockClock::new();
//! let mut timer = MockTimer::new();
//! timer
//!     .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
//!     .unwrap();
//!
//! timer.run_for(&clock, 100);
//! assert_eq!(handle.ticks(), 100);
//!
//! assert!(handle.request_mode(GenerationMode::Toggle));
//! timer.run_for(&clock, 1);
//! assert_eq!(handle.mode(), GenerationMode::Toggle);
//! assert_eq!(handle.last_sample(), 0);
//! ```

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use log::{debug, info};

use crate::config::{GenerationMode, GeneratorConfig, TimerBackend};
use crate::error::{ConfigError, GeneratorError};
use crate::table::WaveTable;
use crate::traits::{
    Clock, DacChannel, DacOutput, DynamicSource, SampleSource, SquareToggle, StaticSource,
};

const NO_REQUEST: u8 = u8::MAX;

const fn mode_code(mode: GenerationMode) -> u8 {
    match mode {
        GenerationMode::Static => 0,
        GenerationMode::Dynamic => 1,
        GenerationMode::Toggle => 2,
    }
}

const fn mode_from_code(code: u8) -> Option<GenerationMode> {
    match code {
        0 => Some(GenerationMode::Static),
        1 => Some(GenerationMode::Dynamic),
        2 => Some(GenerationMode::Toggle),
        _ => None,
    }
}

/// Counters and requests shared between the tick handler and the main loop.
///
/// 32-bit atomics only: the ESP32 has no 64-bit atomic instructions.
#[derive(Debug)]
struct Shared {
    ticks: AtomicU32,
    last_sample: AtomicU8,
    dac_errors: AtomicU32,
    running: AtomicBool,
    mode: AtomicU8,
    static_available: bool,
    dynamic_allowed: bool,
    requested_mode: AtomicU8,
    stop_requested: AtomicBool,
}

/// Main waveform generator.
///
/// Owns the DAC and all three sample sources. Every source is prepared in
/// [`new`](Self::new), so switching modes later never allocates or does
/// floating point work beyond what the new mode itself needs.
///
/// # Type Parameter
///
/// - `D`: The DAC output implementation ([`DacOutput`] trait)
///
/// # Thread Safety
///
/// The generator is driven from a single context (usually the timer
/// interrupt). Other tasks talk to it through a [`GeneratorHandle`].
pub struct WaveGenerator<D: DacOutput> {
    dac: D,
    mode: GenerationMode,
    static_source: Option<StaticSource>,
    dynamic_source: DynamicSource,
    toggle: SquareToggle,
    dynamic_allowed: bool,
    ticks: u64,
    last_sample: u8,
    running: bool,
    shared: Arc<Shared>,
}

impl<D: DacOutput> WaveGenerator<D> {
    /// Create a generator and enable the DAC channel.
    ///
    /// The static table is precomputed here when one cycle fits in a
    /// table, regardless of the starting mode.
    pub fn new(mut dac: D, config: &GeneratorConfig) -> Result<Self, GeneratorError<D::Error>> {
        config.validate()?;

        let static_source = if config.table_fits() {
            Some(StaticSource::new(config.static_table()?))
        } else {
            None
        };
        let dynamic_source = DynamicSource::new(config.dynamic_waveforms());
        let toggle = SquareToggle::new(config.toggle_high, 0, config.toggle_half_period_ticks());
        let dynamic_allowed = config.timer != TimerBackend::HardwareTimer;

        dac.enable().map_err(GeneratorError::Dac)?;

        info!(
            "Generator ready: {} Hz at {} samples/s, {} mode on {} (GPIO{})",
            config.frequency_hz,
            config.sample_rate_hz,
            config.mode.as_str(),
            dac.channel().as_str(),
            dac.channel().gpio()
        );
        if let Some(source) = &static_source {
            let (min, max) = source.table().range();
            debug!(
                "Static table: {} samples, codes {}..={}",
                source.table().len(),
                min,
                max
            );
        }

        let shared = Arc::new(Shared {
            ticks: AtomicU32::new(0),
            last_sample: AtomicU8::new(0),
            dac_errors: AtomicU32::new(0),
            running: AtomicBool::new(true),
            mode: AtomicU8::new(mode_code(config.mode)),
            static_available: static_source.is_some(),
            dynamic_allowed,
            requested_mode: AtomicU8::new(NO_REQUEST),
            stop_requested: AtomicBool::new(false),
        });

        Ok(Self {
            dac,
            mode: config.mode,
            static_source,
            dynamic_source,
            toggle,
            dynamic_allowed,
            ticks: 0,
            last_sample: 0,
            running: true,
            shared,
        })
    }

    /// Emit one sample. Call once per timer tick.
    ///
    /// Applies any pending [`GeneratorHandle`] requests first, then pulls
    /// a code from the active source and writes it to the DAC.
    ///
    /// A failed write still consumes its tick: the source has advanced, so
    /// the next tick emits the following sample and the output stays in
    /// phase with the timer. Only the tick counter and last sample are left
    /// untouched, and the failure is counted in
    /// [`GeneratorHandle::dac_errors`].
    pub fn on_tick(&mut self, now_us: u64) -> Result<u8, GeneratorError<D::Error>> {
        self.apply_requests()?;
        if !self.running {
            return Err(GeneratorError::Stopped);
        }

        let sample = match self.mode {
            GenerationMode::Static => match self.static_source.as_mut() {
                Some(source) => source.next_sample(now_us),
                None => return Err(GeneratorError::TableUnavailable),
            },
            GenerationMode::Dynamic => self.dynamic_source.next_sample(now_us),
            GenerationMode::Toggle => self.toggle.next_sample(now_us),
        };

        if let Err(e) = self.dac.write(sample) {
            self.shared.dac_errors.fetch_add(1, Ordering::Relaxed);
            return Err(GeneratorError::Dac(e));
        }

        self.ticks = self.ticks.wrapping_add(1);
        self.last_sample = sample;
        self.shared.ticks.fetch_add(1, Ordering::Relaxed);
        self.shared.last_sample.store(sample, Ordering::Relaxed);
        Ok(sample)
    }

    /// Switch generation mode.
    ///
    /// The new source restarts from its beginning: table index 0, dynamic
    /// time origin at the next tick, toggle on the low level.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::TableUnavailable`] for static mode without a table
    /// - [`ConfigError::DynamicInInterrupt`] for dynamic mode when the
    ///   generator was configured for the hardware timer
    pub fn set_mode(&mut self, mode: GenerationMode) -> Result<(), GeneratorError<D::Error>> {
        self.switch_mode(mode)?;
        info!("Generation mode set to {}", mode.as_str());
        Ok(())
    }

    /// Stop emitting and disable the DAC channel.
    ///
    /// Later ticks return [`GeneratorError::Stopped`]. Stopping twice is a no-op.
    pub fn stop(&mut self) -> Result<(), GeneratorError<D::Error>> {
        if self.running {
            self.halt()?;
            info!("Generator stopped after {} ticks", self.ticks);
        }
        Ok(())
    }

    /// Get the current state for logging
    pub fn state(&self) -> GeneratorState {
        GeneratorState {
            mode: self.mode,
            ticks: self.ticks,
            last_sample: self.last_sample,
            table_len: self.static_source.as_ref().map_or(0, |s| s.table().len()),
            running: self.running,
        }
    }

    /// A handle for reading counters and posting requests from another context.
    pub fn handle(&self) -> GeneratorHandle {
        GeneratorHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The precomputed table, if one cycle fit.
    pub fn table(&self) -> Option<&WaveTable> {
        self.static_source.as_ref().map(|s| s.table())
    }

    /// Current generation mode
    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Channel being driven
    pub fn channel(&self) -> DacChannel {
        self.dac.channel()
    }

    /// Check if the generator is still emitting
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Borrow the DAC
    pub fn dac(&self) -> &D {
        &self.dac
    }

    /// Borrow the DAC mutably
    pub fn dac_mut(&mut self) -> &mut D {
        &mut self.dac
    }

    /// Take the DAC back, leaving its enable state untouched
    pub fn into_dac(self) -> D {
        self.dac
    }

    /// Move the generator into a timer callback.
    ///
    /// Each call reads `clock` and runs one [`on_tick`](Self::on_tick).
    /// Errors are not propagated out of the callback: DAC failures are
    /// counted in [`GeneratorHandle::dac_errors`], and a stopped generator
    /// simply does nothing.
    pub fn into_tick_handler<C>(mut self, clock: C) -> impl FnMut() + Send + 'static
    where
        C: Clock + Send + 'static,
        D: Send + 'static,
    {
        move || {
            let _ = self.on_tick(clock.now_us());
        }
    }

    fn apply_requests(&mut self) -> Result<(), GeneratorError<D::Error>> {
        let stop = self.shared.stop_requested.swap(false, Ordering::Acquire);
        let code = self.shared.requested_mode.swap(NO_REQUEST, Ordering::Acquire);
        if stop && self.running {
            self.halt()?;
        }
        // A halted generator drops pending mode changes
        match mode_from_code(code) {
            Some(mode) if self.running => self.switch_mode(mode),
            _ => Ok(()),
        }
    }

    fn switch_mode(&mut self, mode: GenerationMode) -> Result<(), GeneratorError<D::Error>> {
        if mode.needs_float() && !self.dynamic_allowed {
            return Err(ConfigError::DynamicInInterrupt.into());
        }
        match mode {
            GenerationMode::Static => self
                .static_source
                .as_mut()
                .ok_or(GeneratorError::TableUnavailable)?
                .reset(),
            GenerationMode::Dynamic => self.dynamic_source.reset(),
            GenerationMode::Toggle => self.toggle.reset(),
        }
        self.mode = mode;
        self.shared.mode.store(mode_code(mode), Ordering::Relaxed);
        Ok(())
    }

    fn halt(&mut self) -> Result<(), GeneratorError<D::Error>> {
        self.running = false;
        self.shared.running.store(false, Ordering::Release);
        self.dac.disable().map_err(GeneratorError::Dac)
    }
}

/// Cloneable view of a running generator.
///
/// Reads are lock-free. Requests are picked up at the start of the next
/// tick, so they take effect within one sample period.
#[derive(Clone, Debug)]
pub struct GeneratorHandle {
    shared: Arc<Shared>,
}

impl GeneratorHandle {
    /// Samples emitted so far (wraps at `u32::MAX`)
    pub fn ticks(&self) -> u32 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Most recently written DAC code
    pub fn last_sample(&self) -> u8 {
        self.shared.last_sample.load(Ordering::Relaxed)
    }

    /// Number of failed DAC writes
    pub fn dac_errors(&self) -> u32 {
        self.shared.dac_errors.load(Ordering::Relaxed)
    }

    /// Check if the generator is still emitting
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Mode as of the last applied change
    pub fn mode(&self) -> GenerationMode {
        mode_from_code(self.shared.mode.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Ask the generator to switch mode at its next tick.
    ///
    /// Returns `false` without posting anything if the generator could not
    /// switch: static mode without a precomputed table, or dynamic mode on
    /// the hardware timer.
    pub fn request_mode(&self, mode: GenerationMode) -> bool {
        let allowed = match mode {
            GenerationMode::Static => self.shared.static_available,
            GenerationMode::Dynamic => self.shared.dynamic_allowed,
            GenerationMode::Toggle => true,
        };
        if !allowed {
            return false;
        }
        self.shared
            .requested_mode
            .store(mode_code(mode), Ordering::Release);
        true
    }

    /// Ask the generator to stop at its next tick.
    pub fn request_stop(&self) {
        self.shared.stop_requested.store(true, Ordering::Release);
    }
}

/// Snapshot of generator state.
///
/// ```rust
/// use rs_wavegen::{WaveGenerator, GeneratorConfig, GenerationMode, hal::MockDac};
/// use rs_wavegen::traits::DacChannel;
///
/// let generator =
///     WaveGenerator::new(MockDac::new(DacChannel::Channel2), &GeneratorConfig::default()).unwrap();
///
/// let state = generator.state();
/// assert_eq!(state.mode, GenerationMode::Static);
/// assert_eq!(state.ticks, 0);
/// assert_eq!(state.table_len, 60);
/// assert!(state.running);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorState {
    /// Active generation mode.
    pub mode: GenerationMode,
    /// Samples emitted since creation.
    pub ticks: u64,
    /// Last code written to the DAC.
    pub last_sample: u8,
    /// Length of the precomputed table, or 0 if there is none.
    pub table_len: usize,
    /// Whether the generator is still emitting.
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockDac;
    use crate::traits::Shape;

    fn quarter_config() -> GeneratorConfig {
        // Four samples per cycle keeps expected sequences short
        GeneratorConfig::default()
            .with_frequency_hz(1000)
            .with_sample_rate_hz(4000)
            .with_attenuation(1.0)
    }

    fn generator(config: &GeneratorConfig) -> WaveGenerator<MockDac> {
        WaveGenerator::new(MockDac::new(DacChannel::Channel1), config).unwrap()
    }

    #[test]
    fn new_enables_dac() {
        let g = generator(&quarter_config());
        assert!(g.dac().enabled);
        assert!(g.dac().samples.is_empty());
        assert!(g.is_running());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = quarter_config().with_sample_rate_hz(1000);
        let result = WaveGenerator::new(MockDac::new(DacChannel::Channel1), &config);
        assert!(matches!(
            result,
            Err(GeneratorError::Config(ConfigError::BelowNyquist { .. }))
        ));
    }

    #[test]
    fn new_propagates_dac_enable_failure() {
        let mut dac = MockDac::new(DacChannel::Channel1);
        dac.fail_enable = true;
        let result = WaveGenerator::new(dac, &quarter_config());
        assert!(matches!(result, Err(GeneratorError::Dac(()))));
    }

    #[test]
    fn static_ticks_replay_table() {
        let mut g = generator(&quarter_config());
        let out: Vec<u8> = (0..6).map(|t| g.on_tick(t).unwrap()).collect();
        assert_eq!(out, vec![127, 254, 127, 0, 127, 254]);
        assert_eq!(g.state().last_sample, 254);
    }

    #[test]
    fn toggle_mode_flips_every_half_cycle() {
        let config = quarter_config().with_mode(GenerationMode::Toggle);
        let mut g = generator(&config);
        let out: Vec<u8> = (0..8).map(|t| g.on_tick(t).unwrap()).collect();
        assert_eq!(out, vec![0, 0, 128, 128, 0, 0, 128, 128]);
    }

    #[test]
    fn dynamic_mode_follows_clock() {
        let config = quarter_config()
            .with_mode(GenerationMode::Dynamic)
            .with_timer(TimerBackend::EspTimer)
            .with_frequency_hz(100)
            .with_sample_rate_hz(10_000);
        let mut g = generator(&config);
        assert_eq!(g.on_tick(1_000).unwrap(), 127);
        // 2.5ms later is a quarter cycle of 100 Hz
        assert_eq!(g.on_tick(3_500).unwrap(), 254);
    }

    #[test]
    fn set_mode_restarts_source() {
        let mut g = generator(&quarter_config());
        g.on_tick(0).unwrap();
        g.on_tick(1).unwrap();
        g.set_mode(GenerationMode::Toggle).unwrap();
        assert_eq!(g.on_tick(2).unwrap(), 0);
        g.set_mode(GenerationMode::Static).unwrap();
        assert_eq!(g.on_tick(3).unwrap(), 127);
    }

    #[test]
    fn static_unavailable_without_table() {
        // 10 Hz at 100 kHz needs 10_000 samples: no table is built
        let config = GeneratorConfig::default()
            .with_frequency_hz(10)
            .with_sample_rate_hz(100_000)
            .with_mode(GenerationMode::Toggle);
        let mut g = generator(&config);
        assert!(g.table().is_none());
        assert_eq!(g.state().table_len, 0);
        assert!(matches!(
            g.set_mode(GenerationMode::Static),
            Err(GeneratorError::TableUnavailable)
        ));
        assert_eq!(g.mode(), GenerationMode::Toggle);
        assert!(!g.handle().request_mode(GenerationMode::Static));
    }

    #[test]
    fn stop_disables_and_rejects_ticks() {
        let mut g = generator(&quarter_config());
        g.on_tick(0).unwrap();
        g.stop().unwrap();
        assert!(!g.dac().enabled);
        assert!(!g.is_running());
        assert!(matches!(g.on_tick(1), Err(GeneratorError::Stopped)));
        assert_eq!(g.dac().samples.len(), 1);
        // Second stop is harmless
        g.stop().unwrap();
    }

    #[test]
    fn dac_failure_counted() {
        let mut g = generator(&quarter_config());
        let handle = g.handle();
        g.dac_mut().fail_writes = true;
        assert!(matches!(g.on_tick(0), Err(GeneratorError::Dac(()))));
        assert_eq!(handle.dac_errors(), 1);
        assert_eq!(handle.ticks(), 0);
        g.dac_mut().fail_writes = false;
        // The failed tick used up table slot 0
        assert_eq!(g.on_tick(1).unwrap(), 254);
        assert_eq!(handle.ticks(), 1);
        assert_eq!(handle.last_sample(), 254);
    }

    #[test]
    fn stop_discards_pending_mode_request() {
        let mut g = generator(&quarter_config());
        let handle = g.handle();

        handle.request_stop();
        assert!(handle.request_mode(GenerationMode::Toggle));
        assert!(matches!(g.on_tick(0), Err(GeneratorError::Stopped)));

        assert!(!handle.is_running());
        assert_eq!(handle.mode(), GenerationMode::Static);
        assert_eq!(g.mode(), GenerationMode::Static);
        // Nothing left queued behind the stop
        assert!(matches!(g.on_tick(1), Err(GeneratorError::Stopped)));
        assert_eq!(g.mode(), GenerationMode::Static);
    }

    #[test]
    fn generator_stays_small_with_long_table() {
        let config = GeneratorConfig::default()
            .with_frequency_hz(1)
            .with_sample_rate_hz(4096);
        let g = generator(&config);
        assert_eq!(g.table().map(|t| t.len()), Some(4096));
        // The table is heap allocated; moving the generator into a timer
        // callback must not copy the cycle through the stack
        assert!(core::mem::size_of::<WaveGenerator<MockDac>>() < 1024);
    }

    #[test]
    fn handle_requests_apply_on_next_tick() {
        let mut g = generator(&quarter_config());
        let handle = g.handle();
        g.on_tick(0).unwrap();

        assert!(handle.request_mode(GenerationMode::Toggle));
        assert_eq!(g.mode(), GenerationMode::Static);
        g.on_tick(1).unwrap();
        assert_eq!(handle.mode(), GenerationMode::Toggle);

        handle.request_stop();
        assert!(handle.is_running());
        assert!(matches!(g.on_tick(2), Err(GeneratorError::Stopped)));
        assert!(!handle.is_running());
        assert!(!g.dac().enabled);
    }

    #[test]
    fn dynamic_refused_on_hardware_timer() {
        let mut g = generator(&quarter_config());
        assert!(matches!(
            g.set_mode(GenerationMode::Dynamic),
            Err(GeneratorError::Config(ConfigError::DynamicInInterrupt))
        ));
        assert!(!g.handle().request_mode(GenerationMode::Dynamic));
        assert_eq!(g.mode(), GenerationMode::Static);
    }

    #[test]
    fn table_matches_shape() {
        let config = quarter_config().with_shape(Shape::Square);
        let g = generator(&config);
        assert_eq!(g.table().map(|t| t.as_slice()), Some(&[254u8, 254, 0, 0][..]));
    }

    #[test]
    fn mode_codes_round_trip() {
        for mode in [
            GenerationMode::Static,
            GenerationMode::Dynamic,
            GenerationMode::Toggle,
        ] {
            assert_eq!(mode_from_code(mode_code(mode)), Some(mode));
        }
        assert_eq!(mode_from_code(NO_REQUEST), None);
    }
}
