//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::config::{Config, GenerationMode, GeneratorConfig};
//! use rs_wavegen::traits::Shape;
//!
//! // Use defaults: 3 kHz sine from a 60-sample table
//! let config = Config::default();
//! assert_eq!(config.generator.samples_per_cycle(), 60);
//!
//! // Or customize
//! let config = Config::default().with_generator(
//!     GeneratorConfig::default()
//!         .with_frequency_hz(200)
//!         .with_sample_rate_hz(150_000)
//!         .with_shape(Shape::Triangle)
//!         .with_mode(GenerationMode::Static),
//! );
//! assert_eq!(config.generator.samples_per_cycle(), 750);
//! assert!(config.generator.validate().is_ok());
//! ```

use crate::error::ConfigError;
use crate::table::{WaveTable, MAX_TABLE_LEN};
use crate::traits::{DacChannel, Shape, SquareToggle};
use crate::waveform::{Waveform, WaveformSet};
use heapless::String as HString;

/// Maximum length for short config strings (device names, IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Microseconds in one second.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// ESP32 APB clock feeding the timer groups.
pub const APB_CLOCK_HZ: u32 = 80_000_000;

/// Timer prescaler giving one tick per microsecond.
pub const TIMER_DIVIDER: u32 = APB_CLOCK_HZ / MICROS_PER_SECOND;

/// Shortest period the `esp_timer` task service sustains reliably.
pub const MIN_ESP_TIMER_PERIOD_US: u32 = 50;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating on a character boundary
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Enums
// ============================================================================

/// How samples are produced on each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum GenerationMode {
    /// Replay a table computed at startup.
    #[default]
    Static,
    /// Evaluate the waveform formula at every tick.
    Dynamic,
    /// Flip between two levels.
    Toggle,
}

impl GenerationMode {
    /// Returns the mode name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Static => "static",
            GenerationMode::Dynamic => "dynamic",
            GenerationMode::Toggle => "toggle",
        }
    }

    /// Parse a mode from text input (trimmed, case-insensitive).
    ///
    /// ```
    /// use rs_wavegen::config::GenerationMode;
    ///
    /// assert_eq!(GenerationMode::from_text("Dynamic"), Some(GenerationMode::Dynamic));
    /// assert_eq!(GenerationMode::from_text(" table "), Some(GenerationMode::Static));
    /// assert_eq!(GenerationMode::from_text("square"), Some(GenerationMode::Toggle));
    /// assert_eq!(GenerationMode::from_text("fm"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        let matches = |options: &[&str]| options.iter().any(|o| o.eq_ignore_ascii_case(s));
        if matches(&["static", "table", "precomputed"]) {
            Some(GenerationMode::Static)
        } else if matches(&["dynamic", "live", "computed"]) {
            Some(GenerationMode::Dynamic)
        } else if matches(&["toggle", "square"]) {
            Some(GenerationMode::Toggle)
        } else {
            None
        }
    }

    /// Whether ticks in this mode use floating point.
    #[inline]
    pub const fn needs_float(&self) -> bool {
        matches!(self, GenerationMode::Dynamic)
    }
}

/// Which timer drives the sample clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TimerBackend {
    /// Timer-group alarm interrupt. Precise, but no floating point allowed.
    #[default]
    HardwareTimer,
    /// `esp_timer` callback on the timer service task.
    EspTimer,
}

impl TimerBackend {
    /// Returns the backend name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TimerBackend::HardwareTimer => "hardware-timer",
            TimerBackend::EspTimer => "esp-timer",
        }
    }

    /// Parse a backend from text input (trimmed, case-insensitive).
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        let matches = |options: &[&str]| options.iter().any(|o| o.eq_ignore_ascii_case(s));
        if matches(&["hardware-timer", "hardware", "hw", "isr"]) {
            Some(TimerBackend::HardwareTimer)
        } else if matches(&["esp-timer", "esp_timer", "task"]) {
            Some(TimerBackend::EspTimer)
        } else {
            None
        }
    }

    /// Shortest sample period this backend accepts, in microseconds.
    #[inline]
    pub const fn min_period_us(&self) -> u32 {
        match self {
            TimerBackend::HardwareTimer => 1,
            TimerBackend::EspTimer => MIN_ESP_TIMER_PERIOD_US,
        }
    }
}

/// Which peripheral turns codes into a voltage on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OutputBackend {
    /// Built-in 8-bit DAC on GPIO25/26.
    #[default]
    Dac,
    /// LEDC hardware PWM into an RC filter, for parts without a DAC.
    Ledc,
}

impl OutputBackend {
    /// Returns the backend name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutputBackend::Dac => "dac",
            OutputBackend::Ledc => "ledc",
        }
    }

    /// Parse a backend from text input (trimmed, case-insensitive).
    ///
    /// ```
    /// use rs_wavegen::config::OutputBackend;
    ///
    /// assert_eq!(OutputBackend::from_text("PWM"), Some(OutputBackend::Ledc));
    /// assert_eq!(OutputBackend::from_text(" dac "), Some(OutputBackend::Dac));
    /// assert_eq!(OutputBackend::from_text("i2s"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        let matches = |options: &[&str]| options.iter().any(|o| o.eq_ignore_ascii_case(s));
        if matches(&["dac", "builtin"]) {
            Some(OutputBackend::Dac)
        } else if matches(&["ledc", "pwm"]) {
            Some(OutputBackend::Ledc)
        } else {
            None
        }
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Waveform and timing configuration
    pub generator: GeneratorConfig,
    /// Device identification
    pub device: DeviceConfig,
    /// Startup report and heartbeat settings
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Set generator configuration
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set diagnostics configuration
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Parse and validate a JSON document.
    ///
    /// Missing fields take their defaults.
    ///
    /// ```
    /// use rs_wavegen::config::{Config, GenerationMode};
    ///
    /// let json = br#"{"generator":{"frequency_hz":1000,"mode":"toggle"}}"#;
    /// let config = Config::from_json(json).unwrap();
    /// assert_eq!(config.generator.frequency_hz, 1000);
    /// assert_eq!(config.generator.mode, GenerationMode::Toggle);
    /// assert_eq!(config.generator.sample_rate_hz, 180_000);
    /// ```
    #[cfg(feature = "serde-json-core")]
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        let (config, _): (Self, usize) =
            serde_json_core::from_slice(json).map_err(|_| ConfigError::Parse)?;
        config.generator.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Generator Config
// ============================================================================

/// Waveform and timing configuration.
///
/// # Derived Values
///
/// | Value | Formula |
/// |-------|---------|
/// | samples per cycle | `sample_rate / frequency` (integer) |
/// | microseconds per sample | `1e6 / sample_rate` |
/// | timer period | microseconds per sample, rounded, at least 1 |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    /// Output frequency in Hz
    pub frequency_hz: u32,
    /// Samples emitted per second
    pub sample_rate_hz: u32,
    /// Scale applied to the full-scale waveform (0.0 to 1.0)
    pub attenuation: f32,
    /// DAC channel to drive
    pub channel: DacChannel,
    /// How samples are produced
    pub mode: GenerationMode,
    /// Shape used when no waveform components are given
    pub shape: Shape,
    /// Components to sum (empty = one component from frequency/shape/attenuation)
    pub waveforms: WaveformSet,
    /// Timer driving the sample clock
    pub timer: TimerBackend,
    /// High level for toggle mode
    pub toggle_high: u8,
    /// Peripheral the samples are written to
    pub output: OutputBackend,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 3000,
            sample_rate_hz: 180_000,
            attenuation: 0.8,
            channel: DacChannel::Channel1,
            mode: GenerationMode::Static,
            shape: Shape::Sine,
            waveforms: WaveformSet::new(),
            timer: TimerBackend::HardwareTimer,
            toggle_high: SquareToggle::DEFAULT_HIGH,
            output: OutputBackend::Dac,
        }
    }
}

impl GeneratorConfig {
    /// Set the output frequency
    pub fn with_frequency_hz(mut self, hz: u32) -> Self {
        self.frequency_hz = hz;
        self
    }

    /// Set the sample rate
    pub fn with_sample_rate_hz(mut self, hz: u32) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    /// Set the attenuation
    pub fn with_attenuation(mut self, attenuation: f32) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Set the DAC channel
    pub fn with_channel(mut self, channel: DacChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the generation mode
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fallback shape
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the waveform components
    pub fn with_waveforms(mut self, waveforms: WaveformSet) -> Self {
        self.waveforms = waveforms;
        self
    }

    /// Set the timer backend
    pub fn with_timer(mut self, timer: TimerBackend) -> Self {
        self.timer = timer;
        self
    }

    /// Set the toggle-mode high level
    pub fn with_toggle_high(mut self, high: u8) -> Self {
        self.toggle_high = high;
        self
    }

    /// Set the output peripheral
    pub fn with_output(mut self, output: OutputBackend) -> Self {
        self.output = output;
        self
    }

    /// Samples in one output cycle. Zero when the frequency is zero.
    pub fn samples_per_cycle(&self) -> u32 {
        self.sample_rate_hz.checked_div(self.frequency_hz).unwrap_or(0)
    }

    /// Frequency actually produced by replaying a whole-sample cycle.
    ///
    /// This is the rate the timer really runs at after period rounding
    /// ([`effective_sample_rate_hz`](Self::effective_sample_rate_hz)),
    /// divided by the whole number of samples in one cycle.
    ///
    /// ```
    /// use rs_wavegen::config::GeneratorConfig;
    ///
    /// // 7000 does not divide 100000; 14 samples per cycle gives 7142.86 Hz
    /// let config = GeneratorConfig::default()
    ///     .with_frequency_hz(7000)
    ///     .with_sample_rate_hz(100_000);
    /// assert_eq!(config.samples_per_cycle(), 14);
    /// assert!((config.effective_frequency_hz() - 7142.857).abs() < 0.01);
    ///
    /// // 180 kHz runs at 166666 samples/s on a 6us alarm, so the
    /// // 60-sample cycle plays at 2777.8 Hz rather than 3000 Hz
    /// let config = GeneratorConfig::default();
    /// assert!((config.effective_frequency_hz() - 2777.77).abs() < 0.01);
    /// ```
    pub fn effective_frequency_hz(&self) -> f32 {
        match self.samples_per_cycle() {
            0 => 0.0,
            n => self.effective_sample_rate_hz() as f32 / n as f32,
        }
    }

    /// Exact time between samples in microseconds.
    pub fn micros_per_sample(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            0.0
        } else {
            MICROS_PER_SECOND as f64 / self.sample_rate_hz as f64
        }
    }

    /// Exact time between samples in seconds.
    pub fn seconds_per_sample(&self) -> f64 {
        self.micros_per_sample() / MICROS_PER_SECOND as f64
    }

    /// Timer alarm value in 1 MHz ticks: the sample period rounded, at least 1.
    pub fn alarm_ticks(&self) -> u64 {
        let ticks = libm::round(self.micros_per_sample()) as u64;
        ticks.max(1)
    }

    /// Timer period in microseconds.
    pub fn period_us(&self) -> u32 {
        self.alarm_ticks().min(u32::MAX as u64) as u32
    }

    /// Sample rate the timer actually runs at after period rounding.
    ///
    /// ```
    /// use rs_wavegen::config::GeneratorConfig;
    ///
    /// // 180 kHz is 5.56us per sample, rounded to a 6us alarm
    /// let config = GeneratorConfig::default();
    /// assert_eq!(config.period_us(), 6);
    /// assert_eq!(config.effective_sample_rate_hz(), 166_666);
    /// ```
    pub fn effective_sample_rate_hz(&self) -> u32 {
        MICROS_PER_SECOND / self.period_us()
    }

    /// Ticks spent on each level in toggle mode.
    pub fn toggle_half_period_ticks(&self) -> u32 {
        (self.samples_per_cycle() / 2).max(1)
    }

    /// Components evaluated in dynamic mode.
    ///
    /// Falls back to a single component built from the frequency, shape
    /// and attenuation when no components are configured.
    pub fn dynamic_waveforms(&self) -> WaveformSet {
        if self.waveforms.is_empty() {
            WaveformSet::single(
                Waveform::sine(self.frequency_hz as f32)
                    .with_amplitude(self.attenuation)
                    .with_shape(self.shape),
            )
        } else {
            self.waveforms.clone()
        }
    }

    /// Precompute the static table.
    pub fn static_table(&self) -> Result<WaveTable, ConfigError> {
        let len = self.samples_per_cycle() as usize;
        if self.waveforms.is_empty() {
            WaveTable::one_cycle(self.shape, len, self.attenuation)
        } else {
            WaveTable::from_set(&self.waveforms, len, self.sample_rate_hz)
        }
    }

    /// Whether one cycle fits in a precomputed table.
    pub fn table_fits(&self) -> bool {
        (2..=MAX_TABLE_LEN).contains(&(self.samples_per_cycle() as usize))
    }

    /// Check the configuration for the current mode and timer backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if !(0.0..=1.0).contains(&self.attenuation) {
            return Err(ConfigError::AttenuationOutOfRange {
                attenuation: self.attenuation,
            });
        }
        if self.sample_rate_hz / 2 < self.frequency_hz {
            return Err(ConfigError::BelowNyquist {
                frequency_hz: self.frequency_hz,
                sample_rate_hz: self.sample_rate_hz,
            });
        }
        self.waveforms.validate()?;

        let spc = self.samples_per_cycle();
        if self.mode == GenerationMode::Static && spc as usize > MAX_TABLE_LEN {
            return Err(ConfigError::TableTooLong {
                samples_per_cycle: spc,
                max: MAX_TABLE_LEN,
            });
        }
        if self.mode.needs_float() && self.timer == TimerBackend::HardwareTimer {
            return Err(ConfigError::DynamicInInterrupt);
        }

        let min_us = self.timer.min_period_us();
        if self.period_us() < min_us {
            return Err(ConfigError::TimerPeriodTooShort {
                period_us: self.period_us(),
                min_us,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Board or bench ID
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-wavegen"),
            id: short_string("esp32-dac"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Diagnostics Config
// ============================================================================

/// Startup report and heartbeat configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiagnosticsConfig {
    /// Log the settings report before starting the timer
    pub report_on_start: bool,
    /// Log every entry of the static table
    pub dump_table: bool,
    /// Interval between heartbeat log lines in milliseconds (0 = off)
    pub heartbeat_ms: u32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            report_on_start: true,
            dump_table: false,
            heartbeat_ms: 120_000,
        }
    }
}

impl DiagnosticsConfig {
    /// Set whether to log the settings report
    pub fn with_report_on_start(mut self, enabled: bool) -> Self {
        self.report_on_start = enabled;
        self
    }

    /// Set whether to dump the static table
    pub fn with_dump_table(mut self, enabled: bool) -> Self {
        self.dump_table = enabled;
        self
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_ms(mut self, ms: u32) -> Self {
        self.heartbeat_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
