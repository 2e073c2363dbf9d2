//! Error types for configuration and sample generation.
//!
//! Configuration problems are detected up front by
//! [`GeneratorConfig::validate`](crate::config::GeneratorConfig::validate)
//! and reported as [`ConfigError`]. Once a generator is running, the only
//! failures left are hardware ones, carried in [`GeneratorError::Dac`].

use core::fmt;

/// Reasons a generator configuration is rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// Output frequency must be greater than zero.
    ZeroFrequency,

    /// Sample rate must be greater than zero.
    ZeroSampleRate,

    /// Attenuation must lie in `0.0..=1.0`.
    AttenuationOutOfRange {
        /// The rejected value.
        attenuation: f32,
    },

    /// Sample rate is below twice the output frequency.
    BelowNyquist {
        /// Requested output frequency.
        frequency_hz: u32,
        /// Requested sample rate.
        sample_rate_hz: u32,
    },

    /// One cycle does not fit in a precomputed table.
    TableTooLong {
        /// Samples needed for one cycle.
        samples_per_cycle: u32,
        /// Largest table supported.
        max: usize,
    },

    /// A precomputed table must hold at least one sample.
    EmptyTable,

    /// More waveform components than a [`WaveformSet`](crate::waveform::WaveformSet) holds.
    TooManyWaveforms {
        /// Capacity of the set.
        max: usize,
    },

    /// A waveform component has a non-positive frequency, an amplitude
    /// outside `0.0..=1.0`, or a negative decay constant.
    InvalidWaveform {
        /// Position of the component in the set.
        index: usize,
    },

    /// Dynamic synthesis uses floating point, which the ESP32 does not
    /// allow inside a hardware timer interrupt.
    DynamicInInterrupt,

    /// The timer backend cannot fire this often.
    TimerPeriodTooShort {
        /// Requested period.
        period_us: u32,
        /// Shortest period the backend supports.
        min_us: u32,
    },

    /// A JSON configuration document could not be parsed.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroFrequency => write!(f, "frequency must be positive"),
            ConfigError::ZeroSampleRate => write!(f, "sample rate must be positive"),
            ConfigError::AttenuationOutOfRange { attenuation } => write!(
                f,
                "attenuation must be between zero and one, found {}",
                attenuation
            ),
            ConfigError::BelowNyquist {
                frequency_hz,
                sample_rate_hz,
            } => write!(
                f,
                "sample rate {} is below twice the frequency {}",
                sample_rate_hz, frequency_hz
            ),
            ConfigError::TableTooLong {
                samples_per_cycle,
                max,
            } => write!(
                f,
                "{} samples per cycle exceeds the table limit of {}",
                samples_per_cycle, max
            ),
            ConfigError::EmptyTable => write!(f, "waveform table is empty"),
            ConfigError::TooManyWaveforms { max } => {
                write!(f, "at most {} waveforms can be summed", max)
            }
            ConfigError::InvalidWaveform { index } => {
                write!(f, "waveform {} has invalid parameters", index)
            }
            ConfigError::DynamicInInterrupt => write!(
                f,
                "dynamic generation needs the task timer, not the hardware timer interrupt"
            ),
            ConfigError::TimerPeriodTooShort { period_us, min_us } => write!(
                f,
                "timer period {}us is shorter than the {}us minimum",
                period_us, min_us
            ),
            ConfigError::Parse => write!(f, "malformed configuration document"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Errors raised by a running [`WaveGenerator`](crate::WaveGenerator).
///
/// `E` is the error type of the [`DacOutput`](crate::traits::DacOutput)
/// implementation.
#[derive(Clone, Debug, PartialEq)]
pub enum GeneratorError<E> {
    /// The configuration was rejected.
    Config(ConfigError),

    /// The DAC driver failed.
    Dac(E),

    /// The generator was stopped; no further samples are emitted.
    Stopped,

    /// Static mode was requested but no table was precomputed, because
    /// one cycle does not fit in [`MAX_TABLE_LEN`](crate::table::MAX_TABLE_LEN).
    TableUnavailable,
}

impl<E> From<ConfigError> for GeneratorError<E> {
    fn from(err: ConfigError) -> Self {
        GeneratorError::Config(err)
    }
}

impl<E: fmt::Debug> fmt::Display for GeneratorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Config(err) => write!(f, "invalid configuration: {}", err),
            GeneratorError::Dac(err) => write!(f, "DAC error: {:?}", err),
            GeneratorError::Stopped => write!(f, "generator is stopped"),
            GeneratorError::TableUnavailable => write!(f, "no precomputed table available"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for GeneratorError<E> {}
