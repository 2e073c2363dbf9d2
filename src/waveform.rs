//! Decaying periodic waveforms and their sums.
//!
//! Each component follows
//!
//! ```text
//! y(t) = A · e^(-a·t) · (127 + 127 · shape(f·t + φ/2π))
//! ```
//!
//! where `A` is the amplitude (0..=1), `a` the decay constant, `f` the
//! frequency in Hz and `φ` the phase angle in radians. The `127 + 127·x`
//! term lifts the unit shape into DAC code space so that a full-amplitude,
//! undamped component swings across the whole 0..=254 range.
//!
//! A [`WaveformSet`] sums up to [`MAX_WAVEFORMS`] components in `f32`
//! and only converts to a DAC code at the very end, so resolution is not
//! lost to intermediate rounding.
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::waveform::{Waveform, WaveformSet};
//!
//! let mut set = WaveformSet::new();
//! set.push(Waveform::sine(100.0).with_amplitude(0.5)).unwrap();
//! set.push(Waveform::sine(1000.0).with_amplitude(0.1)).unwrap();
//!
//! // At t = 0 both sines sit at their midpoint
//! assert_eq!(set.sample(0.0), 76); // 0.5 * 127 + 0.1 * 127 = 76.2
//! ```

use crate::error::ConfigError;
use crate::traits::{Shape, DAC_MIDPOINT};
use core::f64::consts::TAU;

/// Maximum number of components in a [`WaveformSet`].
pub const MAX_WAVEFORMS: usize = 8;

/// One decaying periodic component.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Waveform {
    /// Frequency in cycles per second.
    pub frequency_hz: f32,
    /// Initial amplitude, 0.0 to 1.0 of full scale.
    pub amplitude: f32,
    /// Phase angle in radians.
    pub phase_rad: f32,
    /// Exponential decay constant in 1/s. Zero means no decay.
    pub decay: f32,
    /// Shape of one cycle.
    pub shape: Shape,
}

impl Default for Waveform {
    fn default() -> Self {
        Self::sine(1000.0)
    }
}

impl Waveform {
    /// Creates a decaying sine component.
    pub fn new(frequency_hz: f32, amplitude: f32, phase_rad: f32, decay: f32) -> Self {
        Self {
            frequency_hz,
            amplitude,
            phase_rad,
            decay,
            shape: Shape::Sine,
        }
    }

    /// Creates an undamped, full-amplitude sine at `frequency_hz`.
    pub fn sine(frequency_hz: f32) -> Self {
        Self::new(frequency_hz, 1.0, 0.0, 0.0)
    }

    /// Set the amplitude.
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Set the phase angle in radians.
    pub fn with_phase(mut self, phase_rad: f32) -> Self {
        self.phase_rad = phase_rad;
        self
    }

    /// Set the decay constant.
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    /// Set the shape.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Level of this component at `t_secs`, in (fractional) DAC codes.
    ///
    /// The phase is accumulated in `f64` so that long-running outputs do not
    /// drift as `f·t` grows.
    ///
    /// ```
    /// use rs_wavegen::waveform::Waveform;
    ///
    /// let w = Waveform::sine(1.0);
    /// assert!((w.level(0.0) - 127.0).abs() < 1e-3);
    /// assert!((w.level(0.25) - 254.0).abs() < 1e-3);
    /// assert!(w.level(0.75).abs() < 1e-3);
    /// ```
    pub fn level(&self, t_secs: f64) -> f32 {
        let envelope = self.amplitude * libm::expf(-self.decay * t_secs as f32);
        let cycles = self.frequency_hz as f64 * t_secs + self.phase_rad as f64 / TAU;
        let phase = (cycles - libm::floor(cycles)) as f32;
        let mid = DAC_MIDPOINT as f32;
        envelope * (mid + mid * self.shape.value(phase))
    }

    /// Whether the parameters are usable.
    pub fn is_valid(&self) -> bool {
        self.frequency_hz.is_finite()
            && self.frequency_hz > 0.0
            && (0.0..=1.0).contains(&self.amplitude)
            && self.phase_rad.is_finite()
            && self.decay.is_finite()
            && self.decay >= 0.0
    }
}

/// Convert a level to a DAC code, rounding to the nearest code and
/// saturating at the ends of the 0..=255 range. NaN maps to 0.
///
/// Rounding rather than truncating keeps zero crossings such as
/// `127 + 127·sin(π)` on 127 despite the tiny negative error of `sinf`.
///
/// ```
/// use rs_wavegen::waveform::to_dac_code;
///
/// assert_eq!(to_dac_code(127.4), 127);
/// assert_eq!(to_dac_code(126.99998), 127);
/// assert_eq!(to_dac_code(300.0), 255);
/// assert_eq!(to_dac_code(-4.0), 0);
/// assert_eq!(to_dac_code(f32::NAN), 0);
/// ```
#[inline]
pub fn to_dac_code(level: f32) -> u8 {
    if level.is_nan() {
        0
    } else {
        libm::roundf(level).clamp(0.0, u8::MAX as f32) as u8
    }
}

/// Bounded list of waveform components that are summed together.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WaveformSet {
    waveforms: heapless::Vec<Waveform, MAX_WAVEFORMS>,
}

impl WaveformSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding one component.
    pub fn single(waveform: Waveform) -> Self {
        let mut set = Self::new();
        // capacity is at least one
        let _ = set.waveforms.push(waveform);
        set
    }

    /// Creates a set from a slice of components.
    pub fn from_slice(waveforms: &[Waveform]) -> Result<Self, ConfigError> {
        let mut set = Self::new();
        for w in waveforms {
            set.push(*w)?;
        }
        Ok(set)
    }

    /// Add a component.
    ///
    /// Fails with [`ConfigError::TooManyWaveforms`] once the set is full.
    pub fn push(&mut self, waveform: Waveform) -> Result<(), ConfigError> {
        self.waveforms
            .push(waveform)
            .map_err(|_| ConfigError::TooManyWaveforms { max: MAX_WAVEFORMS })
    }

    /// Number of components.
    #[inline]
    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    /// Whether the set has no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    /// Iterate over the components.
    pub fn iter(&self) -> impl Iterator<Item = &Waveform> {
        self.waveforms.iter()
    }

    /// Check every component, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.waveforms.iter().position(|w| !w.is_valid()) {
            Some(index) => Err(ConfigError::InvalidWaveform { index }),
            None => Ok(()),
        }
    }

    /// Sum of all component levels at `t_secs`.
    pub fn level(&self, t_secs: f64) -> f32 {
        self.waveforms.iter().map(|w| w.level(t_secs)).sum()
    }

    /// DAC code for the summed level at `t_secs`.
    #[inline]
    pub fn sample(&self, t_secs: f64) -> u8 {
        to_dac_code(self.level(t_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Waveform Tests
    // =========================================================================

    #[test]
    fn sine_defaults() {
        let w = Waveform::sine(200.0);
        assert_eq!(w.frequency_hz, 200.0);
        assert_eq!(w.amplitude, 1.0);
        assert_eq!(w.phase_rad, 0.0);
        assert_eq!(w.decay, 0.0);
        assert_eq!(w.shape, Shape::Sine);
    }

    #[test]
    fn builder_chain() {
        let w = Waveform::sine(10.0)
            .with_amplitude(0.8)
            .with_phase(1.57)
            .with_decay(0.1)
            .with_shape(Shape::Triangle);
        assert_eq!(w, Waveform {
            frequency_hz: 10.0,
            amplitude: 0.8,
            phase_rad: 1.57,
            decay: 0.1,
            shape: Shape::Triangle,
        });
    }

    #[test]
    fn amplitude_scales_level() {
        let w = Waveform::sine(1.0).with_amplitude(0.5);
        assert!((w.level(0.25) - 127.0).abs() < 1e-3);
    }

    #[test]
    fn phase_shifts_level() {
        // A quarter-cycle phase starts the sine at its peak
        let w = Waveform::sine(1.0).with_phase(core::f32::consts::FRAC_PI_2);
        assert!((w.level(0.0) - 254.0).abs() < 1e-2);
    }

    #[test]
    fn decay_shrinks_envelope() {
        let w = Waveform::sine(1.0).with_decay(1.0);
        let early = w.level(0.25);
        let late = w.level(2.25);
        assert!(late < early);
        // e^-2.25 relative to e^-0.25 is e^-2
        assert!((late / early - libm::expf(-2.0)).abs() < 1e-3);
    }

    #[test]
    fn long_running_phase_stays_accurate() {
        // Ten hours in, a 1 kHz sine should still be at its midpoint on whole cycles
        let w = Waveform::sine(1000.0);
        assert!((w.level(36_000.0) - 127.0).abs() < 0.5);
    }

    #[test]
    fn validity_checks() {
        assert!(Waveform::sine(1.0).is_valid());
        assert!(!Waveform::sine(0.0).is_valid());
        assert!(!Waveform::sine(-5.0).is_valid());
        assert!(!Waveform::sine(1.0).with_amplitude(1.5).is_valid());
        assert!(!Waveform::sine(1.0).with_decay(-0.1).is_valid());
        assert!(!Waveform::sine(f32::NAN).is_valid());
    }

    // =========================================================================
    // WaveformSet Tests
    // =========================================================================

    #[test]
    fn set_capacity_enforced() {
        let mut set = WaveformSet::new();
        for _ in 0..MAX_WAVEFORMS {
            set.push(Waveform::sine(1.0).with_amplitude(0.1)).unwrap();
        }
        assert_eq!(set.len(), MAX_WAVEFORMS);
        assert_eq!(
            set.push(Waveform::sine(1.0)),
            Err(ConfigError::TooManyWaveforms { max: MAX_WAVEFORMS })
        );
    }

    #[test]
    fn set_sum_saturates() {
        let set = WaveformSet::from_slice(&[Waveform::sine(1.0), Waveform::sine(1.0)]).unwrap();
        // Two full-scale peaks would be 508
        assert_eq!(set.sample(0.25), 255);
        assert_eq!(set.sample(0.75), 0);
    }

    #[test]
    fn empty_set_is_silent() {
        let set = WaveformSet::new();
        assert!(set.is_empty());
        assert_eq!(set.sample(0.5), 0);
    }

    #[test]
    fn set_validate_reports_index() {
        let set = WaveformSet::from_slice(&[
            Waveform::sine(1.0),
            Waveform::sine(2.0),
            Waveform::sine(3.0).with_amplitude(2.0),
        ])
        .unwrap();
        assert_eq!(set.validate(), Err(ConfigError::InvalidWaveform { index: 2 }));
    }

    #[test]
    fn single_holds_one() {
        let set = WaveformSet::single(Waveform::sine(50.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|w| w.frequency_hz), Some(50.0));
    }
}
