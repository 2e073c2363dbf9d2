//! Unit-cycle wave shapes.
//!
//! A [`Shape`] maps a phase, measured in cycles, to a value in `[-1, 1]`.
//! Everything else (frequency, amplitude, decay, DAC offset) is layered on
//! top by [`Waveform`](crate::waveform::Waveform) and
//! [`WaveTable`](crate::table::WaveTable).
//!
//! # Shapes
//!
//! | Shape | At phase 0 | Notes |
//! |-------|-----------:|-------|
//! | [`Sine`](Shape::Sine) | 0 | `sin(2πφ)` |
//! | [`Square`](Shape::Square) | 1 | High for the first half cycle |
//! | [`Triangle`](Shape::Triangle) | 0 | Peaks at a quarter cycle, like a sine |
//! | [`Sawtooth`](Shape::Sawtooth) | -1 | Linear ramp |
//! | [`SquareSeries`](Shape::SquareSeries) | 0 | Odd harmonics up to the 11th |
//! | [`TriangleSeries`](Shape::TriangleSeries) | 0 | Odd harmonics up to the 9th |
//!
//! The series shapes are band-limited approximations built from a handful
//! of sine harmonics. They ring slightly (Gibbs) and are clamped to `[-1, 1]`.
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::traits::Shape;
//!
//! assert!((Shape::Sine.value(0.25) - 1.0).abs() < 1e-6);
//! assert_eq!(Shape::Square.value(0.75), -1.0);
//! assert!((Shape::Triangle.value(0.25) - 1.0).abs() < 1e-6);
//! ```

use core::f32::consts::{PI, TAU};

/// Odd-harmonic terms summed by [`Shape::SquareSeries`] (1st through 11th).
pub const SQUARE_SERIES_TERMS: u32 = 6;

/// Odd-harmonic terms summed by [`Shape::TriangleSeries`] (1st through 9th).
pub const TRIANGLE_SERIES_TERMS: u32 = 5;

/// Periodic wave shape with unit amplitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Shape {
    /// Pure sinusoid.
    #[default]
    Sine,
    /// Ideal square wave.
    Square,
    /// Ideal triangle wave.
    Triangle,
    /// Rising ramp that drops back at the end of each cycle.
    Sawtooth,
    /// Square wave approximated by a sum of odd sine harmonics.
    SquareSeries,
    /// Triangle wave approximated by a sum of odd sine harmonics.
    TriangleSeries,
}

impl Shape {
    /// Evaluate the shape at `phase` cycles.
    ///
    /// `phase` may be any finite value; it is wrapped into `[0, 1)`.
    /// The result is always within `[-1, 1]`.
    pub fn value(&self, phase: f32) -> f32 {
        let p = wrap_phase(phase);
        match self {
            Shape::Sine => libm::sinf(TAU * p),
            Shape::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Shape::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            Shape::Sawtooth => 2.0 * p - 1.0,
            Shape::SquareSeries => {
                let x = TAU * p;
                let sum: f32 = (0..SQUARE_SERIES_TERMS)
                    .map(|i| {
                        let k = (2 * i + 1) as f32;
                        libm::sinf(k * x) / k
                    })
                    .sum();
                (sum * 4.0 / PI).clamp(-1.0, 1.0)
            }
            Shape::TriangleSeries => {
                let x = TAU * p;
                let sum: f32 = (0..TRIANGLE_SERIES_TERMS)
                    .map(|i| {
                        let k = (2 * i + 1) as f32;
                        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                        sign * libm::sinf(k * x) / (k * k)
                    })
                    .sum();
                (sum * 8.0 / (PI * PI)).clamp(-1.0, 1.0)
            }
        }
    }

    /// Returns the shape name in kebab case.
    ///
    /// ```
    /// use rs_wavegen::traits::Shape;
    ///
    /// assert_eq!(Shape::Sine.as_str(), "sine");
    /// assert_eq!(Shape::SquareSeries.as_str(), "square-series");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Shape::Sine => "sine",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Sawtooth => "sawtooth",
            Shape::SquareSeries => "square-series",
            Shape::TriangleSeries => "triangle-series",
        }
    }

    /// Parse a shape name.
    ///
    /// Accepts the [`as_str`](Self::as_str) names plus the short forms
    /// `sin`, `sq`, `tri`, `saw` and `ramp`. Trimmed and case-insensitive.
    ///
    /// ```
    /// use rs_wavegen::traits::Shape;
    ///
    /// assert_eq!(Shape::from_text("TRI"), Some(Shape::Triangle));
    /// assert_eq!(Shape::from_text("ramp"), Some(Shape::Sawtooth));
    /// assert_eq!(Shape::from_text("noise"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        let table: [(&[&str], Shape); 6] = [
            (&["sine", "sin"], Shape::Sine),
            (&["square", "sq"], Shape::Square),
            (&["triangle", "tri"], Shape::Triangle),
            (&["sawtooth", "saw", "ramp"], Shape::Sawtooth),
            (&["square-series"], Shape::SquareSeries),
            (&["triangle-series"], Shape::TriangleSeries),
        ];
        table
            .iter()
            .find(|(names, _)| names.iter().any(|n| n.eq_ignore_ascii_case(s)))
            .map(|(_, shape)| *shape)
    }
}

/// Wrap a phase into `[0, 1)`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase - libm::floorf(phase);
    // floorf rounding can leave exactly 1.0 for tiny negative inputs
    if p >= 1.0 {
        0.0
    } else {
        p
    }
}
