//! # rs-wavegen
//!
//! A timer-driven DAC waveform generator: precompute one cycle into a
//! table and replay it from a timer interrupt, or evaluate a sum of
//! decaying waveforms at every tick.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for DAC output, sample timers, clocks and system info
//! - **Static generation**: One cycle of sine, square, triangle, sawtooth or a composite, precomputed
//! - **Dynamic generation**: Up to eight decaying components summed live
//! - **Toggle generation**: Square wave by flipping between two levels
//! - **Runtime mode swap**: Switch between modes from the main loop without stopping the timer
//! - **Other outputs**: R-2R resistor ladders, LEDC hardware PWM, or bit-banged PWM through
//!   `embedded-hal` pins for chips without a DAC
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions, wave shapes and sample sources
//! - `waveform` - Decaying periodic components and their sums
//! - `table` - Precomputed single-cycle tables and the circular cursor
//! - `generator` - Main generator that ties sources, DAC and counters together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_wavegen::{
//!     WaveGenerator, GeneratorConfig, GenerationMode,
//!     hal::MockDac,
//!     traits::{DacChannel, Shape},
//! };
//!
//! // 1 kHz triangle at 8000 samples/s
//! let config = GeneratorConfig::default()
//!     .with_frequency_hz(1000)
//!     .with_sample_rate_hz(8000)
//!     .with_attenuation(1.0)
//!     .with_shape(Shape::Triangle);
//!
//! let mut generator = WaveGenerator::new(MockDac::new(DacChannel::Channel1), &config).unwrap();
//!
//! // Call on every timer tick
//! for tick in 0..8u64 {
//!     generator.on_tick(tick * 125).unwrap();
//! }
//! assert_eq!(generator.dac().samples, vec![127, 191, 254, 191, 127, 64, 0, 64]);
//!
//! // Swap to a square wave without rebuilding anything
//! generator.set_mode(GenerationMode::Toggle).unwrap();
//! assert_eq!(generator.on_tick(1000).unwrap(), 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Software PWM output over `embedded-hal` pins.
pub mod bitbang;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Error types for configuration and generation.
pub mod error;
/// Main generator that coordinates sources, DAC output and counters.
pub mod generator;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Parallel R-2R resistor ladder output.
pub mod ladder;
/// Startup settings report and table dump.
pub mod report;
/// Precomputed single-cycle wave tables.
pub mod table;
/// Core traits for hardware abstraction and sample generation.
pub mod traits;
/// Decaying periodic waveforms and bounded sums of them.
pub mod waveform;

// Re-exports for convenience
pub use error::{ConfigError, GeneratorError};
pub use generator::{GeneratorHandle, GeneratorState, WaveGenerator};
pub use table::{TableCursor, WaveTable};
pub use traits::{
    // Hardware
    Clock,
    DacChannel,
    DacOutput,
    // Sources
    DynamicSource,
    SampleSource,
    SampleTimer,
    // Shapes
    Shape,
    SquareToggle,
    StaticSource,
    SystemInfo,
    SystemSnapshot,
};
pub use waveform::{Waveform, WaveformSet};

// Config re-exports
pub use config::{
    Config, DeviceConfig, DiagnosticsConfig, GenerationMode, GeneratorConfig, OutputBackend,
    TimerBackend,
};
