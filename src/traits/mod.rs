//! Trait definitions for hardware abstraction and sample generation.
//!
//! This module defines the core abstractions that allow rs-wavegen to:
//! - Run on different hardware (ESP32 DAC, bit-banged PWM, desktop mock)
//! - Drive output from different timer backends
//! - Produce samples from tables, live synthesis or a simple toggle
//!
//! # Submodules
//!
//! - `hardware`: DAC output, sample timer, clock, system info
//! - `shape`: Unit waveform shapes
//! - `source`: Per-tick sample sources
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`DacOutput`]: 8-bit analog output channel
//! - [`SampleTimer`]: Periodic callback at the sample rate
//! - [`Clock`]: Time source for `no_std` environments
//! - [`SystemInfo`]: Heap and clock figures for the settings report
//!
//! # Sample Sources
//!
//! Each timer tick pulls one code from a [`SampleSource`]:
//!
//! - [`StaticSource`]: Replays a precomputed table
//! - [`DynamicSource`]: Evaluates a waveform sum at the current time
//! - [`SquareToggle`]: Flips between two levels

pub mod hardware;
pub mod shape;
pub mod source;

pub use hardware::*;
pub use shape::*;
pub use source::*;
