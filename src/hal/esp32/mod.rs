//! ESP32 hardware abstraction layer for DAC waveform output.
//!
//! This module provides hardware implementations for the classic ESP32
//! (ESP32-WROOM-32 / ESP32-D0WD), the variant with a built-in 8-bit DAC.
//! Parts without a DAC (C3, S3) can use [`Esp32LedcDac`] with an RC
//! filter, or an [`R2rLadder`](crate::ladder::R2rLadder) over GPIO pins.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-WROOM-32 (Xtensa dual core 240MHz)
//! - **DAC**: two 8-bit channels, 0 to ~3.3V, on GPIO25 and GPIO26
//!   (fixed in silicon, see [`DacChannel::gpio`](crate::traits::DacChannel::gpio))
//! - **LEDC**: 8-bit PWM at 250kHz on any output-capable GPIO
//! - **Timers**: timer group 0/1, 80MHz APB clock divided down to 1MHz

mod clock;
mod dac;
mod ledc;
mod system;
mod timer;

pub use clock::Esp32Clock;
pub use dac::Esp32Dac;
pub use ledc::Esp32LedcDac;
pub use system::Esp32System;
pub use timer::{Esp32EspTimer, Esp32SampleTimer};
