//! Software PWM output for chips without a DAC.
//!
//! [`BitBangPwm`] turns each 8-bit sample into one PWM period on a plain
//! GPIO: high for `sample / 255` of the period, low for the rest. An RC
//! low-pass filter on the pin recovers the analog level.
//!
//! Each [`emit`](BitBangPwm::emit) blocks for a full period, so the
//! sample rate is `1e6 / period_us`. Drive it from the main loop, not from
//! a timer interrupt.
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::bitbang::BitBangPwm;
//! use rs_wavegen::hal::{MockDelay, MockPin};
//!
//! let mut pwm = BitBangPwm::new(MockPin::new(), MockDelay::new());
//! pwm.emit(51).unwrap(); // 20% duty
//!
//! assert_eq!(pwm.pin().levels, vec![true, false]);
//! assert_eq!(pwm.delay().delays_us(), vec![200, 800]);
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::traits::{scale_code, DacChannel, DacOutput};

/// Default PWM period: 1 ms, i.e. 1 kHz.
pub const DEFAULT_PERIOD_US: u32 = 1000;

/// Bit-banged PWM on one output pin.
pub struct BitBangPwm<P, D> {
    pin: P,
    delay: D,
    period_us: u32,
    channel: DacChannel,
}

impl<P: OutputPin, D: DelayNs> BitBangPwm<P, D> {
    /// Creates an output with a [`DEFAULT_PERIOD_US`] period.
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            pin,
            delay,
            period_us: DEFAULT_PERIOD_US,
            channel: DacChannel::default(),
        }
    }

    /// Set the PWM period. Zero is treated as one microsecond.
    pub fn with_period_us(mut self, period_us: u32) -> Self {
        self.period_us = period_us.max(1);
        self
    }

    /// Set the channel this output reports through [`DacOutput::channel`].
    pub fn with_channel(mut self, channel: DacChannel) -> Self {
        self.channel = channel;
        self
    }

    /// PWM period in microseconds.
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// High time for `sample`, in microseconds.
    ///
    /// ```
    /// use rs_wavegen::bitbang::BitBangPwm;
    /// use rs_wavegen::hal::{MockDelay, MockPin};
    ///
    /// let pwm = BitBangPwm::new(MockPin::new(), MockDelay::new());
    /// assert_eq!(pwm.on_time_us(0), 0);
    /// assert_eq!(pwm.on_time_us(127), 498);
    /// assert_eq!(pwm.on_time_us(255), 1000);
    /// ```
    pub fn on_time_us(&self, sample: u8) -> u32 {
        scale_code(sample, self.period_us)
    }

    /// Output one PWM period for `sample`.
    ///
    /// A phase of zero length is skipped, so 0 stays low and 255 stays
    /// high for the whole period.
    pub fn emit(&mut self, sample: u8) -> Result<(), P::Error> {
        let on = self.on_time_us(sample);
        let off = self.period_us - on;
        if on > 0 {
            self.pin.set_high()?;
            self.delay.delay_us(on);
        }
        if off > 0 {
            self.pin.set_low()?;
            self.delay.delay_us(off);
        }
        Ok(())
    }

    /// Borrow the pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Borrow the delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Release the pin and delay
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P: OutputPin, D: DelayNs> DacOutput for BitBangPwm<P, D> {
    type Error = P::Error;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn write(&mut self, code: u8) -> Result<(), Self::Error> {
        self.emit(code)
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn channel(&self) -> DacChannel {
        self.channel
    }
}
