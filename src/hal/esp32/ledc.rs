//! LEDC hardware PWM output for ESP32 parts without a DAC.
//!
//! Each code sets the duty cycle of a fast PWM carrier; an RC low-pass
//! filter on the pin recovers the analog level. Unlike
//! [`BitBangPwm`](crate::bitbang::BitBangPwm) the carrier runs in hardware,
//! so a write is a register update and does not block.
//!
//! The filter can only follow samples that are well below the carrier, so
//! keep the sample rate a few times under [`Esp32LedcDac::PWM_FREQ_HZ`].

use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

use crate::traits::{scale_code, DacChannel, DacOutput};

/// PWM output on one LEDC channel.
///
/// # Example
///
/// ```ignore
/// use rs_wavegen::hal::esp32::Esp32LedcDac;
/// use rs_wavegen::traits::DacOutput;
///
/// let peripherals = Peripherals::take()?;
/// let mut dac = Esp32LedcDac::new(
///     peripherals.pins.gpio4,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
/// )?;
/// dac.enable()?;
/// dac.write(127)?; // 50% duty
/// ```
pub struct Esp32LedcDac<'d> {
    driver: LedcDriver<'d>,
    channel: DacChannel,
}

impl<'d> Esp32LedcDac<'d> {
    /// PWM carrier frequency in Hz
    pub const PWM_FREQ_HZ: u32 = 250_000;

    /// 8-bit duty matches the DAC code range
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Creates a PWM output on `pin`, held at zero duty until enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the LEDC timer or channel cannot be configured.
    pub fn new<T, TI, C, CI, P, PI>(pin: P, timer: T, channel: C) -> Result<Self, EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let mut driver = LedcDriver::new(channel, &timer_driver, pin)?;
        driver.set_duty(0)?;

        Ok(Self {
            driver,
            channel: DacChannel::default(),
        })
    }

    /// Set the channel this output reports through [`DacOutput::channel`].
    pub fn with_channel(mut self, channel: DacChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Full-scale duty value of the configured resolution.
    #[inline]
    pub fn max_duty(&self) -> u32 {
        self.driver.get_max_duty()
    }
}

impl DacOutput for Esp32LedcDac<'_> {
    type Error = EspError;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.driver.set_duty(0)?;
        self.driver.enable()
    }

    #[inline]
    fn write(&mut self, code: u8) -> Result<(), Self::Error> {
        let duty = scale_code(code, self.max_duty());
        self.driver.set_duty(duty)
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.driver.set_duty(0)?;
        self.driver.disable()
    }

    fn channel(&self) -> DacChannel {
        self.channel
    }
}
