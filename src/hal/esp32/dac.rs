//! Built-in DAC output using the ESP-IDF oneshot DAC driver.
//!
//! The oneshot driver writes one code at a time, which is exactly what a
//! timer-driven generator needs. `dac_oneshot_output_voltage` only touches
//! a register, so it is safe to call from the timer ISR.

use esp_idf_hal::sys::{
    dac_channel_t, dac_channel_t_DAC_CHAN_0, dac_channel_t_DAC_CHAN_1, dac_oneshot_config_t,
    dac_oneshot_del_channel, dac_oneshot_handle_t, dac_oneshot_new_channel,
    dac_oneshot_output_voltage, esp, EspError,
};

use crate::traits::{DacChannel, DacOutput};

/// One ESP32 DAC channel.
///
/// The channel is acquired in [`enable`](DacOutput::enable) and released
/// in [`disable`](DacOutput::disable) or on drop.
///
/// # Example
///
/// ```ignore
/// use rs_wavegen::hal::esp32::Esp32Dac;
/// use rs_wavegen::traits::{DacChannel, DacOutput};
///
/// let mut dac = Esp32Dac::new(DacChannel::Channel1);
/// dac.enable()?;
/// dac.write(127)?; // ~1.65V on GPIO25
/// ```
pub struct Esp32Dac {
    channel: DacChannel,
    handle: Option<dac_oneshot_handle_t>,
}

// The oneshot driver handle has no thread affinity.
unsafe impl Send for Esp32Dac {}

impl Esp32Dac {
    /// Creates a disabled output for `channel`.
    pub fn new(channel: DacChannel) -> Self {
        Self {
            channel,
            handle: None,
        }
    }

    /// Whether the channel is currently acquired.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    fn chan_id(channel: DacChannel) -> dac_channel_t {
        match channel {
            DacChannel::Channel1 => dac_channel_t_DAC_CHAN_0,
            DacChannel::Channel2 => dac_channel_t_DAC_CHAN_1,
        }
    }
}

impl DacOutput for Esp32Dac {
    type Error = EspError;

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.handle.is_some() {
            return Ok(());
        }
        let config = dac_oneshot_config_t {
            chan_id: Self::chan_id(self.channel),
        };
        let mut handle: dac_oneshot_handle_t = core::ptr::null_mut();
        esp!(unsafe { dac_oneshot_new_channel(&config, &mut handle) })?;
        self.handle = Some(handle);
        Ok(())
    }

    #[inline]
    fn write(&mut self, code: u8) -> Result<(), Self::Error> {
        match self.handle {
            Some(handle) => esp!(unsafe { dac_oneshot_output_voltage(handle, code) }),
            // ESP_ERR_INVALID_STATE
            None => Err(EspError::from_infallible::<0x103>()),
        }
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        match self.handle.take() {
            Some(handle) => esp!(unsafe { dac_oneshot_del_channel(handle) }),
            None => Ok(()),
        }
    }

    fn channel(&self) -> DacChannel {
        self.channel
    }
}

impl Drop for Esp32Dac {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}
