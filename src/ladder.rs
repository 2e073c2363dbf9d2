//! Parallel R-2R resistor ladder DAC.
//!
//! An R-2R ladder turns `N` digital pins into an analog level of
//! `Vcc * level / (2^N - 1)`. Pin 0 carries the least significant bit.
//! The 8-bit code from the generator is scaled onto the ladder's range,
//! so a 12-bit ladder reaches 4095 at code 255 and a 4-bit ladder 15.
//!
//! Writes only touch GPIO registers, so the ladder can be driven straight
//! from the sample timer callback.
//!
//! # Example
//!
//! ```rust
//! use rs_wavegen::hal::MockPin;
//! use rs_wavegen::ladder::R2rLadder;
//! use rs_wavegen::traits::DacOutput;
//!
//! let mut ladder: R2rLadder<MockPin, 4> = R2rLadder::new(core::array::from_fn(|_| MockPin::new()));
//! ladder.enable().unwrap();
//! ladder.write(255).unwrap();
//!
//! assert_eq!(ladder.level(), 15);
//! assert!(ladder.pins().iter().all(|p| p.is_high()));
//! ```

use embedded_hal::digital::OutputPin;

use crate::traits::{scale_code, DacChannel, DacOutput};

/// R-2R ladder on `N` output pins, least significant bit first.
pub struct R2rLadder<P, const N: usize> {
    pins: [P; N],
    level: u32,
    channel: DacChannel,
}

impl<P: OutputPin, const N: usize> R2rLadder<P, N> {
    /// Largest ladder level, `2^N - 1`.
    pub const FULL_SCALE: u32 = {
        assert!(N >= 1 && N <= 16, "an R-2R ladder needs 1 to 16 bits");
        (1u32 << N) - 1
    };

    /// Creates a ladder over `pins`, `pins[0]` being the least significant bit.
    ///
    /// The pins are left untouched until [`DacOutput::enable`].
    pub fn new(pins: [P; N]) -> Self {
        Self {
            pins,
            level: 0,
            channel: DacChannel::default(),
        }
    }

    /// Set the channel this output reports through [`DacOutput::channel`].
    pub fn with_channel(mut self, channel: DacChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Ladder level for a DAC code.
    ///
    /// ```
    /// use rs_wavegen::hal::MockPin;
    /// use rs_wavegen::ladder::R2rLadder;
    ///
    /// assert_eq!(R2rLadder::<MockPin, 8>::level_for(200), 200);
    /// assert_eq!(R2rLadder::<MockPin, 12>::level_for(255), 4095);
    /// assert_eq!(R2rLadder::<MockPin, 4>::level_for(136), 8);
    /// ```
    #[inline]
    pub fn level_for(code: u8) -> u32 {
        scale_code(code, Self::FULL_SCALE)
    }

    /// Drive the pins to `level`. Bits above `N` are ignored.
    pub fn set_level(&mut self, level: u32) -> Result<(), P::Error> {
        let level = level & Self::FULL_SCALE;
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if (level >> bit) & 1 == 1 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        self.level = level;
        Ok(())
    }

    /// Level most recently driven
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Borrow the pins
    pub fn pins(&self) -> &[P; N] {
        &self.pins
    }

    /// Release the pins
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P: OutputPin, const N: usize> DacOutput for R2rLadder<P, N> {
    type Error = P::Error;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.set_level(0)
    }

    #[inline]
    fn write(&mut self, code: u8) -> Result<(), Self::Error> {
        self.set_level(Self::level_for(code))
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.set_level(0)
    }

    fn channel(&self) -> DacChannel {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::hal::MockPin;
    use crate::WaveGenerator;

    fn ladder<const N: usize>() -> R2rLadder<MockPin, N> {
        R2rLadder::new(core::array::from_fn(|_| MockPin::new()))
    }

    fn pin_bits<const N: usize>(ladder: &R2rLadder<MockPin, N>) -> u32 {
        ladder
            .pins()
            .iter()
            .enumerate()
            .map(|(bit, pin)| (pin.is_high() as u32) << bit)
            .sum()
    }

    #[test]
    fn eight_bit_ladder_mirrors_code() {
        let mut ladder = ladder::<8>();
        ladder.write(0b1010_0101).unwrap();
        assert_eq!(ladder.level(), 0b1010_0101);
        assert_eq!(pin_bits(&ladder), 0b1010_0101);
        assert!(ladder.pins()[0].is_high());
        assert!(!ladder.pins()[1].is_high());
    }

    #[test]
    fn narrow_and_wide_ladders_scale() {
        assert_eq!(R2rLadder::<MockPin, 4>::FULL_SCALE, 15);
        assert_eq!(R2rLadder::<MockPin, 12>::FULL_SCALE, 4095);

        let mut narrow = ladder::<4>();
        narrow.write(255).unwrap();
        assert_eq!(pin_bits(&narrow), 15);
        narrow.write(0).unwrap();
        assert_eq!(pin_bits(&narrow), 0);

        let mut wide = ladder::<12>();
        wide.write(255).unwrap();
        assert_eq!(pin_bits(&wide), 4095);
        wide.write(127).unwrap();
        assert_eq!(wide.level(), 2039);
    }

    #[test]
    fn set_level_masks_extra_bits() {
        let mut ladder = ladder::<4>();
        ladder.set_level(0x1F).unwrap();
        assert_eq!(ladder.level(), 0xF);
    }

    #[test]
    fn enable_and_disable_drive_zero() {
        let mut ladder = ladder::<8>();
        ladder.enable().unwrap();
        assert!(ladder.pins().iter().all(|p| p.levels == vec![false]));

        ladder.write(255).unwrap();
        ladder.disable().unwrap();
        assert_eq!(pin_bits(&ladder), 0);
    }

    #[test]
    fn drives_a_generator() {
        let config = GeneratorConfig::default()
            .with_frequency_hz(1000)
            .with_sample_rate_hz(4000)
            .with_attenuation(1.0);
        let output = ladder::<8>().with_channel(DacChannel::Channel2);
        let mut generator = WaveGenerator::new(output, &config).unwrap();
        assert_eq!(generator.channel(), DacChannel::Channel2);

        let mut levels = Vec::new();
        for t in 0..4 {
            generator.on_tick(t * 250).unwrap();
            levels.push(pin_bits(generator.dac()));
        }
        assert_eq!(levels, vec![127, 254, 127, 0]);
    }
}
