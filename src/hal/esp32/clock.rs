//! ESP32 clock implementation using the ESP-IDF timer.

use crate::traits::Clock;

/// ESP32 clock using the high-resolution `esp_timer`.
///
/// `esp_timer_get_time()` returns microseconds since boot and may be
/// called from an interrupt, so the same clock works for the hardware
/// timer ISR and the timer service task.
///
/// # Example
///
/// ```ignore
/// use rs_wavegen::hal::esp32::Esp32Clock;
/// use rs_wavegen::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let start = clock.now_us();
/// // ... do work ...
/// let elapsed = clock.now_us() - start;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_us(&self) -> u64 {
        // Safe: a read of the running esp_timer counter, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        micros.max(0) as u64
    }
}
