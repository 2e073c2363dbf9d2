//! Sample timers: the timer-group alarm ISR and the `esp_timer` task service.
//!
//! | Backend | Context | Floor | Floating point in callback |
//! |---------|---------|-------|----------------------------|
//! | [`Esp32SampleTimer`] | ISR | 1 µs tick | No |
//! | [`Esp32EspTimer`] | `esp_timer` task | ~50 µs | Yes |

use core::time::Duration;

use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::timer::{Timer, TimerConfig, TimerDriver};
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use crate::config::{MIN_ESP_TIMER_PERIOD_US, TIMER_DIVIDER};
use crate::traits::SampleTimer;

/// Hardware timer-group alarm driving the callback from an interrupt.
///
/// The counter runs at 1 MHz (80 MHz APB / 80), so the alarm value is the
/// sample period in microseconds. Auto-reload restarts the count from zero
/// on every alarm.
///
/// The callback runs in interrupt context: it must not block, allocate,
/// log, or use floating point.
///
/// # Example
///
/// ```ignore
/// use rs_wavegen::hal::esp32::Esp32SampleTimer;
/// use rs_wavegen::traits::SampleTimer;
///
/// let peripherals = Peripherals::take()?;
/// let mut timer = Esp32SampleTimer::new(peripherals.timer00)?;
/// timer.start_periodic(6, move || { /* one sample */ })?;
/// ```
pub struct Esp32SampleTimer<'d> {
    driver: TimerDriver<'d>,
}

impl<'d> Esp32SampleTimer<'d> {
    /// Creates a stopped timer on `timer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer driver cannot be installed.
    pub fn new<T: Timer>(timer: impl Peripheral<P = T> + 'd) -> Result<Self, EspError> {
        let config = TimerConfig::new().divider(TIMER_DIVIDER).auto_reload(true);
        let driver = TimerDriver::new(timer, &config)?;
        Ok(Self { driver })
    }
}

impl SampleTimer for Esp32SampleTimer<'_> {
    type Error = EspError;

    fn start_periodic<F>(&mut self, period_us: u32, callback: F) -> Result<(), Self::Error>
    where
        F: FnMut() + Send + 'static,
    {
        self.stop()?;
        self.driver.set_counter(0)?;
        self.driver.set_alarm(period_us.max(1) as u64)?;
        // Safe: the callback is 'static and owns everything it touches
        unsafe {
            self.driver.subscribe(callback)?;
        }
        self.driver.enable_interrupt()?;
        self.driver.enable_alarm(true)?;
        self.driver.enable(true)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.driver.enable(false)?;
        self.driver.enable_alarm(false)?;
        self.driver.disable_interrupt()?;
        self.driver.unsubscribe()?;
        Ok(())
    }
}

/// Periodic `esp_timer` callback on the timer service task.
///
/// Slower and less regular than the alarm ISR, but the callback runs as a
/// normal task, so dynamic synthesis with floating point is allowed.
pub struct Esp32EspTimer {
    service: EspTaskTimerService,
    timer: Option<EspTimer<'static>>,
}

impl Esp32EspTimer {
    /// Creates a stopped timer on the shared task timer service.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer service cannot be taken.
    pub fn new() -> Result<Self, EspError> {
        Ok(Self {
            service: EspTaskTimerService::new()?,
            timer: None,
        })
    }
}

impl SampleTimer for Esp32EspTimer {
    type Error = EspError;

    fn start_periodic<F>(&mut self, period_us: u32, callback: F) -> Result<(), Self::Error>
    where
        F: FnMut() + Send + 'static,
    {
        self.stop()?;
        let timer = self.service.timer(callback)?;
        timer.every(Duration::from_micros(period_us as u64))?;
        self.timer = Some(timer);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        if let Some(timer) = self.timer.take() {
            timer.cancel()?;
        }
        Ok(())
    }

    fn min_period_us(&self) -> u32 {
        MIN_ESP_TIMER_PERIOD_US
    }
}
