//! ESP32 DAC waveform generator.
//!
//! This is the main entry point for the hardware generator. It:
//! - Loads the configuration (compile-time JSON or defaults)
//! - Logs the settings report and, optionally, the static table
//! - Enables the DAC channel (or LEDC PWM) and arms the sample timer
//! - Logs a heartbeat with the measured sample rate
//!
//! # Hardware Setup
//!
//! Scope or amplifier on GPIO25 (DAC1) or GPIO26 (DAC2), ground to GND.
//! With `"output":"ledc"` the PWM comes out on GPIO4; put an RC low-pass
//! filter between the pin and the scope.
//!
//! # Build
//!
//! ```bash
//! # Defaults: 3 kHz sine, 180k samples/s, DAC1
//! cargo build --release --features esp32
//!
//! # Custom configuration
//! WAVEGEN_CONFIG='{"generator":{"frequency_hz":200,"sample_rate_hz":150000}}' \
//!     cargo build --release --features esp32
//! ```

use anyhow::Context;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::timer::TIMER00;
use esp_idf_svc::log::EspLogger;
use log::{info, warn};
use rs_wavegen::hal::esp32::{
    Esp32Clock, Esp32Dac, Esp32EspTimer, Esp32LedcDac, Esp32SampleTimer, Esp32System,
};
use rs_wavegen::report::{SettingsReport, TableDump};
use rs_wavegen::traits::{Clock, DacOutput, SampleTimer, SystemInfo};
use rs_wavegen::{Config, GeneratorHandle, OutputBackend, TimerBackend, WaveGenerator};
use std::fmt::Debug;
use std::thread;
use std::time::Duration;

/// Main loop wake-up interval when the heartbeat is off.
const IDLE_INTERVAL_MS: u64 = 1000;

/// GPIO carrying the LEDC PWM output.
const PWM_OUT_GPIO: u8 = 4;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  rs-wavegen ESP32 DAC Generator");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = match option_env!("WAVEGEN_CONFIG") {
        Some(json) => Config::from_json(json.as_bytes()).context("invalid WAVEGEN_CONFIG")?,
        None => Config::default(),
    };
    let gen_config = &config.generator;
    println!(
        "[OK] Configuration loaded ({} / {})",
        config.device.name, config.device.id
    );

    if config.diagnostics.report_on_start {
        let system = Esp32System::new().snapshot();
        info!("\n{}", SettingsReport::new(gen_config, Some(system)));
    }

    // =========================================================================
    // Select Output
    // =========================================================================
    let peripherals = Peripherals::take()?;
    match gen_config.output {
        OutputBackend::Dac => {
            let dac = Esp32Dac::new(gen_config.channel);
            println!(
                "[OK] DAC output ({} on GPIO{})",
                gen_config.channel.as_str(),
                gen_config.channel.gpio()
            );
            run(dac, &config, peripherals.timer00)
        }
        OutputBackend::Ledc => {
            let dac = Esp32LedcDac::new(
                peripherals.pins.gpio4,
                peripherals.ledc.timer0,
                peripherals.ledc.channel0,
            )?
            .with_channel(gen_config.channel);
            println!(
                "[OK] LEDC PWM output (GPIO{}, {} Hz carrier)",
                PWM_OUT_GPIO,
                Esp32LedcDac::PWM_FREQ_HZ
            );
            run(dac, &config, peripherals.timer00)
        }
    }
}

/// Build the generator on `dac`, start the configured sample timer and
/// hand over to the heartbeat.
fn run<D>(dac: D, config: &Config, timer00: TIMER00) -> anyhow::Result<()>
where
    D: DacOutput + Send + 'static,
    D::Error: Debug + Send + Sync + 'static,
{
    let gen_config = &config.generator;

    // =========================================================================
    // Initialize Generator
    // =========================================================================
    let generator = WaveGenerator::new(dac, gen_config)?;
    println!("[OK] Generator ready ({} mode)", gen_config.mode.as_str());

    if config.diagnostics.dump_table {
        match generator.table() {
            Some(table) => info!("Static table:\n{}", TableDump(table)),
            None => warn!("No static table to dump"),
        }
    }

    let handle = generator.handle();
    let on_tick = generator.into_tick_handler(Esp32Clock::new());
    let period_us = gen_config.period_us();

    // =========================================================================
    // Start Sample Timer
    // =========================================================================
    match gen_config.timer {
        TimerBackend::HardwareTimer => {
            let mut timer = Esp32SampleTimer::new(timer00)?;
            timer.start_periodic(period_us, on_tick)?;
            println!("[OK] Hardware timer started ({} us period)", period_us);
            run_heartbeat(&handle, config.diagnostics.heartbeat_ms)
        }
        TimerBackend::EspTimer => {
            let mut timer = Esp32EspTimer::new()?;
            timer.start_periodic(period_us, on_tick)?;
            println!("[OK] esp_timer started ({} us period)", period_us);
            run_heartbeat(&handle, config.diagnostics.heartbeat_ms)
        }
    }
}

/// Log tick counters forever. The timer keeps running in the background.
fn run_heartbeat(handle: &GeneratorHandle, heartbeat_ms: u32) -> ! {
    let clock = Esp32Clock::new();
    let mut last_ticks = handle.ticks();
    let mut last_us = clock.now_us();
    let mut last_errors = 0;

    println!();
    println!("Generating...");
    println!();

    loop {
        let interval_ms = match heartbeat_ms {
            0 => IDLE_INTERVAL_MS,
            ms => ms as u64,
        };
        thread::sleep(Duration::from_millis(interval_ms));

        let errors = handle.dac_errors();
        if errors != last_errors {
            warn!("{} DAC write errors", errors - last_errors);
            last_errors = errors;
        }
        if !handle.is_running() {
            warn!("Generator stopped");
            continue;
        }
        if heartbeat_ms == 0 {
            continue;
        }

        let ticks = handle.ticks();
        let now_us = clock.now_us();
        let elapsed_s = now_us.saturating_sub(last_us) as f64 / 1_000_000.0;
        let emitted = ticks.wrapping_sub(last_ticks);
        let rate = if elapsed_s > 0.0 {
            emitted as f64 / elapsed_s
        } else {
            0.0
        };
        info!(
            "{} mode: {} samples in {:.1}s ({:.0} samples/s), last code {}",
            handle.mode().as_str(),
            emitted,
            elapsed_s,
            rate,
            handle.last_sample()
        );
        last_ticks = ticks;
        last_us = now_us;
    }
}
