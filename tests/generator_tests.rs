//! Integration tests for the waveform generator

use rs_wavegen::{
    bitbang::BitBangPwm,
    config::MIN_ESP_TIMER_PERIOD_US,
    hal::{MockClock, MockDac, MockDelay, MockPin, MockTimer},
    traits::SampleTimer,
    ConfigError, DacChannel, GenerationMode, GeneratorConfig, GeneratorError, Shape,
    TimerBackend, WaveGenerator, Waveform, WaveformSet,
};

fn dac() -> MockDac {
    MockDac::new(DacChannel::Channel1)
}

fn run(generator: &mut WaveGenerator<MockDac>, ticks: u64, period_us: u64) {
    for i in 0..ticks {
        generator.on_tick(i * period_us).unwrap();
    }
}

// ============================================================================
// Static Generation Tests
// ============================================================================

#[test]
fn default_sine_table_follows_formula() {
    let config = GeneratorConfig::default();
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 60, 6);

    let samples = &generator.dac().samples;
    assert_eq!(samples.len(), 60);
    for (i, &code) in samples.iter().enumerate() {
        let x = 2.0 * std::f64::consts::PI * i as f64 / 60.0;
        let expected = 0.8 * (127.0 + 127.0 * x.sin());
        assert!(
            (code as f64 - expected).abs() <= 1.0,
            "sample {} was {}, expected about {:.2}",
            i,
            code,
            expected
        );
    }
    assert_eq!(samples[0], 102);
    assert_eq!(samples[15], 203);
    assert_eq!(samples[45], 0);
}

#[test]
fn static_output_repeats_every_cycle() {
    let config = GeneratorConfig::default();
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 180, 6);

    let samples = &generator.dac().samples;
    for i in 60..180 {
        assert_eq!(samples[i], samples[i % 60]);
    }
}

#[test]
fn static_output_matches_precomputed_table() {
    let config = GeneratorConfig::default().with_shape(Shape::Sawtooth);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    let table = generator.table().unwrap().clone();
    run(&mut generator, 60, 6);

    assert_eq!(generator.dac().samples.as_slice(), table.as_slice());
}

#[test]
fn triangle_table_is_symmetric() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(40_000)
        .with_attenuation(1.0)
        .with_shape(Shape::Triangle);
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let table = generator.table().unwrap();

    assert_eq!(table.len(), 40);
    assert_eq!(table.get(10), 254);
    assert_eq!(table.get(30), 0);
    for i in 1..10 {
        assert_eq!(table.get(10 - i), table.get(10 + i));
    }
}

#[test]
fn composite_table_from_components() {
    let waveforms = WaveformSet::from_slice(&[
        Waveform::sine(1000.0).with_amplitude(0.5),
        Waveform::sine(2000.0).with_amplitude(0.5),
    ])
    .unwrap();
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(8000)
        .with_waveforms(waveforms);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();

    assert_eq!(generator.table().unwrap().len(), 8);
    run(&mut generator, 16, 125);
    let samples = &generator.dac().samples;
    assert_eq!(samples[0], 127);
    assert_eq!(&samples[..8], &samples[8..]);
}

// ============================================================================
// Dynamic Generation Tests
// ============================================================================

fn dynamic_config(waveforms: &[Waveform]) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_frequency_hz(100)
        .with_sample_rate_hz(10_000)
        .with_mode(GenerationMode::Dynamic)
        .with_timer(TimerBackend::EspTimer)
        .with_waveforms(WaveformSet::from_slice(waveforms).unwrap())
}

#[test]
fn dynamic_sums_components() {
    let config = dynamic_config(&[
        Waveform::sine(100.0).with_amplitude(0.5),
        Waveform::sine(300.0).with_amplitude(0.25),
    ]);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();

    // First tick fixes the time origin
    assert_eq!(generator.on_tick(5_000).unwrap(), 95);
    // Quarter period of the fundamental: 100 Hz at its peak, 300 Hz at its trough
    assert_eq!(generator.on_tick(7_500).unwrap(), 127);
}

#[test]
fn dynamic_decay_shrinks_each_cycle() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(10)
        .with_sample_rate_hz(1000)
        .with_mode(GenerationMode::Dynamic)
        .with_timer(TimerBackend::EspTimer)
        .with_waveforms(WaveformSet::single(Waveform::new(10.0, 1.0, 0.0, 5.0)));
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 300, 1000);

    let peaks: Vec<u8> = generator
        .dac()
        .samples
        .chunks(100)
        .map(|cycle| cycle.iter().copied().max().unwrap())
        .collect();
    assert_eq!(peaks.len(), 3);
    assert!(peaks[0] > peaks[1]);
    assert!(peaks[1] > peaks[2]);
    assert!(peaks[0] >= 220);
}

#[test]
fn dynamic_without_components_uses_frequency_and_shape() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(4000)
        .with_attenuation(1.0)
        .with_mode(GenerationMode::Dynamic)
        .with_timer(TimerBackend::EspTimer);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 4, 250);

    assert_eq!(generator.dac().samples, vec![127, 254, 127, 0]);
}

// ============================================================================
// Toggle Generation Tests
// ============================================================================

#[test]
fn toggle_at_twice_the_frequency() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(2000)
        .with_mode(GenerationMode::Toggle)
        .with_toggle_high(200);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 6, 500);

    assert_eq!(generator.dac().samples, vec![0, 200, 0, 200, 0, 200]);
}

#[test]
fn toggle_holds_each_level_for_half_a_cycle() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(8000)
        .with_mode(GenerationMode::Toggle);
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 8, 125);

    assert_eq!(
        generator.dac().samples,
        vec![0, 0, 0, 0, 128, 128, 128, 128]
    );
}

// ============================================================================
// Timer-Driven Tests
// ============================================================================

#[test]
fn timer_drives_generator() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let table = generator.table().unwrap().clone();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new();
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    assert_eq!(timer.run_for(&clock, 600), 600);
    assert_eq!(handle.ticks(), 600);
    assert_eq!(handle.last_sample(), table.get(599));
    assert_eq!(handle.dac_errors(), 0);
    assert!(handle.is_running());
}

#[test]
fn one_second_of_timer_ticks_plays_effective_frequency() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new();
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    // Ticks that fit in one second of 6us alarms
    let ticks = (1_000_000 / config.period_us()) as usize;
    timer.run_for(&clock, ticks);

    let cycles = handle.ticks() as f32 / config.samples_per_cycle() as f32;
    assert!((cycles - config.effective_frequency_hz()).abs() < 0.01);
    assert!(cycles < 2800.0);
}

#[test]
fn handle_swaps_modes_between_ticks() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new();
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    timer.run_for(&clock, 17);
    assert!(handle.request_mode(GenerationMode::Toggle));
    // Request is not applied until the next tick
    assert_eq!(handle.mode(), GenerationMode::Static);

    timer.run_for(&clock, 1);
    assert_eq!(handle.mode(), GenerationMode::Toggle);
    assert_eq!(handle.last_sample(), 0);

    // Static restarts from the first table entry
    assert!(handle.request_mode(GenerationMode::Static));
    timer.run_for(&clock, 1);
    assert_eq!(handle.mode(), GenerationMode::Static);
    assert_eq!(handle.last_sample(), 102);
    assert_eq!(handle.ticks(), 19);
}

#[test]
fn handle_refuses_dynamic_on_hardware_timer() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let handle = generator.handle();

    assert!(!handle.request_mode(GenerationMode::Dynamic));
    assert_eq!(handle.mode(), GenerationMode::Static);
}

#[test]
fn handle_stop_halts_ticks() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new();
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    timer.run_for(&clock, 10);
    handle.request_stop();
    timer.run_for(&clock, 10);

    assert!(!handle.is_running());
    assert_eq!(handle.ticks(), 10);
    // The callback still fires, it just does nothing
    assert_eq!(timer.fired, 20);
}

#[test]
fn dac_failures_are_counted_not_fatal() {
    let mut failing = dac();
    failing.fail_writes = true;
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(failing, &config).unwrap();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new();
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    assert_eq!(timer.run_for(&clock, 5), 5);
    assert_eq!(handle.dac_errors(), 5);
    assert_eq!(handle.ticks(), 0);
    assert!(handle.is_running());
}

#[test]
fn esp_timer_rejects_short_period() {
    let config = GeneratorConfig::default();
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let clock = MockClock::new();
    let mut timer = MockTimer::new().with_min_period(MIN_ESP_TIMER_PERIOD_US);

    assert!(timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock))
        .is_err());
    assert!(!timer.is_running());

    assert_eq!(
        config.with_timer(TimerBackend::EspTimer).validate(),
        Err(ConfigError::TimerPeriodTooShort {
            period_us: 6,
            min_us: MIN_ESP_TIMER_PERIOD_US,
        })
    );
}

#[test]
fn dynamic_on_esp_timer_with_clock() {
    let config = dynamic_config(&[Waveform::sine(100.0)]);
    let generator = WaveGenerator::new(dac(), &config).unwrap();
    let handle = generator.handle();

    let clock = MockClock::new();
    let mut timer = MockTimer::new().with_min_period(MIN_ESP_TIMER_PERIOD_US);
    timer
        .start_periodic(config.period_us(), generator.into_tick_handler(clock.clone()))
        .unwrap();

    // 100us per sample; the 26th tick lands a quarter period after the first
    timer.run_for(&clock, 26);
    assert_eq!(handle.last_sample(), 254);
    timer.run_for(&clock, 50);
    assert_eq!(handle.last_sample(), 0);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn stop_disables_dac_and_rejects_ticks() {
    let config = GeneratorConfig::default();
    let mut generator = WaveGenerator::new(dac(), &config).unwrap();
    run(&mut generator, 3, 6);

    generator.stop().unwrap();
    assert!(!generator.dac().enabled);
    assert!(matches!(generator.on_tick(100), Err(GeneratorError::Stopped)));
    assert_eq!(generator.state().ticks, 3);

    // Second stop is a no-op
    generator.stop().unwrap();
}

#[test]
fn state_reports_progress() {
    let config = GeneratorConfig::default().with_channel(DacChannel::Channel2);
    let mut generator = WaveGenerator::new(MockDac::new(DacChannel::Channel2), &config).unwrap();
    run(&mut generator, 15, 6);

    let state = generator.state();
    assert_eq!(state.mode, GenerationMode::Static);
    assert_eq!(state.ticks, 15);
    assert_eq!(state.last_sample, generator.table().unwrap().get(14));
    assert_eq!(state.table_len, 60);
    assert_eq!(generator.channel(), DacChannel::Channel2);
}

#[cfg(feature = "serde-json-core")]
#[test]
fn json_config_to_samples() {
    let config = rs_wavegen::Config::from_json(
        br#"{"generator":{"frequency_hz":1000,"sample_rate_hz":4000,"attenuation":1.0}}"#,
    )
    .unwrap();
    let mut generator = WaveGenerator::new(dac(), &config.generator).unwrap();
    run(&mut generator, 8, 250);

    assert_eq!(
        generator.dac().samples,
        vec![127, 254, 127, 0, 127, 254, 127, 0]
    );
}

// ============================================================================
// Bit-Banged PWM Tests
// ============================================================================

#[test]
fn bitbang_pwm_as_generator_output() {
    let config = GeneratorConfig::default()
        .with_frequency_hz(1000)
        .with_sample_rate_hz(4000)
        .with_attenuation(1.0);
    let pwm = BitBangPwm::new(MockPin::new(), MockDelay::new());
    let mut generator = WaveGenerator::new(pwm, &config).unwrap();

    for i in 0..4u64 {
        generator.on_tick(i * 250).unwrap();
    }

    let (pin, delay) = generator.into_dac().release();
    assert!(!pin.is_high());
    // One full PWM period per sample
    assert_eq!(delay.total_us(), 4000);
    assert_eq!(delay.delays_us(), vec![498, 502, 996, 4, 498, 502, 1000]);
}
