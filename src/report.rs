//! Human-readable startup diagnostics.
//!
//! [`SettingsReport`] renders the generator settings, and optionally the
//! CPU clock and heap figures, as a fixed-width block for the serial log.
//! [`TableDump`] lists a precomputed table one entry per line.
//!
//! ```rust
//! use rs_wavegen::config::GeneratorConfig;
//! use rs_wavegen::report::SettingsReport;
//!
//! let config = GeneratorConfig::default();
//! let text = SettingsReport::new(&config, None).to_string();
//! assert!(text.contains("Frequency            : 3000 Hz"));
//! assert!(text.contains("Samples Per Cycle    : 60"));
//! ```

use core::fmt;

use crate::config::GeneratorConfig;
use crate::table::WaveTable;
use crate::traits::SystemSnapshot;

const RULE: &str = "=======================================================";

/// Settings printout shown before the timer starts.
#[derive(Clone, Copy, Debug)]
pub struct SettingsReport<'a> {
    config: &'a GeneratorConfig,
    system: Option<SystemSnapshot>,
}

impl<'a> SettingsReport<'a> {
    /// Creates a report for `config`, with system figures if available.
    pub fn new(config: &'a GeneratorConfig, system: Option<SystemSnapshot>) -> Self {
        Self { config, system }
    }
}

impl fmt::Display for SettingsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Frequency            : {} Hz", c.frequency_hz)?;
        writeln!(
            f,
            "Effective Frequency  : {:.2} Hz",
            c.effective_frequency_hz()
        )?;
        writeln!(
            f,
            "Sample Rate          : {} samples per second",
            c.sample_rate_hz
        )?;
        writeln!(
            f,
            "Samples Per Cycle    : {} samples per cycle",
            c.samples_per_cycle()
        )?;
        writeln!(
            f,
            "Seconds Per Sample   : {:.9} s",
            c.seconds_per_sample()
        )?;
        writeln!(
            f,
            "Micros Per Sample    : {:.3} us",
            c.micros_per_sample()
        )?;
        writeln!(
            f,
            "Timer Period         : {} us ({} samples per second)",
            c.period_us(),
            c.effective_sample_rate_hz()
        )?;
        writeln!(f, "Timer                : {}", c.timer.as_str())?;
        writeln!(f, "Mode                 : {}", c.mode.as_str())?;
        writeln!(f, "Shape                : {}", c.shape.as_str())?;
        writeln!(f, "Waveforms            : {}", c.waveforms.len())?;
        writeln!(f, "Attenuation          : {:.2}", c.attenuation)?;
        writeln!(f, "Output               : {}", c.output.as_str())?;
        writeln!(
            f,
            "Channel              : {} (GPIO{})",
            c.channel.as_str(),
            c.channel.gpio()
        )?;

        if let Some(sys) = &self.system {
            writeln!(
                f,
                "Clock Speed          : {} MHz",
                sys.cpu_freq_hz / 1_000_000
            )?;
            writeln!(f, "APB Clock            : {} Hz", sys.apb_freq_hz)?;
            writeln!(f, "------Heap Info------")?;
            writeln!(f, "Free Heap            : {}", sys.free_heap)?;
            writeln!(f, "Min Free Heap        : {}", sys.min_free_heap)?;
            writeln!(f, "Used Heap            : {}", sys.used_heap())?;
        }

        write!(f, "{}", RULE)
    }
}

/// One table entry per line, as `index : code`.
///
/// ```rust
/// use rs_wavegen::report::TableDump;
/// use rs_wavegen::table::WaveTable;
///
/// let table = WaveTable::from_samples(&[127, 254]).unwrap();
/// assert_eq!(TableDump(&table).to_string(), "0 : 127\n1 : 254\n");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TableDump<'a>(pub &'a WaveTable);

impl fmt::Display for TableDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.0.iter().enumerate() {
            writeln!(f, "{} : {}", i, code)?;
        }
        Ok(())
    }
}
