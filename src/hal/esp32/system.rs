//! Heap and clock figures from ESP-IDF.

use esp_idf_hal::sys::{esp_get_free_heap_size, esp_get_minimum_free_heap_size, ets_get_cpu_frequency};

use crate::config::APB_CLOCK_HZ;
use crate::traits::SystemInfo;

/// Reads heap and clock figures for the settings report.
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32System;

impl Esp32System {
    /// Creates a new instance.
    pub fn new() -> Self {
        Self
    }
}

impl SystemInfo for Esp32System {
    fn free_heap(&self) -> u32 {
        unsafe { esp_get_free_heap_size() }
    }

    fn min_free_heap(&self) -> u32 {
        unsafe { esp_get_minimum_free_heap_size() }
    }

    fn cpu_freq_hz(&self) -> u32 {
        // ROM call reports MHz
        unsafe { ets_get_cpu_frequency() }.saturating_mul(1_000_000)
    }

    fn apb_freq_hz(&self) -> u32 {
        APB_CLOCK_HZ
    }
}
