//! Observed processor clock frequency, reported as an auxiliary counter
//! alongside timings.

use std::fs;

/// Current frequency of cpu0 in Hz, or 0 when the platform exposes nothing.
pub fn current_cpu_frequency_hz() -> u64 {
    scaling_cur_freq_khz()
        .map(|khz| khz * 1_000)
        .or_else(cpuinfo_mhz)
        .unwrap_or(0)
}

fn scaling_cur_freq_khz() -> Option<u64> {
    let raw = fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq").ok()?;
    raw.trim().parse().ok()
}

fn cpuinfo_mhz() -> Option<u64> {
    let raw = fs::read_to_string("/proc/cpuinfo").ok()?;
    for line in raw.lines() {
        if let Some(value) = line.strip_prefix("cpu MHz") {
            let mhz: f64 = value.trim_start_matches([' ', '\t', ':']).trim().parse().ok()?;
            return Some((mhz * 1.0e6) as u64);
        }
    }
    None
}
