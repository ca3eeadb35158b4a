//! Host CPU and memory sampling from `/proc`
//!
//! Degrades to 0.0 when `/proc` is unreadable; sampling must never fail the
//! flush cycle.

use std::fs;

/// Aggregate CPU usage percentage across all logical cores, 2 decimals
pub fn cpu_usage_percentage() -> f64 {
    let stat = fs::read_to_string("/proc/stat").unwrap_or_default();
    let (idle, total) = cpu_ticks(&stat);
    cpu_usage_from_ticks(idle, total)
}

/// Physical memory usage percentage, 2 decimals
pub fn memory_usage_percentage() -> f64 {
    let meminfo = fs::read_to_string("/proc/meminfo").unwrap_or_default();
    let (used, total) = memory_from_meminfo(&meminfo);
    memory_usage_from(used, total)
}

/// Usage = 100 × (1 − idle/total), rounded to 2 decimals, clamped to [0, 100]
pub fn cpu_usage_from_ticks(idle: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let usage = 1.0 - idle as f64 / total as f64;
    clamp_percentage(round2(usage * 100.0))
}

/// Usage = 100 × used/total, rounded to 2 decimals, clamped to [0, 100]
pub fn memory_usage_from(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_percentage(round2(used as f64 / total as f64 * 100.0))
}

/// Sum idle and total ticks over the per-core `cpuN` lines of /proc/stat
///
/// Line format: `cpu0 user nice system idle iowait irq softirq steal ...`
fn cpu_ticks(stat: &str) -> (u64, u64) {
    let mut idle_sum = 0u64;
    let mut total_sum = 0u64;

    for line in stat.lines() {
        let mut parts = line.split_whitespace();
        let label = match parts.next() {
            Some(label) => label,
            None => continue,
        };
        // Per-core lines only; "cpu" is the aggregate of the same counters.
        if label == "cpu" || !label.starts_with("cpu") {
            continue;
        }

        let ticks: Vec<u64> = parts.filter_map(|field| field.parse().ok()).collect();
        if ticks.len() < 4 {
            continue;
        }

        idle_sum += ticks[3];
        total_sum += ticks.iter().sum::<u64>();
    }

    (idle_sum, total_sum)
}

/// Extract (used, total) bytes from /proc/meminfo; used = MemTotal − MemFree
fn memory_from_meminfo(meminfo: &str) -> (u64, u64) {
    let mut mem_total = 0u64;
    let mut mem_free = 0u64;

    for line in meminfo.lines() {
        let mut parts = line.splitn(2, ':');
        let key = match parts.next() {
            Some(key) => key.trim(),
            None => continue,
        };
        let value_kb: u64 = parts
            .next()
            .and_then(|value| value.split_whitespace().next())
            .and_then(|number| number.parse().ok())
            .unwrap_or(0);

        match key {
            "MemTotal" => mem_total = value_kb * 1024,
            "MemFree" => mem_free = value_kb * 1024,
            _ => {}
        }
    }

    (mem_total.saturating_sub(mem_free), mem_total)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
