#[cfg(target_os = "linux")]
use std::fs;
use sysinfo::{ComponentExt, System, SystemExt};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TempReading {
    pub sensor: String,
    pub celsius: f64,
}

const GPU_MARKERS: [&str; 4] = ["gpu", "nvidia", "amdgpu", "radeon"];
const CPU_MARKERS: [&str; 6] = ["cpu", "package", "tctl", "tdie", "coretemp", "k10temp"];
const ZONE_MARKERS: [&str; 3] = ["acpi", "thermal zone", "_tz"];

pub fn read_temperatures() -> Vec<TempReading> {
    let mut system = System::new();
    system.refresh_components_list();
    system.refresh_components();

    let mut temps: Vec<TempReading> = system
        .components()
        .iter()
        .map(|c| TempReading {
            sensor: c.label().to_string(),
            celsius: c.temperature() as f64,
        })
        .filter(|t| t.celsius > 0.0)
        .collect();

    let sys_count = temps.len();
    let zones = read_thermal_zones();
    debug!(
        sysinfo_temps = sys_count,
        thermal_zones = zones.len(),
        "temperature sources read"
    );
    temps.extend(zones);
    temps
}

/// Hottest CPU sensor; falls back to any non-GPU sensor, then to ACPI zones.
pub fn hottest_cpu_temperature(temps: &[TempReading]) -> Option<f64> {
    let plausible = || {
        temps
            .iter()
            .filter(|t| (0.0..=130.0).contains(&t.celsius))
            .map(|t| (t.sensor.to_lowercase(), t.celsius))
    };
    let is_gpu = |s: &str| GPU_MARKERS.iter().any(|m| s.contains(m));
    let is_zone = |s: &str| ZONE_MARKERS.iter().any(|m| s.contains(m));

    let primary = plausible()
        .filter(|(s, _)| CPU_MARKERS.iter().any(|m| s.contains(m)) && !is_gpu(s) && !is_zone(s))
        .map(|(_, c)| c)
        .max_by(|a, b| a.total_cmp(b));
    if primary.is_some() {
        return primary;
    }

    let non_gpu = plausible()
        .filter(|(s, _)| !is_gpu(s) && !is_zone(s))
        .map(|(_, c)| c)
        .max_by(|a, b| a.total_cmp(b));
    if non_gpu.is_some() {
        return non_gpu;
    }

    plausible()
        .filter(|(s, _)| is_zone(s))
        .map(|(_, c)| c)
        .max_by(|a, b| a.total_cmp(b))
}

#[cfg(target_os = "linux")]
fn read_thermal_zones() -> Vec<TempReading> {
    let Ok(entries) = fs::read_dir("/sys/class/thermal") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        if !name.starts_with("thermal_zone") {
            continue;
        }

        let Ok(raw) = fs::read_to_string(path.join("temp")) else {
            continue;
        };
        let Ok(v) = raw.trim().parse::<f64>() else {
            continue;
        };
        // Kernel reports millidegrees.
        let celsius = if v > 1000.0 { v / 1000.0 } else { v };
        if celsius <= 0.0 {
            continue;
        }
        let kind = fs::read_to_string(path.join("type"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| name.to_string());
        out.push(TempReading {
            sensor: format!("{kind} thermal zone"),
            celsius,
        });
    }

    out
}

#[cfg(not(target_os = "linux"))]
fn read_thermal_zones() -> Vec<TempReading> {
    Vec::new()
}
