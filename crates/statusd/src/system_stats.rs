use crate::util::IterAverage;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::{
    fs::read_to_string,
    path::Path,
    sync::{Mutex, PoisonError},
};
use sysinfo::System;

struct RefreshTime(std::time::Instant);
impl RefreshTime {
    pub fn new() -> Self {
        Self(std::time::Instant::now())
    }

    pub fn next_refresh(&mut self) -> std::time::Duration {
        let now = std::time::Instant::now();
        let duration = now.duration_since(self.0);
        self.0 = now;
        duration
    }
}

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| Mutex::new(System::new()));
static COMPONENTS: Lazy<Mutex<sysinfo::Components>> = Lazy::new(|| Mutex::new(sysinfo::Components::new_with_refreshed_list()));
static NETWORKS: Lazy<Mutex<(RefreshTime, sysinfo::Networks)>> =
    Lazy::new(|| Mutex::new((RefreshTime::new(), sysinfo::Networks::new_with_refreshed_list())));

/// A sensor that can be shown on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Module {
    Cpu,
    Mem,
    Therm,
    Net,
    Battery,
}

impl Module {
    pub const DEFAULT: &'static [Module] = &[Module::Cpu, Module::Mem, Module::Therm, Module::Net, Module::Battery];

    /// Current text of this sensor, or `None` if there is nothing to show.
    pub fn read(self) -> Result<Option<String>> {
        match self {
            Module::Cpu => Ok(get_cpu()),
            Module::Mem => Ok(get_mem()),
            Module::Therm => Ok(get_temperature()),
            Module::Net => Ok(get_net()),
            Module::Battery => get_battery(Path::new("/sys/class/power_supply")),
        }
    }
}

/// Read all modules, skipping the ones that failed or have nothing to say.
pub fn read_modules(modules: &[Module]) -> Vec<String> {
    modules
        .iter()
        .filter_map(|module| match module.read() {
            Ok(text) => text,
            Err(err) => {
                log::debug!("Failed to read {:?}: {:?}", module, err);
                None
            }
        })
        .collect()
}

fn get_cpu() -> Option<String> {
    let mut system = SYSTEM.lock().unwrap_or_else(PoisonError::into_inner);
    system.refresh_cpu_specifics(sysinfo::CpuRefreshKind::everything());
    let cpus = system.cpus();
    if cpus.is_empty() {
        return None;
    }
    Some(format!("c={}%", cpus.iter().map(|cpu| cpu.cpu_usage()).avg().round() as i64))
}

fn get_mem() -> Option<String> {
    let mut system = SYSTEM.lock().unwrap_or_else(PoisonError::into_inner);
    system.refresh_memory();

    let total_memory = system.total_memory();
    if total_memory == 0 {
        return None;
    }
    let used_memory = total_memory.saturating_sub(system.available_memory());
    Some(format!("m={}%", used_memory * 100 / total_memory))
}

fn get_temperature() -> Option<String> {
    let mut components = COMPONENTS.lock().unwrap_or_else(PoisonError::into_inner);
    components.refresh();
    components
        .iter()
        .map(|c| c.temperature())
        // It is common for temperatures to report a non-numeric value.
        .filter(|t| t.is_finite())
        .reduce(f32::max)
        .map(|t| format!("t={}C", t.round() as i64))
}

fn get_net() -> Option<String> {
    let (ref mut last_refresh, ref mut networks) = &mut *NETWORKS.lock().unwrap_or_else(PoisonError::into_inner);

    networks.refresh_list();
    let elapsed = last_refresh.next_refresh().as_secs_f64();
    if networks.iter().next().is_none() || elapsed <= 0.0 {
        return None;
    }

    let (received, transmitted) =
        networks.iter().fold((0u64, 0u64), |(rx, tx), (_, data)| (rx + data.received(), tx + data.transmitted()));
    Some(format!("n={}/{}", human_rate(received as f64 / elapsed), human_rate(transmitted as f64 / elapsed)))
}

/// Format a byte rate with a B/K/M suffix.
fn human_rate(bytes_per_sec: f64) -> String {
    const KIB: f64 = 1024.0;
    if bytes_per_sec < KIB {
        format!("{:.0}B", bytes_per_sec)
    } else if bytes_per_sec < KIB * KIB {
        format!("{:.1}K", bytes_per_sec / KIB)
    } else {
        format!("{:.1}M", bytes_per_sec / (KIB * KIB))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Full,
    /// "Not charging", "Unknown", ...
    Idle,
}

impl BatteryStatus {
    fn parse(status: &str) -> Self {
        match status.trim() {
            "Charging" => BatteryStatus::Charging,
            "Discharging" => BatteryStatus::Discharging,
            "Full" => BatteryStatus::Full,
            _ => BatteryStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battery {
    pub name: String,
    pub capacity: i64,
    pub status: BatteryStatus,
}

fn get_battery(power_supply_dir: &Path) -> Result<Option<String>> {
    let batteries = read_batteries(power_supply_dir)?;
    Ok(format_batteries(&batteries))
}

/// Read every power supply that has a capacity and a status, i.e. every battery.
fn read_batteries(power_supply_dir: &Path) -> Result<Vec<Battery>> {
    let entries = power_supply_dir
        .read_dir()
        .with_context(|| format!("Couldn't read {} directory", power_supply_dir.display()))?;

    let mut batteries = Vec::new();
    for entry in entries {
        let entry = entry?.path();
        if !entry.is_dir() {
            continue;
        }
        if let (Ok(capacity), Ok(status)) = (read_to_string(entry.join("capacity")), read_to_string(entry.join("status"))) {
            batteries.push(Battery {
                name: entry.file_name().context("Couldn't get filename")?.to_string_lossy().to_string(),
                capacity: capacity.trim_end_matches('\n').parse::<f64>()?.round() as i64,
                status: BatteryStatus::parse(&status),
            });
        }
    }
    batteries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(batteries)
}

/// `=|` when every battery is full, otherwise `||` followed by ` >NN%` for each charging and
/// ` <NN%` for each discharging battery.
pub fn format_batteries(batteries: &[Battery]) -> Option<String> {
    if batteries.is_empty() {
        return None;
    }
    if batteries.iter().all(|b| b.status == BatteryStatus::Full) {
        return Some("=|".to_string());
    }

    let mut out = String::from("||");
    for battery in batteries {
        match battery.status {
            BatteryStatus::Charging => out.push_str(&format!(" >{}%", battery.capacity)),
            BatteryStatus::Discharging => out.push_str(&format!(" <{}%", battery.capacity)),
            BatteryStatus::Full | BatteryStatus::Idle => {}
        }
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn battery(name: &str, capacity: i64, status: BatteryStatus) -> Battery {
        Battery { name: name.to_string(), capacity, status }
    }

    #[test]
    fn test_all_full() {
        let batteries = vec![battery("BAT0", 100, BatteryStatus::Full), battery("BAT1", 99, BatteryStatus::Full)];
        assert_eq!(Some("=|".to_string()), format_batteries(&batteries));
    }

    #[test]
    fn test_charging_and_discharging() {
        let batteries = vec![
            battery("BAT0", 80, BatteryStatus::Charging),
            battery("BAT1", 35, BatteryStatus::Discharging),
            battery("BAT2", 50, BatteryStatus::Idle),
        ];
        assert_eq!(Some("|| >80% <35%".to_string()), format_batteries(&batteries));
    }

    #[test]
    fn test_no_batteries() {
        assert_eq!(None, format_batteries(&[]));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(BatteryStatus::Charging, BatteryStatus::parse("Charging\n"));
        assert_eq!(BatteryStatus::Discharging, BatteryStatus::parse("Discharging"));
        assert_eq!(BatteryStatus::Full, BatteryStatus::parse("Full\n"));
        assert_eq!(BatteryStatus::Idle, BatteryStatus::parse("Not charging\n"));
    }

    #[test]
    fn test_read_batteries_from_sysfs_layout() {
        let dir = std::env::temp_dir().join(format!("statusd-power-supply-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("BAT0")).unwrap();
        std::fs::create_dir_all(dir.join("AC")).unwrap();
        std::fs::write(dir.join("BAT0/capacity"), "57\n").unwrap();
        std::fs::write(dir.join("BAT0/status"), "Discharging\n").unwrap();
        std::fs::write(dir.join("AC/online"), "0\n").unwrap();

        let batteries = read_batteries(&dir).unwrap();
        assert_eq!(vec![battery("BAT0", 57, BatteryStatus::Discharging)], batteries);
        assert_eq!(Some("|| <57%".to_string()), get_battery(&dir).unwrap());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_human_rate() {
        assert_eq!("512B", human_rate(512.0));
        assert_eq!("1.5K", human_rate(1536.0));
        assert_eq!("2.0M", human_rate(2.0 * 1024.0 * 1024.0));
    }
}
