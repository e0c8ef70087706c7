use notify_server::MarqueeConfig;
use smart_default::SmartDefault;
use std::time::Duration;

use crate::system_stats::Module;

#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct StatusConfig {
    #[default(Duration::from_secs(1))]
    pub interval: Duration,

    #[default(Module::DEFAULT.to_vec())]
    pub modules: Vec<Module>,

    #[default(" | ".to_string())]
    pub delimiter: String,

    #[default = 256]
    pub max_length: usize,

    #[default("%d %b %Y - %I:%M".to_string())]
    pub date_format: String,

    pub marquee: MarqueeConfig,
}

/// Build one status line.
///
/// A notification takes the place of all sensors, since the bar is too short for both. The date
/// and time always come last.
pub fn assemble(message: Option<&str>, sensors: &[String], datetime: &str, config: &StatusConfig) -> String {
    let mut line = String::new();
    match message {
        Some(message) => {
            line.push_str(message);
            line.push_str(&config.delimiter);
        }
        None => {
            for sensor in sensors {
                line.push_str(sensor);
                line.push_str(&config.delimiter);
            }
        }
    }
    line.push_str(datetime);

    if let Some((idx, _)) = line.char_indices().nth(config.max_length) {
        line.truncate(idx);
    }
    line
}

pub fn datetime(format: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    // chrono reports invalid format strings only when writing
    if write!(out, "{}", chrono::Local::now().format(format)).is_err() {
        log::warn!("Invalid date format {:?}", format);
        out.clear();
    }
    out
}
