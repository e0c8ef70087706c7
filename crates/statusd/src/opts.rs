use clap::Parser;
use notify_server::MarqueeConfig;
use std::time::Duration;

use crate::{display_backend::BackendKind, status::StatusConfig, system_stats::Module};

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub backend: BackendKind,
    pub notify: bool,
    pub status: StatusConfig,
}

/// Status line for minimalist window managers, with a built-in notification server.
#[derive(Parser, Debug, PartialEq)]
#[command(version)]
pub(crate) struct RawOpt {
    /// Write out debug logs, including every call the notification server receives.
    #[arg(long = "debug")]
    log_debug: bool,

    /// Where to publish the status line.
    #[arg(long, value_enum, default_value_t = BackendKind::default())]
    backend: BackendKind,

    /// Seconds to wait between two refreshes. Keep this low, notifications only show up on a refresh.
    #[arg(long)]
    interval: Option<u64>,

    /// Sensors to show, in order, when there is no notification.
    #[arg(long, value_enum, value_delimiter = ',')]
    modules: Option<Vec<Module>>,

    /// Text placed between two parts of the status line.
    #[arg(long)]
    delimiter: Option<String>,

    /// Maximum number of characters in the status line.
    #[arg(long)]
    max_length: Option<usize>,

    /// strftime-style format of the date and time at the end of the line.
    #[arg(long)]
    date_format: Option<String>,

    /// Notification bodies of at least this many characters scroll.
    #[arg(long)]
    marquee_width: Option<usize>,

    /// Characters per second a scrolling notification body moves by.
    #[arg(long)]
    marquee_shift: Option<usize>,

    /// Don't claim org.freedesktop.Notifications, just show sensors.
    #[arg(long)]
    no_notify: bool,
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt {
            log_debug,
            backend,
            interval,
            modules,
            delimiter,
            max_length,
            date_format,
            marquee_width,
            marquee_shift,
            no_notify,
        } = other;

        let defaults = StatusConfig::default();
        let status = StatusConfig {
            interval: interval.map(Duration::from_secs).unwrap_or(defaults.interval),
            modules: modules.unwrap_or(defaults.modules),
            delimiter: delimiter.unwrap_or(defaults.delimiter),
            max_length: max_length.unwrap_or(defaults.max_length),
            date_format: date_format.unwrap_or(defaults.date_format),
            marquee: MarqueeConfig {
                width: marquee_width.unwrap_or(defaults.marquee.width),
                shift: marquee_shift.unwrap_or(defaults.marquee.shift),
            },
        };
        Opt { log_debug, backend, notify: !no_notify, status }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Opt {
        RawOpt::parse_from(std::iter::once("statusd").chain(args.iter().copied())).into()
    }

    #[test]
    fn test_defaults() {
        let opt = parse(&[]);
        assert!(!opt.log_debug);
        assert!(opt.notify);
        assert_eq!(BackendKind::default(), opt.backend);
        assert_eq!(StatusConfig::default(), opt.status);
    }

    #[test]
    fn test_overrides() {
        let opt = parse(&[
            "--debug",
            "--backend",
            "stdout",
            "--interval",
            "5",
            "--modules",
            "battery,cpu",
            "--marquee-width",
            "40",
            "--no-notify",
        ]);
        assert!(opt.log_debug);
        assert!(!opt.notify);
        assert_eq!(BackendKind::Stdout, opt.backend);
        assert_eq!(Duration::from_secs(5), opt.status.interval);
        assert_eq!(vec![Module::Battery, Module::Cpu], opt.status.modules);
        assert_eq!(40, opt.status.marquee.width);
        assert_eq!(3, opt.status.marquee.shift);
    }
}
