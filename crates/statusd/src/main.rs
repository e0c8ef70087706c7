use anyhow::{Context, Result};
use notify_server::{NotifyConfig, NotifyServer};

mod app;
mod display_backend;
mod opts;
mod status;
mod system_stats;
mod util;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("statusd"), log_level_filter)
            .filter(Some("notify_server"), log_level_filter)
            .init();
    }

    if let Err(err) = run(opts) {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .thread_name("statusd-async-runtime")
        .enable_all()
        .build()
        .context("Failed to initialize tokio runtime")?;

    let backend = display_backend::open(opts.backend).with_context(|| format!("Failed to open {:?} backend", opts.backend))?;
    log::debug!("Publishing to {:?}", opts.backend);

    rt.block_on(async move {
        let shutdown = app::shutdown_signal()?;
        let notify = if opts.notify {
            let config = NotifyConfig { debug: opts.log_debug, ..NotifyConfig::default() };
            Some(NotifyServer::init(config).await.context("Cannot bind notification server")?)
        } else {
            None
        };

        let app = app::App { config: opts.status, notify, backend, last_line: None };
        app.run_until(shutdown).await;
        Ok::<_, anyhow::Error>(())
    })
}
