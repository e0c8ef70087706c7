use anyhow::{Context, Result};
use notify_server::NotifyServer;
use std::future::Future;

use crate::{display_backend::DisplayBackend, print_result_err, status, system_stats};

pub struct App {
    pub config: status::StatusConfig,
    pub notify: Option<NotifyServer>,
    pub backend: Box<dyn DisplayBackend>,
    pub last_line: Option<String>,
}

impl App {
    /// Handle pending notification calls first, and refresh the status line whenever there is
    /// nothing left to handle. Returns once `shutdown` completes.
    ///
    /// `shutdown` lives for the whole loop, so a request that comes in while a call is being
    /// handled or the line is being refreshed is seen at the next sleep.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            if let Some(notify) = &mut self.notify {
                if notify.check().await {
                    continue;
                }
            }
            self.refresh().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = &mut shutdown => {
                    log::info!("Shutting down");
                    break;
                }
            }
        }

        if let Some(notify) = self.notify.take() {
            print_result_err!("while releasing the notification service", notify.shutdown().await);
        }
    }

    async fn refresh(&mut self) {
        let message = match &mut self.notify {
            Some(notify) => notify.poll_current_message(&self.config.marquee).await,
            None => None,
        };
        let sensors = if message.is_none() { system_stats::read_modules(&self.config.modules) } else { Vec::new() };
        let datetime = status::datetime(&self.config.date_format);
        let line = status::assemble(message.as_deref(), &sensors, &datetime, &self.config);

        if self.last_line.as_deref() != Some(line.as_str()) {
            log::debug!("New status line: {}", line);
            print_result_err!("while publishing the status line", self.backend.publish(&line));
            self.last_line = Some(line);
        }
    }
}

/// Resolves on the first SIGINT or SIGTERM. The handlers are installed right away, so signals
/// received before the returned future is first polled are not lost.
///
/// Must be called from within a tokio runtime.
pub fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut interrupt = signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}
