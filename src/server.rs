use crate::config::Config;
use crate::host::{HostClient, HostEvent, LogEntry, Toast};
use crate::plugin::QuotaPlugin;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

// One line of stdout per host call.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum HostLine {
    Log(LogEntry),
    Toast(Toast),
}

/// Host sink that writes newline-delimited JSON to stdout.
pub struct StdioHost;

impl StdioHost {
    fn write_line(line: &HostLine) -> anyhow::Result<()> {
        let payload = serde_json::to_string(line)?;
        let mut out = io::stdout().lock();
        writeln!(out, "{}", payload)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl HostClient for StdioHost {
    async fn log(&self, entry: LogEntry) -> anyhow::Result<()> {
        Self::write_line(&HostLine::Log(entry))
    }

    async fn toast(&self, toast: Toast) -> anyhow::Result<()> {
        Self::write_line(&HostLine::Toast(toast))
    }
}

/// Activate the plugin and report once, without reading events.
pub async fn run_once(cfg: &Config) -> anyhow::Result<()> {
    let mut plugin = QuotaPlugin::activate(Arc::new(StdioHost), cfg).await;
    if let Some(task) = plugin.take_startup_task() {
        task.await?;
    }
    Ok(())
}

/// Activate the plugin, then feed it one host event per stdin line until EOF.
pub async fn run_stdio_host(cfg: &Config) -> anyhow::Result<()> {
    info!("Starting firmware-quota stdio host; endpoint={}", cfg.api_url);
    let mut plugin = QuotaPlugin::activate(Arc::new(StdioHost), cfg).await;
    let startup = plugin.take_startup_task();
    let plugin = Arc::new(plugin);

    let mut handlers = JoinSet::new();
    pump_events(BufReader::new(tokio::io::stdin()), &plugin, &mut handlers).await;

    while let Some(res) = handlers.join_next().await {
        log_handler_result(res);
    }
    if let Some(task) = startup {
        if let Err(e) = task.await {
            warn!("Startup quota check aborted: {}", e);
        }
    }
    Ok(())
}

// Reads until EOF or an I/O error; bad lines are skipped, never fatal.
async fn pump_events<R>(mut reader: R, plugin: &Arc<QuotaPlugin>, handlers: &mut JoinSet<()>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Stopped reading host events: {}", e);
                break;
            }
        }
        reap_finished(handlers);
        let Some(event) = decode_event(&buf) else {
            continue;
        };
        debug!("Received event type={}", event.kind);
        let plugin = plugin.clone();
        handlers.spawn(async move { plugin.on_event(&event).await });
    }
}

fn decode_event(raw: &[u8]) -> Option<HostEvent> {
    let line = match std::str::from_utf8(raw) {
        Ok(s) => s.trim(),
        Err(e) => {
            warn!("Ignoring host event that is not UTF-8: {}", e);
            return None;
        }
    };
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(ev) => Some(ev),
        Err(e) => {
            warn!("Ignoring malformed host event: {}", e);
            None
        }
    }
}

// Drop handles of handlers that already finished so the set tracks in-flight work only.
fn reap_finished(handlers: &mut JoinSet<()>) {
    while let Some(res) = handlers.try_join_next() {
        log_handler_result(res);
    }
}

fn log_handler_result(res: Result<(), JoinError>) {
    if let Err(e) = res {
        warn!("Event handler aborted: {}", e);
    }
}
