//! Poll orchestration: one report at activation, one per host idle event.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::credentials::{Credential, CredentialResolver};
use crate::host::{HostClient, HostEvent, LogEntry, LogLevel, Toast};
use crate::http::QuotaFetcher;
use crate::quota::{format_idle_message, format_quota_message};
use crate::types::QuotaInfo;

pub const MISSING_KEY_MESSAGE: &str =
    "No Firmware.ai API key found. Set FIRMWARE_API_KEY environment variable.";

pub struct QuotaPlugin {
    host: Arc<dyn HostClient>,
    fetcher: Option<Arc<QuotaFetcher>>,
    credential: Option<Credential>,
    startup: Option<JoinHandle<()>>,
}

impl QuotaPlugin {
    /// Activate with the standard credential chain.
    pub async fn activate(host: Arc<dyn HostClient>, cfg: &Config) -> Self {
        let fetcher = match QuotaFetcher::new(cfg) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("failed to build quota HTTP client: {}", e);
                None
            }
        };
        Self::activate_with(host, fetcher, &CredentialResolver::standard()).await
    }

    /// Resolve once, then kick off the startup check without waiting for it.
    pub async fn activate_with(
        host: Arc<dyn HostClient>,
        fetcher: Option<QuotaFetcher>,
        resolver: &CredentialResolver,
    ) -> Self {
        let fetcher = fetcher.map(Arc::new);
        let Some(credential) = resolver.resolve() else {
            info!("no Firmware.ai credential configured; quota checks disabled");
            emit_log(host.as_ref(), LogEntry::new(LogLevel::Warn, MISSING_KEY_MESSAGE)).await;
            return Self {
                host,
                fetcher,
                credential: None,
                startup: None,
            };
        };

        let startup = fetcher.clone().map(|fetcher| {
            let host = host.clone();
            let credential = credential.clone();
            tokio::spawn(async move {
                if let Some(quota) = fetcher.fetch(&credential).await {
                    report_startup(host.as_ref(), &quota).await;
                }
            })
        });

        Self {
            host,
            fetcher,
            credential: Some(credential),
            startup,
        }
    }

    pub fn is_active(&self) -> bool {
        self.credential.is_some() && self.fetcher.is_some()
    }

    /// Handle of the detached startup check, for callers that want to await it.
    pub fn take_startup_task(&mut self) -> Option<JoinHandle<()>> {
        self.startup.take()
    }

    /// Host event callback. Anything other than `session.idle` is ignored.
    pub async fn on_event(&self, event: &HostEvent) {
        if !event.is_session_idle() {
            return;
        }
        if let Some(quota) = self.check_once().await {
            emit_log(
                self.host.as_ref(),
                LogEntry::new(LogLevel::Debug, format_idle_message(&quota)),
            )
            .await;
        }
    }

    /// One fetch with the activation-time credential; `None` when inactive or failed.
    pub async fn check_once(&self) -> Option<QuotaInfo> {
        let (Some(fetcher), Some(credential)) = (&self.fetcher, &self.credential) else {
            return None;
        };
        fetcher.fetch(credential).await
    }
}

async fn report_startup(host: &dyn HostClient, quota: &QuotaInfo) {
    let message = format_quota_message(quota);
    emit_log(host, LogEntry::new(LogLevel::Info, message.clone())).await;
    if let Err(e) = host.toast(Toast::info(message)).await {
        warn!("host rejected quota toast: {}", e);
    }
}

// Host sink failures are never propagated back into the host.
async fn emit_log(host: &dyn HostClient, entry: LogEntry) {
    let level = entry.level;
    if let Err(e) = host.log(entry).await {
        warn!("host rejected {:?} log: {}", level, e);
    } else {
        debug!("emitted {:?} log to host", level);
    }
}
