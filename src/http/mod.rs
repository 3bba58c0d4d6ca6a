use crate::config::Config;
use crate::credentials::Credential;
use crate::quota::{normalize, DisplayZone};
use crate::types::{QuotaInfo, RawQuotaResponse};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("quota request timed out after {0:?}")]
    Timeout(Duration),
    #[error("quota request cancelled")]
    Cancelled,
    #[error("credential is not a valid header value")]
    InvalidCredential,
    #[error("error sending quota request: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("quota endpoint returned {0}")]
    Status(StatusCode),
    #[error("malformed quota body: {0}")]
    Body(String),
}

pub fn build_client(cfg: &Config) -> reqwest::Result<Client> {
    let mut default_headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(&cfg.user_agent) {
        default_headers.insert(USER_AGENT, ua);
    }
    // Authorization header is injected per request; the credential is not part of Config.
    Client::builder()
        .default_headers(default_headers)
        .timeout(cfg.timeout)
        .use_rustls_tls()
        .build()
}

fn auth_header(credential: &Credential) -> Result<HeaderValue, FetchError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| FetchError::InvalidCredential)?;
    value.set_sensitive(true);
    Ok(value)
}

/// One-shot quota client with a hard latency bound.
#[derive(Debug, Clone)]
pub struct QuotaFetcher {
    client: Client,
    url: String,
    timeout: Duration,
    zone: DisplayZone,
}

impl QuotaFetcher {
    pub fn new(cfg: &Config) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            url: cfg.api_url.clone(),
            timeout: cfg.timeout,
            zone: DisplayZone::detect(cfg.display_tz.as_deref()),
        })
    }

    pub fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch and normalize. Every failure mode collapses to `None`.
    pub async fn fetch(&self, credential: &Credential) -> Option<QuotaInfo> {
        match self.fetch_raw(credential).await {
            Ok(raw) => Some(normalize(&raw, self.zone)),
            Err(e) => {
                debug!("quota check for {} skipped: {}", credential.redacted(), e);
                None
            }
        }
    }

    /// Single GET bounded by `timeout`. The bound is enforced twice: a timer task
    /// cancels the in-flight request, and the whole call races a timeout of the
    /// same length, so neither a stuck transport nor a missed cancel can hang it.
    pub async fn fetch_raw(&self, credential: &Credential) -> Result<RawQuotaResponse, FetchError> {
        let auth = auth_header(credential)?;
        let cancel = CancellationToken::new();
        let _timer = TimerGuard::arm(self.timeout, cancel.clone());

        let request = async {
            tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                res = self.send(auth) => res,
            }
        };
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Err(FetchError::Cancelled)) | Err(_) => Err(FetchError::Timeout(self.timeout)),
            Ok(res) => res,
        }
    }

    async fn send(&self, auth: HeaderValue) -> Result<RawQuotaResponse, FetchError> {
        let res = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Transport(e)
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let text = res.text().await.map_err(FetchError::Transport)?;
        parse_quota_body(&text)
    }
}

pub fn parse_quota_body(text: &str) -> Result<RawQuotaResponse, FetchError> {
    let raw: RawQuotaResponse =
        serde_json::from_str(text).map_err(|e| FetchError::Body(e.to_string()))?;
    if !raw.used.is_finite() {
        return Err(FetchError::Body(format!("used is not finite: {}", raw.used)));
    }
    Ok(raw)
}

// Fires `cancel` once `after` elapses; aborted on drop so no timer outlives the call.
struct TimerGuard(JoinHandle<()>);

impl TimerGuard {
    fn arm(after: Duration, cancel: CancellationToken) -> Self {
        Self(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            cancel.cancel();
        }))
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
