//! The narrow slice of the host runtime this plugin talks to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SERVICE_NAME: &str = "firmware-quota";
pub const SESSION_IDLE: &str = "session.idle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub service: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub message: String,
    pub variant: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: "info".to_string(),
        }
    }
}

/// Event delivered by the host. Only `type` is inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
}

impl HostEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: Value::Null,
        }
    }

    pub fn is_session_idle(&self) -> bool {
        self.kind == SESSION_IDLE
    }
}

/// Client handle the host passes in at activation.
#[async_trait]
pub trait HostClient: Send + Sync {
    async fn log(&self, entry: LogEntry) -> anyhow::Result<()>;
    async fn toast(&self, toast: Toast) -> anyhow::Result<()>;
}
