//! Firmware.ai quota reporting for agent runtimes.
//!
//! [`plugin::QuotaPlugin`] is the entry point a host embeds: it resolves an API key
//! once, reports the remaining quota at activation and again on every
//! `session.idle` event. Failures never reach the host; a check that cannot
//! complete within the configured bound is simply not reported.

pub mod config;
pub mod credentials;
pub mod host;
pub mod http;
pub mod plugin;
pub mod quota;
pub mod server;
pub mod types;
