//! Quota normalization and message formatting.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::{QuotaInfo, RawQuotaResponse};

/// Zone used to render reset times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Named(Tz),
    /// System local time; abbreviation falls back to the numeric offset.
    Local,
}

impl DisplayZone {
    /// Resolve from an explicit IANA name, else the system zone, else `Local`.
    pub fn detect(preferred: Option<&str>) -> Self {
        let from_name = |name: &str| name.trim().trim_start_matches(':').parse::<Tz>().ok();
        preferred
            .and_then(from_name)
            .or_else(|| {
                iana_time_zone::get_timezone()
                    .ok()
                    .and_then(|name| from_name(&name))
            })
            .map(DisplayZone::Named)
            .unwrap_or(DisplayZone::Local)
    }
}

pub fn normalize(raw: &RawQuotaResponse, zone: DisplayZone) -> QuotaInfo {
    QuotaInfo {
        remaining_percent: format!("{:.1}", (1.0 - raw.used) * 100.0),
        used_percent: format!("{:.1}", raw.used * 100.0),
        reset_raw: raw.reset.clone(),
        reset_local: format_reset(&raw.reset, zone).unwrap_or_else(|| raw.reset.clone()),
    }
}

/// 24-hour `HH:MM ZONE`, or `None` when `reset` is not a timestamp we understand.
pub fn format_reset(reset: &str, zone: DisplayZone) -> Option<String> {
    let reset = reset.trim();
    if reset.is_empty() {
        return None;
    }
    let instant = parse_instant(reset, zone)?;
    let rendered = match zone {
        DisplayZone::Named(tz) => instant.with_timezone(&tz).format("%H:%M %Z").to_string(),
        DisplayZone::Local => instant.with_timezone(&Local).format("%H:%M %Z").to_string(),
    };
    Some(rendered)
}

// RFC 3339 first; a zone-less timestamp is read as wall time in the display zone.
fn parse_instant(reset: &str, zone: DisplayZone) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(reset) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(reset, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(reset, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    match zone {
        DisplayZone::Named(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        DisplayZone::Local => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

pub fn format_quota_message(quota: &QuotaInfo) -> String {
    format!(
        "🔋 Firmware.ai: {}% remaining ({}% used) | Resets: {}",
        quota.remaining_percent, quota.used_percent, quota.reset_local
    )
}

// Idle polls are frequent, so only the remaining figure is reported.
pub fn format_idle_message(quota: &QuotaInfo) -> String {
    format!("🔋 {}% remaining", quota.remaining_percent)
}
