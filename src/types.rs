use serde::{Deserialize, Serialize};

// Body returned by the quota endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawQuotaResponse {
    /// Fraction of the allowance consumed, 0.0..=1.0.
    pub used: f64,
    /// ISO-8601 instant at which the allowance resets.
    #[serde(default)]
    pub reset: String,
}

// Normalized view of one quota check; lives for a single report cycle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QuotaInfo {
    pub remaining_percent: String,
    pub used_percent: String,
    pub reset_raw: String,
    pub reset_local: String,
}
