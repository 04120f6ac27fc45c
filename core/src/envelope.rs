//! The uniform `{timestamp, status, data}` envelope.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one API call, as shown to the user. Built fresh for every
/// call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub timestamp: DateTime<Utc>,
    pub status: Option<u16>,
    pub data: Value,
}

impl ApiResult {
    /// Stamps `data` with the current time at millisecond precision.
    pub fn new(data: Value, status: Option<u16>) -> Self {
        Self::at(Utc::now().trunc_subsecs(3), data, status)
    }

    pub fn at(timestamp: DateTime<Utc>, data: Value, status: Option<u16>) -> Self {
        Self {
            timestamp,
            status,
            data,
        }
    }

    /// Synthetic payload for a 204 response.
    pub fn no_content() -> Self {
        Self::new(serde_json::json!({"message": "No content"}), Some(204))
    }
}
