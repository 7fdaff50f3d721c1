//! Remote write destinations shared by the metrics and integrations sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

/// A remote write endpoint.
///
/// ## Fields
/// - `url`: endpoint receiving samples (required)
/// - `name`: optional identifier used in logs and metrics
/// - `remote_timeout`: request timeout (default: 30s)
/// - `headers`: extra HTTP headers sent with each request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemoteWriteConfig {
    #[validate(url)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_remote_timeout", with = "humantime_serde")]
    pub remote_timeout: Duration,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>
}

fn default_remote_timeout() -> Duration {
    Duration::from_secs(30)
}

impl RemoteWriteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            remote_timeout: default_remote_timeout(),
            headers: BTreeMap::new()
        }
    }
}
