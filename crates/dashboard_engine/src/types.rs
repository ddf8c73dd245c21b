use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Sequence number the caller attached to a command; echoed on its event.
pub type RequestSeq = u64;

/// One row of a node's job list, as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub status: String,
}

/// The `overview` block of a job detail response. Other blocks are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct JobOverview {
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobDetailBody {
    #[serde(default)]
    pub overview: JobOverview,
}

/// Query for one page of a job list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub sort_by: String,
    pub direction: String,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobsFetched {
        seq: RequestSeq,
        result: Result<Vec<JobSummary>, ApiError>,
    },
    JobDetailFetched {
        seq: RequestSeq,
        job_id: String,
        result: Result<JobOverview, ApiError>,
    },
    /// Raw `{client, server}` document.
    SettingsFetched {
        seq: RequestSeq,
        result: Result<serde_json::Value, ApiError>,
    },
    SettingsPersisted {
        seq: RequestSeq,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::HttpStatus(404)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}

/// Accepts RFC 3339 as well as the naive `2024-03-01T12:00:00.123` form the
/// backend uses for UTC times.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_with_and_without_offset() {
        let expected = Utc.with_ymd_and_hms(2022, 2, 28, 23, 21, 17).unwrap();
        assert_eq!(parse_timestamp("2022-02-28T23:21:17+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2022-02-28T23:21:17"), Some(expected));
        assert_eq!(parse_timestamp("2022-02-28 23:21:17"), Some(expected));
        assert_eq!(
            parse_timestamp("2022-03-01T01:21:17+02:00"),
            Some(expected)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn job_summary_tolerates_missing_optional_fields() {
        let summary: JobSummary = serde_json::from_value(serde_json::json!({
            "job_id": "abc",
            "start_time": "2022-02-28T23:21:17.844268",
        }))
        .unwrap();
        assert_eq!(summary.job_id, "abc");
        assert_eq!(summary.executor, "");
        assert_eq!(summary.status, "");
    }
}
