use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platforms a project can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Platform::Youtube => write!(f, "youtube"),
            Platform::Tiktok => write!(f, "tiktok"),
            Platform::Instagram => write!(f, "instagram"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            other => Err(format!(
                "Unknown platform: {} (expected youtube, tiktok, or instagram)",
                other
            )),
        }
    }
}

/// Body of `POST /schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub project_id: String,
    pub platforms: Vec<Platform>,
    pub scheduled_time: DateTime<Utc>,
}

/// Whether the backend accepted the schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn platform_parse_round_trip() {
        for name in ["youtube", "tiktok", "instagram"] {
            let platform: Platform = name.parse().unwrap();
            assert_eq!(platform.to_string(), name);
        }
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn schedule_request_wire_shape() {
        let req = ScheduleRequest {
            project_id: "p1".into(),
            platforms: vec![Platform::Youtube, Platform::Tiktok],
            scheduled_time: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["project_id"], "p1");
        assert_eq!(json["platforms"][0], "youtube");
        assert!(json["scheduled_time"].as_str().unwrap().starts_with("2026-09-01T08:00:00"));
    }
}
