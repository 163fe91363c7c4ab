//! Runtime configuration read from the environment.
//!
//! Environment variables:
//! - `SCHOOL_START_TIME` / `SCHOOL_END_TIME`: school day bounds, `HH:MM` (default 07:00 / 17:00)
//! - `MIN_SESSION_MINUTES` / `MAX_SESSION_MINUTES`: session length limits (default 30 / 180)
//! - `SCHOOL_DAYS_PER_WEEK`: divisor for per-day averages (default 5)
//! - `HOST` / `PORT`: HTTP bind address (default 0.0.0.0:8080)

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Limits applied when validating and reporting on schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingPolicy {
    pub school_start: NaiveTime,
    pub school_end: NaiveTime,
    pub min_session_minutes: i64,
    pub max_session_minutes: i64,
    pub school_days: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            school_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            school_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            min_session_minutes: 30,
            max_session_minutes: 180,
            school_days: 5,
        }
    }
}

impl SchedulingPolicy {
    /// Build a policy from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let school_start = std::env::var("SCHOOL_START_TIME")
            .ok()
            .and_then(|v| parse_clock(&v))
            .unwrap_or(defaults.school_start);

        let school_end = std::env::var("SCHOOL_END_TIME")
            .ok()
            .and_then(|v| parse_clock(&v))
            .unwrap_or(defaults.school_end);

        let min_session_minutes = std::env::var("MIN_SESSION_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults.min_session_minutes);

        let max_session_minutes = std::env::var("MAX_SESSION_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults.max_session_minutes);

        let school_days = std::env::var("SCHOOL_DAYS_PER_WEEK")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(defaults.school_days);

        let policy = Self {
            school_start,
            school_end,
            min_session_minutes,
            max_session_minutes,
            school_days,
        };

        if policy.school_start >= policy.school_end {
            log::warn!(
                "Ignoring school day {} - {}: start must precede end",
                policy.school_start,
                policy.school_end
            );
            return Self {
                school_start: defaults.school_start,
                school_end: defaults.school_end,
                ..policy
            };
        }
        policy
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// HTTP bind address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
