use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveTime};
use std::env;
use std::str::FromStr;

use crate::utils::attendance_window::AttendanceWindow;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub attendance_window: AttendanceWindow,
    pub report_cache_ttl_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let opens: NaiveTime = parse_or(&lookup, "TIME_IN_OPENS", "00:00:00")?;
        let closes: NaiveTime = parse_or(&lookup, "TIME_IN_CLOSES", "23:59:59")?;
        let offset_minutes: i32 = parse_or(&lookup, "ATTENDANCE_UTC_OFFSET_MINUTES", "0")?;
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("ATTENDANCE_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        if opens > closes {
            return Err(anyhow!(
                "TIME_IN_OPENS ({opens}) must not be after TIME_IN_CLOSES ({closes})"
            ));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", "900")?, // 15 min

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", "60")?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            attendance_window: AttendanceWindow::new(opens, closes, offset),
            report_cache_ttl_secs: parse_or(&lookup, "REPORT_CACHE_TTL_SECS", "30")?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {key}: {raw:?}"))
}
