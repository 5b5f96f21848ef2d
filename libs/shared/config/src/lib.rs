use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 600;
pub const DEFAULT_SCHEDULE_WINDOW_DAYS: u32 = 7;
pub const MIN_SCHEDULE_WINDOW_DAYS: u32 = 1;
pub const MAX_SCHEDULE_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: String,
    pub bind_addr: String,
    pub sweep_interval_seconds: u64,
    pub schedule_window_days: u32,
    pub clinic_utc_offset: FixedOffset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_token: String::new(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            schedule_window_days: DEFAULT_SCHEDULE_WINDOW_DAYS,
            clinic_utc_offset: utc(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_token: env::var("SUPABASE_SERVICE_TOKEN")
                .unwrap_or_default(),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            sweep_interval_seconds: parse_or_default(
                "OVERDUE_SWEEP_INTERVAL_SECONDS",
                env::var("OVERDUE_SWEEP_INTERVAL_SECONDS").ok(),
                DEFAULT_SWEEP_INTERVAL_SECONDS,
            ),
            schedule_window_days: bound_window_days(parse_or_default(
                "SCHEDULE_WINDOW_DAYS",
                env::var("SCHEDULE_WINDOW_DAYS").ok(),
                DEFAULT_SCHEDULE_WINDOW_DAYS,
            )),
            clinic_utc_offset: parse_offset_or_utc(env::var("CLINIC_UTC_OFFSET").ok()),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - appointments will be kept in memory");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Bearer token used for store calls made by the service itself.
    pub fn store_token(&self) -> &str {
        if self.supabase_service_token.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_token
        }
    }

    pub fn clinic_timezone(&self) -> FixedOffset {
        self.clinic_utc_offset
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn parse_or_default<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!("{} has invalid value '{}', using default", name, raw);
            default
        }
    }
}

/// Keeps a schedule window within what the weekly view accepts.
pub fn bound_window_days(days: u32) -> u32 {
    if (MIN_SCHEDULE_WINDOW_DAYS..=MAX_SCHEDULE_WINDOW_DAYS).contains(&days) {
        return days;
    }

    warn!(
        "SCHEDULE_WINDOW_DAYS {} is outside {}..={}, using default",
        days, MIN_SCHEDULE_WINDOW_DAYS, MAX_SCHEDULE_WINDOW_DAYS
    );
    DEFAULT_SCHEDULE_WINDOW_DAYS
}

/// Accepts `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_offset_or_utc(raw: Option<String>) -> FixedOffset {
    match raw {
        None => utc(),
        Some(raw) => parse_utc_offset(&raw).unwrap_or_else(|| {
            warn!("CLINIC_UTC_OFFSET has invalid value '{}', using UTC", raw);
            utc()
        }),
    }
}
