//! Runtime configuration for the ground booking server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Access-token lifetime (minutes).
    pub access_token_ttl_minutes: i64,
    /// Refresh-token lifetime (days).
    pub refresh_token_ttl_days: u64,
    /// Magic-link lifetime (minutes).
    pub magic_link_ttl_minutes: u64,
    /// Prefix for links printed by the magic-link endpoint.
    pub public_base_url: String,
    /// Lower-cased emails that are promoted to admin on login.
    pub admin_emails: Vec<String>,
    /// First hour billed at the night rate.
    pub night_start_hour: u8,
    /// First hour billed at the day rate again.
    pub night_end_hour: u8,
    /// Minimum advance as a percentage of the slot total.
    pub min_advance_percent: u8,
    /// Pending bookings older than this are expired by the cleanup worker.
    pub pending_hold_minutes: i64,
    pub cleanup_interval_secs: u64,
    /// Ground-local offset from UTC, used for "today" and started slots.
    pub utc_offset_minutes: i32,
    /// Redis TTL for availability snapshots (seconds).
    pub availability_cache_secs: u64,
    pub currency: String,
    pub max_slots_per_booking: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_lookup(|_| None)
    }
}

impl Settings {
    fn from_env() -> Self {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; missing or unparseable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str| lookup(key).and_then(|v| v.trim().parse::<i64>().ok());
        let hour = |key: &str, default: u8| {
            num(key)
                .filter(|h| (0..24).contains(h))
                .map(|h| h as u8)
                .unwrap_or(default)
        };

        let admin_emails = lookup("ADMIN_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Settings {
            access_token_ttl_minutes: num("ACCESS_TOKEN_TTL_MINUTES")
                .filter(|v| *v > 0)
                .unwrap_or(15),
            refresh_token_ttl_days: num("REFRESH_TOKEN_TTL_DAYS")
                .filter(|v| *v > 0)
                .map(|v| v as u64)
                .unwrap_or(30),
            magic_link_ttl_minutes: num("MAGIC_LINK_TTL_MINUTES")
                .filter(|v| *v > 0)
                .map(|v| v as u64)
                .unwrap_or(15),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:8080".into()),
            admin_emails,
            night_start_hour: hour("NIGHT_START_HOUR", 18),
            night_end_hour: hour("NIGHT_END_HOUR", 6),
            min_advance_percent: num("MIN_ADVANCE_PERCENT")
                .filter(|p| (0..=100).contains(p))
                .map(|p| p as u8)
                .unwrap_or(25),
            pending_hold_minutes: num("PENDING_HOLD_MINUTES")
                .filter(|v| *v > 0)
                .unwrap_or(30),
            cleanup_interval_secs: num("CLEANUP_INTERVAL_SECS")
                .filter(|v| *v > 0)
                .map(|v| v as u64)
                .unwrap_or(60),
            utc_offset_minutes: num("UTC_OFFSET_MINUTES")
                .filter(|v| (-14 * 60..=14 * 60).contains(v))
                .map(|v| v as i32)
                .unwrap_or(330),
            availability_cache_secs: num("AVAILABILITY_CACHE_SECS")
                .filter(|v| *v >= 0)
                .map(|v| v as u64)
                .unwrap_or(30),
            currency: lookup("CURRENCY")
                .map(|v| v.trim().to_uppercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "INR".into()),
            max_slots_per_booking: num("MAX_SLOTS_PER_BOOKING")
                .filter(|v| (1..=24).contains(v))
                .map(|v| v as usize)
                .unwrap_or(12),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }

    /// Current wall-clock time at the ground.
    pub fn local_now(&self) -> chrono::NaiveDateTime {
        chrono::Utc::now().naive_utc() + chrono::Duration::minutes(self.utc_offset_minutes as i64)
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
