use std::env;
use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_API_BASE: &str = "https://prod01.platform.impl.lunchboxentertainmentapps.com";
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_COOLDOWN_MS: u64 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardRoute {
    Standard,
    ByType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardCacheMode {
    Session,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub leaderboard_route: LeaderboardRoute,
    pub leaderboard_cache: LeaderboardCacheMode,
    pub cache_ttl: Duration,
    pub fetch_cooldown: Duration,
    pub http_timeout: Duration,
    pub initial_location: Option<String>,
    pub warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let api_base = match lookup("PROFILE_API_BASE").filter(|v| !v.trim().is_empty()) {
            Some(raw) => match Url::parse(raw.trim()) {
                Ok(url) if !url.cannot_be_a_base() => url.to_string(),
                _ => {
                    warnings.push(format!("[WARN] Ignoring invalid PROFILE_API_BASE: {raw}"));
                    DEFAULT_API_BASE.to_string()
                }
            },
            None => DEFAULT_API_BASE.to_string(),
        };

        let leaderboard_route = match lookup("LEADERBOARD_ROUTE")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("standard") => LeaderboardRoute::Standard,
            Some("by-type") | Some("by_type") | Some("bytype") => LeaderboardRoute::ByType,
            Some(other) => {
                warnings.push(format!("[WARN] Unknown LEADERBOARD_ROUTE '{other}', using standard"));
                LeaderboardRoute::Standard
            }
        };

        let leaderboard_cache = match lookup("LEADERBOARD_CACHE")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("session") => LeaderboardCacheMode::Session,
            Some("memory") => LeaderboardCacheMode::Memory,
            Some(other) => {
                warnings.push(format!("[WARN] Unknown LEADERBOARD_CACHE '{other}', using session"));
                LeaderboardCacheMode::Session
            }
        };

        let cache_ttl = lookup("PROFILE_CACHE_TTL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
            .max(1);
        let fetch_cooldown = lookup("FETCH_COOLDOWN_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_COOLDOWN_MS);
        let http_timeout = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .max(1);

        let initial_location = lookup("ACCOUNT_ID").filter(|v| !v.trim().is_empty());

        Self {
            api_base,
            leaderboard_route,
            leaderboard_cache,
            cache_ttl: Duration::from_secs(cache_ttl),
            fetch_cooldown: Duration::from_millis(fetch_cooldown),
            http_timeout: Duration::from_secs(http_timeout),
            initial_location,
            warnings,
        }
    }

    /// A command-line location argument overrides `ACCOUNT_ID`.
    pub fn with_location_arg(mut self, arg: Option<String>) -> Self {
        if let Some(arg) = arg.filter(|v| !v.trim().is_empty()) {
            self.initial_location = Some(arg);
        }
        self
    }
}
