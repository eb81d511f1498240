use std::fmt;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::{AppConfig, LeaderboardRoute};
use crate::http_client::http_client;
use crate::leaderboard::LeaderboardEntry;
use crate::profile::{AccountStats, ProfileData, RankedEntry};

const LEADERBOARD_CATEGORY: &str = "MMR";

pub trait PlayerApi: Send + Sync {
    fn account_stats(&self, account_id: &str) -> Result<Option<AccountStats>>;
    fn leaderboard_entry(&self, account_id: &str) -> Result<Option<RankedEntry>>;
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>>;
}

/// Non-success HTTP status. Kept as a distinct type so callers can downcast through `anyhow`.
#[derive(Debug, Clone)]
pub struct HttpStatusError {
    pub status: StatusCode,
    pub url: String,
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API request failed: {} ({})", self.status, self.url)
    }
}

impl std::error::Error for HttpStatusError {}

pub fn status_of(err: &anyhow::Error) -> Option<StatusCode> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<HttpStatusError>())
        .map(|e| e.status)
}

/// Fetches stats and the ranked entry concurrently and merges them. Either failure fails the
/// whole profile.
pub fn fetch_profile(api: &dyn PlayerApi, account_id: &str) -> Result<ProfileData> {
    let (stats, entry) = rayon::join(
        || api.account_stats(account_id),
        || api.leaderboard_entry(account_id),
    );
    Ok(ProfileData {
        stats: stats.context("stats request")?,
        entry: entry.context("leaderboard entry request")?,
    })
}

pub struct LunchboxApi {
    client: &'static Client,
    base: Url,
    route: LeaderboardRoute,
}

impl LunchboxApi {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.http_timeout)?,
            base: Url::parse(&config.api_base)
                .with_context(|| format!("invalid api base: {}", config.api_base))?,
            route: config.leaderboard_route,
        })
    }

    fn get_text(&self, url: Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HttpStatusError {
                status,
                url: url.to_string(),
            }
            .into());
        }
        resp.text().context("failed reading body")
    }
}

impl PlayerApi for LunchboxApi {
    fn account_stats(&self, account_id: &str) -> Result<Option<AccountStats>> {
        let body = self.get_text(stats_url(&self.base, account_id)?)?;
        parse_stats_json(&body)
    }

    fn leaderboard_entry(&self, account_id: &str) -> Result<Option<RankedEntry>> {
        let body = self.get_text(entry_url(&self.base, account_id)?)?;
        parse_entry_json(&body)
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let body = self.get_text(leaderboard_url(&self.base, self.route)?)?;
        parse_leaderboard_json(&body)
    }
}

pub fn stats_url(base: &Url, account_id: &str) -> Result<Url> {
    endpoint(base, &["api", "v1", "accounts", account_id, "stats"])
}

pub fn entry_url(base: &Url, account_id: &str) -> Result<Url> {
    endpoint(
        base,
        &["api", "v1", "leaderboards", LEADERBOARD_CATEGORY, "entry", account_id],
    )
}

pub fn leaderboard_url(base: &Url, route: LeaderboardRoute) -> Result<Url> {
    match route {
        LeaderboardRoute::Standard => endpoint(base, &["api", "v1", "leaderboards", LEADERBOARD_CATEGORY]),
        LeaderboardRoute::ByType => endpoint(
            base,
            &["api", "v1", "leaderboards", "by-type", LEADERBOARD_CATEGORY],
        ),
    }
}

// Segments are percent-encoded, so an id can never escape its path slot.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow!("api base cannot carry a path: {base}"))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    stats: Option<AccountStats>,
}

#[derive(Debug, Deserialize)]
struct EntryResponse {
    entry: Option<RankedEntry>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardResponse {
    #[serde(rename = "mmrLeaderboard")]
    mmr_leaderboard: Option<MmrLeaderboard>,
}

#[derive(Debug, Deserialize)]
struct MmrLeaderboard {
    #[serde(rename = "playerEntries", default)]
    player_entries: Option<Vec<LeaderboardEntry>>,
}

fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "null"
}

pub fn parse_stats_json(raw: &str) -> Result<Option<AccountStats>> {
    if is_blank(raw) {
        return Ok(None);
    }
    let resp: StatsResponse = serde_json::from_str(raw.trim()).context("invalid stats json")?;
    Ok(resp.stats)
}

pub fn parse_entry_json(raw: &str) -> Result<Option<RankedEntry>> {
    if is_blank(raw) {
        return Ok(None);
    }
    let resp: EntryResponse =
        serde_json::from_str(raw.trim()).context("invalid leaderboard entry json")?;
    Ok(resp.entry)
}

pub fn parse_leaderboard_json(raw: &str) -> Result<Vec<LeaderboardEntry>> {
    if is_blank(raw) {
        return Ok(Vec::new());
    }
    let resp: LeaderboardResponse =
        serde_json::from_str(raw.trim()).context("invalid leaderboard json")?;
    Ok(resp
        .mmr_leaderboard
        .and_then(|board| board.player_entries)
        .unwrap_or_default())
}
