use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LeaderboardCacheMode;
use crate::profile::{NOT_AVAILABLE, display_rank, format_score};
use crate::session::{CacheEntry, LEADERBOARD_KEY, Lookup, SessionStore};

pub const FAILED_WARNING: &str = "⚠️ Failed to retrieve the leaderboard.";
pub const EMPTY_WARNING: &str = "⚠️ No leaderboard data found.";
pub const UNAVAILABLE_WARNING: &str = "⚠️ Unable to load leaderboard. Try again later.";
const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: Option<i64>,
    pub display_name: Option<String>,
    pub score: Option<f64>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: String,
    pub display_name: String,
    pub score: String,
    pub account_id: Option<String>,
}

impl LeaderboardRow {
    pub fn from_entry(entry: &LeaderboardEntry) -> Self {
        Self {
            rank: format!("#{}", display_rank(entry.rank.unwrap_or(0))),
            display_name: entry
                .display_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            score: entry
                .score
                .map(format_score)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            account_id: entry.account_id.clone().filter(|id| !id.trim().is_empty()),
        }
    }
}

/// API order is kept; rows are never re-sorted.
pub fn rows_from_entries(entries: &[LeaderboardEntry]) -> Vec<LeaderboardRow> {
    entries.iter().map(LeaderboardRow::from_entry).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardFailure {
    Status(u16),
    Unavailable(String),
}

impl LeaderboardFailure {
    pub fn warning(&self) -> &'static str {
        match self {
            LeaderboardFailure::Status(_) => FAILED_WARNING,
            LeaderboardFailure::Unavailable(_) => UNAVAILABLE_WARNING,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LeaderboardPane {
    #[default]
    Idle,
    Loading,
    Rows(Vec<LeaderboardRow>),
    Warning(&'static str),
}

impl LeaderboardPane {
    pub fn rows(&self) -> &[LeaderboardRow] {
        match self {
            LeaderboardPane::Rows(rows) => rows,
            _ => &[],
        }
    }
}

/// Side panel holding the leaderboard. Controls only respond once it is mounted.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    pub mounted: bool,
    pub open: bool,
    pub selected: usize,
    pub pane: LeaderboardPane,
}

impl Sidebar {
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn select_next(&mut self) {
        let len = self.pane.rows().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_row(&self) -> Option<&LeaderboardRow> {
        self.pane.rows().get(self.selected)
    }

    pub fn show_rows(&mut self, rows: Vec<LeaderboardRow>) {
        if self.selected >= rows.len() {
            self.selected = 0;
        }
        self.pane = LeaderboardPane::Rows(rows);
    }
}

/// Leaderboard cache, either in the session store under `cachedLeaderboard` or held in memory.
#[derive(Debug, Clone)]
pub struct LeaderboardCache {
    mode: LeaderboardCacheMode,
    ttl: Duration,
    memory: Option<CacheEntry<Vec<LeaderboardEntry>>>,
}

impl LeaderboardCache {
    pub fn new(mode: LeaderboardCacheMode, ttl: Duration) -> Self {
        Self {
            mode,
            ttl,
            memory: None,
        }
    }

    pub fn get(&self, session: &SessionStore, now_ms: i64) -> Lookup<Vec<LeaderboardEntry>> {
        match self.mode {
            LeaderboardCacheMode::Session => session.read_entry(LEADERBOARD_KEY, now_ms, self.ttl),
            LeaderboardCacheMode::Memory => match &self.memory {
                Some(entry) if entry.is_fresh(now_ms, self.ttl) => Lookup::Fresh(entry.data.clone()),
                Some(_) => Lookup::Stale,
                None => Lookup::Missing,
            },
        }
    }

    pub fn put(
        &mut self,
        session: &mut SessionStore,
        entries: &[LeaderboardEntry],
        now_ms: i64,
    ) -> anyhow::Result<()> {
        match self.mode {
            LeaderboardCacheMode::Session => session.write_entry(LEADERBOARD_KEY, &entries, now_ms),
            LeaderboardCacheMode::Memory => {
                self.memory = Some(CacheEntry::new(entries.to_vec(), now_ms));
                Ok(())
            }
        }
    }
}
