use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const VALIDATION_MESSAGE: &str = "Please enter a valid Account ID.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load profile data. Please check the Account ID.";
pub const LOADING_MESSAGE: &str = "Loading...";
pub const UNKNOWN_PLAYER: &str = "Unknown Player";
pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_TITLE: &str = "Player Profile";

/// Aggregate counters from `/accounts/{id}/stats`. Absent counters read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    pub wins: Option<f64>,
    pub losses: Option<f64>,
    pub draws: Option<f64>,
    pub win_streak: Option<f64>,
    pub loss_streak: Option<f64>,
    pub max_win_streak: Option<f64>,
    pub max_loss_streak: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub display_name: Option<String>,
    pub rank: Option<i64>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub stats: Option<AccountStats>,
    pub entry: Option<RankedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileView {
    pub display_name: String,
    pub rank: String,
    pub score: String,
    pub wins: String,
    pub losses: String,
    pub draws: String,
    pub total_games: String,
    pub win_percentage: String,
    pub win_streak: String,
    pub loss_streak: String,
    pub max_win_streak: String,
    pub max_loss_streak: String,
}

impl ProfileView {
    pub fn from_data(data: &ProfileData) -> Self {
        let stats = data.stats.clone().unwrap_or_default();
        let entry = data.entry.as_ref();

        let wins = stats.wins.unwrap_or(0.0);
        let losses = stats.losses.unwrap_or(0.0);
        // Draws are shown but never counted as decided games.
        let decided = wins + losses;

        let display_name = entry
            .and_then(|e| e.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_PLAYER)
            .to_string();
        let rank = entry
            .and_then(|e| e.rank)
            .map(display_rank)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let score = entry
            .and_then(|e| e.score)
            .map(format_score)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            display_name,
            rank,
            score,
            wins: format_score(wins),
            losses: format_score(losses),
            draws: counter(stats.draws),
            total_games: format_score(decided),
            win_percentage: win_percentage(wins, losses),
            win_streak: counter(stats.win_streak),
            loss_streak: counter(stats.loss_streak),
            max_win_streak: counter(stats.max_win_streak),
            max_loss_streak: counter(stats.max_loss_streak),
        }
    }

    pub fn fields(&self) -> [(&'static str, &str); 12] {
        [
            ("displayName", self.display_name.as_str()),
            ("rank", self.rank.as_str()),
            ("score", self.score.as_str()),
            ("wins", self.wins.as_str()),
            ("losses", self.losses.as_str()),
            ("draws", self.draws.as_str()),
            ("totalGames", self.total_games.as_str()),
            ("winPercentage", self.win_percentage.as_str()),
            ("winStreak", self.win_streak.as_str()),
            ("lossStreak", self.loss_streak.as_str()),
            ("maxWinStreak", self.max_win_streak.as_str()),
            ("maxLossStreak", self.max_loss_streak.as_str()),
        ]
    }

    pub fn title(&self) -> String {
        format!("{} - {DEFAULT_TITLE}", self.display_name)
    }
}

/// `N/A` when no game was decided.
pub fn win_percentage(wins: f64, losses: f64) -> String {
    let decided = wins + losses;
    if decided == 0.0 || !decided.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.2}%", wins / decided * 100.0)
}

/// API ranks are zero-based.
pub fn display_rank(rank: i64) -> String {
    rank.saturating_add(1).to_string()
}

fn counter(value: Option<f64>) -> String {
    format_score(value.unwrap_or(0.0))
}

pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub force_refresh: bool,
    // back/forward: the history entry already exists
    pub from_history: bool,
}

impl LoadOptions {
    pub fn startup() -> Self {
        Self::default()
    }

    pub fn submit() -> Self {
        Self {
            force_refresh: true,
            from_history: false,
        }
    }

    pub fn leaderboard() -> Self {
        Self::submit()
    }

    pub fn history() -> Self {
        Self {
            force_refresh: false,
            from_history: true,
        }
    }

    pub fn use_cache(&self) -> bool {
        !self.force_refresh
    }
}

/// In-flight guard for profile fetches. Stays closed for `cooldown` after a fetch settles.
#[derive(Debug, Clone)]
pub struct RequestGate {
    in_flight: bool,
    cooldown: Duration,
    settled_at: Option<Instant>,
}

impl RequestGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            in_flight: false,
            cooldown,
            settled_at: None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_busy(&self, now: Instant) -> bool {
        if self.in_flight {
            return true;
        }
        self.settled_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    pub fn settle(&mut self, now: Instant) {
        self.in_flight = false;
        self.settled_at = Some(now);
    }
}
