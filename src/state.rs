use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::leaderboard::{
    EMPTY_WARNING, LeaderboardCache, LeaderboardEntry, LeaderboardFailure, LeaderboardPane,
    Sidebar, rows_from_entries,
};
use crate::location::{History, Location};
use crate::profile::{
    DEFAULT_TITLE, LOAD_FAILED_MESSAGE, LOADING_MESSAGE, LoadOptions, ProfileData, ProfileView,
    RequestGate, VALIDATION_MESSAGE,
};
use crate::session::{LEADERBOARD_KEY, Lookup, SessionStore, now_millis, player_key};

const MAX_LOGS: usize = 200;

/// A single reading of both clocks: `instant` drives the cooldown, `epoch_ms` stamps the cache.
#[derive(Debug, Clone, Copy)]
pub struct Now {
    pub instant: Instant,
    pub epoch_ms: i64,
}

impl Now {
    pub fn current() -> Self {
        Self {
            instant: Instant::now(),
            epoch_ms: now_millis(),
        }
    }

    pub fn later(self, by: Duration) -> Self {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        Self {
            instant: self.instant + by,
            epoch_ms: self.epoch_ms.saturating_add(ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchProfile {
        account_id: String,
        from_history: bool,
    },
    FetchLeaderboard,
}

#[derive(Debug, Clone)]
pub enum Delta {
    ProfileLoaded {
        account_id: String,
        data: ProfileData,
        from_history: bool,
    },
    ProfileFailed {
        account_id: String,
        error: String,
    },
    LeaderboardLoaded(Vec<LeaderboardEntry>),
    LeaderboardFailed(LeaderboardFailure),
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub input: String,
    pub focus: Focus,
    pub profile: ProfileView,
    pub profile_notice: Option<String>,
    pub profile_account: Option<String>,
    pub title: String,
    pub history: History,
    pub session: SessionStore,
    pub gate: RequestGate,
    pub cache_ttl: Duration,
    pub sidebar: Sidebar,
    pub leaderboard_cache: LeaderboardCache,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let mut state = Self {
            input: String::new(),
            focus: Focus::Input,
            profile: ProfileView::default(),
            profile_notice: None,
            profile_account: None,
            title: DEFAULT_TITLE.to_string(),
            history: History::default(),
            session: SessionStore::new(),
            gate: RequestGate::new(config.fetch_cooldown),
            cache_ttl: config.cache_ttl,
            sidebar: Sidebar::default(),
            leaderboard_cache: LeaderboardCache::new(config.leaderboard_cache, config.cache_ttl),
            logs: VecDeque::new(),
            help_overlay: false,
        };
        for warning in &config.warnings {
            state.push_log(warning.clone());
        }
        state
    }

    /// Page-load equivalent: mounts the sidebar and loads the profile named by `location`.
    pub fn start(&mut self, location: Location, now: Now) -> Option<ProviderCommand> {
        self.history = History::new(location.clone());
        self.mount_sidebar();
        let account_id = location.account_id?;
        self.input = account_id.clone();
        self.load_player_profile(&account_id, LoadOptions::startup(), now)
    }

    pub fn mount_sidebar(&mut self) {
        if self.sidebar.mount() {
            self.push_log("[INFO] Leaderboard sidebar ready");
        }
    }

    /// Returns the fetch to dispatch, or `None` when the request was rejected, ignored, or
    /// served from the session cache.
    pub fn load_player_profile(
        &mut self,
        account_id: &str,
        opts: LoadOptions,
        now: Now,
    ) -> Option<ProviderCommand> {
        if self.gate.is_busy(now.instant) {
            return None;
        }

        let account_id = account_id.trim();
        if account_id.is_empty() {
            self.profile_notice = Some(VALIDATION_MESSAGE.to_string());
            return None;
        }

        if opts.use_cache() {
            let key = player_key(account_id);
            match self
                .session
                .read_entry::<ProfileData>(&key, now.epoch_ms, self.cache_ttl)
            {
                Lookup::Fresh(data) => {
                    self.render_profile(account_id, &data);
                    self.update_location(account_id, opts.from_history);
                    self.push_log(format!("[INFO] {account_id} served from session cache"));
                    return None;
                }
                Lookup::Corrupt(err) => {
                    self.push_log(format!("[WARN] Dropping unreadable cache entry {key}: {err}"));
                    self.session.remove_item(&key);
                }
                Lookup::Stale | Lookup::Missing => {}
            }
        }

        self.profile_notice = Some(LOADING_MESSAGE.to_string());
        self.gate.begin();
        Some(ProviderCommand::FetchProfile {
            account_id: account_id.to_string(),
            from_history: opts.from_history,
        })
    }

    pub fn submit_input(&mut self, now: Now) -> Option<ProviderCommand> {
        let account_id = self.input.clone();
        self.load_player_profile(&account_id, LoadOptions::submit(), now)
    }

    pub fn load_leaderboard(&mut self, force_refresh: bool, now: Now) -> Option<ProviderCommand> {
        if force_refresh {
            let purged = self.session.clear_profiles();
            if purged > 0 {
                self.push_log(format!("[INFO] Cleared {purged} cached profiles"));
            }
        } else {
            match self.leaderboard_cache.get(&self.session, now.epoch_ms) {
                Lookup::Fresh(entries) => {
                    self.sidebar.show_rows(rows_from_entries(&entries));
                    return None;
                }
                Lookup::Corrupt(err) => {
                    self.push_log(format!("[WARN] Dropping unreadable leaderboard cache: {err}"));
                    self.session.remove_item(LEADERBOARD_KEY);
                }
                Lookup::Stale | Lookup::Missing => {}
            }
        }

        self.sidebar.pane = LeaderboardPane::Loading;
        Some(ProviderCommand::FetchLeaderboard)
    }

    pub fn toggle_sidebar(&mut self, now: Now) -> Option<ProviderCommand> {
        if !self.sidebar.mounted {
            self.push_log("[ERROR] Leaderboard sidebar is not mounted");
            return None;
        }
        if self.sidebar.open {
            self.close_sidebar();
            return None;
        }
        self.sidebar.open = true;
        self.focus = Focus::Sidebar;
        self.load_leaderboard(false, now)
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar.close();
        self.focus = Focus::Input;
    }

    pub fn open_selected_entry(&mut self, now: Now) -> Option<ProviderCommand> {
        let row = self.sidebar.selected_row()?.clone();
        let Some(account_id) = row.account_id else {
            self.push_log(format!("[WARN] {} has no account id", row.display_name));
            return None;
        };
        self.input = account_id.clone();
        self.load_player_profile(&account_id, LoadOptions::leaderboard(), now)
    }

    pub fn navigate_back(&mut self, now: Now) -> Option<ProviderCommand> {
        let location = self.history.back()?.clone();
        self.on_history_navigation(location, now)
    }

    pub fn navigate_forward(&mut self, now: Now) -> Option<ProviderCommand> {
        let location = self.history.forward()?.clone();
        self.on_history_navigation(location, now)
    }

    fn on_history_navigation(&mut self, location: Location, now: Now) -> Option<ProviderCommand> {
        self.input = location.account_id.clone().unwrap_or_default();
        let account_id = location.account_id?;
        self.load_player_profile(&account_id, LoadOptions::history(), now)
    }

    fn render_profile(&mut self, account_id: &str, data: &ProfileData) {
        self.profile = ProfileView::from_data(data);
        self.profile_notice = None;
        self.profile_account = Some(account_id.to_string());
        self.title = self.profile.title();
    }

    fn update_location(&mut self, account_id: &str, from_history: bool) {
        if from_history {
            return;
        }
        self.history.push(Location::for_account(account_id));
    }

    pub fn headline(&self) -> &str {
        self.profile_notice
            .as_deref()
            .unwrap_or(&self.profile.display_name)
    }

    pub fn location_label(&self) -> String {
        format!("profile{}", self.history.current().to_query())
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta, now: Now) {
    match delta {
        Delta::ProfileLoaded {
            account_id,
            data,
            from_history,
        } => {
            if let Err(err) = state
                .session
                .write_entry(&player_key(&account_id), &data, now.epoch_ms)
            {
                state.push_log(format!("[WARN] Could not cache {account_id}: {err:#}"));
            }
            state.render_profile(&account_id, &data);
            state.update_location(&account_id, from_history);
            state.gate.settle(now.instant);
            state.push_log(format!("[INFO] Loaded profile {account_id}"));
        }
        Delta::ProfileFailed { account_id, error } => {
            state.profile_notice = Some(LOAD_FAILED_MESSAGE.to_string());
            state.gate.settle(now.instant);
            state.push_log(format!("[WARN] Error fetching player data for {account_id}: {error}"));
        }
        Delta::LeaderboardLoaded(entries) => {
            if entries.is_empty() {
                state.sidebar.pane = LeaderboardPane::Warning(EMPTY_WARNING);
                state.push_log("[WARN] No player data available.");
                return;
            }
            if let Err(err) =
                state
                    .leaderboard_cache
                    .put(&mut state.session, &entries, now.epoch_ms)
            {
                state.push_log(format!("[WARN] Could not cache leaderboard: {err:#}"));
            }
            state.sidebar.show_rows(rows_from_entries(&entries));
            state.push_log(format!("[INFO] Leaderboard loaded ({} players)", entries.len()));
        }
        Delta::LeaderboardFailed(failure) => {
            state.sidebar.pane = LeaderboardPane::Warning(failure.warning());
            match failure {
                LeaderboardFailure::Status(code) => {
                    state.push_log(format!("[ERROR] Leaderboard request failed: HTTP {code}"));
                }
                LeaderboardFailure::Unavailable(err) => {
                    state.push_log(format!("[ERROR] Error fetching leaderboard: {err}"));
                }
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
