use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use profile_terminal::api::{HttpStatusError, PlayerApi};
use profile_terminal::feed::run_command;
use profile_terminal::leaderboard::LeaderboardEntry;
use profile_terminal::location::Location;
use profile_terminal::profile::{
    AccountStats, LOAD_FAILED_MESSAGE, LOADING_MESSAGE, LoadOptions, RankedEntry,
    VALIDATION_MESSAGE,
};
use profile_terminal::state::{AppState, Delta, Now, ProviderCommand, apply_delta};
use reqwest::StatusCode;

const HOUR: Duration = Duration::from_secs(3600);
const COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Default)]
struct FakeApi {
    stats_calls: AtomicUsize,
    entry_calls: AtomicUsize,
    failing_account: Option<&'static str>,
}

impl FakeApi {
    fn calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst) + self.entry_calls.load(Ordering::SeqCst)
    }
}

impl PlayerApi for FakeApi {
    fn account_stats(&self, account_id: &str) -> Result<Option<AccountStats>> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_account == Some(account_id) {
            return Err(HttpStatusError {
                status: StatusCode::NOT_FOUND,
                url: format!("stats/{account_id}"),
            }
            .into());
        }
        let (wins, losses) = if account_id == "rookie" { (0.0, 0.0) } else { (10.0, 5.0) };
        Ok(Some(AccountStats {
            wins: Some(wins),
            losses: Some(losses),
            draws: Some(2.0),
            ..AccountStats::default()
        }))
    }

    fn leaderboard_entry(&self, account_id: &str) -> Result<Option<RankedEntry>> {
        self.entry_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(RankedEntry {
            display_name: Some(name_for(account_id)),
            rank: Some(0),
            score: Some(1500.0),
        }))
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        Err(anyhow!("not used here"))
    }
}

fn name_for(account_id: &str) -> String {
    match account_id {
        "ace" => "Ace".to_string(),
        other => format!("Player {other}"),
    }
}

/// Runs a dispatched command to completion on the current thread, like one event-loop turn.
fn settle(state: &mut AppState, api: &FakeApi, cmd: Option<ProviderCommand>, now: Now) -> bool {
    let Some(cmd) = cmd else {
        return false;
    };
    apply_delta(state, run_command(api, cmd), now);
    true
}

fn load(state: &mut AppState, api: &FakeApi, id: &str, opts: LoadOptions, now: Now) -> bool {
    let cmd = state.load_player_profile(id, opts, now);
    settle(state, api, cmd, now)
}

#[test]
fn merged_profile_renders_expected_fields() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    let now = Now::current();

    assert!(load(&mut state, &api, "ace", LoadOptions::submit(), now));

    let view = &state.profile;
    assert_eq!(state.headline(), "Ace");
    assert_eq!(view.rank, "1");
    assert_eq!(view.score, "1500");
    assert_eq!(view.wins, "10");
    assert_eq!(view.losses, "5");
    assert_eq!(view.total_games, "15");
    assert_eq!(view.win_percentage, "66.67%");
    assert_eq!(state.title, "Ace - Player Profile");
    assert_eq!(state.location_label(), "profile?accountId=ace");
    assert_eq!(api.calls(), 2);
}

#[test]
fn zero_games_render_not_available() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    load(&mut state, &api, "rookie", LoadOptions::submit(), Now::current());
    assert_eq!(state.profile.total_games, "0");
    assert_eq!(state.profile.win_percentage, "N/A");
}

#[test]
fn fresh_cache_entry_skips_network() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    let t0 = Now::current();
    load(&mut state, &api, "ace", LoadOptions::submit(), t0);
    assert_eq!(api.calls(), 2);

    let later = t0.later(HOUR - Duration::from_secs(1));
    assert_eq!(
        state.load_player_profile("ace", LoadOptions::startup(), later),
        None
    );
    assert_eq!(api.calls(), 2);
    assert_eq!(state.headline(), "Ace");
}

#[test]
fn stale_cache_entry_is_refetched() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    let t0 = Now::current();
    load(&mut state, &api, "ace", LoadOptions::submit(), t0);

    let cmd = state.load_player_profile("ace", LoadOptions::startup(), t0.later(HOUR));
    assert_eq!(
        cmd,
        Some(ProviderCommand::FetchProfile {
            account_id: "ace".to_string(),
            from_history: false,
        })
    );
    assert_eq!(state.headline(), LOADING_MESSAGE);
}

#[test]
fn blank_input_is_rejected_without_network() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    state.input = "  \t ".to_string();
    let cmd = state.submit_input(Now::current());
    assert!(!settle(&mut state, &api, cmd, Now::current()));
    assert_eq!(state.headline(), VALIDATION_MESSAGE);
    assert_eq!(api.calls(), 0);
}

#[test]
fn input_is_trimmed_before_fetching() {
    let mut state = AppState::default();
    state.input = "  ace \n".to_string();
    assert_eq!(
        state.submit_input(Now::current()),
        Some(ProviderCommand::FetchProfile {
            account_id: "ace".to_string(),
            from_history: false,
        })
    );
}

#[test]
fn concurrent_loads_are_suppressed_until_cooldown_passes() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    let t0 = Now::current();

    let first = state.load_player_profile("ace", LoadOptions::submit(), t0);
    assert!(first.is_some());
    assert_eq!(state.load_player_profile("ace", LoadOptions::submit(), t0), None);
    assert_eq!(state.load_player_profile("other", LoadOptions::submit(), t0), None);

    let done = t0.later(Duration::from_millis(300));
    settle(&mut state, &api, first, done);
    assert_eq!(
        state.load_player_profile("other", LoadOptions::submit(), done.later(Duration::from_millis(999))),
        None
    );
    assert!(
        state
            .load_player_profile("other", LoadOptions::submit(), done.later(COOLDOWN))
            .is_some()
    );
}

#[test]
fn failed_fetch_shows_error_and_keeps_previous_fields() {
    let api = FakeApi {
        failing_account: Some("missing"),
        ..FakeApi::default()
    };
    let mut state = AppState::default();
    let t0 = Now::current();
    load(&mut state, &api, "ace", LoadOptions::submit(), t0);

    let t1 = t0.later(COOLDOWN);
    load(&mut state, &api, "missing", LoadOptions::submit(), t1);
    assert_eq!(state.headline(), LOAD_FAILED_MESSAGE);
    assert_eq!(state.profile.display_name, "Ace");
    assert_eq!(state.title, "Ace - Player Profile");
    assert_eq!(state.location_label(), "profile?accountId=ace");
    assert!(!state.gate.in_flight());
    assert!(state.session.get_item("player_missing").is_none());
    assert!(state.logs.iter().any(|line| line.contains("404")));
}

#[test]
fn failure_settles_gate_with_cooldown() {
    let mut state = AppState::default();
    let t0 = Now::current();
    state.load_player_profile("x", LoadOptions::submit(), t0);
    apply_delta(
        &mut state,
        Delta::ProfileFailed {
            account_id: "x".into(),
            error: "timeout".into(),
        },
        t0,
    );
    assert_eq!(state.load_player_profile("x", LoadOptions::submit(), t0), None);
    assert!(
        state
            .load_player_profile("x", LoadOptions::submit(), t0.later(COOLDOWN))
            .is_some()
    );
}

#[test]
fn startup_location_loads_profile_without_extra_history() {
    let api = FakeApi::default();
    let mut state = AppState::default();
    let now = Now::current();
    let cmd = state.start(Location::parse("?accountId=ace"), now);
    assert_eq!(state.input, "ace");
    assert!(state.sidebar.mounted);
    settle(&mut state, &api, cmd, now);
    assert_eq!(state.history.entry_count(), 1);
    assert_eq!(state.headline(), "Ace");
}

#[test]
fn startup_without_account_does_nothing() {
    let mut state = AppState::default();
    assert_eq!(state.start(Location::default(), Now::current()), None);
    assert_eq!(state.headline(), "");
}

#[test]
fn corrupt_cache_entry_is_dropped_and_refetched() {
    let mut state = AppState::default();
    state.session.set_item("player_ace", "{oops");
    let cmd = state.load_player_profile("ace", LoadOptions::startup(), Now::current());
    assert!(cmd.is_some());
    assert!(state.session.get_item("player_ace").is_none());
}
