use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::{PlayerApi, fetch_profile, status_of};
use crate::leaderboard::LeaderboardFailure;
use crate::state::{Delta, ProviderCommand};

/// Each command runs as its own pool task. Exits when the command channel closes.
pub fn spawn_provider(
    api: Arc<dyn PlayerApi>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let tx = tx.clone();
            rayon::spawn(move || {
                let _ = tx.send(run_command(api.as_ref(), cmd));
            });
        }
    })
}

pub fn run_command(api: &dyn PlayerApi, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchProfile {
            account_id,
            from_history,
        } => match fetch_profile(api, &account_id) {
            Ok(data) => Delta::ProfileLoaded {
                account_id,
                data,
                from_history,
            },
            Err(err) => Delta::ProfileFailed {
                account_id,
                error: format!("{err:#}"),
            },
        },
        ProviderCommand::FetchLeaderboard => match api.leaderboard() {
            Ok(entries) => Delta::LeaderboardLoaded(entries),
            Err(err) => {
                let failure = match status_of(&err) {
                    Some(status) => LeaderboardFailure::Status(status.as_u16()),
                    None => LeaderboardFailure::Unavailable(format!("{err:#}")),
                };
                Delta::LeaderboardFailed(failure)
            }
        },
    }
}
