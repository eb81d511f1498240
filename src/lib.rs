pub mod api;
pub mod config;
pub mod feed;
pub mod http_client;
pub mod leaderboard;
pub mod location;
pub mod profile;
pub mod session;
pub mod state;
