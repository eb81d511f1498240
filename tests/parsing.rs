use std::fs;
use std::path::PathBuf;

use profile_terminal::api::{parse_entry_json, parse_leaderboard_json, parse_stats_json};
use profile_terminal::leaderboard::rows_from_entries;
use profile_terminal::profile::{ProfileData, ProfileView};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_stats_fixture() {
    let stats = parse_stats_json(&read_fixture("stats.json"))
        .expect("fixture should parse")
        .expect("stats present");
    assert_eq!(stats.wins, Some(10.0));
    assert_eq!(stats.losses, Some(5.0));
    assert_eq!(stats.draws, Some(2.0));
    assert_eq!(stats.max_win_streak, Some(7.0));
}

#[test]
fn parses_entry_fixture() {
    let entry = parse_entry_json(&read_fixture("entry.json"))
        .expect("fixture should parse")
        .expect("entry present");
    assert_eq!(entry.display_name.as_deref(), Some("Ace"));
    assert_eq!(entry.rank, Some(0));
    assert_eq!(entry.score, Some(1500.0));
}

#[test]
fn merged_fixtures_render_expected_fields() {
    let data = ProfileData {
        stats: parse_stats_json(&read_fixture("stats.json")).unwrap(),
        entry: parse_entry_json(&read_fixture("entry.json")).unwrap(),
    };
    let view = ProfileView::from_data(&data);
    assert_eq!(view.rank, "1");
    assert_eq!(view.score, "1500");
    assert_eq!(view.wins, "10");
    assert_eq!(view.losses, "5");
    assert_eq!(view.total_games, "15");
    assert_eq!(view.win_percentage, "66.67%");
    assert_eq!(view.max_loss_streak, "4");
}

#[test]
fn parses_leaderboard_fixture_in_api_order() {
    let entries = parse_leaderboard_json(&read_fixture("leaderboard.json")).expect("fixture should parse");
    assert_eq!(entries.len(), 3);
    let rows = rows_from_entries(&entries);
    assert_eq!(rows[0].rank, "#1");
    assert_eq!(rows[1].display_name, "Bolt");
    assert_eq!(rows[1].score, "1988.5");
    assert_eq!(rows[2].display_name, "Unknown");
    assert_eq!(rows[2].score, "N/A");
    assert_eq!(rows[2].account_id.as_deref(), Some("acc-ghost"));
}

#[test]
fn leaderboard_without_entries_is_empty() {
    let entries = parse_leaderboard_json(&read_fixture("leaderboard_empty.json")).expect("fixture should parse");
    assert!(entries.is_empty());
    assert!(parse_leaderboard_json("null").expect("null should parse").is_empty());
}

#[test]
fn null_bodies_parse_to_nothing() {
    assert!(parse_stats_json("null").expect("null should parse").is_none());
    assert!(parse_entry_json("").expect("empty should parse").is_none());
    assert!(parse_stats_json("{not json").is_err());
}

#[test]
fn float_counters_still_render() {
    let stats = parse_stats_json(r#"{"stats":{"wins":10.0,"losses":-1,"draws":2}}"#)
        .expect("float counters should parse")
        .expect("stats present");
    let view = ProfileView::from_data(&ProfileData {
        stats: Some(stats),
        entry: None,
    });
    assert_eq!(view.wins, "10");
    assert_eq!(view.losses, "-1");
    assert_eq!(view.total_games, "9");
}

#[test]
fn max_rank_survives_profile_and_leaderboard() {
    let entry = parse_entry_json(r#"{"entry":{"displayName":"X","rank":9223372036854775807,"score":1}}"#)
        .expect("entry should parse");
    let view = ProfileView::from_data(&ProfileData { stats: None, entry });
    assert_eq!(view.rank, "9223372036854775807");

    let entries = parse_leaderboard_json(
        r#"{"mmrLeaderboard":{"playerEntries":[{"rank":9223372036854775807,"displayName":"X","score":1,"accountId":"x"}]}}"#,
    )
    .expect("leaderboard should parse");
    assert_eq!(rows_from_entries(&entries)[0].rank, "#9223372036854775807");
}
