mod common;

use chrono::NaiveDate;
use sqlx::Row;

use common::{api_game, api_player, api_team, memory_store, stat_line, FakeSource};
use courtline::domain::{Market, SportsbookLine};
use courtline::error::CourtlineError;
use courtline::ingest::IngestionPipeline;
use courtline::metrics::MetricsEngine;

async fn row_count(pool: &sqlx::SqlitePool, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
        .get("n")
}

#[tokio::test]
async fn ingest_teams_is_idempotent() {
    let store = memory_store().await;
    let source = FakeSource {
        teams: vec![api_team(1, "Lakers", "LAL"), api_team(2, "Celtics", "BOS")],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone());

    let first = pipeline.ingest_teams().await.unwrap();
    let second = pipeline.ingest_teams().await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 2);
    assert_eq!(row_count(store.pool(), "teams").await, 2);

    let lakers = store.team_by_api_id(1).await.unwrap().unwrap();
    assert_eq!(lakers.name, "Lakers");
    assert_eq!(lakers.abbreviation.as_deref(), Some("LAL"));
    assert!(lakers.is_nba);
}

#[tokio::test]
async fn reingesting_refreshes_fields_without_duplicating() {
    let store = memory_store().await;

    let pipeline = IngestionPipeline::new(
        FakeSource {
            teams: vec![api_team(1, "Supersonics", "SEA")],
            ..Default::default()
        },
        store.clone(),
    );
    pipeline.ingest_teams().await.unwrap();

    // Same api_id, renamed upstream
    let pipeline = IngestionPipeline::new(
        FakeSource {
            teams: vec![api_team(1, "Thunder", "OKC")],
            ..Default::default()
        },
        store.clone(),
    );
    pipeline.ingest_teams().await.unwrap();

    assert_eq!(row_count(store.pool(), "teams").await, 1);
    let team = store.team_by_api_id(1).await.unwrap().unwrap();
    assert_eq!(team.name, "Thunder");
    assert_eq!(team.abbreviation.as_deref(), Some("OKC"));
}

#[tokio::test]
async fn player_with_unknown_team_is_kept_with_null_reference() {
    let store = memory_store().await;
    let source = FakeSource {
        players: vec![api_player(50, "Victor", "Wembanyama", Some(api_team(99, "Spurs", "SAS")))],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone());

    let count = pipeline.ingest_players(&[]).await.unwrap();
    assert_eq!(count, 1);

    let player = store.player_by_api_id(50).await.unwrap().unwrap();
    assert_eq!(player.team_id, None);
    assert_eq!(player.full_name, "Victor Wembanyama");
    assert_eq!(
        player.image_url.as_deref(),
        Some("https://cdn.nba.com/headshots/nba/latest/1040x760/50.png")
    );
}

#[tokio::test]
async fn player_team_resolves_after_teams_are_ingested() {
    let store = memory_store().await;
    let spurs = api_team(99, "Spurs", "SAS");
    let source = FakeSource {
        teams: vec![spurs.clone()],
        players: vec![api_player(50, "Victor", "Wembanyama", Some(spurs))],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone());

    pipeline.ingest_teams().await.unwrap();
    pipeline.ingest_players(&[]).await.unwrap();

    let player = store.player_by_api_id(50).await.unwrap().unwrap();
    let team = store.team_by_api_id(99).await.unwrap().unwrap();
    assert_eq!(player.team_id, team.id);
}

#[tokio::test]
async fn stats_with_missing_game_are_skipped_not_raised() {
    let store = memory_store().await;
    let lakers = api_team(1, "Lakers", "LAL");
    let source = FakeSource {
        teams: vec![lakers.clone()],
        players: vec![api_player(10, "LeBron", "James", Some(lakers))],
        // Game 777 is never ingested
        stats: vec![stat_line(10, 777, "2024-01-15T00:00:00Z", 25, 8, 9)],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone());

    pipeline.ingest_teams().await.unwrap();
    pipeline.ingest_players(&[]).await.unwrap();

    let count = pipeline
        .ingest_stats(2024, &[], &[], None, None, false)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(row_count(store.pool(), "player_game_stats").await, 0);
}

#[tokio::test]
async fn strict_mode_fails_the_batch_on_missing_references() {
    let store = memory_store().await;
    let lakers = api_team(1, "Lakers", "LAL");
    let source = FakeSource {
        teams: vec![lakers.clone()],
        players: vec![api_player(10, "LeBron", "James", Some(lakers))],
        stats: vec![stat_line(10, 777, "2024-01-15T00:00:00Z", 25, 8, 9)],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone()).with_strict_references(true);

    pipeline.ingest_teams().await.unwrap();
    pipeline.ingest_players(&[]).await.unwrap();

    let err = pipeline
        .ingest_stats(2024, &[], &[], None, None, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CourtlineError::MissingReference {
            entity: "game",
            api_id: 777
        }
    ));
    assert_eq!(row_count(store.pool(), "player_game_stats").await, 0);
}

#[tokio::test]
async fn stats_upsert_on_player_game_pair_never_duplicates() {
    let store = memory_store().await;
    let lakers = api_team(1, "Lakers", "LAL");
    let celtics = api_team(2, "Celtics", "BOS");
    let source = FakeSource {
        teams: vec![lakers.clone(), celtics.clone()],
        players: vec![api_player(10, "LeBron", "James", Some(lakers.clone()))],
        games: vec![api_game(100, "2024-01-15T00:00:00Z", &lakers, &celtics)],
        stats: vec![stat_line(10, 100, "2024-01-15T00:00:00Z", 25, 8, 9)],
    };
    let pipeline = IngestionPipeline::new(source.clone(), store.clone());

    pipeline.ingest_all(2024).await.unwrap();
    pipeline.ingest_all(2024).await.unwrap();

    assert_eq!(row_count(store.pool(), "player_game_stats").await, 1);
    assert_eq!(row_count(store.pool(), "games").await, 1);

    // Second pass replaced, not merged
    let player = store.player_by_api_id(10).await.unwrap().unwrap();
    let stats = store.recent_stats(player.id.unwrap(), None).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].points, 25);
    // Percentages recomputed locally when the provider omits them
    assert_eq!(stats[0].fg_pct, Some(0.5));
}

#[tokio::test]
async fn game_upsert_populates_legacy_abbreviations_and_status() {
    let store = memory_store().await;
    let lakers = api_team(1, "Lakers", "LAL");
    let celtics = api_team(2, "Celtics", "BOS");
    let source = FakeSource {
        teams: vec![lakers.clone(), celtics.clone()],
        games: vec![api_game(100, "2024-01-15T19:30:00-05:00", &celtics, &lakers)],
        ..Default::default()
    };
    let pipeline = IngestionPipeline::new(source, store.clone());

    pipeline.ingest_teams().await.unwrap();
    pipeline.ingest_games(2024, &[], None, None, false).await.unwrap();

    let game = store.game_by_api_id(100).await.unwrap().unwrap();
    assert_eq!(game.home_team_abbr.as_deref(), Some("BOS"));
    assert_eq!(game.visitor_team_abbr.as_deref(), Some("LAL"));
    assert_eq!(game.status, courtline::domain::GameStatus::Final);
    // 'Z'-normalized to UTC
    assert_eq!(game.date.to_rfc3339(), "2024-01-16T00:30:00+00:00");
    assert!(game.home_team_id.is_some());
    assert!(game.visitor_team_id.is_some());
}

#[tokio::test]
async fn end_to_end_scenario_matches_expected_metrics() {
    let store = memory_store().await;
    let lakers = api_team(1, "Lakers", "LAL");
    let celtics = api_team(2, "Celtics", "BOS");
    let source = FakeSource {
        teams: vec![lakers.clone(), celtics.clone()],
        players: vec![
            api_player(10, "LeBron", "James", Some(lakers.clone())),
            api_player(20, "Jayson", "Tatum", Some(celtics.clone())),
        ],
        games: vec![
            api_game(100, "2024-01-10T00:00:00Z", &lakers, &celtics),
            api_game(101, "2024-01-12T00:00:00Z", &celtics, &lakers),
            api_game(102, "2024-01-15T00:00:00Z", &lakers, &celtics),
        ],
        // Oldest to newest: 18, 22, 26 points
        stats: vec![
            stat_line(10, 100, "2024-01-10T00:00:00Z", 18, 6, 7),
            stat_line(10, 101, "2024-01-12T00:00:00Z", 22, 8, 7),
            stat_line(10, 102, "2024-01-15T00:00:00Z", 26, 7, 9),
        ],
    };
    let pipeline = IngestionPipeline::new(source, store.clone());
    let totals = pipeline.ingest_all(2024).await.unwrap();
    assert_eq!(totals.teams, 2);
    assert_eq!(totals.players, 2);
    assert_eq!(totals.games, 3);
    assert_eq!(totals.stats, 3);

    let player_id = store
        .player_by_api_id(10)
        .await
        .unwrap()
        .unwrap()
        .id
        .unwrap();

    let engine = MetricsEngine::new(store.clone());
    assert_eq!(
        engine.season_average(player_id, Market::Points).await.unwrap(),
        Some(22.0)
    );
    assert_eq!(
        engine
            .rolling_average(player_id, Market::Points, 2)
            .await
            .unwrap(),
        Some(24.0)
    );

    // Line on the date of the most recent game
    let line_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    store
        .insert_line(&SportsbookLine {
            id: None,
            player_id,
            date: line_date,
            market: Market::Points,
            line_value: 23.0,
            book: "PrizePicks".to_string(),
        })
        .await
        .unwrap();

    let comparisons = engine.player_markets(player_id, line_date).await.unwrap();
    assert_eq!(comparisons.len(), 1);
    let points = &comparisons[0];
    assert_eq!(points.market, Market::Points);
    assert_eq!(points.line_value, 23.0);
    assert_eq!(points.season_avg, Some(22.0));
    assert_eq!(points.delta_line_vs_season, Some(1.0));
    assert_eq!(points.pct_diff_line_vs_season, Some(4.5));
}
