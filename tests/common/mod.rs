//! Shared fixtures: an in-memory store and a canned upstream source.
#![allow(dead_code)]

use async_trait::async_trait;

use courtline::provider::{
    ApiGame, ApiPlayer, ApiStatLine, ApiTeam, GameFilter, PlayerFilter, SportsDataSource,
    StatFilter,
};
use courtline::store::SqliteStore;
use courtline::Result;

/// Fresh migrated store on a single-connection in-memory database
pub async fn memory_store() -> SqliteStore {
    let store = SqliteStore::new("sqlite::memory:", 1)
        .await
        .expect("in-memory store");
    store.migrate().await.expect("migrations");
    store
}

/// Upstream source serving canned payloads, ignoring filters
#[derive(Default, Clone)]
pub struct FakeSource {
    pub teams: Vec<ApiTeam>,
    pub players: Vec<ApiPlayer>,
    pub games: Vec<ApiGame>,
    pub stats: Vec<ApiStatLine>,
}

#[async_trait]
impl SportsDataSource for FakeSource {
    async fn teams(&self) -> Result<Vec<ApiTeam>> {
        Ok(self.teams.clone())
    }

    async fn players(&self, _filter: &PlayerFilter) -> Result<Vec<ApiPlayer>> {
        Ok(self.players.clone())
    }

    async fn games(&self, _filter: &GameFilter) -> Result<Vec<ApiGame>> {
        Ok(self.games.clone())
    }

    async fn stats(&self, _filter: &StatFilter) -> Result<Vec<ApiStatLine>> {
        Ok(self.stats.clone())
    }
}

pub fn api_team(id: i64, name: &str, abbreviation: &str) -> ApiTeam {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "full_name": format!("City {name}"),
        "abbreviation": abbreviation,
        "city": "City",
        "conference": "West",
        "division": "Pacific"
    }))
    .unwrap()
}

pub fn api_player(id: i64, first: &str, last: &str, team: Option<ApiTeam>) -> ApiPlayer {
    let mut value = serde_json::json!({
        "id": id,
        "first_name": first,
        "last_name": last,
        "position": "G",
        "height": "6-4",
        "weight": "200"
    });
    if let Some(team) = team {
        value["team"] = serde_json::json!({
            "id": team.id,
            "name": team.name,
            "abbreviation": team.abbreviation
        });
    }
    serde_json::from_value(value).unwrap()
}

pub fn api_game(id: i64, date: &str, home: &ApiTeam, visitor: &ApiTeam) -> ApiGame {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "date": date,
        "season": 2024,
        "status": "Final",
        "postseason": false,
        "home_team": {"id": home.id, "name": home.name, "abbreviation": home.abbreviation},
        "visitor_team": {"id": visitor.id, "name": visitor.name, "abbreviation": visitor.abbreviation},
        "home_team_score": 110,
        "visitor_team_score": 104
    }))
    .unwrap()
}

pub fn stat_line(
    player_api_id: i64,
    game_api_id: i64,
    date: &str,
    pts: i64,
    reb: i64,
    ast: i64,
) -> ApiStatLine {
    serde_json::from_value(serde_json::json!({
        "min": "34:10",
        "pts": pts,
        "reb": reb,
        "ast": ast,
        "stl": 1,
        "blk": 0,
        "turnover": 2,
        "pf": 3,
        "oreb": 1,
        "dreb": reb - 1,
        "fgm": 8,
        "fga": 16,
        "fg3m": 2,
        "fg3a": 6,
        "ftm": 4,
        "fta": 5,
        "player": {"id": player_api_id},
        "game": {"id": game_api_id, "date": date}
    }))
    .unwrap()
}
