//! Wire types for the upstream stats API.
//!
//! Paginated endpoints respond with `{ "data": [...], "meta": { "next_cursor": ... } }`;
//! single-resource endpoints wrap the object in `{ "data": {...} }`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// One page of a paginated response
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl<T: DeserializeOwned> Page<T> {
    /// Cursor to inject into the next request, if any
    pub fn next_cursor(&self) -> Option<&serde_json::Value> {
        self.meta
            .as_ref()
            .and_then(|m| m.next_cursor.as_ref())
            .filter(|c| !c.is_null())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    /// Opaque pagination cursor; absent or null on the last page
    #[serde(default)]
    pub next_cursor: Option<serde_json::Value>,
}

/// Single-resource response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Single<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeam {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlayer {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<String>,
    #[serde(default)]
    pub team: Option<ApiTeam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGame {
    pub id: i64,
    /// ISO-8601, sometimes with a trailing 'Z'
    pub date: String,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub postseason: bool,
    pub home_team: ApiTeam,
    pub visitor_team: ApiTeam,
    #[serde(default)]
    pub home_team_score: Option<i32>,
    #[serde(default)]
    pub visitor_team_score: Option<i32>,
}

/// Nested references inside a stat line; only the fields the pipeline needs
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlayerRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGameRef {
    pub id: i64,
    pub date: String,
}

/// One box-score row from the stats endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatLine {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub pts: Option<i64>,
    #[serde(default)]
    pub reb: Option<i64>,
    #[serde(default)]
    pub ast: Option<i64>,
    #[serde(default)]
    pub stl: Option<i64>,
    #[serde(default)]
    pub blk: Option<i64>,
    #[serde(default)]
    pub turnover: Option<i64>,
    #[serde(default)]
    pub pf: Option<i64>,
    #[serde(default)]
    pub oreb: Option<i64>,
    #[serde(default)]
    pub dreb: Option<i64>,
    #[serde(default)]
    pub fgm: Option<i64>,
    #[serde(default)]
    pub fga: Option<i64>,
    #[serde(default)]
    pub fg_pct: Option<f64>,
    #[serde(default)]
    pub fg3m: Option<i64>,
    #[serde(default)]
    pub fg3a: Option<i64>,
    #[serde(default)]
    pub fg3_pct: Option<f64>,
    #[serde(default)]
    pub ftm: Option<i64>,
    #[serde(default)]
    pub fta: Option<i64>,
    #[serde(default)]
    pub ft_pct: Option<f64>,
    pub player: ApiPlayerRef,
    pub game: ApiGameRef,
}

/// Season-aggregate row from the season_averages endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSeasonAverage {
    pub player_id: i64,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub pts: Option<f64>,
    #[serde(default)]
    pub reb: Option<f64>,
    #[serde(default)]
    pub ast: Option<f64>,
    #[serde(default)]
    pub stl: Option<f64>,
    #[serde(default)]
    pub blk: Option<f64>,
    #[serde(default)]
    pub turnover: Option<f64>,
}
