//! Upstream sports-data provider: rate-limited HTTP client, pagination, and
//! the trait seam the ingestion pipeline consumes.

pub mod client;
pub mod types;

pub use client::ProviderClient;
pub use types::{
    ApiGame, ApiPlayer, ApiSeasonAverage, ApiStatLine, ApiTeam, Page, PageMeta, Single,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;

/// Filter for the players endpoint
#[derive(Debug, Clone, Default)]
pub struct PlayerFilter {
    pub search: Option<String>,
    pub team_ids: Vec<i64>,
}

impl PlayerFilter {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        for id in &self.team_ids {
            params.push(("team_ids[]".to_string(), id.to_string()));
        }
        params
    }
}

/// Filter for the games endpoint
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    pub seasons: Vec<i32>,
    pub team_ids: Vec<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub postseason: Option<bool>,
}

impl GameFilter {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for season in &self.seasons {
            params.push(("seasons[]".to_string(), season.to_string()));
        }
        for id in &self.team_ids {
            params.push(("team_ids[]".to_string(), id.to_string()));
        }
        if let Some(d) = self.start_date {
            params.push(("start_date".to_string(), d.to_string()));
        }
        if let Some(d) = self.end_date {
            params.push(("end_date".to_string(), d.to_string()));
        }
        if let Some(p) = self.postseason {
            params.push(("postseason".to_string(), p.to_string()));
        }
        params
    }
}

/// Filter for the stats endpoint
#[derive(Debug, Clone, Default)]
pub struct StatFilter {
    pub seasons: Vec<i32>,
    pub game_ids: Vec<i64>,
    pub player_ids: Vec<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub postseason: Option<bool>,
}

impl StatFilter {
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for id in &self.game_ids {
            params.push(("game_ids[]".to_string(), id.to_string()));
        }
        for id in &self.player_ids {
            params.push(("player_ids[]".to_string(), id.to_string()));
        }
        for season in &self.seasons {
            params.push(("seasons[]".to_string(), season.to_string()));
        }
        if let Some(d) = self.start_date {
            params.push(("start_date".to_string(), d.to_string()));
        }
        if let Some(d) = self.end_date {
            params.push(("end_date".to_string(), d.to_string()));
        }
        if let Some(p) = self.postseason {
            params.push(("postseason".to_string(), p.to_string()));
        }
        params
    }
}

/// Upstream data source consumed by the ingestion pipeline.
///
/// `ProviderClient` is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait SportsDataSource: Send + Sync {
    async fn teams(&self) -> Result<Vec<ApiTeam>>;
    async fn players(&self, filter: &PlayerFilter) -> Result<Vec<ApiPlayer>>;
    async fn games(&self, filter: &GameFilter) -> Result<Vec<ApiGame>>;
    async fn stats(&self, filter: &StatFilter) -> Result<Vec<ApiStatLine>>;
}
