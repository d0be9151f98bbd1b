//! Core entities shared by the ingestion pipeline and the metrics engine.
//!
//! Internal `id` fields are surrogate keys assigned by storage; `api_id`
//! fields carry the upstream provider's identifiers and are the idempotency
//! keys for upserts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CourtlineError;

/// Betting market for player props
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Points,
    Rebounds,
    Assists,
    /// Combined points + rebounds + assists
    Pra,
}

impl Market {
    /// All markets, in presentation order
    pub const ALL: [Market; 4] = [
        Market::Points,
        Market::Rebounds,
        Market::Assists,
        Market::Pra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Points => "points",
            Market::Rebounds => "rebounds",
            Market::Assists => "assists",
            Market::Pra => "pra",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Market {
    type Err = CourtlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points" => Ok(Market::Points),
            "rebounds" => Ok(Market::Rebounds),
            "assists" => Ok(Market::Assists),
            "pra" => Ok(Market::Pra),
            other => Err(CourtlineError::InvalidMarket(other.to_string())),
        }
    }
}

/// Game status, collapsed from the provider's free-form status strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in_progress",
            GameStatus::Final => "final",
        }
    }

    /// Classify the provider's raw status field. The upstream sends "Final"
    /// for finished games, a tip-off timestamp for scheduled ones, and clock
    /// text ("Halftime", "3rd Qtr") while in progress.
    pub fn from_provider(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("final") {
            GameStatus::Final
        } else if raw.is_empty() || raw.parse::<DateTime<Utc>>().is_ok() {
            GameStatus::Scheduled
        } else {
            GameStatus::InProgress
        }
    }
}

impl std::str::FromStr for GameStatus {
    type Err = CourtlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(GameStatus::Scheduled),
            "in_progress" => Ok(GameStatus::InProgress),
            "final" => Ok(GameStatus::Final),
            other => Err(CourtlineError::Internal(format!(
                "unknown game status: {other}"
            ))),
        }
    }
}

/// An NBA team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<i64>,
    pub api_id: i64,
    pub name: String,
    pub full_name: Option<String>,
    pub abbreviation: Option<String>,
    pub city: Option<String>,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub is_nba: bool,
}

/// An NBA player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Option<i64>,
    pub api_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub position: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub jersey_number: Option<String>,
    /// Internal id of the owning team; None when the team was not yet ingested
    pub team_id: Option<i64>,
    pub image_url: Option<String>,
}

/// A scheduled or played game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Option<i64>,
    pub api_id: i64,
    pub date: DateTime<Utc>,
    pub season: Option<i32>,
    pub home_team_id: Option<i64>,
    pub visitor_team_id: Option<i64>,
    pub home_team_score: Option<i32>,
    pub visitor_team_score: Option<i32>,
    pub status: GameStatus,
    pub postseason: bool,
    // Legacy abbreviation fields kept for backward-compatible lookups
    pub home_team_abbr: Option<String>,
    pub visitor_team_abbr: Option<String>,
}

/// One player's box score for one game.
///
/// (player_id, game_id) pairs are unique; re-ingesting the same box score
/// replaces the row wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub id: Option<i64>,
    pub player_id: i64,
    pub game_id: i64,
    /// Game date, denormalized for time-window queries
    pub date: DateTime<Utc>,
    /// Provider-native "MM:SS" text
    pub minutes: Option<String>,
    pub points: i64,
    pub rebounds: i64,
    pub assists: i64,
    pub steals: i64,
    pub blocks: i64,
    pub turnovers: i64,
    pub personal_fouls: i64,
    pub oreb: i64,
    pub dreb: i64,
    pub fgm: i64,
    pub fga: i64,
    pub fg_pct: Option<f64>,
    pub fg3m: i64,
    pub fg3a: i64,
    pub fg3_pct: Option<f64>,
    pub ftm: i64,
    pub fta: i64,
    pub ft_pct: Option<f64>,
}

impl PlayerGameStats {
    /// Combined points + rebounds + assists for this game
    pub fn pra(&self) -> i64 {
        self.points + self.rebounds + self.assists
    }

    /// Minutes played as a fractional count, parsed from the "MM:SS" text
    pub fn minutes_played(&self) -> Option<f64> {
        parse_minutes(self.minutes.as_deref()?)
    }

    /// Value of the given market for this game
    pub fn market_value(&self, market: Market) -> i64 {
        match market {
            Market::Points => self.points,
            Market::Rebounds => self.rebounds,
            Market::Assists => self.assists,
            Market::Pra => self.pra(),
        }
    }
}

/// Parse provider-native "MM:SS" minutes text into a fractional minute count
pub fn parse_minutes(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((mins, secs)) => {
            let mins: f64 = mins.parse().ok()?;
            let secs: f64 = secs.parse().ok()?;
            Some(mins + secs / 60.0)
        }
        // Some feeds send whole minutes without seconds
        None => raw.parse().ok(),
    }
}

/// A sportsbook-published line for a player/market/date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportsbookLine {
    pub id: Option<i64>,
    pub player_id: i64,
    pub date: NaiveDate,
    pub market: Market,
    pub line_value: f64,
    pub book: String,
}

const HEADSHOT_CDN: &str = "https://cdn.nba.com/headshots/nba/latest";

/// Player headshot URL on the NBA CDN. The provider's player id is the
/// official NBA id, so the URL derives purely from it.
pub fn headshot_url(player_api_id: i64) -> String {
    format!("{HEADSHOT_CDN}/1040x760/{player_api_id}.png")
}

/// Smaller headshot for lists/cards
pub fn thumbnail_url(player_api_id: i64) -> String {
    format!("{HEADSHOT_CDN}/260x190/{player_api_id}.png")
}
