//! Derived statistics: season and rolling averages per market, and the
//! line-vs-average comparisons the prop views are built from.
//!
//! "No data" is always `None`, never zero — callers must be able to tell a
//! quiet rookie from a failed query.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{parse_minutes, Market, PlayerGameStats};
use crate::error::Result;
use crate::store::SqliteStore;

/// One market's line compared against the player's recent performance.
/// All numeric fields are rounded to one decimal place.
#[derive(Debug, Clone, Serialize)]
pub struct MarketComparison {
    pub market: Market,
    pub line_value: f64,
    pub book: String,
    pub season_avg: Option<f64>,
    pub last5_avg: Option<f64>,
    pub last10_avg: Option<f64>,
    /// line − season average; positive means the line sits above performance
    pub delta_line_vs_season: Option<f64>,
    pub delta_line_vs_last5: Option<f64>,
    pub pct_diff_line_vs_season: Option<f64>,
    pub pct_diff_line_vs_last5: Option<f64>,
}

/// One row of a player's recent game log
#[derive(Debug, Clone, Serialize)]
pub struct GameLogEntry {
    pub date: NaiveDate,
    pub opponent: Option<String>,
    pub points: i64,
    pub rebounds: i64,
    pub assists: i64,
    /// Provider-native "MM:SS" text
    pub minutes: Option<String>,
    /// Minutes as a fractional count, when the text parses
    pub minutes_played: Option<f64>,
    pub pra: i64,
}

/// Computes derived statistics from stored box scores and lines
pub struct MetricsEngine {
    store: SqliteStore,
}

impl MetricsEngine {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Mean of the market value across every stored game for the player.
    ///
    /// Note: despite the name, no season predicate is applied — the average
    /// spans all stored rows, matching the behavior the prop views were
    /// built against. None when the player has no stored games.
    pub async fn season_average(&self, player_id: i64, market: Market) -> Result<Option<f64>> {
        let stats = self.store.recent_stats(player_id, None).await?;
        Ok(mean_market(&stats, market))
    }

    /// Mean of the market value over the `last_n` most recent games by date.
    /// Fewer stored games than `last_n` averages whatever exists; zero games
    /// is None.
    pub async fn rolling_average(
        &self,
        player_id: i64,
        market: Market,
        last_n: i64,
    ) -> Result<Option<f64>> {
        let stats = self.store.recent_stats(player_id, Some(last_n)).await?;
        Ok(mean_market(&stats, market))
    }

    /// Compare the player's sportsbook lines for `as_of_date` against season,
    /// 5-game, and 10-game baselines. Markets without a line that day are
    /// omitted entirely.
    pub async fn player_markets(
        &self,
        player_id: i64,
        as_of_date: NaiveDate,
    ) -> Result<Vec<MarketComparison>> {
        let mut comparisons = Vec::new();

        for market in Market::ALL {
            let line = match self.store.line_for(player_id, market, as_of_date).await? {
                Some(line) => line,
                None => continue,
            };

            let season_avg = self.season_average(player_id, market).await?;
            let last5_avg = self.rolling_average(player_id, market, 5).await?;
            let last10_avg = self.rolling_average(player_id, market, 10).await?;

            let delta_line_vs_season = season_avg.map(|avg| line.line_value - avg);
            let delta_line_vs_last5 = last5_avg.map(|avg| line.line_value - avg);

            comparisons.push(MarketComparison {
                market,
                line_value: round1(line.line_value),
                book: line.book,
                season_avg: season_avg.map(round1),
                last5_avg: last5_avg.map(round1),
                last10_avg: last10_avg.map(round1),
                delta_line_vs_season: delta_line_vs_season.map(round1),
                delta_line_vs_last5: delta_line_vs_last5.map(round1),
                pct_diff_line_vs_season: pct_diff(line.line_value, season_avg),
                pct_diff_line_vs_last5: pct_diff(line.line_value, last5_avg),
            });
        }

        Ok(comparisons)
    }

    /// The `limit` most recent game-log rows for the player, newest first
    pub async fn recent_game_logs(&self, player_id: i64, limit: i64) -> Result<Vec<GameLogEntry>> {
        let rows = self.store.game_log_rows(player_id, limit).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                // Opponent is the opposing side of the player's own team;
                // when the player's team is unresolved, fall back to the
                // visitor abbreviation
                let player_is_home = match (row.player_team_id, row.home_team_id) {
                    (Some(player_team), Some(home_team)) => player_team == home_team,
                    _ => true,
                };
                let opponent = if player_is_home {
                    row.visitor_team_abbr
                } else {
                    row.home_team_abbr
                };

                let minutes_played = row.minutes.as_deref().and_then(parse_minutes);

                GameLogEntry {
                    date: row.date.date_naive(),
                    opponent,
                    points: row.points,
                    rebounds: row.rebounds,
                    assists: row.assists,
                    minutes: row.minutes,
                    minutes_played,
                    pra: row.points + row.rebounds + row.assists,
                }
            })
            .collect())
    }
}

/// Per-game market value averaged over the given rows. PRA is summed per
/// game first, then averaged, so it matches sum(per-game PRA) / game count.
fn mean_market(stats: &[PlayerGameStats], market: Market) -> Option<f64> {
    if stats.is_empty() {
        return None;
    }
    let total: i64 = stats.iter().map(|s| s.market_value(market)).sum();
    Some(total as f64 / stats.len() as f64)
}

/// (line − avg) / avg × 100, rounded to one decimal. None average propagates
/// as None; a zero average suppresses the percentage rather than emitting
/// infinity.
fn pct_diff(line_value: f64, avg: Option<f64>) -> Option<f64> {
    let avg = avg?;
    if avg == 0.0 {
        return None;
    }
    Some(round1((line_value - avg) / avg * 100.0))
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
