//! Idempotent ingestion pipeline: teams → players → games → stats.
//!
//! Every stage upserts on the upstream api_id (or the (player, game) pair for
//! box scores), so re-running a stage with the same upstream data refreshes
//! rows instead of duplicating them. Stages must run in dependency order:
//! each stage resolves foreign keys through an identity map snapshotted from
//! rows the previous stages committed.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::domain::{self, Game, GameStatus, Player, PlayerGameStats, Team};
use crate::error::{CourtlineError, Result};
use crate::provider::{GameFilter, PlayerFilter, SportsDataSource, StatFilter};
use crate::store::SqliteStore;

/// Commit every N player/game upserts to bound transaction size
const ENTITY_BATCH: u64 = 100;
/// Stat rows are smaller and arrive in bulk; commit less often
const STATS_BATCH: u64 = 500;

/// Row counts from a full ingestion run
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestTotals {
    pub teams: u64,
    pub players: u64,
    pub games: u64,
    pub stats: u64,
}

/// Synchronizes upstream entities into local storage.
///
/// Generic over the data source so tests can feed canned upstream payloads.
pub struct IngestionPipeline<S: SportsDataSource> {
    source: S,
    store: SqliteStore,
    strict_references: bool,
}

impl<S: SportsDataSource> IngestionPipeline<S> {
    pub fn new(source: S, store: SqliteStore) -> Self {
        Self {
            source,
            store,
            strict_references: false,
        }
    }

    /// Fail a stats batch on unresolved player/game references instead of
    /// skipping rows with a warning
    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// Ingest all teams. No dependency on other entities.
    pub async fn ingest_teams(&self) -> Result<u64> {
        info!("Starting teams ingestion");

        let teams = self.source.teams().await?;
        let mut tx = self.store.pool().begin().await?;
        let mut count = 0u64;

        for api_team in teams {
            let team = Team {
                id: None,
                api_id: api_team.id,
                name: api_team.name,
                full_name: api_team.full_name,
                abbreviation: api_team.abbreviation,
                city: api_team.city,
                conference: api_team.conference,
                division: api_team.division,
                is_nba: true,
            };
            self.store.upsert_team(&mut *tx, &team).await?;
            count += 1;
        }

        tx.commit().await?;
        info!(count, "Teams ingestion complete");
        Ok(count)
    }

    /// Ingest players, optionally filtered by upstream team ids.
    ///
    /// A player whose team has not been ingested yet is still inserted, with
    /// a null team reference and a warning — never dropped.
    pub async fn ingest_players(&self, team_ids: &[i64]) -> Result<u64> {
        info!(?team_ids, "Starting players ingestion");

        let filter = PlayerFilter {
            search: None,
            team_ids: team_ids.to_vec(),
        };
        let players = self.source.players(&filter).await?;

        // Snapshot the team map once; players only resolve teams committed
        // before this stage started
        let team_map = self.store.team_id_map().await?;

        let mut tx = self.store.pool().begin().await?;
        let mut count = 0u64;

        for api_player in players {
            let api_team_id = api_player.team.as_ref().map(|t| t.id);
            let team_id = api_team_id.and_then(|id| team_map.get(&id).copied());
            if team_id.is_none() {
                if let Some(api_team_id) = api_team_id {
                    warn!(
                        team_api_id = api_team_id,
                        player_api_id = api_player.id,
                        "Team not found in database, inserting player without team"
                    );
                }
            }

            let first_name = api_player.first_name.unwrap_or_default();
            let last_name = api_player.last_name.unwrap_or_default();
            let full_name = format!("{first_name} {last_name}").trim().to_string();

            let player = Player {
                id: None,
                api_id: api_player.id,
                image_url: Some(domain::headshot_url(api_player.id)),
                first_name: Some(first_name),
                last_name: Some(last_name),
                full_name,
                position: api_player.position,
                height: api_player.height,
                weight: api_player.weight,
                jersey_number: api_player.jersey_number,
                team_id,
            };
            self.store.upsert_player(&mut *tx, &player).await?;
            count += 1;

            if count % ENTITY_BATCH == 0 {
                info!(count, "Processed players batch");
                tx.commit().await?;
                tx = self.store.pool().begin().await?;
            }
        }

        tx.commit().await?;
        info!(count, "Players ingestion complete");
        Ok(count)
    }

    /// Ingest games for a season, optionally windowed by team/date/postseason
    pub async fn ingest_games(
        &self,
        season: i32,
        team_ids: &[i64],
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        postseason: bool,
    ) -> Result<u64> {
        info!(season, "Starting games ingestion");

        let filter = GameFilter {
            seasons: vec![season],
            team_ids: team_ids.to_vec(),
            start_date,
            end_date,
            postseason: Some(postseason),
        };
        let games = self.source.games(&filter).await?;

        let team_map = self.store.team_id_map().await?;

        let mut tx = self.store.pool().begin().await?;
        let mut count = 0u64;

        for api_game in games {
            let date = parse_provider_date(&api_game.date)?;
            let status = api_game
                .status
                .as_deref()
                .map(GameStatus::from_provider)
                .unwrap_or(GameStatus::Scheduled);

            let game = Game {
                id: None,
                api_id: api_game.id,
                date,
                season: api_game.season.or(Some(season)),
                home_team_id: team_map.get(&api_game.home_team.id).copied(),
                visitor_team_id: team_map.get(&api_game.visitor_team.id).copied(),
                home_team_score: api_game.home_team_score,
                visitor_team_score: api_game.visitor_team_score,
                status,
                postseason: api_game.postseason,
                home_team_abbr: api_game.home_team.abbreviation,
                visitor_team_abbr: api_game.visitor_team.abbreviation,
            };
            self.store.upsert_game(&mut *tx, &game).await?;
            count += 1;

            if count % ENTITY_BATCH == 0 {
                info!(count, "Processed games batch");
                tx.commit().await?;
                tx = self.store.pool().begin().await?;
            }
        }

        tx.commit().await?;
        info!(count, "Games ingestion complete");
        Ok(count)
    }

    /// Ingest box scores for a season.
    ///
    /// Rows referencing a player or game that is not yet stored are skipped
    /// with a warning (the returned count excludes them) unless strict
    /// references are enabled, in which case the batch fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_stats(
        &self,
        season: i32,
        game_ids: &[i64],
        player_ids: &[i64],
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        postseason: bool,
    ) -> Result<u64> {
        info!(season, "Starting stats ingestion");

        let filter = StatFilter {
            seasons: vec![season],
            game_ids: game_ids.to_vec(),
            player_ids: player_ids.to_vec(),
            start_date,
            end_date,
            postseason: Some(postseason),
        };
        let stats = self.source.stats(&filter).await?;

        let player_map = self.store.player_id_map().await?;
        let game_map = self.store.game_id_map().await?;

        let mut tx = self.store.pool().begin().await?;
        let mut count = 0u64;

        for line in stats {
            let player_id = match player_map.get(&line.player.id) {
                Some(id) => *id,
                None => {
                    if self.strict_references {
                        return Err(CourtlineError::MissingReference {
                            entity: "player",
                            api_id: line.player.id,
                        });
                    }
                    warn!(
                        player_api_id = line.player.id,
                        "Player not found in database, skipping stat"
                    );
                    continue;
                }
            };
            let game_id = match game_map.get(&line.game.id) {
                Some(id) => *id,
                None => {
                    if self.strict_references {
                        return Err(CourtlineError::MissingReference {
                            entity: "game",
                            api_id: line.game.id,
                        });
                    }
                    warn!(
                        game_api_id = line.game.id,
                        "Game not found in database, skipping stat"
                    );
                    continue;
                }
            };

            let date = parse_provider_date(&line.game.date)?;
            let oreb = line.oreb.unwrap_or(0);
            let dreb = line.dreb.unwrap_or(0);
            let fgm = line.fgm.unwrap_or(0);
            let fga = line.fga.unwrap_or(0);
            let fg3m = line.fg3m.unwrap_or(0);
            let fg3a = line.fg3a.unwrap_or(0);
            let ftm = line.ftm.unwrap_or(0);
            let fta = line.fta.unwrap_or(0);

            let stats_row = PlayerGameStats {
                id: None,
                player_id,
                game_id,
                date,
                minutes: line.min,
                points: line.pts.unwrap_or(0),
                // Trust the provider's total when present, otherwise derive
                // it from the offensive/defensive split
                rebounds: line.reb.unwrap_or(oreb + dreb),
                assists: line.ast.unwrap_or(0),
                steals: line.stl.unwrap_or(0),
                blocks: line.blk.unwrap_or(0),
                turnovers: line.turnover.unwrap_or(0),
                personal_fouls: line.pf.unwrap_or(0),
                oreb,
                dreb,
                fgm,
                fga,
                fg_pct: line.fg_pct.or_else(|| shooting_pct(fgm, fga)),
                fg3m,
                fg3a,
                fg3_pct: line.fg3_pct.or_else(|| shooting_pct(fg3m, fg3a)),
                ftm,
                fta,
                ft_pct: line.ft_pct.or_else(|| shooting_pct(ftm, fta)),
            };
            self.store.upsert_stats(&mut *tx, &stats_row).await?;
            count += 1;

            if count % STATS_BATCH == 0 {
                info!(count, "Processed stats batch");
                tx.commit().await?;
                tx = self.store.pool().begin().await?;
            }
        }

        tx.commit().await?;
        info!(count, "Stats ingestion complete");
        Ok(count)
    }

    /// Run all four stages in dependency order for one season
    pub async fn ingest_all(&self, season: i32) -> Result<IngestTotals> {
        let teams = self.ingest_teams().await?;
        let players = self.ingest_players(&[]).await?;
        let games = self.ingest_games(season, &[], None, None, false).await?;
        let stats = self.ingest_stats(season, &[], &[], None, None, false).await?;

        Ok(IngestTotals {
            teams,
            players,
            games,
            stats,
        })
    }
}

/// Parse the provider's ISO-8601 dates, normalizing the 'Z' UTC suffix.
/// Some endpoints send plain calendar dates; those become midnight UTC.
fn parse_provider_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    Err(CourtlineError::InvalidDate(raw.to_string()))
}

/// Recompute a shooting percentage when the provider omitted it
fn shooting_pct(makes: i64, attempts: i64) -> Option<f64> {
    if attempts > 0 {
        Some(makes as f64 / attempts as f64)
    } else {
        None
    }
}
