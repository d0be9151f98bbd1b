use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, SqliteExecutor};
use tracing::info;

use crate::domain::{Game, Market, Player, PlayerGameStats, SportsbookLine, Team};
use crate::error::Result;

/// SQLite storage adapter
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the database file if missing
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite");
        Ok(Self { pool })
    }

    /// Create a store from an existing connection pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== Upserts ====================
    //
    // Upserts take an explicit executor so the ingestion pipeline can batch
    // them inside one transaction and control commit size.

    /// Insert or update a team, keyed on its external api_id
    pub async fn upsert_team(
        &self,
        exec: impl SqliteExecutor<'_>,
        team: &Team,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO teams
                (api_id, name, full_name, abbreviation, city, conference, division,
                 is_nba, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (api_id) DO UPDATE SET
                name = excluded.name,
                full_name = excluded.full_name,
                abbreviation = excluded.abbreviation,
                city = excluded.city,
                conference = excluded.conference,
                division = excluded.division,
                is_nba = excluded.is_nba,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(team.api_id)
        .bind(&team.name)
        .bind(&team.full_name)
        .bind(&team.abbreviation)
        .bind(&team.city)
        .bind(&team.conference)
        .bind(&team.division)
        .bind(team.is_nba)
        .bind(now)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Insert or update a player, keyed on its external api_id
    pub async fn upsert_player(
        &self,
        exec: impl SqliteExecutor<'_>,
        player: &Player,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO players
                (api_id, first_name, last_name, full_name, position, height, weight,
                 jersey_number, team_id, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (api_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                full_name = excluded.full_name,
                position = excluded.position,
                height = excluded.height,
                weight = excluded.weight,
                jersey_number = excluded.jersey_number,
                team_id = excluded.team_id,
                image_url = excluded.image_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(player.api_id)
        .bind(&player.first_name)
        .bind(&player.last_name)
        .bind(&player.full_name)
        .bind(&player.position)
        .bind(&player.height)
        .bind(&player.weight)
        .bind(&player.jersey_number)
        .bind(player.team_id)
        .bind(&player.image_url)
        .bind(now)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Insert or update a game, keyed on its external api_id
    pub async fn upsert_game(&self, exec: impl SqliteExecutor<'_>, game: &Game) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO games
                (api_id, date, season, home_team_id, visitor_team_id,
                 home_team_score, visitor_team_score, status, postseason,
                 home_team_abbr, visitor_team_abbr, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (api_id) DO UPDATE SET
                date = excluded.date,
                season = excluded.season,
                home_team_id = excluded.home_team_id,
                visitor_team_id = excluded.visitor_team_id,
                home_team_score = excluded.home_team_score,
                visitor_team_score = excluded.visitor_team_score,
                status = excluded.status,
                postseason = excluded.postseason,
                home_team_abbr = excluded.home_team_abbr,
                visitor_team_abbr = excluded.visitor_team_abbr,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(game.api_id)
        .bind(game.date)
        .bind(game.season)
        .bind(game.home_team_id)
        .bind(game.visitor_team_id)
        .bind(game.home_team_score)
        .bind(game.visitor_team_score)
        .bind(game.status.as_str())
        .bind(game.postseason)
        .bind(&game.home_team_abbr)
        .bind(&game.visitor_team_abbr)
        .bind(now)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Insert or update a box score, keyed on the (player_id, game_id)
    /// unique constraint. Stat values are overwritten wholesale, never merged.
    pub async fn upsert_stats(
        &self,
        exec: impl SqliteExecutor<'_>,
        stats: &PlayerGameStats,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO player_game_stats
                (player_id, game_id, date, minutes, points, rebounds, assists,
                 steals, blocks, turnovers, personal_fouls, oreb, dreb,
                 fgm, fga, fg_pct, fg3m, fg3a, fg3_pct, ftm, fta, ft_pct,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (player_id, game_id) DO UPDATE SET
                date = excluded.date,
                minutes = excluded.minutes,
                points = excluded.points,
                rebounds = excluded.rebounds,
                assists = excluded.assists,
                steals = excluded.steals,
                blocks = excluded.blocks,
                turnovers = excluded.turnovers,
                personal_fouls = excluded.personal_fouls,
                oreb = excluded.oreb,
                dreb = excluded.dreb,
                fgm = excluded.fgm,
                fga = excluded.fga,
                fg_pct = excluded.fg_pct,
                fg3m = excluded.fg3m,
                fg3a = excluded.fg3a,
                fg3_pct = excluded.fg3_pct,
                ftm = excluded.ftm,
                fta = excluded.fta,
                ft_pct = excluded.ft_pct,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(stats.player_id)
        .bind(stats.game_id)
        .bind(stats.date)
        .bind(&stats.minutes)
        .bind(stats.points)
        .bind(stats.rebounds)
        .bind(stats.assists)
        .bind(stats.steals)
        .bind(stats.blocks)
        .bind(stats.turnovers)
        .bind(stats.personal_fouls)
        .bind(stats.oreb)
        .bind(stats.dreb)
        .bind(stats.fgm)
        .bind(stats.fga)
        .bind(stats.fg_pct)
        .bind(stats.fg3m)
        .bind(stats.fg3a)
        .bind(stats.fg3_pct)
        .bind(stats.ftm)
        .bind(stats.fta)
        .bind(stats.ft_pct)
        .bind(now)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(())
    }

    // ==================== Identity maps ====================
    //
    // Each map is a fresh full-table snapshot of (api_id -> internal id).
    // Callers re-read after inserting rows they expect to resolve.

    pub async fn team_id_map(&self) -> Result<HashMap<i64, i64>> {
        self.id_map("teams").await
    }

    pub async fn player_id_map(&self) -> Result<HashMap<i64, i64>> {
        self.id_map("players").await
    }

    pub async fn game_id_map(&self) -> Result<HashMap<i64, i64>> {
        self.id_map("games").await
    }

    async fn id_map(&self, table: &str) -> Result<HashMap<i64, i64>> {
        // Table name comes from the three fixed callers above
        let rows = sqlx::query(&format!("SELECT api_id, id FROM {table}"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get::<i64, _>("api_id"), r.get::<i64, _>("id")))
            .collect())
    }

    // ==================== Entity lookups ====================

    pub async fn team_by_api_id(&self, api_id: i64) -> Result<Option<Team>> {
        let row = sqlx::query(
            r#"
            SELECT id, api_id, name, full_name, abbreviation, city, conference,
                   division, is_nba
            FROM teams WHERE api_id = ?
            "#,
        )
        .bind(api_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Team {
            id: Some(r.get("id")),
            api_id: r.get("api_id"),
            name: r.get("name"),
            full_name: r.get("full_name"),
            abbreviation: r.get("abbreviation"),
            city: r.get("city"),
            conference: r.get("conference"),
            division: r.get("division"),
            is_nba: r.get("is_nba"),
        }))
    }

    pub async fn player_by_api_id(&self, api_id: i64) -> Result<Option<Player>> {
        let row = sqlx::query(
            r#"
            SELECT id, api_id, first_name, last_name, full_name, position,
                   height, weight, jersey_number, team_id, image_url
            FROM players WHERE api_id = ?
            "#,
        )
        .bind(api_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Player {
            id: Some(r.get("id")),
            api_id: r.get("api_id"),
            first_name: r.get("first_name"),
            last_name: r.get("last_name"),
            full_name: r.get("full_name"),
            position: r.get("position"),
            height: r.get("height"),
            weight: r.get("weight"),
            jersey_number: r.get("jersey_number"),
            team_id: r.get("team_id"),
            image_url: r.get("image_url"),
        }))
    }

    pub async fn game_by_api_id(&self, api_id: i64) -> Result<Option<Game>> {
        let row = sqlx::query(
            r#"
            SELECT id, api_id, date, season, home_team_id, visitor_team_id,
                   home_team_score, visitor_team_score, status, postseason,
                   home_team_abbr, visitor_team_abbr
            FROM games WHERE api_id = ?
            "#,
        )
        .bind(api_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let status: String = r.get("status");
            Ok(Game {
                id: Some(r.get("id")),
                api_id: r.get("api_id"),
                date: r.get("date"),
                season: r.get("season"),
                home_team_id: r.get("home_team_id"),
                visitor_team_id: r.get("visitor_team_id"),
                home_team_score: r.get("home_team_score"),
                visitor_team_score: r.get("visitor_team_score"),
                status: status.parse()?,
                postseason: r.get("postseason"),
                home_team_abbr: r.get("home_team_abbr"),
                visitor_team_abbr: r.get("visitor_team_abbr"),
            })
        })
        .transpose()
    }

    // ==================== Metric queries ====================

    /// Most recent stat rows for a player, newest first. `limit` of None
    /// returns every stored row.
    pub async fn recent_stats(
        &self,
        player_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<PlayerGameStats>> {
        let rows = sqlx::query(
            r#"
            SELECT id, player_id, game_id, date, minutes, points, rebounds,
                   assists, steals, blocks, turnovers, personal_fouls, oreb,
                   dreb, fgm, fga, fg_pct, fg3m, fg3a, fg3_pct, ftm, fta, ft_pct
            FROM player_game_stats
            WHERE player_id = ?
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(player_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PlayerGameStats {
                id: Some(r.get("id")),
                player_id: r.get("player_id"),
                game_id: r.get("game_id"),
                date: r.get("date"),
                minutes: r.get("minutes"),
                points: r.get("points"),
                rebounds: r.get("rebounds"),
                assists: r.get("assists"),
                steals: r.get("steals"),
                blocks: r.get("blocks"),
                turnovers: r.get("turnovers"),
                personal_fouls: r.get("personal_fouls"),
                oreb: r.get("oreb"),
                dreb: r.get("dreb"),
                fgm: r.get("fgm"),
                fga: r.get("fga"),
                fg_pct: r.get("fg_pct"),
                fg3m: r.get("fg3m"),
                fg3a: r.get("fg3a"),
                fg3_pct: r.get("fg3_pct"),
                ftm: r.get("ftm"),
                fta: r.get("fta"),
                ft_pct: r.get("ft_pct"),
            })
            .collect())
    }

    /// Sportsbook line for a player/market on an exact calendar day
    pub async fn line_for(
        &self,
        player_id: i64,
        market: Market,
        date: NaiveDate,
    ) -> Result<Option<SportsbookLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, player_id, date, market, line_value, book
            FROM sportsbook_lines
            WHERE player_id = ? AND market = ? AND date = ?
            LIMIT 1
            "#,
        )
        .bind(player_id)
        .bind(market.as_str())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let market: String = r.get("market");
            Ok(SportsbookLine {
                id: Some(r.get("id")),
                player_id: r.get("player_id"),
                date: r.get("date"),
                market: market.parse()?,
                line_value: r.get("line_value"),
                book: r.get("book"),
            })
        })
        .transpose()
    }

    /// Insert a sportsbook line (lines are append-only; a separate feed
    /// populates them in production, tests and fixtures use this directly)
    pub async fn insert_line(&self, line: &SportsbookLine) -> Result<i64> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO sportsbook_lines
                (player_id, date, market, line_value, book, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(line.player_id)
        .bind(line.date)
        .bind(line.market.as_str())
        .bind(line.line_value)
        .bind(&line.book)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// Recent stat rows joined with their game and the player's team, for
    /// building game logs with opponent abbreviations
    pub async fn game_log_rows(&self, player_id: i64, limit: i64) -> Result<Vec<GameLogRow>> {
        let rows = sqlx::query(
            r#"
            SELECT s.date, s.minutes, s.points, s.rebounds, s.assists,
                   g.home_team_id, g.home_team_abbr, g.visitor_team_abbr,
                   p.team_id AS player_team_id
            FROM player_game_stats s
            JOIN games g ON g.id = s.game_id
            JOIN players p ON p.id = s.player_id
            WHERE s.player_id = ?
            ORDER BY s.date DESC
            LIMIT ?
            "#,
        )
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| GameLogRow {
                date: r.get("date"),
                minutes: r.get("minutes"),
                points: r.get("points"),
                rebounds: r.get("rebounds"),
                assists: r.get("assists"),
                home_team_id: r.get("home_team_id"),
                player_team_id: r.get("player_team_id"),
                home_team_abbr: r.get("home_team_abbr"),
                visitor_team_abbr: r.get("visitor_team_abbr"),
            })
            .collect())
    }

    // ==================== Cache rows ====================

    pub async fn cache_get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT payload FROM api_cache WHERE cache_key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("payload")))
    }

    pub async fn cache_put(
        &self,
        key: &str,
        payload: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO api_cache (cache_key, payload, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (cache_key) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(expires_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete all expired cache entries, returning the number removed
    pub async fn cache_purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM api_cache WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// One row of a player's game log, with enough context to name the opponent
#[derive(Debug, Clone)]
pub struct GameLogRow {
    pub date: DateTime<Utc>,
    pub minutes: Option<String>,
    pub points: i64,
    pub rebounds: i64,
    pub assists: i64,
    pub home_team_id: Option<i64>,
    pub player_team_id: Option<i64>,
    pub home_team_abbr: Option<String>,
    pub visitor_team_abbr: Option<String>,
}
