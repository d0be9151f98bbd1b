use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "courtline")]
#[command(version = "0.1.0")]
#[command(about = "NBA player-prop analytics: ingestion and line comparisons", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest all NBA teams
    IngestTeams,
    /// Ingest players, optionally filtered by upstream team ids
    IngestPlayers {
        /// Upstream team ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        team_ids: Vec<i64>,
    },
    /// Ingest games for a season
    IngestGames {
        /// Season year (e.g. 2024 for the 2024-25 season)
        #[arg(long)]
        season: i32,
        /// Games on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Games on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Playoff games instead of regular season
        #[arg(long)]
        postseason: bool,
        /// Upstream team ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        team_ids: Vec<i64>,
    },
    /// Ingest box scores for a season
    IngestStats {
        /// Season year
        #[arg(long)]
        season: i32,
        /// Stats on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Stats on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Playoff stats instead of regular season
        #[arg(long)]
        postseason: bool,
        /// Upstream game ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        game_ids: Vec<i64>,
        /// Upstream player ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        player_ids: Vec<i64>,
        /// Fail the batch on unresolved player/game references
        #[arg(long)]
        strict: bool,
    },
    /// Run all four ingestion stages in dependency order
    IngestAll {
        /// Season year
        #[arg(long)]
        season: i32,
        /// Fail stats ingestion on unresolved references
        #[arg(long)]
        strict: bool,
    },
    /// Delete expired response-cache entries
    PurgeCache,
    /// Show line-vs-average comparisons for a player on a date
    Markets {
        /// Internal player id
        #[arg(long)]
        player_id: i64,
        /// Line date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Show a player's recent game log
    GameLogs {
        /// Internal player id
        #[arg(long)]
        player_id: i64,
        /// Number of games
        #[arg(long, default_value = "10")]
        limit: i64,
    },
}
