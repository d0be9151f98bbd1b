use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use courtline::cache::ResponseCache;
use courtline::cli::{Cli, Commands};
use courtline::config::AppConfig;
use courtline::ingest::IngestionPipeline;
use courtline::metrics::MetricsEngine;
use courtline::provider::ProviderClient;
use courtline::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config.logging.level);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Config error: {e}");
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }

    let store = SqliteStore::new(&config.database.url, config.database.max_connections).await?;
    store.migrate().await?;

    let cache = ResponseCache::new(store.clone(), config.cache.clone());

    match cli.command {
        Commands::IngestTeams => {
            let pipeline = build_pipeline(&config, &store, cache, false)?;
            let count = pipeline.ingest_teams().await?;
            info!(count, "Done");
        }
        Commands::IngestPlayers { team_ids } => {
            let pipeline = build_pipeline(&config, &store, cache, false)?;
            let count = pipeline.ingest_players(&team_ids).await?;
            info!(count, "Done");
        }
        Commands::IngestGames {
            season,
            start_date,
            end_date,
            postseason,
            team_ids,
        } => {
            let pipeline = build_pipeline(&config, &store, cache, false)?;
            let count = pipeline
                .ingest_games(season, &team_ids, start_date, end_date, postseason)
                .await?;
            info!(count, "Done");
        }
        Commands::IngestStats {
            season,
            start_date,
            end_date,
            postseason,
            game_ids,
            player_ids,
            strict,
        } => {
            let pipeline = build_pipeline(&config, &store, cache, strict)?;
            let count = pipeline
                .ingest_stats(season, &game_ids, &player_ids, start_date, end_date, postseason)
                .await?;
            info!(count, "Done");
        }
        Commands::IngestAll { season, strict } => {
            let pipeline = build_pipeline(&config, &store, cache, strict)?;
            let totals = pipeline.ingest_all(season).await?;
            info!(
                teams = totals.teams,
                players = totals.players,
                games = totals.games,
                stats = totals.stats,
                "Full ingestion complete"
            );
        }
        Commands::PurgeCache => {
            let purged = cache.purge_expired().await?;
            println!("Purged {purged} expired cache entries");
        }
        Commands::Markets { player_id, date } => {
            let engine = MetricsEngine::new(store.clone());
            let comparisons = engine.player_markets(player_id, date).await?;
            println!("{}", serde_json::to_string_pretty(&comparisons)?);
        }
        Commands::GameLogs { player_id, limit } => {
            let engine = MetricsEngine::new(store.clone());
            let logs = engine.recent_game_logs(player_id, limit).await?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
    }

    Ok(())
}

fn build_pipeline(
    config: &AppConfig,
    store: &SqliteStore,
    cache: ResponseCache,
    strict: bool,
) -> anyhow::Result<IngestionPipeline<ProviderClient>> {
    let client = ProviderClient::new(&config.provider)?.with_cache(cache);
    Ok(IngestionPipeline::new(client, store.clone())
        .with_strict_references(strict || config.ingest.strict_references))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},courtline=debug,sqlx=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
