//! Support bot HTTP server.
//!
//! Serves the conversation API over a rule-based intent classifier and a
//! per-session dialog router, with PostgreSQL-backed order, catalog and
//! FAQ lookups when `DATABASE_URL` is set.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sb_dialog::SentimentScorer;
use sb_nlu::{IntentClassifier, KeywordSentiment, RuleClassifier, RuleTable};
use sb_server::config::ServerConfig;
use sb_server::db;
use sb_server::db::log_writer::{ChannelLog, spawn_writer};
use sb_server::routes;
use sb_server::scorer::HttpScorer;
use sb_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sb-server starting");

    let config = match std::env::var("SB_CONFIG") {
        Ok(path) => {
            tracing::info!(path = %path, "loading config file");
            ServerConfig::from_file(&path)?
        }
        Err(_) => ServerConfig::from_env(),
    };

    let table = match &config.rules_file {
        Some(path) => {
            tracing::info!(path = %path, "loading intent rules");
            RuleTable::from_file(path)?
        }
        None => RuleTable::default(),
    };
    tracing::info!(rules = table.len(), "intent classifier ready");
    let classifier: Arc<dyn IntentClassifier> = Arc::new(RuleClassifier::new(table));

    let scorer: Arc<dyn SentimentScorer> = match &config.scorer {
        Some(scorer) => {
            tracing::info!(url = %scorer.url, "using HTTP sentiment scorer");
            Arc::new(HttpScorer::new(scorer)?)
        }
        None => Arc::new(KeywordSentiment::new()),
    };

    // Connect to PostgreSQL if DATABASE_URL is set, otherwise use in-memory state.
    let state = if let Some(database_url) = &config.database_url {
        tracing::info!("connecting to PostgreSQL");
        let pool = db::connect(database_url).await?;
        let (log, rx) = ChannelLog::new(config.log_queue_capacity);
        spawn_writer(pool.clone(), rx);
        AppState::with_pool(
            pool,
            classifier,
            scorer,
            Arc::new(log),
            config.dialog.clone(),
        )
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory state with sample data");
        AppState::in_memory(classifier, scorer, config.dialog.clone())
    };

    let agent = state.agent.clone();
    let purge_every = Duration::from_secs(config.purge_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_every);
        loop {
            ticker.tick().await;
            agent.sessions().purge_expired().await;
        }
    });

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
