use actix_web::{web, App, HttpServer};
use anyhow::Context;
use ranking_service::db::{ContentRepository, PgContentRepository};
use ranking_service::{handlers, Config, EngagementScorer, FeedService, TrendingService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load config before logging so LOG_LEVEL can seed the filter
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},actix_web=info", config.app.log_level))),
        )
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_line_number(true)
                .with_target(true),
        )
        .init();

    info!(
        "Starting agora-ranking-service v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.app.port
    );
    info!("Environment: {}", config.app.env);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            error!("Database pool creation failed: {}", e);
            e
        })
        .context("failed to connect to the database")?;

    let repo: Arc<dyn ContentRepository> = Arc::new(PgContentRepository::new(db_pool));
    let scorer = EngagementScorer::from_config(&config.scoring);

    let feed_service = web::Data::new(FeedService::new(
        repo.clone(),
        scorer.clone(),
        config.feed.clone(),
    ));
    let trending_service = web::Data::new(TrendingService::new(
        repo,
        scorer,
        config.feed.trending_limit(),
    ));

    info!(
        "Default feed weights: {:?}",
        config.feed.default_weights()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(feed_service.clone())
            .app_data(trending_service.clone())
            .configure(handlers::configure)
    })
    .bind(("0.0.0.0", config.app.port))
    .context("failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
