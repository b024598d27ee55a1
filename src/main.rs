use pantry_console::{
    apply_migrations, app_router, auth::SessionSettings, config, seed_admin, AppState, PgRecordStore,
    RecordRepository, Views,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pantry_console=info,tower_http=info")),
        )
        .init();

    let settings = config::from_env()?;
    tracing::info!(database = %settings.database.describe(), "connecting");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(settings.database.connect_options()?)
        .await?;

    if settings.run_migrations {
        apply_migrations(&pool).await?;
    }

    let records = RecordRepository::new(Arc::new(PgRecordStore::new(pool.clone())));
    if let Some(admin) = &settings.bootstrap_admin {
        seed_admin(&records, admin).await?;
    }

    let state = AppState {
        records,
        sessions: SessionSettings::new(&settings.session_secret, settings.session_ttl)?
            .with_secure(settings.secure_cookies),
        views: Arc::new(Views::new()?),
    };

    let app = app_router(state, &settings.static_dir);
    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    tracing::info!("Pantry console listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    pool.close().await;
    tracing::info!("server closed");
    Ok(())
}
