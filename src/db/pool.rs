use anyhow::Context;
use sqlx::postgres::PgPool;
use tracing::info;

/// Round-trips a trivial query to prove the pool can reach the server.
pub async fn health_check(pool: &PgPool) -> anyhow::Result<()> {
    let one: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(pool)
        .await
        .context("database health check failed")?;
    anyhow::ensure!(one == 1, "unexpected health check result: {one}");
    Ok(())
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")?;
    info!("Database migrations completed");
    Ok(())
}
