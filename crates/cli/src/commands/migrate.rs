//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or a
/// migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
