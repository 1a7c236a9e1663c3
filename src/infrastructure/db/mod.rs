pub mod copy;

use sqlx::{Connection, PgConnection};

/// Open the single connection the ingestion pipeline shares.
pub async fn connect(database_url: &str) -> Result<PgConnection, sqlx::Error> {
    PgConnection::connect(database_url).await
}

pub async fn check_connection(conn: &mut PgConnection) -> Result<bool, sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(conn).await.map(|_| true)
}

pub async fn run_migrations(conn: &mut PgConnection) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(conn).await
}
