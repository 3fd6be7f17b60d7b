use std::env;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

pub async fn get_db_pool() -> Result<Pool<Sqlite>, sqlx::Error> {
    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./savings_planner.db".to_string());

    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}
