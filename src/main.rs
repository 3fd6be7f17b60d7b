use std::env;

use dotenvy::dotenv;
use savings_planner::{backend, cli, database};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "server" {
        // Only the server path installs a subscriber; the TUI owns the
        // terminal in raw mode.
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();

        let pool = database::db::connection::get_db_pool().await?;
        database::db::migrate::run_migrations(&pool).await?;
        backend::run_server(pool).await?;
    } else {
        cli::run().await?;
    }
    Ok(())
}
