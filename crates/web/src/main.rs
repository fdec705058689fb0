use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use countdown_common::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var("COUNTDOWN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| countdown_common::default_config_path());
    let mut config = Config::load(&config_path)?;

    if let Ok(addr) = std::env::var("COUNTDOWN_WEB_ADDR") {
        config.listen_addr = addr;
    }
    if let Ok(path) = std::env::var("COUNTDOWN_WORDLIST") {
        if !path.trim().is_empty() {
            config.identity.wordlist_path = Some(PathBuf::from(path));
        }
    }
    let db_path = std::env::var("COUNTDOWN_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config.db_path());

    config.validate()?;
    let web_addr: SocketAddr = config.listen_addr.parse()?;

    info!(
        "Starting Countdown API on http://{} (db: {:?}, share links: {})",
        web_addr, db_path, config.public_base_url
    );

    countdown_web::serve(web_addr, config, &db_path).await
}
