use anyhow::Result;
use windfeed_app::{init_logging, load_config, run};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config.log_level)?;

    tracing::info!(
        "WindFeed {}, feed path '{}'",
        windfeed_core::VERSION,
        config.feed_path
    );

    run(config).await
}
