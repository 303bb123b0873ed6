use anyhow::Context;
use downbeat_store::startup;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let store = startup().await.context("startup failed")?;

    let settings = store.settings.get_general_settings().await?;
    println!("{}", serde_json::to_string_pretty(&settings)?);

    info!("Shutting down");
    store.close();
    Ok(())
}
