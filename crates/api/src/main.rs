use anyhow::Context;

use clipgate_core::GatewayConfig;
use clipgate_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clipgate_observability::init_with(LogFormat::from_env());

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let app = clipgate_api::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        production = config.is_production(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
