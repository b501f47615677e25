use chase::{ChaseError, ChaseServer, ServerConfig};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), ChaseError> {
    init_tracing();

    let bind = std::env::var("CHASE_BIND")
        .unwrap_or_else(|_| ServerConfig::DEFAULT_BIND.to_string());

    let server = ChaseServer::builder().bind(&bind).build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "could not listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
