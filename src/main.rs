use dealroom::config::Config;
use dealroom::server::route_builder::register_routes;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealroom=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let app = register_routes(&config).await?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("dealroom listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
