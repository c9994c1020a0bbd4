mod config;
mod routes;

#[tokio::main]
async fn main() {
    // A missing .env file is normal in production.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid server configuration");
    if !config.dist_dir.is_dir() {
        tracing::warn!(dist_dir = %config.dist_dir.display(), "dist directory missing; every request will 404");
    }

    let app = routes::app(&config.dist_dir);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, dist_dir = %config.dist_dir.display(), "bookmark manager listening");
    axum::serve(listener, app).await.expect("server failed");
}
