use anyhow::Result;
use aula_board_server::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // Bootstrap the application (config, logging, hub, observer loop, router)
    let app = bootstrap::setup().await?;

    tracing::info!("HTTP server listening on http://{}", app.bind_address);

    let listener = tokio::net::TcpListener::bind(app.socket_addr).await?;
    axum::serve(listener, app.router).await?;

    Ok(())
}
