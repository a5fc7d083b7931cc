use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};

use clinic_membership_backend::storage::csv::CsvConnection;
use clinic_membership_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up storage");
    let csv_conn = match std::env::var("CLINIC_DATA_DIR") {
        Ok(dir) => CsvConnection::new(dir)?,
        Err(_) => CsvConnection::new_default()?,
    };

    let state = initialize_backend(Arc::new(csv_conn))?;
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
