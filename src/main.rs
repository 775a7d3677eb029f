// src/main.rs
use std::process::exit;
use tracing::error;

use taskflow::cli::{exit_code, App};

#[tokio::main]
async fn main() {
    let app = match App::from_args() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(app.log_level())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = app.run().await {
        error!("{:#}", e);
        exit(exit_code(&e));
    }
}
