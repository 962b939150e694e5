use clap::Parser;
use todoguard::cli::{
    Args, build_config, init_logging, load_secret, open_database, validate_auth_config,
};
use todoguard::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_secret(
        "JWT_SECRET",
        args.jwt_secret_file.as_deref(),
        "--jwt-secret-file",
    ) else {
        std::process::exit(1);
    };

    let Some(csrf_secret) = load_secret(
        "CSRF_SECRET",
        args.csrf_secret_file.as_deref(),
        "--csrf-secret-file",
    ) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    let config = build_config(&args, db, jwt_secret, csrf_secret);
    if !validate_auth_config(&config.auth) {
        std::process::exit(1);
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
