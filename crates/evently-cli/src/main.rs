use clap::{Args, Parser, Subcommand};
use evently_api::{app_with_state, AppState};
use evently_common::config::EventlyConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "evently", version, about = "Event booking API and its load driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the booking API server
    Serve(ServeArgs),
    /// Fire the configured load at the booking endpoint
    Blast,
    Version,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Seed a few future events so joins have a target
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Blast => blast().await,
        Commands::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn serve(args: ServeArgs) {
    let cfg = EventlyConfig::load();
    let state = AppState::new();
    if args.seed_demo {
        seed_demo(&state).await;
    }
    let app = app_with_state(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port)).await.unwrap();
    tracing::info!("listening on http://0.0.0.0:{}", cfg.port);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .unwrap();
}

// The last seeded event lands on id 3, the default blast target.
async fn seed_demo(state: &AppState) {
    let starts_at = chrono::Utc::now() + chrono::Duration::days(1);
    for (title, location, capacity) in [
        ("Rust Meetup", "Berlin", 40),
        ("Design Jam", "Lisbon", 25),
        ("Launch Party", "Amsterdam", 150),
    ] {
        let id = state.insert_event(title, starts_at, location, capacity).await;
        tracing::info!("seeded event {} ({}, capacity {})", id, title, capacity);
    }
}

async fn blast() {
    let cfg = EventlyConfig::load();
    tracing::info!(
        "{} requests -> {}/events/{} (max {} in flight)",
        cfg.total_requests,
        cfg.base_url,
        cfg.event_id,
        cfg.concurrency
    );
    match evently_load::run(&cfg).await {
        Ok(report) => println!("\n{}", report),
        Err(err) => tracing::error!("load run aborted: {}", err),
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
