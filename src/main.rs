use eventboard_client::{Navigation, bootstrap, config::{ClientConfig, Env}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Operator entry point: hydrates the persisted session, runs every path given on
/// the command line through the navigation guard, and reports the moderation
/// partition of the current event listing.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = ClientConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eventboard_client=debug,reqwest=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Client starting in {:?} mode against {}", config.env, config.api_base_url);

    // 4. Component Wiring + background hydration
    let state = bootstrap(config).expect("FATAL: Failed to build the HTTP client.");

    // 5. Navigation checks (each waits for hydration on its own)
    let mut paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        paths.push("/".to_string());
    }
    for path in &paths {
        match state.guard.resolve(path).await {
            Navigation::Proceed => println!("{path}: allowed"),
            Navigation::Redirect { to, .. } => println!("{path}: redirect to {to}"),
        }
    }

    let session = state.session.snapshot();
    println!(
        "session: {:?} (admin: {})",
        session.state(),
        session.is_admin()
    );

    // 6. Event listing
    match state.events.fetch_events().await {
        Ok(events) => println!(
            "events: {} total, {} published, {} pending review",
            events.len(),
            state.events.published().len(),
            state.events.pending_review().len()
        ),
        Err(e) => tracing::error!("could not load events: {}", e),
    }
}
