use std::sync::Arc;

use cowork_onboarding::client_service::{ClientDataService, ClientLookup, HttpClientService};
use cowork_onboarding::config::ConsoleConfig;
use cowork_onboarding::error::Result;
use cowork_onboarding::onboarding::{
    DecisionOutcome, OnboardingOrchestrator, OnboardingRouteState, onboarding_routes,
};
use cowork_onboarding::store::{ContextStore, LibSqlContextStore};

const USAGE: &str = "usage: cowork-onboarding <decide <client-id|me> | serve>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);
    if !matches!(command, Some("decide") | Some("serve")) {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    let config = ConsoleConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export COWORK_API_BASE_URL=https://api.example.com");
        std::process::exit(1);
    });

    let service: Arc<dyn ClientDataService> = Arc::new(HttpClientService::from_config(&config)?);

    let store: Arc<dyn ContextStore> = Arc::new(
        LibSqlContextStore::new_local(&config.context_db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open staged context store at {}: {}",
                    config.context_db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    let orchestrator = OnboardingOrchestrator::new(service, store);

    match (command, args.get(1)) {
        (Some("decide"), Some(client)) => {
            let Some(lookup) = ClientLookup::parse(client) else {
                eprintln!("Error: client id is required");
                eprintln!("{USAGE}");
                std::process::exit(2);
            };
            let outcome = DecisionOutcome::from(orchestrator.decide(lookup).await);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !matches!(outcome, DecisionOutcome::Navigate { .. }) {
                std::process::exit(1);
            }
        }
        (Some("serve"), _) => {
            eprintln!("🏢 Cowork Onboarding v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("   Client API: {}", config.api_base_url);
            eprintln!("   Context store: {}", config.context_db_path.display());
            eprintln!(
                "   Decisions: http://0.0.0.0:{}/api/onboarding/decision/{{client}}\n",
                config.listen_port
            );

            let app = onboarding_routes(OnboardingRouteState { orchestrator });
            let listener =
                tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.listen_port)).await?;
            tracing::info!(port = config.listen_port, "Onboarding decision server started");
            axum::serve(listener, app).await?;
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
