use tracing::{debug, error};
use wizarding::config::AppConfig;
use wizarding::run;
use wizarding::state::AppState;

#[cfg(debug_assertions)]
use dotenv::dotenv;

#[tokio::main]
async fn main() {
    #[cfg(debug_assertions)]
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    debug!("config: {:?}", config);
    let state = AppState::new(config);

    if let Err(e) = run(state).await {
        error!("failed to start app: {}", e);
    }
}
