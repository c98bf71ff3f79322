use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use veripeditus::app::App;
use veripeditus::config::ClientConfig;
use veripeditus::sensor::simulated::SimulatedPlatform;
use veripeditus::sync::{CredentialStore, Credentials, FileCredentialStore};
use veripeditus::views::ViewKind;
use veripeditus::views::log_surface::{LogArSurface, LogMapSurface};

#[derive(Parser, Debug)]
#[command(name = "veripeditus", about = "Headless Veripeditus game client")]
struct Cli {
    #[arg(long, env = "VERIPEDITUS_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "VERIPEDITUS_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "VERIPEDITUS_PASSWORD", requires = "username")]
    password: Option<String>,

    /// Where stored credentials live between runs.
    #[arg(long, env = "VERIPEDITUS_CREDENTIALS", default_value = ".veripeditus-credentials.json")]
    credentials: String,

    #[arg(long, default_value_t = 52.520_008, allow_hyphen_values = true)]
    latitude: f64,

    #[arg(long, default_value_t = 13.404_954, allow_hyphen_values = true)]
    longitude: f64,

    #[arg(long, default_value_t = 0.0)]
    heading: f64,

    /// Interval between simulated sensor samples, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    sample_ms: u64,

    #[arg(long, default_value = "map")]
    view: ViewKind,

    /// Simulate a device without a camera.
    #[arg(long)]
    no_camera: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().expect("invalid configuration");
    if let Some(base_url) = cli.base_url {
        config.http.base_url = base_url.trim_end_matches('/').to_owned();
    }

    let credentials = Arc::new(FileCredentialStore::new(&cli.credentials));
    let mut platform = SimulatedPlatform::new(cli.latitude, cli.longitude, cli.heading, Duration::from_millis(cli.sample_ms));
    if cli.no_camera {
        platform = platform.without_camera();
    }

    let app = App::with_http(
        &config,
        Arc::new(platform),
        credentials.clone(),
        Arc::new(LogMapSurface),
        Arc::new(LogArSurface),
    )
    .expect("failed to build HTTP client");

    if let (Some(username), Some(password)) = (cli.username, cli.password) {
        match app.sync().login(Credentials::new(username, password)).await {
            Ok(player_id) => tracing::info!(player_id, "logged in"),
            Err(e) => tracing::error!(error = %e, "login failed"),
        }
    } else if credentials.load().is_none() {
        tracing::info!("no credentials; pass --username and --password to log in");
    }

    app.start(cli.view).await;
    tracing::info!(base_url = %config.http.base_url, view = %cli.view, "veripeditus client running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    app.shutdown();
}
