use rand::rngs::StdRng;
use rand::SeedableRng;
use wheel_engine::config::AppConfig;
use wheel_engine::feeds::yahoo::YahooClient;
use wheel_engine::strategy::evaluate_ticker;

#[tokio::main]
async fn main() {
    eprintln!("[wheel] binary started, setting up logging...");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        ticker = %cfg.ticker,
        lookback = %cfg.lookback,
        risk_tolerance = cfg.risk_tolerance.value(),
        policy = ?cfg.strike_policy,
        simulate = cfg.simulate,
        seed = ?cfg.seed,
        "wheel evaluation starting"
    );

    let client = YahooClient::new(&cfg.yahoo_base_url);
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let today = chrono::Local::now().date_naive();

    let report = match evaluate_ticker(
        &client,
        &cfg.ticker,
        &cfg.lookback,
        today,
        &cfg.evaluation_settings(),
        &mut rng,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("evaluation failed: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("report serialization failed: {e}");
            std::process::exit(1);
        }
    }
}
