use std::sync::Arc;

use listing_matcher::models::config::ServerConfig;
use listing_matcher::processing::ZMQMessage;
use listing_matcher::processing::matching::process_match_message;
use listing_matcher::repository::JsonFileRepository;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.match_config() {
        log::error!("Invalid matching configuration: {e}");
        std::process::exit(1);
    }
    let config = Arc::new(config);

    let repo = JsonFileRepository::new(&config.processed_dir, &config.matched_dir);

    let context = zmq::Context::new();
    let responder = context.socket(zmq::PULL).expect("Cannot create zmq socket");
    responder
        .bind(&config.zmq_address)
        .expect("Cannot bind to zmq port");
    log::info!("Listening for match requests on {}", config.zmq_address);

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive message: {e}");
                continue;
            }
        };
        match serde_json::from_slice::<ZMQMessage>(&msg) {
            Ok(parsed) => {
                let config = Arc::clone(&config);
                let repo = repo.clone();
                tokio::spawn(async move {
                    match parsed {
                        ZMQMessage::Match(request) => {
                            process_match_message(request, &config, repo).await
                        }
                    }
                });
            }
            Err(e) => log::error!("Failed to parse JSON: {e}"),
        }
    }
}
