use std::io;

use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenvy::dotenv;
use log::info;

use pow_ledger::api::{self, AppState};
use pow_ledger::blockchain::Ledger;
use pow_ledger::config::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    info!(
        "⛓️ Starting ledger node {} at http://{}:{} ({} mining worker(s))",
        config.node_id, config.host, config.port, config.mining_workers
    );

    let ledger = Ledger::new(config.mining_workers);
    let state = web::Data::new(AppState::new(ledger, &config));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
