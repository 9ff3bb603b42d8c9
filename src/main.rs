use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use taskdeck::auth::{AuthState, Bcrypt, CredentialVerifier, SessionStore};
use taskdeck::config::Config;
use taskdeck::routes::{self, health};
use taskdeck::storage::{CredentialStore, MemoryCredentialStore, PgCredentialStore};

fn to_io(err: taskdeck::AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}

async fn credential_store(config: &Config) -> std::io::Result<Arc<dyn CredentialStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgCredentialStore::connect(url).await.map_err(to_io)?;
            store.ensure_schema().await.map_err(to_io)?;
            log::info!("Using PostgreSQL credential store");
            Ok(Arc::new(store))
        }
        None => {
            log::warn!("DATABASE_URL not set; accounts are kept in memory and lost on restart");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
    }
}

/// Periodically evicts expired sessions that were never presented again.
fn spawn_sweeper(sessions: Arc<SessionStore>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired(Utc::now());
            if purged > 0 {
                log::debug!("Purged {} expired sessions", purged);
            }
        }
    });
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let store = credential_store(&config).await?;

    // Sessions live only as long as this process. A restart logs everyone out.
    let sessions = Arc::new(SessionStore::new(config.session_ttl()));
    let verifier =
        CredentialVerifier::new(store, Arc::new(Bcrypt::new(config.bcrypt_cost))).map_err(to_io)?;
    let state = web::Data::new(AuthState::new(verifier, sessions.clone()));

    if config.session_sweep_secs > 0 {
        spawn_sweeper(sessions, Duration::from_secs(config.session_sweep_secs));
    }

    log::info!("Starting TaskDeck server at {}", config.server_url());
    let cors_origin = config.cors_allowed_origin.clone();
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        }
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config(&state)))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
