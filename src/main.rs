use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use gigmarket_backend::auth::AuthConfig;
use gigmarket_backend::cache::{CacheConfig, RedisCache};
use gigmarket_backend::config::AppConfig;
use gigmarket_backend::create_pool;
use gigmarket_backend::handlers;
use gigmarket_backend::hire::{HireWorkflow, SeaOrmHireStore};
use gigmarket_backend::realtime::{NotificationDispatcher, PresenceRegistry};
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Connected to database");

    let redis_cache = RedisCache::new(&config.redis_url, CacheConfig::from_env())
        .await
        .expect("Failed to connect to Redis");
    let redis_data = web::Data::new(Arc::new(redis_cache));
    tracing::info!("Connected to Redis");

    let auth_data = web::Data::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
        secure_cookies: config.secure_cookies,
    });

    // Who is online, shared by WebSocket sessions and the hire notifier.
    let presence = Arc::new(PresenceRegistry::new());
    let presence_data = web::Data::new(presence.clone());

    let workflow = web::Data::new(HireWorkflow::new(
        Arc::new(SeaOrmHireStore::new(db.clone())),
        Arc::new(NotificationDispatcher::new(presence.clone())),
    ));

    let db_data = web::Data::new(db);
    let client_url = config.client_url.clone();
    let bind_addr = config.bind_addr();
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = match &client_url {
            Some(origin) => Cors::default().allowed_origin(origin).supports_credentials(),
            None => Cors::default().allow_any_origin(),
        }
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(redis_data.clone())
            .app_data(auth_data.clone())
            .app_data(presence_data.clone())
            .app_data(workflow.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    tracing::info!(
        online = presence.online_count().await,
        "Server stopped, dropping realtime connections"
    );
    presence.clear().await;

    Ok(())
}
