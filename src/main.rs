use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use tasknest::auth::{AuthMiddleware, TokenService};
use tasknest::config::Config;
use tasknest::routes;
use tasknest::routes::health;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    // Refuses to start on missing configuration (signing secret included):
    // there is no insecure fallback to degrade into.
    let config = Config::from_env().unwrap_or_else(|e| {
        log::error!("configuration error: {}", e);
        std::process::exit(1);
    });

    let pool = PgPool::connect(&config.database_url).await.unwrap_or_else(|e| {
        log::error!("failed to connect to database: {}", e);
        std::process::exit(1);
    });

    let token_service = web::Data::new(TokenService::from_config(&config));
    let bind_addr = (config.server_host.clone(), config.server_port);
    let config = web::Data::new(config);

    log::info!(
        "Starting TaskNest server at {}",
        config.server_url()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(token_service.clone())
            .app_data(config.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
