use dotenvy::dotenv;
use gas_delivery_service::{build_server, create_pool, run_migrations, AppState, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().expect("Invalid configuration");

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .expect("Failed to create database pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    let state = AppState::with_pool(pool, config.message_channel_capacity);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
