use actix_web::{middleware as actix_middleware, web, App, HttpServer};

use expense_api::config::AppConfig;
use expense_api::db::repository::Database;
use expense_api::handlers;
use expense_api::token::TokenService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if it exists (for development)
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting Expense API server...");

    // Load configuration
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Hint: SECRET_KEY and ALGORITHM must be set in the environment or .env");
        std::process::exit(1);
    });

    // Connect to SQLite and make sure the schema exists
    log::info!("Opening database at {}...", config.database_url);
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to open database");

    db.init_schema()
        .await
        .expect("Failed to initialize database schema");

    let tokens = TokenService::new(config.auth.secret.clone().into_bytes(), config.auth.algorithm)
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize token service: {}", e);
            std::process::exit(1);
        });

    log::info!(
        "Starting HTTP server at {}:{}...",
        config.host,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            // Shared state
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(tokens.clone()))
            // Middleware
            .wrap(actix_middleware::Logger::default())
            .wrap(actix_middleware::Compress::default())
            .service(handlers::health_check)
            .service(handlers::register)
            .service(handlers::issue_token)
            .service(handlers::create_expense)
            .service(handlers::list_expenses)
            // The search route must come before the id route so that
            // "search" is never captured as an expense id.
            .service(handlers::search_expenses)
            .service(handlers::get_expense)
            .service(handlers::update_expense)
            .service(handlers::delete_expense)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
