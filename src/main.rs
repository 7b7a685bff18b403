mod models;
mod service;
mod config;
mod dtos;
mod error;
mod db;
mod utils;
mod mail;
mod handler;
mod realtime;
mod routes;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use realtime::dispatcher::Dispatcher;
use routes::create_router;
use service::{
    application_service::ApplicationService, identity_service::IdentityResolver,
    job_service::JobService, message_service::MessageService,
    notification_service::NotificationService, recommendation_service::RecommendationService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub db_client: Arc<DBClient>,
    pub dispatcher: Dispatcher,
    pub job_service: Arc<JobService>,
    pub application_service: Arc<ApplicationService>,
    pub message_service: Arc<MessageService>,
    pub notification_service: Arc<NotificationService>,
    pub recommendation_service: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(env: Config, db_client: Arc<DBClient>) -> Self {
        let dispatcher = Dispatcher::new();

        let identity = Arc::new(IdentityResolver::new(
            db_client.clone(),
            env.identity_provider_url.clone(),
        ));

        let notification_service = Arc::new(NotificationService::new(
            db_client.clone(),
            dispatcher.clone(),
            identity.clone(),
            env,
        ));

        let job_service = Arc::new(JobService::new(
            db_client.clone(),
            notification_service.clone(),
        ));

        let application_service = Arc::new(ApplicationService::new(
            db_client.clone(),
            identity,
            notification_service.clone(),
        ));

        let message_service = Arc::new(MessageService::new(
            db_client.clone(),
            dispatcher.clone(),
            notification_service.clone(),
        ));

        let recommendation_service = Arc::new(RecommendationService::new(db_client.clone()));

        AppState {
            db_client,
            dispatcher,
            job_service,
            application_service,
            message_service,
            notification_service,
            recommendation_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        println!("🔥 Failed to run database migrations: {:?}", err);
        std::process::exit(1);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE]);

    let db_client = Arc::new(DBClient::new(pool));
    let app_state = Arc::new(AppState::new(config.clone(), db_client));

    tokio::spawn(service::background_jobs::start_job_expiry_sweep(
        app_state.clone(),
    ));

    let app = create_router(app_state).layer(cors);

    println!(
        "{}",
        format!("🚀 Server is running on http://localhost:{}", config.port)
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
