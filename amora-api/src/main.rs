use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

mod config;
mod matching;
mod models;
mod routes;
mod schema;
mod services;
mod socket;

use amora_shared::clients::db::{create_pool, DbPool};
use amora_shared::clients::email::EmailClient;
use amora_shared::clients::minio::MinioClient;
use amora_shared::clients::redis::RedisClient;
use amora_shared::middleware::{init_metrics, metrics_middleware};
use config::AppConfig;
use socket::hub::ChatHub;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub redis: RedisClient,
    pub email: EmailClient,
    pub minio: MinioClient,
    pub chat_hub: ChatHub,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-api");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor validates against JWT_SECRET; keep it in step with
    // the signing secret when only the config variable is set.
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", &config.jwt_secret);
    }

    let db = create_pool(&config.database_url);
    let redis = RedisClient::connect(&config.redis_url).await?;
    let email = EmailClient::new(&config.email_api_key, &config.email_from, &config.email_from_name);
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;

    let chat_hub = ChatHub::spawn();
    let metrics_handle = init_metrics();
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    let state = Arc::new(AppState { db, config, redis, email, minio, chat_hub });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        // Auth & account
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/verify_email", post(routes::auth::verify_email))
        .route("/auth/forgot_password", post(routes::password_reset::forgot_password))
        .route("/auth/reset_password", post(routes::password_reset::reset_password))
        // Users
        .route("/users/me", patch(routes::users::update_me).delete(routes::users::delete_me))
        .route("/users/:id", get(routes::users::get_user))
        .route("/users/:id/photos", get(routes::photos::list_user_photos))
        // Matching
        .route(
            "/matching/filters",
            post(routes::filters::create_filters)
                .patch(routes::filters::patch_filters)
                .get(routes::filters::get_filters),
        )
        .route("/matching/candidates", get(routes::candidates::list_candidates))
        .route("/matching/like/:user_id", post(routes::reactions::create_like))
        .route("/matching/dislike/:user_id", post(routes::reactions::create_dislike))
        .route("/matching/likes", get(routes::reactions::get_likes))
        .route("/matching/dislikes", get(routes::reactions::get_dislikes))
        .route("/matching/matches", get(routes::reactions::get_matches))
        // Chat
        .route("/chat/dialogues", get(routes::dialogues::list_dialogues))
        .route("/chat/dialogues/:id", delete(routes::dialogues::delete_dialogue))
        .route("/chat/dialogues/:id/messages", get(routes::messages::load_messages))
        .route(
            "/chat/messages/:id",
            patch(routes::messages::edit_message).delete(routes::messages::delete_message),
        )
        .route("/chat/ws", get(socket::handlers::chat_ws))
        // Events
        .route("/events", get(routes::events::list_events).post(routes::events::create_event))
        .route(
            "/events/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route("/events/:id/join", post(routes::events::join_event))
        // Channels
        .route("/channels", get(routes::channels::list_channels).post(routes::channels::create_channel))
        .route("/channels/:id", get(routes::channels::get_channel))
        .route("/channels/:id/members", get(routes::channels::get_channel_members))
        .route("/channels/:id/join", post(routes::channels::join_channel))
        // Photos
        .route(
            "/photos",
            post(routes::photos::upload_photo).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/photos/profile", get(routes::photos::get_profile_photo))
        .route("/photos/:id/profile", patch(routes::photos::set_profile_photo))
        // Admin
        .route("/admin/reactions", delete(routes::admin::reset_reactions))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amora-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
