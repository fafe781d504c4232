//! Quorum server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use quorum_api::{TokenVerifier, middleware::AppState, router as api_router, streaming_handler};
use quorum_common::Config;
use quorum_core::{
    NotificationDispatcher, NotificationService, PresenceRegistry, ScoreProjector,
    TargetDirectory, VoteService,
};
use quorum_db::repositories::{
    AnswerRepository, NotificationRepository, QuestionRepository, VoteRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quorum=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quorum server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = quorum_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    quorum_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let question_repo = QuestionRepository::new(Arc::clone(&db));
    let answer_repo = AnswerRepository::new(Arc::clone(&db));

    // Initialize services
    let score_projector = ScoreProjector::new(vote_repo.clone());
    let vote_service = VoteService::new(vote_repo, score_projector.clone());
    let notification_service = NotificationService::new(notification_repo);
    let targets = TargetDirectory::new(question_repo, answer_repo);

    // The presence registry lives as long as the process and is shared by
    // the dispatcher and the streaming transport.
    let presence = Arc::new(PresenceRegistry::new());
    let dispatcher =
        NotificationDispatcher::new(notification_service.clone(), Arc::clone(&presence));

    let token_verifier = TokenVerifier::new(&config.auth.jwt_secret, config.auth.issuer.as_deref());

    // Create app state
    let state = AppState {
        vote_service,
        score_projector,
        notification_service,
        dispatcher,
        presence,
        targets,
        token_verifier,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router())
        .route("/streaming", get(streaming_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            quorum_api::middleware::auth_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
