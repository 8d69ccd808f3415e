//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use atm_types::AtmRepository;

use super::admin::admin_guard;
use super::handlers::{self, AppState};
use crate::AtmService;

/// HTTP Server for the ATM API.
pub struct HttpServer<R: AtmRepository> {
    state: Arc<AppState<R>>,
}

impl<R: AtmRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: AtmService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Returns the service behind the server.
    pub fn service(&self) -> &AtmService<R> {
        &self.state.service
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        let admin = Router::new()
            .route("/add-user", post(handlers::add_user::<R>))
            .route("/delete-user/{id}", delete(handlers::delete_user::<R>))
            .route("/users", get(handlers::list_users::<R>))
            .route(
                "/user/{id}/transactions",
                get(handlers::user_transactions::<R>),
            )
            .route("/transactions", get(handlers::all_transactions::<R>))
            .route("/deposit", post(handlers::load_cash::<R>))
            .route("/atm-balance", get(handlers::atm_balance::<R>))
            .route("/atm-inventory", get(handlers::atm_inventory::<R>))
            .route("/reconcile", get(handlers::reconcile::<R>))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                admin_guard::<R>,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route("/api/auth/login", post(handlers::login::<R>))
            .route("/api/auth/register", post(handlers::register::<R>))
            .route("/api/auth/{mobile}/balance", get(handlers::balance::<R>))
            .route("/api/auth/{mobile}/deposit", post(handlers::deposit::<R>))
            .route("/api/auth/{mobile}/withdraw", post(handlers::withdraw::<R>))
            .route(
                "/api/auth/{mobile}/transactions",
                get(handlers::transactions::<R>),
            )
            .route("/api/auth/{mobile}/changepin", post(handlers::change_pin::<R>))
            .nest("/api/admin", admin)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
