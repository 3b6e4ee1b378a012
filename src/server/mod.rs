//! HTTP chat server using axum.
//!
//! Provides `AppState` (shared state), the route handlers, and
//! `ChatServer` (startup logic).
pub mod session;
pub mod smalltalk;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex as TokioMutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::engine::RagEngine;
use session::{Role, Session};

pub const EMPTY_MESSAGE_REPLY: &str = "Please enter a message.";

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagEngine>,
    pub session: Arc<TokioMutex<Session>>,
}

impl AppState {
    pub fn new(engine: Arc<RagEngine>) -> Self {
        let timeout = engine.config().server.session_timeout_secs;
        Self {
            engine,
            session: Arc::new(TokioMutex::new(Session::new(timeout, Utc::now()))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskReply {
    pub reply: String,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn ask(
    State(state): State<AppState>,
    form: Result<Form<AskForm>, FormRejection>,
) -> (StatusCode, Json<AskReply>) {
    // A body that is not a form carries no message
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Unreadable /ask body: {rejection}");
            AskForm::default()
        }
    };
    let message = form.message.trim();
    {
        let now = Utc::now();
        let mut session = state.session.lock().await;
        if session.reset_if_idle(now) {
            info!("Session idle, conversation reset");
        }
        if message.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(AskReply {
                    reply: EMPTY_MESSAGE_REPLY.to_string(),
                }),
            );
        }
        session.record_user(message, now);
    }

    let reply = match smalltalk::classify(message) {
        Some(kind) => smalltalk::canned_reply(kind, &mut rand::thread_rng()).to_string(),
        None => {
            let raw = state.engine.query(message).await;
            smalltalk::add_flourish(&raw, &mut rand::thread_rng())
        }
    };

    let mut session = state.session.lock().await;
    session.record_bot(&reply, Utc::now());
    debug!(
        "Session has {} turns ({} from user)",
        session.turns().len(),
        session.turns().iter().filter(|t| t.role == Role::User).count()
    );

    (StatusCode::OK, Json(AskReply { reply }))
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Chat server wrapping the shared state.
#[derive(Clone)]
pub struct ChatServer {
    pub state: AppState,
}

impl ChatServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn start<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("listener has no address")?;
        info!("Chat server listening on http://{addr}");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server encountered an error")?;

        Ok(())
    }
}
