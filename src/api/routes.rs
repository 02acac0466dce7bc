use crate::api::api_error::APIError;
use crate::api::model::{HookCommand, HookRequest, HookResult};
use crate::api::server::AppState;
use crate::error::Error;
use crate::txt_store::TxtStore;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/hook", post(hook))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.hook_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

#[allow(clippy::unused_async)]
async fn hook(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    WithRejection(Form(payload), _): WithRejection<Form<HookRequest>, APIError>,
) -> Result<Json<HookResult>, APIError> {
    let client_addr = client_addr.ip();
    if !state.config.hook_permitted(client_addr) {
        tracing::debug!("rejected hook call from {client_addr}");
        return Err(Error::Forbidden(client_addr).into());
    }

    tracing::info!(
        hook = %payload.hook,
        domain = %payload.domain,
        client = ?payload.client,
        challenge = ?payload.challenge,
        token = ?payload.token,
        "hook call from {client_addr}"
    );
    let command = HookCommand::try_from(payload).map_err(|err| {
        tracing::debug!("rejected hook call from {client_addr}: {err}");
        err
    })?;

    let result = match command {
        HookCommand::Add { challenge, keyauth } => {
            let message = format!("TXT record added: {challenge} -> {keyauth}");
            state.txt_store.set_txt(&challenge, keyauth);
            HookResult {
                record: challenge,
                message,
            }
        }
        HookCommand::Remove { challenge } => {
            state.txt_store.clear_txt(&challenge);
            HookResult {
                message: format!("TXT record removed: {challenge}"),
                record: challenge,
            }
        }
    };
    tracing::debug!("{} TXT record(s) provisioned", state.txt_store.len());
    Ok(Json(result))
}
