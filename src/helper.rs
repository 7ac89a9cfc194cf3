//! Local OAuth helper server.
//!
//! A small loopback web app that walks the authorization-code flow:
//!
//! - `GET /`            landing page with the start link
//! - `GET /start_oauth` mint an anti-forgery state token, persist it, and
//!   redirect to the authorization server
//! - `GET /callback`    validate state, exchange the code, fetch the
//!   profile, and persist the credentials
//! - `GET /status`      JSON view of the current identity
//! - `GET /clear_users` wipe the credential store
//!
//! The state token lives in a file rather than a session: it is written on
//! `/start_oauth` and consumed (read then deleted) on `/callback`, so each
//! token authorizes exactly one redirect.
//!
//! Core credential work is blocking, so handlers hop to
//! `tokio::task::spawn_blocking` for anything that touches the store or
//! the network.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::routing::get;
use maud::{DOCTYPE, Markup, html};
use rand::Rng as _;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::auth::{AuthorizationServer, HttpAuthServer, authorization_url};
use crate::config::AppConfig;
use crate::store::{CredentialStore, Identity};

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(String),
}

struct HelperState {
    config: AppConfig,
}

type SharedState = Arc<HelperState>;

/// Run the helper server on `127.0.0.1:port` until interrupted.
pub fn run(config: AppConfig, port: u16) -> Result<(), HelperError> {
    let state: SharedState = Arc::new(HelperState { config });
    let app = axum::Router::new()
        .route("/", get(index))
        .route("/start_oauth", get(start_oauth))
        .route("/callback", get(callback))
        .route("/status", get(status))
        .route("/clear_users", get(clear_users))
        .with_state(state);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| HelperError::Runtime(e.to_string()))?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        log::info!("helper listening on http://127.0.0.1:{port}");
        axum::serve(listener, app).await?;
        Ok(())
    })
}

fn page(title: &str, body: Markup) -> Html<String> {
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style { "body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; }" }
            }
            body {
                h1 { (title) }
                (body)
            }
        }
    };
    Html(markup.into_string())
}

fn internal_error(detail: impl ToString) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, detail.to_string())
}

async fn index() -> Html<String> {
    page(
        "PosterFlow",
        html! {
            p { "Authorize a Google account so exports can be uploaded to Drive." }
            p { a href="/start_oauth" { "Start authorization" } }
            p { a href="/status" { "Who is logged in?" } }
        },
    )
}

/// Mint a 32-character alphanumeric state token.
fn new_state_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

async fn start_oauth(
    State(state): State<SharedState>,
) -> Result<Redirect, (StatusCode, String)> {
    let config = state.config.clone();
    let url = tokio::task::spawn_blocking(move || -> Result<String, String> {
        config.require_oauth_client().map_err(|e| e.to_string())?;
        let token = new_state_token();
        fs::write(&config.storage.state_path, &token).map_err(|e| e.to_string())?;
        authorization_url(&config.oauth, &token).map_err(|e| e.to_string())
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(state): State<SharedState>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<String>, (StatusCode, String)> {
    if let Some(error) = params.error {
        return Ok(page(
            "Authorization failed",
            html! { p { "The authorization server reported: " (error) } },
        ));
    }
    let (code, returned_state) = match (params.code, params.state) {
        (Some(code), Some(returned_state)) => (code, returned_state),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "missing code or state parameter".to_string(),
            ));
        }
    };

    let config = state.config.clone();
    let profile = tokio::task::spawn_blocking(move || -> Result<(String, Option<String>), String> {
        // Consume the state token: one redirect per token.
        let expected = fs::read_to_string(&config.storage.state_path)
            .map_err(|_| "no pending authorization (state file missing)".to_string())?;
        let _ = fs::remove_file(&config.storage.state_path);
        if expected.trim() != returned_state {
            return Err("state mismatch; possible forged redirect".to_string());
        }

        let timeout = Duration::from_secs(config.http.timeout_secs);
        let server =
            HttpAuthServer::new(config.oauth.clone(), timeout).map_err(|e| e.to_string())?;
        let grant = server.exchange_code(&code).map_err(|e| e.to_string())?;
        let profile = server
            .user_profile(&grant.access_token)
            .map_err(|e| e.to_string())?;

        let store = CredentialStore::open(&config.storage.db_path).map_err(|e| e.to_string())?;
        store
            .upsert(
                &Identity::new(profile.email.clone()),
                &grant.access_token,
                grant.refresh_token.as_deref(),
                profile.name.as_deref(),
                profile.picture.as_deref(),
            )
            .map_err(|e| e.to_string())?;
        Ok((profile.email, profile.name))
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;

    let (email, name) = profile;
    Ok(page(
        "Authorized",
        html! {
            p { "Signed in as " b { (name.unwrap_or_else(|| email.clone())) } " (" (email) ")." }
            p { "You can close this tab and return to the terminal." }
        },
    ))
}

#[derive(Debug, Serialize)]
struct StatusBody {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

async fn status(
    State(state): State<SharedState>,
) -> Result<Json<StatusBody>, (StatusCode, String)> {
    let config = state.config.clone();
    let body = tokio::task::spawn_blocking(move || -> Result<StatusBody, String> {
        let store = CredentialStore::open(&config.storage.db_path).map_err(|e| e.to_string())?;
        let Some(identity) = store.current_identity().map_err(|e| e.to_string())? else {
            return Ok(StatusBody {
                authenticated: false,
                email: None,
                name: None,
            });
        };
        let record = store.get(&identity).map_err(|e| e.to_string())?;
        Ok(StatusBody {
            authenticated: true,
            email: Some(identity.as_str().to_string()),
            name: record.and_then(|r| r.name),
        })
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;
    Ok(Json(body))
}

async fn clear_users(
    State(state): State<SharedState>,
) -> Result<Html<String>, (StatusCode, String)> {
    let config = state.config.clone();
    tokio::task::spawn_blocking(move || -> Result<(), String> {
        let store = CredentialStore::open(&config.storage.db_path).map_err(|e| e.to_string())?;
        store.clear_all().map_err(|e| e.to_string())
    })
    .await
    .map_err(internal_error)?
    .map_err(internal_error)?;
    Ok(page(
        "Cleared",
        html! { p { "All stored credentials were removed." } },
    ))
}
