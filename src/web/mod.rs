//! Web surface: one page with the upload form and a results area.
//!
//! `GET /` serves the empty form. `POST /submit` runs a whole submission and
//! returns the same page with the results filled in. Submissions are
//! serialised through a single gate, so at most one engine call is in flight.

pub mod page;
pub mod upload;

use crate::display::{DisplayModel, Notice};
use crate::workflow::{SubmissionRequest, SubmissionWorkflow};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Upload size cap applied to `POST /submit`.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

pub struct AppState {
    pub workflow: SubmissionWorkflow,
    gate: Mutex<()>,
}

impl AppState {
    pub fn new(workflow: SubmissionWorkflow) -> Self {
        Self {
            workflow,
            gate: Mutex::new(()),
        }
    }

    fn key_configured(&self) -> bool {
        self.workflow.config().default_api_key.is_some()
    }
}

pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, workflow: SubmissionWorkflow, body_limit: usize) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(workflow));
    let app = router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render_page(None, "", state.key_configured()))
}

async fn submit(State(state): State<Arc<AppState>>, multipart: Multipart) -> (StatusCode, Html<String>) {
    let fields = match upload::parse_multipart(multipart).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Bad upload: {}", e);
            let display = DisplayModel::Notice(Notice::error(e));
            return (
                StatusCode::BAD_REQUEST,
                Html(page::render_page(Some(&display), "", state.key_configured())),
            );
        }
    };

    let request = SubmissionRequest {
        file: fields.file,
        api_key: fields.api_key,
        system_prompt: fields.system_prompt,
        ..Default::default()
    }
    .page_selector(fields.pages.as_str());

    let outcome = {
        let _guard = state.gate.lock().await;
        state.workflow.submit(request).await
    };

    let display = outcome.display();
    (
        StatusCode::OK,
        Html(page::render_page(Some(&display), &fields.pages, state.key_configured())),
    )
}
