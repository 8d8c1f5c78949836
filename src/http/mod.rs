//! HTTP surface of the note service.
//!
//! The router is written once against `NoteService`, whichever backend it wraps.

pub mod body;
pub mod errors;
pub mod handlers;

use crate::app::NoteService;
use crate::{Result, SetupError};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

/// What `GET /UploadForm.html` answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPage {
    /// An HTML form posting to `/write`
    Form,
    /// A one-line plain text hint pointing at `POST /write`
    Instructions,
}

/// Everything needed to start serving
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub service: NoteService,
    pub upload_page: UploadPage,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<NoteService>,
    upload_page: UploadPage,
}

/// Build the application router
pub fn build_router(service: Arc<NoteService>, upload_page: UploadPage) -> Router {
    let state = AppState {
        service,
        upload_page,
    };

    Router::new()
        .route("/notes", get(handlers::list_notes))
        .route(
            "/notes/:name",
            get(handlers::read_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
        .route("/write", post(handlers::create_note))
        .route("/UploadForm.html", get(handlers::upload_form))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    info!("{method} {path} -> {}", response.status());
    response
}

/// Bind, serve until Ctrl-C or SIGTERM, then flush the notes
///
/// # Errors
///
/// Returns a `SetupError` if the address cannot be resolved or bound, or if serving fails.
/// Returns a backend error if the final flush fails
pub async fn run(config: ServerConfig) -> Result<()> {
    let ServerConfig {
        host,
        port,
        service,
        upload_page,
    } = config;
    let display_addr = format!("{host}:{port}");

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| SetupError::InvalidAddress(display_addr.clone(), e))?
        .next()
        .ok_or_else(|| {
            SetupError::InvalidAddress(
                display_addr.clone(),
                std::io::Error::other("no addresses found"),
            )
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SetupError::Bind(display_addr.clone(), e))?;
    let local_addr = listener.local_addr().unwrap_or(addr);

    let service = Arc::new(service);
    let app = build_router(Arc::clone(&service), upload_page);

    info!("Server is running at http://{local_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(SetupError::Serve)?;

    info!("Shutting down, flushing notes");
    service.flush()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed listening for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed listening for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
