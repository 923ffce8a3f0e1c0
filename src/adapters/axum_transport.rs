use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    response::Response,
    routing::{MethodRouter, any},
};
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    core::{
        dispatcher::DEFAULT_MAX_BODY_BYTES,
        error::DispatchError,
        status::{StatusTable, json_response},
        switchboard::Switchboard,
    },
    ports::{router::BoxRouter, transport::Transport},
    utils::graceful_shutdown::ShutdownToken,
};

/// [`Transport`] backed by axum.
///
/// Every path and method lands in one catch-all handler that hands the
/// request line to the [`Switchboard`]; axum does no routing of its own.
pub struct AxumTransport {
    switchboard: Arc<Switchboard>,
    max_body_bytes: usize,
}

impl AxumTransport {
    pub fn new(statuses: StatusTable) -> Self {
        Self {
            switchboard: Arc::new(Switchboard::new(statuses)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn switchboard(&self) -> &Arc<Switchboard> {
        &self.switchboard
    }

    /// The axum application serving this transport.
    pub fn app(&self) -> axum::Router {
        axum::Router::new()
            .route("/", self.catch_all())
            .route("/{*path}", self.catch_all())
            .layer(TraceLayer::new_for_http())
    }

    fn catch_all(&self) -> MethodRouter {
        let switchboard = self.switchboard.clone();
        let max_body_bytes = self.max_body_bytes;
        any(move |req: Request| {
            let switchboard = switchboard.clone();
            async move { handle(&switchboard, max_body_bytes, req).await }
        })
    }
}

#[tracing::instrument(
    name = "request",
    skip_all,
    fields(
        transport = "axum",
        http.method = %req.method(),
        http.path = %req.uri().path(),
        http.status_code = tracing::field::Empty,
    )
)]
async fn handle(switchboard: &Switchboard, max_body_bytes: usize, req: Request) -> Response<Body> {
    let (parts, body) = req.into_parts();

    let reply = match axum::body::to_bytes(body, max_body_bytes).await {
        Ok(body) => switchboard.exchange(parts.uri.path(), &parts.method, body),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            switchboard.reply_error(&DispatchError::BadRequest)
        }
    };

    tracing::Span::current().record("http.status_code", reply.status.as_u16());
    json_response(reply.status, reply.body)
}

impl Transport for AxumTransport {
    fn name(&self) -> &'static str {
        "axum"
    }

    fn route(&self, router: BoxRouter) {
        self.switchboard.route(router);
    }

    async fn serve(&self, listener: TcpListener, shutdown: ShutdownToken) -> Result<()> {
        let addr = listener
            .local_addr()
            .wrap_err("Failed to read listener address")?;
        tracing::info!("axum transport serving on {}", addr);

        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown.cancelled())
            .await
            .wrap_err("axum server error")?;

        tracing::info!("axum transport stopped");
        Ok(())
    }
}
