use std::{convert::Infallible, sync::Arc, time::Duration};

use bytes::Bytes;
use eyre::{Result, WrapErr};
use http::{HeaderValue, Request, Response, header};
use http_body_util::{BodyExt, Full, Limited};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, task::JoinSet};

use crate::{
    core::{
        dispatcher::DEFAULT_MAX_BODY_BYTES,
        error::DispatchError,
        status::{JSON_CONTENT_TYPE, StatusTable},
        switchboard::{Reply, Switchboard},
    },
    ports::{router::BoxRouter, transport::Transport},
    utils::graceful_shutdown::ShutdownToken,
};

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// [`Transport`] driving hyper's HTTP/1 connection machinery directly.
///
/// Owns its own accept loop. On shutdown it stops accepting, asks every open
/// connection to finish its current exchange and waits for them to close.
pub struct HyperTransport {
    switchboard: Arc<Switchboard>,
    max_body_bytes: usize,
}

impl HyperTransport {
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
}

#[tracing::instrument(
    name = "request",
    skip_all,
    fields(
        transport = "hyper",
        http.method = %req.method(),
        http.path = %req.uri().path(),
        http.status_code = tracing::field::Empty,
    )
)]
async fn handle(
    switchboard: &Switchboard,
    max_body_bytes: usize,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let reply = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => switchboard.exchange(parts.uri.path(), &parts.method, collected.to_bytes()),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            switchboard.reply_error(&DispatchError::BadRequest)
        }
    };

    tracing::Span::current().record("http.status_code", reply.status.as_u16());
    into_response(reply)
}

/// Sleep out [`ACCEPT_ERROR_BACKOFF`] unless shutdown comes first. Returns
/// whether the accept loop should keep going.
async fn back_off(stop: &mut ShutdownToken) -> bool {
    tokio::select! {
        _ = stop.wait_for_shutdown() => false,
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
    }
}

fn into_response(reply: Reply) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(reply.body));
    *response.status_mut() = reply.status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

impl Transport for HyperTransport {
    fn name(&self) -> &'static str {
        "hyper"
    }

    fn route(&self, router: BoxRouter) {
        self.switchboard.route(router);
    }

    async fn serve(&self, listener: TcpListener, shutdown: ShutdownToken) -> Result<()> {
        let addr = listener
            .local_addr()
            .wrap_err("Failed to read listener address")?;
        tracing::info!("hyper transport serving on {}", addr);

        let mut stop = shutdown.clone();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = stop.wait_for_shutdown() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            // Resource exhaustion (EMFILE, ENFILE) fails every accept until
                            // a descriptor frees up.
                            tracing::warn!("Accept error: {}", e);
                            if back_off(&mut stop).await {
                                continue;
                            }
                            break;
                        }
                    };

                    let switchboard = self.switchboard.clone();
                    let max_body_bytes = self.max_body_bytes;
                    let conn_shutdown = shutdown.clone();

                    connections.spawn(async move {
                        let service = service_fn(move |req| {
                            let switchboard = switchboard.clone();
                            async move {
                                Ok::<_, Infallible>(handle(&switchboard, max_body_bytes, req).await)
                            }
                        });
                        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                        tokio::pin!(conn);

                        let result = tokio::select! {
                            result = conn.as_mut() => result,
                            _ = conn_shutdown.cancelled() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = result {
                            tracing::debug!("Connection from {} ended with error: {}", peer, e);
                        }
                    });
                }
            }
        }

        tracing::info!(
            "hyper transport draining {} connection(s)",
            connections.len()
        );
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Connection task failed: {}", e);
            }
        }

        tracing::info!("hyper transport stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::{
        core::{action::Action, error::DispatchResult},
        ports::endpoint::Resolved,
        utils::graceful_shutdown::{GracefulShutdown, ShutdownReason},
    };

    fn echo(path: &str, method: &Method) -> DispatchResult<Resolved> {
        match (path, method.as_str()) {
            ("/echo", "POST") => Ok(Resolved::new(Action::Create, |body: Bytes| Ok(body))),
            ("/echo", _) => Err(DispatchError::BadMethod),
            _ => Err(DispatchError::BadRequest),
        }
    }

    #[tokio::test]
    async fn test_back_off_waits_before_retrying() {
        let shutdown = GracefulShutdown::new();
        let mut token = shutdown.shutdown_token();

        let started = tokio::time::Instant::now();
        assert!(back_off(&mut token).await);
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_back_off_yields_to_shutdown() {
        let shutdown = GracefulShutdown::new();
        let mut token = shutdown.shutdown_token();
        shutdown.trigger_shutdown(ShutdownReason::Graceful);

        let keep_going = tokio::time::timeout(Duration::from_millis(200), back_off(&mut token))
            .await
            .expect("back-off should end on shutdown");
        assert!(!keep_going);
    }

    #[tokio::test]
    async fn test_serves_and_shuts_down() {
        let transport = Arc::new(HyperTransport::new(StatusTable::default()));
        transport.route(Box::new(echo));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = GracefulShutdown::new();
        let token = shutdown.shutdown_token();

        let server = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.serve(listener, token).await })
        };

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/echo"))
            .body(r#"{"a":1}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.text().await.unwrap(), r#"{"a":1}"#);

        let response = client.get(format!("http://{addr}/echo")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.text().await.unwrap(),
            r#"{"message":"Method Not Allowed"}"#
        );

        shutdown.trigger_shutdown(ShutdownReason::Graceful);
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop after shutdown")
            .unwrap()
            .unwrap();
    }
}
