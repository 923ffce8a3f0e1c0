#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use crudwire::{
    AxumTransport, Dispatcher, HyperTransport, PostService, PostStore, PostsRouter, StatusTable,
    Transport,
    utils::graceful_shutdown::{GracefulShutdown, ShutdownReason},
};
use http::Method;
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle};

/// The three ways a request can reach the post collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Dispatcher,
    Axum,
    Hyper,
}

impl Binding {
    pub const ALL: [Binding; 3] = [Binding::Dispatcher, Binding::Axum, Binding::Hyper];
    pub const TRANSPORTS: [Binding; 2] = [Binding::Axum, Binding::Hyper];
}

/// A server bound to a loopback port for the duration of a test.
pub struct Running {
    pub base: String,
    shutdown: GracefulShutdown,
    handle: JoinHandle<eyre::Result<()>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger_shutdown(ShutdownReason::Graceful);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

async fn loopback() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Serve `transport` on a fresh loopback port.
pub async fn spawn_transport<T: Transport>(transport: Arc<T>) -> Running {
    let (listener, base) = loopback().await;
    let shutdown = GracefulShutdown::new();
    let token = shutdown.shutdown_token();
    let handle = tokio::spawn(async move { transport.serve(listener, token).await });
    Running {
        base,
        shutdown,
        handle,
    }
}

/// Serve `dispatcher` under `prefix` on a fresh loopback port.
pub async fn spawn_dispatcher(dispatcher: Dispatcher, prefix: &str) -> Running {
    let (listener, base) = loopback().await;
    let shutdown = GracefulShutdown::new();
    let token = shutdown.shutdown_token();
    let app = dispatcher.into_app(prefix);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled())
            .await?;
        Ok::<(), eyre::Report>(())
    });
    Running {
        base,
        shutdown,
        handle,
    }
}

/// Serve the post collection in `store` under `/posts` through `binding`.
pub async fn spawn_posts(binding: Binding, statuses: StatusTable, store: Arc<PostStore>) -> Running {
    match binding {
        Binding::Dispatcher => {
            let dispatcher = Dispatcher::new(Arc::new(PostService::new(store)), statuses);
            spawn_dispatcher(dispatcher, "/posts").await
        }
        Binding::Axum => {
            let transport = Arc::new(AxumTransport::new(statuses));
            transport.route(Box::new(PostsRouter::new("/posts", store).unwrap()));
            spawn_transport(transport).await
        }
        Binding::Hyper => {
            let transport = Arc::new(HyperTransport::new(statuses));
            transport.route(Box::new(PostsRouter::new("/posts", store).unwrap()));
            spawn_transport(transport).await
        }
    }
}

/// Observable outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Value,
}

pub async fn send(client: &reqwest::Client, url: &str, method: Method, body: Option<&str>) -> Outcome {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.body(body.to_string());
    }
    let response = request.send().await.unwrap();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.bytes().await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("{url} returned non-JSON body {bytes:?}: {e}"));
    Outcome {
        status,
        content_type,
        body,
    }
}
