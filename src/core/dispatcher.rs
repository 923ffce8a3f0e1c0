//! CRUD route binder.
//!
//! A [`Dispatcher`] owns one [`Service`] and registers the five
//! method/path combinations for it on an axum router:
//!
//! | method   | path            | action  |
//! |----------|-----------------|---------|
//! | `GET`    | `{prefix}`      | list    |
//! | `POST`   | `{prefix}`      | create  |
//! | `GET`    | `{prefix}/{id}` | get-one |
//! | `PATCH`  | `{prefix}/{id}` | update  |
//! | `DELETE` | `{prefix}/{id}` | delete  |
//!
//! Any other method on those two paths renders `BadMethod`. Every response,
//! success or error, carries the JSON content type.
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    response::Response,
    routing::{MethodFilter, MethodRouter},
};
use tower_http::trace::TraceLayer;

use crate::{
    core::{
        action::{Action, PathShape},
        context::RequestContext,
        error::DispatchError,
        status::{StatusTable, json_response},
    },
    ports::service::{Service, ServiceResult},
};

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Binds a route prefix to a [`Service`].
pub struct Dispatcher {
    service: Arc<dyn Service>,
    statuses: StatusTable,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn Service>, statuses: StatusTable) -> Self {
        Self {
            service,
            statuses,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set the largest request body that will be buffered.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Register the five bindings for `prefix` on `app`, with and without a
    /// trailing slash.
    pub fn bind(self, app: axum::Router, prefix: &str) -> axum::Router {
        let dispatcher = Arc::new(self);
        let item_path = format!("{prefix}/{{id}}");

        tracing::info!("Binding CRUD routes on {} and {}", prefix, item_path);

        let collection = Self::method_router(&dispatcher, PathShape::Collection);
        let item = Self::method_router(&dispatcher, PathShape::Item);
        app.route(prefix, collection.clone())
            .route(&format!("{prefix}/"), collection)
            .route(&item_path, item.clone())
            .route(&format!("{item_path}/"), item)
    }

    /// Complete application serving only this dispatcher: unmatched paths
    /// render `BadRequest`.
    pub fn into_app(self, prefix: &str) -> axum::Router {
        let statuses = self.statuses;
        self.bind(axum::Router::new(), prefix)
            .fallback(move || async move { statuses.render(&DispatchError::BadRequest) })
            .layer(TraceLayer::new_for_http())
    }

    fn method_router(dispatcher: &Arc<Self>, shape: PathShape) -> MethodRouter {
        let mut router = MethodRouter::new();
        for action in Action::ALL.into_iter().filter(|a| a.shape() == shape) {
            let dispatcher = dispatcher.clone();
            router = router.on(method_filter(action), move |req: Request| async move {
                dispatcher.handle(action, req).await
            });
        }

        let statuses = dispatcher.statuses;
        router.fallback(move || async move { statuses.render(&DispatchError::BadMethod) })
    }

    #[tracing::instrument(
        name = "request",
        skip_all,
        fields(
            transport = "dispatcher",
            http.method = %req.method(),
            http.path = %req.uri().path(),
            action = %action,
            http.status_code = tracing::field::Empty,
        )
    )]
    async fn handle(&self, action: Action, req: Request) -> Response<Body> {
        let (parts, body) = req.into_parts();

        // axum serves HEAD through GET handlers; only the exact method runs.
        let response = if parts.method != action.method() {
            self.statuses.render(&DispatchError::BadMethod)
        } else {
            self.read_and_run(action, &parts.uri, body).await
        };

        tracing::Span::current().record("http.status_code", response.status().as_u16());
        response
    }

    async fn read_and_run(&self, action: Action, uri: &axum::http::Uri, body: Body) -> Response<Body> {
        match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(body) => {
                let ctx = RequestContext::new(action, uri.path(), &body);
                let outcome = self.run(&ctx).await;
                self.render(action, outcome)
            }
            Err(e) => {
                tracing::warn!("Failed to read request body: {}", e);
                self.statuses.render(&DispatchError::BadRequest)
            }
        }
    }

    /// Invoke the service operation matching the context's action.
    pub async fn run(&self, ctx: &RequestContext) -> ServiceResult {
        match ctx.action() {
            Action::List => self.service.get_all(ctx).await,
            Action::GetOne => self.service.get_one(ctx).await,
            Action::Create => self.service.create(ctx).await,
            Action::Update => self.service.update(ctx).await,
            Action::Delete => self.service.delete(ctx).await,
        }
    }

    /// Turn a service outcome into the response for `action`.
    pub fn render(&self, action: Action, outcome: ServiceResult) -> Response<Body> {
        match outcome {
            Ok(Some(value)) => match serde_json::to_vec(&value) {
                Ok(body) => json_response(action.success_status(), body),
                Err(e) => {
                    tracing::error!("Failed to serialize {} result: {}", action, e);
                    self.statuses.render(&DispatchError::Internal)
                }
            },
            Ok(None) => self.statuses.render(&DispatchError::NoHandler),
            Err(err) => {
                tracing::debug!("{} failed: {}", action, err);
                self.statuses.render(&err)
            }
        }
    }
}

fn method_filter(action: Action) -> MethodFilter {
    match action {
        Action::List | Action::GetOne => MethodFilter::GET,
        Action::Create => MethodFilter::POST,
        Action::Update => MethodFilter::PATCH,
        Action::Delete => MethodFilter::DELETE,
    }
}
