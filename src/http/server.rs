//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with the resolve-and-forward handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Resolve each request against the currently published router
//! - Forward matched requests to the owning backend

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{uri::Uri, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backends::Backend;
use crate::config::ProxyConfig;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::observability::metrics;
use crate::routing::router::SharedRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: SharedRouter,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP front end dispatching requests to backends.
pub struct HttpServer {
    app: Router,
}

impl HttpServer {
    /// Create a server serving whatever router is published in `router`.
    pub fn new(config: ProxyConfig, router: SharedRouter) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState { router, client };
        let app = Self::build_app(&config, state);
        Self { app }
    }

    /// Build the Axum app with all middleware layers.
    ///
    /// Layers run top to bottom on the way in: the request ID is assigned
    /// before the trace span opens, and the timeout covers the upstream call.
    fn build_app(config: &ProxyConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req)
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ));

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// The Axum app, for serving on a custom listener or driving in tests.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main handler: resolve the owning backend and forward the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();

    let backend = state.router.load().match_request(&request);
    let backend = match backend {
        Some(b) => b,
        None => {
            tracing::warn!(
                request_id = %request_id,
                host = ?request.headers().get("host"),
                path = %request.uri().path(),
                "No route matched and no default backend"
            );
            metrics::record_unmatched();
            metrics::record_request(&method, 404, "none", start);
            return (StatusCode::NOT_FOUND, "No matching route found").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        backend = %backend.name,
        path = %request.uri().path(),
        "Forwarding request"
    );

    let (mut parts, body) = request.into_parts();
    parts.uri = match upstream_uri(&backend, &parts.uri) {
        Some(uri) => uri,
        None => {
            tracing::error!(request_id = %request_id, backend = %backend.name, "Could not build upstream URI");
            metrics::record_request(&method, 502, &backend.name, start);
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), &backend.name, start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, backend = %backend.name, error = %e, "Upstream error");
            metrics::record_request(&method, 502, &backend.name, start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

fn upstream_uri(backend: &Arc<Backend>, original: &Uri) -> Option<Uri> {
    let url = backend.upstream_url(original.path(), original.query());
    Uri::try_from(url.as_str()).ok()
}
