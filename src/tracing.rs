use std::cell::RefCell;
use std::fmt;

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use futures::Future;
use tower_http::classify::StatusInRangeAsFailures;
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse,
    MakeSpan, TraceLayer,
};
use uuid::Uuid;

/// Identificador unico de la peticion, visible en logs y en la cabecera
/// X-Request-Id de la respuesta.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

/// Ejecuta `future` con el request id disponible via `current_request_id`.
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::new)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id.as_str(),
            method = %method,
            uri = %uri,
        )
    }
}

/// Nombre de la cabecera con el identificador de peticion.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Asigna un request id a cada peticion: respeta el que venga en la cabecera
/// o genera uno nuevo, lo deja en las extensiones para los handlers y lo
/// devuelve en la respuesta.
pub async fn request_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::new)
        .unwrap_or_default();

    // Los UUID generados son ASCII; un valor externo invalido se descarta
    // arriba al fallar to_str.
    if let Ok(valor) = HeaderValue::from_str(request_id.as_str()) {
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), valor);
    }
    request.extensions_mut().insert(request_id.clone());

    let mut response =
        scope_request_id(request_id.clone(), async move { next.run(request).await }).await;

    if let Ok(valor) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), valor);
    }

    response
}

/// TraceLayer que clasifica los 5xx como fallos y anota cada span con el
/// request id.
pub fn configure_http_tracing() -> TraceLayer<
    tower_http::classify::SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DefaultOnFailure,
> {
    let classifier =
        tower_http::classify::SharedClassifier::new(StatusInRangeAsFailures::new(500..=599));
    TraceLayer::new(classifier)
        .make_span_with(RequestSpanMaker)
        .on_request(DefaultOnRequest::default())
        .on_response(DefaultOnResponse::default())
        .on_body_chunk(DefaultOnBodyChunk::default())
        .on_eos(DefaultOnEos::default())
        .on_failure(DefaultOnFailure::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_id_is_visible_inside_scope() {
        let seen = scope_request_id(RequestId::new("req-visible"), async {
            current_request_id().map(|rid| rid.as_str().to_string())
        })
        .await;
        assert_eq!(seen.as_deref(), Some("req-visible"));
    }

    #[tokio::test]
    async fn request_id_is_absent_outside_scope() {
        assert!(current_request_id().is_none());
    }

    mod middleware {
        use super::super::*;
        use axum::body::{to_bytes, Body};
        use axum::extract::Extension;
        use axum::http::{Request as HttpRequest, StatusCode};
        use axum::routing::get;
        use axum::Router;
        use tower::ServiceExt;

        async fn handler_con_extension(
            Extension(request_id): Extension<RequestId>,
        ) -> (StatusCode, String) {
            (StatusCode::OK, format!("request-id:{}", request_id.as_str()))
        }

        #[tokio::test]
        async fn agrega_cabecera_y_extension() {
            let app = Router::new()
                .route("/", get(handler_con_extension))
                .layer(axum::middleware::from_fn(request_id_middleware));

            let response = app
                .oneshot(
                    HttpRequest::builder()
                        .uri("/")
                        .method("GET")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert!(response.headers().get(REQUEST_ID_HEADER).is_some());

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body_str = String::from_utf8(body.to_vec()).unwrap();
            assert!(body_str.starts_with("request-id:"));
        }

        #[tokio::test]
        async fn conserva_el_request_id_entrante() {
            let app = Router::new()
                .route("/", get(handler_con_extension))
                .layer(axum::middleware::from_fn(request_id_middleware));

            let response = app
                .oneshot(
                    HttpRequest::builder()
                        .uri("/")
                        .method("GET")
                        .header(REQUEST_ID_HEADER, "req-cliente-7")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let header = response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            assert_eq!(header.as_deref(), Some("req-cliente-7"));
        }
    }
}
