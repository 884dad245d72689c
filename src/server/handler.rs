// src/server/handler.rs
use super::service::{json_response, HealthService};
use hyper::header::HeaderValue;
use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestHandler {
    service: Arc<HealthService>,
}

impl RequestHandler {
    pub fn new(service: Arc<HealthService>) -> Self {
        Self { service }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().clone();
        let uri = req.uri().clone();
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("request", %request_id, %method, path = %uri.path());

        Box::pin(
            async move {
                let mut response = match service.handle(&method, &uri).await {
                    Ok(response) => response,
                    Err(err) => {
                        service.report_error(&err);
                        json_response(
                            StatusCode::SERVICE_UNAVAILABLE,
                            &json!({ "status": "unhealthy", "error": format!("{:#}", err) }),
                        )
                    }
                };
                tracing::debug!(status = %response.status(), "request served");

                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
