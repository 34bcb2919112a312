use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::time::Instant;

use crate::logging::RequestLine;

/// 从代理头中取客户端 IP，依次尝试 X-Forwarded-For 和 X-Real-IP
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|h| h.to_str().ok());

    forwarded
        .into_iter()
        .chain(real_ip)
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// HTTP 访问日志中间件
pub async fn simple_http_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let client = client_ip(request.headers());

    let response = next.run(request).await;

    tracing::info!(
        "{}",
        RequestLine {
            method: &method,
            uri: &uri,
            status: response.status().as_u16(),
            elapsed: start.elapsed(),
            client: client.as_deref(),
        }
    );

    response
}
