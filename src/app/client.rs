//! Client address as seen behind a reverse proxy

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use log::debug;

/// Header a fronting proxy uses to pass on the original client address
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Address of the client that sent the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub IpAddr);

/// Attach a [`ClientAddr`], preferring `X-Real-IP` over the socket peer.
/// Unparseable header values are ignored.
pub async fn resolve_client_addr(mut request: Request, next: Next) -> Response {
    let forwarded = request
        .headers()
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = forwarded.or(peer) {
        debug!("{} {} from {}", request.method(), request.uri(), ip);
        request.extensions_mut().insert(ClientAddr(ip));
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn echo(addr: Option<Extension<ClientAddr>>) -> String {
        addr.map(|Extension(ClientAddr(ip))| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    async fn client_of(request: Request) -> String {
        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(resolve_client_addr));
        let response = app.oneshot(request).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn request_from_peer(real_ip: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(ip) = real_ip {
            builder = builder.header(REAL_IP_HEADER, ip);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    #[tokio::test]
    async fn real_ip_header_wins_over_peer() {
        assert_eq!(client_of(request_from_peer(Some("10.1.2.3"))).await, "10.1.2.3");
    }

    #[tokio::test]
    async fn peer_address_without_header() {
        assert_eq!(client_of(request_from_peer(None)).await, "127.0.0.1");
        assert_eq!(client_of(request_from_peer(Some("not-an-ip"))).await, "127.0.0.1");
    }

    #[tokio::test]
    async fn nothing_known_leaves_no_address() {
        let request = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_of(request).await, "unknown");
    }
}
