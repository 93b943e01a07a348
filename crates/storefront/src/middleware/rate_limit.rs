//! Rate limiting for the login and registration endpoints, using governor
//! and `tower_governor`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP key extractor.
///
/// Uses the peer address from connect info. Behind a trusted proxy it first
/// looks at `CF-Connecting-IP`, then the first `X-Forwarded-For` hop, then
/// `X-Real-IP`; otherwise those headers are client-controlled and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn proxy_header_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    header_ip(req, "cf-connecting-ip")
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| header_ip(req, "x-real-ip"))
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = proxy_header_ip(req)
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    fn with_peer(mut req: Request<()>, peer: &str) -> Request<()> {
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn test_spoofed_headers_ignored_by_default() {
        let extractor = ClientIpKeyExtractor::default();
        let spoofed = [
            ("cf-connecting-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.4"),
            ("x-real-ip", "198.51.100.5"),
        ];

        let req = with_peer(request(&spoofed), "192.0.2.9:50000");
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "192.0.2.9");

        // no peer address and headers alone are not enough
        assert!(extractor.extract(&request(&spoofed)).is_err());
    }

    #[test]
    fn test_trusted_proxy_prefers_cloudflare_header() {
        let extractor = ClientIpKeyExtractor::new(true);
        let req = with_peer(
            request(&[
                ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
                ("cf-connecting-ip", "203.0.113.7"),
            ]),
            "192.0.2.9:50000",
        );
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "203.0.113.7");
    }

    #[test]
    fn test_trusted_proxy_uses_first_forwarded_hop() {
        let extractor = ClientIpKeyExtractor::new(true);
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "198.51.100.4");

        let req = request(&[("x-real-ip", "198.51.100.5")]);
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "198.51.100.5");
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_peer_address() {
        let extractor = ClientIpKeyExtractor::new(true);
        let req = request(&[("x-forwarded-for", "garbage")]);
        assert!(extractor.extract(&req).is_err());

        let req = with_peer(req, "192.0.2.9:50000");
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "192.0.2.9");
    }
}
