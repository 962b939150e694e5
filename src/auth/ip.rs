//! Client IP extraction for per-client rate limiting.

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, extract::Request};

use crate::cli::IpExtractor;

/// Extract the client IP address.
///
/// With an `ip_extractor`, the IP comes from the configured proxy header only; a
/// missing or unparsable header is an error and does not fall back to the socket.
/// Without one, the socket address from `ConnectInfo` is used and client headers
/// are ignored.
pub fn extract_client_ip<B>(
    request: &Request<B>,
    ip_extractor: Option<&IpExtractor>,
) -> Result<String, &'static str> {
    match ip_extractor {
        Some(extractor) => {
            let header_value = request
                .headers()
                .get(extractor.header_name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            extractor.extract(header_value)
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ClientIpHeader;
    use axum::body::Body;

    fn with_peer(mut request: Request<Body>, peer: [u8; 4]) -> Request<Body> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4242))));
        request
    }

    #[test]
    fn test_socket_address_by_default() {
        let request = with_peer(Request::new(Body::empty()), [192, 168, 1, 100]);

        assert_eq!(
            extract_client_ip(&request, None).unwrap(),
            "192.168.1.100"
        );
    }

    #[test]
    fn test_forwarded_for_ignored_without_extractor() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let request = with_peer(request, [10, 0, 0, 1]);

        assert_eq!(extract_client_ip(&request, None).unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_configured_header_wins_over_socket() {
        let extractor = IpExtractor::from(ClientIpHeader::XRealIp);
        let request = Request::builder()
            .header("x-real-ip", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let request = with_peer(request, [10, 0, 0, 1]);

        assert_eq!(
            extract_client_ip(&request, Some(&extractor)).unwrap(),
            "203.0.113.7"
        );
    }

    #[test]
    fn test_missing_configured_header_is_error() {
        let extractor = IpExtractor::from(ClientIpHeader::XForwardFor);
        let request = with_peer(Request::new(Body::empty()), [10, 0, 0, 1]);

        assert!(extract_client_ip(&request, Some(&extractor)).is_err());
    }

    #[test]
    fn test_no_source_is_error() {
        let request = Request::new(Body::empty());
        assert!(extract_client_ip(&request, None).is_err());
    }
}
