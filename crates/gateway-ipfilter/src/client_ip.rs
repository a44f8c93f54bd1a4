use std::net::IpAddr;

/// Derives the client IP for filtering purposes.
///
/// When `trust_proxy` is set: the first entry of `X-Forwarded-For`, else
/// `X-Real-IP`, else the socket peer address. Otherwise the socket peer only.
/// Any header value that fails to parse as an IP address is ignored and the
/// next source is tried, falling back to the socket peer.
pub fn derive_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    socket_peer: Option<IpAddr>,
    trust_proxy: bool,
) -> Option<IpAddr> {
    if trust_proxy {
        if let Some(candidate) = forwarded_for
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .and_then(|s| s.parse::<IpAddr>().ok())
        {
            return Some(candidate);
        }
        if let Some(candidate) = real_ip.map(str::trim).and_then(|s| s.parse::<IpAddr>().ok()) {
            return Some(candidate);
        }
    }
    socket_peer
}
