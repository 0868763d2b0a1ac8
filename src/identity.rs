use axum::http::HeaderMap;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

// Best-effort client identifier used to key rate limit state.
// X-Forwarded-For is trusted from any caller, so clients can pick their own key.
pub fn client_identifier(headers: &HeaderMap, peer_addr: &str) -> String {
    // opaque (non-ASCII) bytes still count as a present header
    if let Some(forwarded) = headers
        .get(FORWARDED_FOR)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .filter(|v| !v.is_empty())
    {
        // first hop is the original client
        let first = forwarded.split(',').next().unwrap_or(&*forwarded);
        return first.trim().to_string();
    }

    match split_host_port(peer_addr) {
        Some(host) => host.to_string(),
        None => peer_addr.to_string(),
    }
}

// Splits "host:port" or "[v6]:port" and returns the host.
// None when the port is missing or the host is ambiguous (bare IPv6).
fn split_host_port(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        if port.contains(':') {
            return None;
        }
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some(host)
}
