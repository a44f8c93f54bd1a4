//! The seam between the gateway and whatever HTTP server the host runs.
//!
//! The gateway never parses HTTP itself (see the crate's Non-goals): it
//! reads and writes through these two traits, which the host implements
//! over its own request/response types.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{Map, Value};

use gateway_validator::Location;

/// Read-only (plus sanitized-field writeback) access to an inbound request.
///
/// Query, body, and path-param values are exposed as a JSON object regardless
/// of source: headers/query/params arrive as strings from the host, a JSON
/// body arrives already parsed (the gateway does not parse bodies itself).
pub trait RequestHandle: Send + Sync {
    fn method(&self) -> &Method;
    fn path(&self) -> &str;
    fn headers(&self) -> &HeaderMap;
    fn query(&self) -> &Map<String, Value>;
    fn body(&self) -> &Map<String, Value>;
    fn params(&self) -> &Map<String, Value>;
    fn client_addr(&self) -> Option<SocketAddr>;
    /// Whether the underlying connection is TLS-terminated. Combined with
    /// the `X-Forwarded-Proto` header by [`gateway_headers::is_secure`].
    fn secure(&self) -> bool;

    /// The unparsed request body, forwarded byte-for-byte to the upstream
    /// target by the load-balancer stage. Distinct from [`Self::body`], which
    /// is the already-parsed JSON view the validator inspects.
    fn raw_body(&self) -> Bytes;

    /// Replaces one field's value in `location` with its sanitized form,
    /// called by the validator stage before the request is forwarded.
    fn set_field(&mut self, location: Location, field: &str, value: Value);

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }
}

/// Write access to the outbound response. The gateway terminates a request
/// by calling `set_status`/`send_body`/`finish` in sequence; it always checks
/// [`ResponseHandle::headers_sent`] first so a stage never double-writes a
/// response the host (or an earlier stage) already sent.
pub trait ResponseHandle: Send + Sync {
    fn set_header(&mut self, name: &str, value: &str);
    fn remove_header(&mut self, name: &str);
    fn set_status(&mut self, status: StatusCode);
    fn send_body(&mut self, body: Bytes);
    fn headers_sent(&self) -> bool;
    fn finish(&mut self);

    /// Writes a complete terminal JSON response: status, `content-type`,
    /// body, then finishes the exchange. No-op if headers were already sent.
    fn send_json(&mut self, status: StatusCode, body: &Value) {
        if self.headers_sent() {
            return;
        }
        self.set_status(status);
        self.set_header("content-type", "application/json");
        let bytes = Bytes::from(serde_json::to_vec(body).unwrap_or_default());
        self.send_body(bytes);
        self.finish();
    }
}
