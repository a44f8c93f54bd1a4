//! Shared `RequestHandle`/`ResponseHandle` test doubles for the gateway's
//! crate-level integration tests.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::{Map, Value};

use gateway::{Location, RequestHandle, ResponseHandle};

pub struct TestRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
    pub params: Map<String, Value>,
    pub addr: Option<SocketAddr>,
    pub secure: bool,
}

impl TestRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            headers: HeaderMap::new(),
            query: Map::new(),
            body: Map::new(),
            params: Map::new(),
            addr: Some("203.0.113.5:54321".parse().unwrap()),
            secure: false,
        }
    }

    pub fn post(path: &str) -> Self {
        let mut req = Self::get(path);
        req.method = Method::POST;
        req
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn with_client_addr(mut self, addr: &str) -> Self {
        self.addr = Some(addr.parse().unwrap());
        self
    }

    pub fn with_body_field(mut self, field: &str, value: Value) -> Self {
        self.body.insert(field.to_string(), value);
        self
    }

    pub fn with_query_field(mut self, field: &str, value: Value) -> Self {
        self.query.insert(field.to_string(), value);
        self
    }
}

impl RequestHandle for TestRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    fn client_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    fn secure(&self) -> bool {
        self.secure
    }

    fn raw_body(&self) -> Bytes {
        Bytes::from(serde_json::to_vec(&self.body).unwrap_or_default())
    }

    fn set_field(&mut self, location: Location, field: &str, value: Value) {
        let map = match location {
            Location::Headers => return,
            Location::Query => &mut self.query,
            Location::Body => &mut self.body,
            Location::Params => &mut self.params,
        };
        map.insert(field.to_string(), value);
    }
}

#[derive(Default)]
pub struct TestResponse {
    pub status: Option<StatusCode>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub finished: bool,
}

impl TestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl ResponseHandle for TestResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn send_body(&mut self, body: Bytes) {
        self.body = body;
    }

    fn headers_sent(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
