//! Per-request state threaded through the chain.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::http::{header, Extensions, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::chain::{next, Chain};
use crate::context::bind::{BindError, BodyFormat};
use crate::context::response::ResponseBuffer;
use crate::routing::Params;

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_XML: &str = "application/xml";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Mutable, pooled state for one request.
///
/// Every field is overwritten by the engine before a request starts, so
/// nothing written by a previous borrower is observable.
#[derive(Default)]
pub struct Context {
    request: Request<Bytes>,
    response: ResponseBuffer,
    params: Params,
    chain: Option<Chain>,
    aborted: bool,
    route: Option<Arc<str>>,
    keys: Extensions,
}

impl Context {
    /// Standalone context for `request`, outside any pool.
    pub fn new(request: Request<Bytes>) -> Self {
        let mut ctx = Self::default();
        ctx.reset(request);
        ctx
    }

    pub(crate) fn reset(&mut self, request: Request<Bytes>) {
        self.request = request;
        self.response.clear();
        self.params.clear();
        self.chain = None;
        self.aborted = false;
        self.route = None;
        self.keys = Extensions::new();
    }

    pub(crate) fn install(&mut self, route: Arc<str>, params: Params, chain: Chain) {
        self.route = Some(route);
        self.params = params;
        self.chain = Some(chain);
    }

    /// Run the installed chain from its first link.
    pub(crate) fn run_chain(&mut self) {
        if let Some(chain) = self.chain.clone() {
            next::run(&chain, self);
        }
    }

    pub(crate) fn take_response(&mut self) -> Response<Bytes> {
        self.response.take()
    }

    // --- Flow control ---

    /// Skip every link after the current one. The current link keeps running.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of links installed for this request (0 when unmatched).
    pub fn chain_len(&self) -> usize {
        self.chain.as_ref().map_or(0, |chain| chain.len())
    }

    // --- Request accessors ---

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Request header as text; `None` when missing or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// First value of a query-string parameter.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.request.uri().query()?;
        form_value(query.as_bytes(), key)
    }

    /// Query parameter, or `default` when missing or empty.
    pub fn default_query(&self, key: &str, default: &str) -> String {
        non_empty_or(self.query(key), default)
    }

    /// Urlencoded form field from the body, falling back to the query string.
    pub fn post_form(&self, key: &str) -> Option<String> {
        let is_form = self.content_type().and_then(BodyFormat::from_content_type)
            == Some(BodyFormat::Form);
        let from_body = if is_form {
            form_value(self.request.body(), key)
        } else {
            None
        };
        from_body.or_else(|| self.query(key))
    }

    /// Form field, or `default` when missing or empty.
    pub fn default_post_form(&self, key: &str, default: &str) -> String {
        non_empty_or(self.post_form(key), default)
    }

    /// Path parameter bound by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Pattern of the matched route.
    pub fn route_pattern(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Full request body.
    pub fn raw_data(&self) -> &Bytes {
        self.request.body()
    }

    /// Peer address recorded by the HTTP host, if any.
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }

    // --- Side-channel ---

    /// Store a value keyed by its type, returning the one it replaced.
    pub fn set<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.keys.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.keys.get::<T>()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.keys.remove::<T>()
    }

    // --- Response writers ---

    pub fn status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// Status written so far, `200 OK` until one is set.
    pub fn status_code(&self) -> StatusCode {
        self.response.status().unwrap_or(StatusCode::OK)
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers_mut().insert(name, value);
    }

    pub fn response(&self) -> &ResponseBuffer {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseBuffer {
        &mut self.response
    }

    /// Drop whatever the chain has written so far.
    pub fn discard_response(&mut self) {
        self.response.clear();
    }

    /// Plain-text body.
    pub fn string(&mut self, status: StatusCode, body: impl AsRef<str>) {
        self.write_body(status, TEXT_PLAIN, body.as_ref().as_bytes());
    }

    /// JSON body. A value that fails to serialize yields a 500 with the error text.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.write_body(status, APPLICATION_JSON, &body),
            Err(err) => self.serialization_failed(&err),
        }
    }

    /// XML body. A value that fails to serialize yields a 500 with the error text.
    pub fn xml<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match quick_xml::se::to_string(value) {
            Ok(body) => self.write_body(status, APPLICATION_XML, body.as_bytes()),
            Err(err) => self.serialization_failed(&err),
        }
    }

    /// Raw bytes with an explicit content type.
    pub fn data(&mut self, status: StatusCode, content_type: HeaderValue, body: &[u8]) {
        self.response.set_status(status);
        self.response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        self.response.write(body);
    }

    fn write_body(&mut self, status: StatusCode, content_type: &'static str, body: &[u8]) {
        self.data(status, HeaderValue::from_static(content_type), body);
    }

    fn serialization_failed(&mut self, err: &dyn fmt::Display) {
        self.response.clear();
        self.string(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
    }

    // --- Body binding ---

    /// Decode the body according to its `Content-Type`.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let content_type = self.content_type().unwrap_or_default();
        match BodyFormat::from_content_type(content_type) {
            Some(format) => format.decode(self.request.body()),
            None => Err(BindError::UnsupportedContentType(content_type.to_string())),
        }
    }

    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        BodyFormat::Json.decode(self.request.body())
    }

    pub fn bind_xml<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        BodyFormat::Xml.decode(self.request.body())
    }

    pub fn bind_form<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        BodyFormat::Form.decode(self.request.body())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("path", &self.path())
            .field("route", &self.route)
            .field("params", &self.params)
            .field("chain_len", &self.chain_len())
            .field("aborted", &self.aborted)
            .field("status", &self.response.status())
            .finish()
    }
}

fn form_value(input: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
