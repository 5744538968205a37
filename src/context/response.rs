//! Buffered response for one request.
//!
//! # Responsibilities
//! - Collect status, headers and body written by the chain
//! - Convert the buffer into an `http::Response` once the chain is done
//!
//! # Design Decisions
//! - Fully buffered: status and headers stay editable until the chain ends,
//!   which lets recovery replace a half-written response
//! - Status is absent until set; conversion falls back to `200 OK`

use axum::body::Bytes;
use axum::http::{HeaderMap, Response, StatusCode};

#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Status set so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Append bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True once a status or any body bytes were written.
    pub fn is_written(&self) -> bool {
        self.status.is_some() || !self.body.is_empty()
    }

    /// Forget everything written so far.
    pub fn clear(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }

    /// Move the buffered content out, leaving an empty buffer behind.
    pub fn take(&mut self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::from(std::mem::take(&mut self.body)));
        *response.status_mut() = self.status.take().unwrap_or(StatusCode::OK);
        *response.headers_mut() = std::mem::take(&mut self.headers);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::HeaderValue;

    #[test]
    fn test_take_defaults_to_ok() {
        let mut buffer = ResponseBuffer::default();
        assert!(!buffer.is_written());
        let response = buffer.take();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_take_moves_content_out() {
        let mut buffer = ResponseBuffer::default();
        buffer.set_status(StatusCode::CREATED);
        buffer
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        buffer.write(b"hello ");
        buffer.write(b"world");

        let response = buffer.take();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(&response.body()[..], b"hello world");

        assert!(!buffer.is_written());
        assert!(buffer.headers().is_empty());
    }

    #[test]
    fn test_clear_discards_partial_write() {
        let mut buffer = ResponseBuffer::default();
        buffer.set_status(StatusCode::OK);
        buffer.write(b"partial");
        buffer.clear();
        assert_eq!(buffer.status(), None);
        assert!(buffer.body().is_empty());
    }
}
