use crate::TransportError;
use auto_impl::auto_impl;
use http::{HeaderMap, Method, StatusCode};

/// A completed HTTP response: status, response headers, and the body read to completion.
///
/// The core never streams a response body — every tus response it reads is either empty or a
/// small JSON object (the concat response), so buffering is the simpler, correct choice here.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    /// Reads a single header's value as a UTF-8 string, if present and valid.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The transport collaborator: issues a single request and returns its response, or classifies
/// the failure as a connect failure, a client error, or a server error.
///
/// Implementors are expected to follow redirects transparently; the state machine only ever sees
/// terminal responses.
#[auto_impl(&, &mut, Box, Rc, Arc)]
pub trait HttpTransport: Send + Sync {
    /// Issues `method` against `url`, sending `headers` and, if present, `body` as the request
    /// payload.
    fn call(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError>;
}
