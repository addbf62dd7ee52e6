use crate::{HttpTransport, Response, TransportError};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::io::{copy, Read};
use std::time::Duration;
use ureq::{Agent, Error as UreqError};

/// Blocking [`HttpTransport`] implementation backed by `ureq`.
///
/// A single shared [`Agent`] with an explicit timeout, never the library default.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Builds a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    /// Builds a transport around a caller-configured [`Agent`].
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpTransport for UreqTransport {
    fn call(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError> {
        let mut request = self.agent.request(method.as_str(), url);
        for (name, value) in headers {
            let value = value
                .to_str()
                .map_err(|err| TransportError::ConnectFailure(Box::new(err)))?;
            request = request.set(name.as_str(), value);
        }

        let result = match body {
            Some(bytes) => request.send_bytes(&bytes),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(into_response(response)),
            Err(UreqError::Status(code, response)) => {
                let response = into_response(response);
                if (400..500).contains(&code) {
                    Err(TransportError::ClientError {
                        status: code,
                        body: response.body,
                    })
                } else {
                    Err(TransportError::ServerError {
                        status: code,
                        body: response.body,
                    })
                }
            }
            Err(UreqError::Transport(transport)) => {
                Err(TransportError::ConnectFailure(Box::new(transport)))
            }
        }
    }
}

fn into_response(response: ureq::Response) -> Response {
    let status =
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    for name in response.headers_names() {
        if let (Ok(header_name), Some(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            response.header(&name),
        ) {
            if let Ok(header_value) = HeaderValue::from_str(value) {
                headers.insert(header_name, header_value);
            }
        }
    }
    let mut body = Vec::new();
    let _ = copy(&mut response.into_reader().take(16 * 1024 * 1024), &mut body);
    Response::new(status, headers, body)
}
