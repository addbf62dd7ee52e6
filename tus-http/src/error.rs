use thiserror::Error;

/// The three failure shapes an [`HttpTransport`](crate::HttpTransport) may raise.
///
/// These map directly onto the core's `ConnectionError`/`ProtocolError` classification; the
/// transport itself never decides which tus-level error a status becomes — that is the state
/// machine's job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The transport never reached the server: DNS failure, refused connection, TLS handshake
    /// failure, or timeout.
    #[error("failed to connect: {0}")]
    ConnectFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A 4xx response, or the `100` pseudo-status described above.
    #[error("client error (status {status})")]
    ClientError { status: u16, body: Vec<u8> },

    /// A 5xx response.
    #[error("server error (status {status})")]
    ServerError { status: u16, body: Vec<u8> },
}

impl TransportError {
    /// The status code carried by a `ClientError`/`ServerError`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ConnectFailure(_) => None,
            Self::ClientError { status, .. } | Self::ServerError { status, .. } => Some(*status),
        }
    }

    /// The response body carried by a `ClientError`/`ServerError`, if any.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::ConnectFailure(_) => None,
            Self::ClientError { body, .. } | Self::ServerError { body, .. } => Some(body),
        }
    }
}
